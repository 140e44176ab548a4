//! Scoped timing of a single computation with deferred reporting.
//!
//! [`timeit`] runs a closure exactly once and measures it on a monotonic
//! clock. The result is returned wrapped in a [`Timed`] value, and the caller
//! decides later whether to print the measurement. Printing with
//! [`Timed::trace`] hands the carried value back, so the call can sit inline in
//! an expression:
//!
//! ```rust
//! use edge_timeit::timeit;
//!
//! let answer = timeit("noop", || 42).trace();
//! assert_eq!(answer, 42);
//! // stdout: [noop] spent: 0.000000 seconds.
//! ```

use std::{
    fmt,
    io::{self, Write},
    time::{Duration, Instant},
};

/// Outcome of one timed computation: its label, its wall-clock duration, and
/// the value it produced.
///
/// `T` defaults to `()`, which is what a closure with no return value yields.
/// The value cannot be re-timed; no method mutates the label or duration.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a timing is only reported when `trace` or `show` is called"]
pub struct Timed<T = ()> {
    label: String,
    elapsed: Duration,
    value: T,
}

/// Runs `computation` once on the calling thread and records how long it took.
///
/// Nothing is printed here; call [`Timed::trace`] or [`Timed::show`] on the
/// result to report. A panic inside `computation` unwinds straight through and
/// no [`Timed`] is produced.
///
/// # Examples
///
/// ```rust
/// use edge_timeit::timeit;
///
/// // Unit closures produce `Timed<()>`.
/// timeit("hello", || println!("Hello.")).trace();
///
/// let factorial = timeit("factorial", || (1..=10u64).product::<u64>()).trace();
/// assert_eq!(factorial, 3_628_800);
/// ```
pub fn timeit<T, F>(label: impl Into<String>, computation: F) -> Timed<T>
where
    F: FnOnce() -> T,
{
    let label = label.into();
    let start = Instant::now();
    let value = computation();
    let elapsed = start.elapsed();

    debug!("{label} finished in {elapsed:?}");

    Timed {
        label,
        elapsed,
        value,
    }
}

/// Like [`timeit`], but for fallible computations.
///
/// `Ok(v)` is timed and wrapped as usual. `Err(e)` is returned to the caller
/// as-is; no timing is built or logged for it.
///
/// ```rust
/// use edge_timeit::try_timeit;
///
/// let failed: Result<_, String> = try_timeit("boom", || Err::<u8, _>("x".to_string()));
/// assert_eq!(failed.unwrap_err(), "x");
/// ```
pub fn try_timeit<T, E, F>(label: impl Into<String>, computation: F) -> Result<Timed<T>, E>
where
    F: FnOnce() -> Result<T, E>,
{
    let start = Instant::now();
    let value = computation()?;
    let elapsed = start.elapsed();

    let label = label.into();
    debug!("{label} finished in {elapsed:?}");

    Ok(Timed {
        label,
        elapsed,
        value,
    })
}

impl<T> Timed<T> {
    /// Label given to [`timeit`].
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Measured wall-clock duration.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Measured duration in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Borrows the computation's result.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Discards the timing and returns the computation's result.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Prints the trace line to stdout without consuming the result.
    pub fn show(&self) {
        println!("{self}");
    }

    /// Writes the trace line, newline-terminated, to `out`.
    pub fn write_trace<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{self}")
    }

    /// Prints the trace line to stdout and returns the computation's result
    /// unchanged.
    pub fn trace(self) -> T {
        self.show();
        self.value
    }
}

/// Renders `[<label>] spent: <seconds> seconds.` with microsecond precision.
/// Scripts scrape this line, so the layout is fixed.
impl<T> fmt::Display for Timed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] spent: {:.6} seconds.",
            self.label,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::thread;

    fn parse_seconds(line: &str, label: &str) -> f64 {
        let prefix = format!("[{label}] spent: ");
        let rest = line
            .strip_prefix(&prefix)
            .and_then(|s| s.strip_suffix(" seconds.\n"))
            .unwrap_or_else(|| panic!("unexpected trace line: {line:?}"));
        rest.parse().unwrap()
    }

    #[test]
    fn test_trace_returns_value_unchanged() {
        let direct = vec![1, 2, 3];
        let timed = timeit("vec", || vec![1, 2, 3]).trace();
        assert_eq!(timed, direct);
    }

    #[test]
    fn test_elapsed_is_non_negative() {
        let timed = timeit("empty", || ());
        assert!(timed.elapsed_secs() >= 0.0);
        assert_eq!(timed.elapsed().as_secs_f64(), timed.elapsed_secs());
    }

    #[test]
    fn test_computation_runs_exactly_once() {
        let calls = Cell::new(0);
        let timed = timeit("count", || {
            calls.set(calls.get() + 1);
            calls.get()
        });
        assert_eq!(calls.get(), 1);

        // Reporting never re-runs the closure.
        let mut sink = Vec::new();
        timed.write_trace(&mut sink).unwrap();
        timed.show();
        assert_eq!(timed.trace(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unit_computation_still_reports() {
        let timed: Timed = timeit("hello", || {});
        let mut out = Vec::new();
        timed.write_trace(&mut out).unwrap();

        let line = String::from_utf8(out).unwrap();
        assert!(parse_seconds(&line, "hello") >= 0.0);
        timed.trace();
    }

    #[test]
    fn test_noop_scenario() {
        let timed = timeit("noop", || 42);
        assert_eq!(timed.label(), "noop");

        let mut out = Vec::new();
        timed.write_trace(&mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.contains("noop"));
        assert_eq!(timed.trace(), 42);
    }

    #[test]
    fn test_sleep_scenario() {
        let timed = timeit("sleep", || {
            thread::sleep(Duration::from_millis(100));
            "done"
        });

        let mut out = Vec::new();
        timed.write_trace(&mut out).unwrap();
        let printed = parse_seconds(&String::from_utf8(out).unwrap(), "sleep");
        assert!(printed >= 0.1, "printed {printed}");
        assert!(timed.elapsed() >= Duration::from_millis(100));
        assert_eq!(timed.trace(), "done");
    }

    #[test]
    fn test_boom_scenario_surfaces_error() {
        let calls = Cell::new(0);
        let result: Result<Timed<i32>, String> = try_timeit("boom", || {
            calls.set(calls.get() + 1);
            Err("x".to_string())
        });
        assert_eq!(result, Err("x".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[cfg(feature = "logger")]
    mod logging {
        use super::*;
        use std::sync::{Mutex, Once};

        struct Capture;

        static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());
        static INSTALL: Once = Once::new();

        impl log::Log for Capture {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }

            fn log(&self, record: &log::Record) {
                LINES.lock().unwrap().push(record.args().to_string());
            }

            fn flush(&self) {}
        }

        fn captured_with(label: &str) -> usize {
            LINES
                .lock()
                .unwrap()
                .iter()
                .filter(|line| line.starts_with(label))
                .count()
        }

        #[test]
        fn test_failed_computation_is_not_logged() {
            INSTALL.call_once(|| {
                static CAPTURE: Capture = Capture;
                log::set_logger(&CAPTURE).unwrap();
                log::set_max_level(log::LevelFilter::Trace);
            });

            let failed: Result<Timed<u8>, &str> = try_timeit("try-fails", || Err("x"));
            assert!(failed.is_err());
            let ok: Result<Timed<u8>, &str> = try_timeit("try-succeeds", || Ok(1));
            assert!(ok.is_ok());

            assert_eq!(captured_with("try-fails "), 0);
            assert_eq!(captured_with("try-succeeds "), 1);
        }
    }

    #[test]
    fn test_try_timeit_wraps_ok_value() {
        let timed: Timed<i32> = try_timeit("parse", || Ok::<_, String>(7)).unwrap();
        assert_eq!(timed.label(), "parse");
        assert_eq!(*timed.value(), 7);
        assert_eq!(timed.into_inner(), 7);
    }

    #[test]
    fn test_fallible_value_passes_through_timeit() {
        let result: Result<u8, &str> = timeit("boom", || Err("x")).trace();
        assert_eq!(result, Err("x"));
    }

    #[test]
    #[should_panic(expected = "x")]
    fn test_panic_propagates() {
        let _timed: Timed<()> = timeit("boom", || panic!("x"));
    }

    #[test]
    fn test_trace_line_layout() {
        let timed = Timed {
            label: "edge detect".to_string(),
            elapsed: Duration::from_micros(1_500_250),
            value: (),
        };
        assert_eq!(timed.to_string(), "[edge detect] spent: 1.500250 seconds.");

        let mut out = Vec::new();
        timed.write_trace(&mut out).unwrap();
        assert_eq!(out, b"[edge detect] spent: 1.500250 seconds.\n");
    }

    #[test]
    fn test_independent_invocations() {
        let first = timeit("a", || 1);
        let second = timeit("b", || 2);
        assert_eq!((first.label(), second.label()), ("a", "b"));
        assert_eq!(first.into_inner() + second.into_inner(), 3);
    }
}
