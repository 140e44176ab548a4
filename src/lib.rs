//! # Edge Timeit
//!
//! This crate times arbitrary computations without deciding, at measurement
//! time, whether the measurement gets printed. [`timeit`] runs a closure once
//! on a monotonic clock and hands back a [`Timed`] value; calling
//! [`Timed::trace`] prints a `[<label>] spent: <seconds> seconds.` line and
//! returns the closure's result, so timing slots into an expression chain.
//!
//! The remaining modules are the glue used by the demos: an edge-box pipeline
//! over `image` and `imageproc` where every stage is timed the same way.
//!
//! ## Features
//!
//! - Generic `Timed<T = ()>`: unit closures need no separate type
//! - Error-transparent `try_timeit` for fallible closures
//! - Sobel edges and orientation via `imageproc`, thinned along the gradient
//! - Edge-box proposals and score-colored drawing
//! - Optional debug logging (enable with `logger` feature)
//!
//! ## Basic Usage
//!
//! ```rust
//! use edge_timeit::timeit;
//!
//! fn fib(n: u32) -> u64 {
//!     if n < 3 { 1 } else { fib(n - 1) + fib(n - 2) }
//! }
//!
//! timeit("hello", || println!("Hello.")).trace();
//!
//! let fib_res = timeit("fib", || fib(10)).trace();
//! assert_eq!(fib_res, 55);
//! ```
//!
//! ## Edge Boxes
//!
//! ```rust,no_run
//! use edge_timeit::{
//!     draw_boxes, edge_canvas, load_image, EdgeBoxDetector, EdgeBoxParams, EdgeModel, NmsParams,
//! };
//!
//! let model = EdgeModel::load(NmsParams::default());
//! let detector = EdgeBoxDetector::new(EdgeBoxParams::default());
//!
//! let image = load_image("input.png").unwrap();
//! let edges = model.detect_edges(&image);
//! let orientation = model.compute_orientation(&image);
//! let thinned = model.suppress(&edges, &orientation);
//! let boxes = detector.find_boxes(&thinned, &orientation);
//!
//! let mut canvas = edge_canvas(&edges);
//! if let Some(stats) = draw_boxes(&mut canvas, &boxes) {
//!     println!("{stats}");
//! }
//! canvas.save("boxes.png").unwrap();
//! ```
//!
//! ## Optional Features
//!
//! ### Logger Feature
//!
//! Every measurement is also emitted as a `debug` record:
//!
//! ```toml
//! [dependencies]
//! edge-timeit = { version = "0.1.0", features = ["logger"] }
//! log = "0.4"
//! env_logger = "0.11"
//! ```
//!
//! ```rust,no_run
//! use edge_timeit::timeit;
//!
//! env_logger::init();
//!
//! let sum: u64 = timeit("sum", || (0..1_000_000u64).sum()).trace();
//! // With logger feature, you'll also see:
//! // DEBUG edge_timeit::timeit: sum finished in 1.234ms
//! ```

// Conditional logging macros
#[cfg(feature = "logger")]
macro_rules! debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(feature = "logger"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

pub mod boxes;
pub mod draw;
pub mod pipeline;
pub mod timeit;

pub use crate::boxes::{BoxProposal, EdgeBoxDetector, EdgeBoxParams};
pub use crate::draw::{draw_boxes, edge_canvas, ScoreStats};
pub use crate::pipeline::{
    edges_to_gray, load_image, EdgeMap, EdgeModel, NmsParams, OrientationMap,
};
pub use crate::timeit::{timeit, try_timeit, Timed};
