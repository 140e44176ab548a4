use std::time::Duration;

use env_logger::Builder;
use log::info;

use edge_timeit::timeit;

fn fib_recursive(n: u32) -> u64 {
    if n < 3 {
        return 1;
    }
    fib_recursive(n - 1) + fib_recursive(n - 2)
}

fn fib_iterative(n: u32) -> u64 {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 2..n {
        (a, b) = (b, a + b);
    }
    b
}

fn main() {
    Builder::from_default_env().format_timestamp_nanos().init();

    const N: u32 = 30;
    let runs = 5;
    let mut recursive_times = Vec::with_capacity(runs);
    let mut iterative_times = Vec::with_capacity(runs);

    info!("Comparing fib({N}) implementations over {runs} runs");

    for i in 0..runs {
        info!("Run {}/{}", i + 1, runs);

        let recursive = timeit("fib recursive", || fib_recursive(N));
        let iterative = timeit("fib iterative", || fib_iterative(N));
        recursive_times.push(recursive.elapsed());
        iterative_times.push(iterative.elapsed());

        info!(
            "  Recursive: {:?}, Iterative: {:?}, Speedup: {:.2}x",
            recursive.elapsed(),
            iterative.elapsed(),
            recursive.elapsed_secs() / iterative.elapsed_secs().max(f64::EPSILON)
        );

        let (r, it) = (recursive.trace(), iterative.trace());
        if r != it {
            info!("  Results differ: recursive={r}, iterative={it}");
        }
    }

    let avg_recursive = recursive_times.iter().sum::<Duration>() / runs as u32;
    let avg_iterative = iterative_times.iter().sum::<Duration>() / runs as u32;
    let speedup = avg_recursive.as_secs_f64() / avg_iterative.as_secs_f64().max(f64::EPSILON);

    info!("=== Summary ===");
    info!("Average Recursive Time: {:?}", avg_recursive);
    info!("Average Iterative Time: {:?}", avg_iterative);
    info!("Average Speedup: {:.2}x", speedup);
}
