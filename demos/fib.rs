use edge_timeit::timeit;

fn fib(n: u32) -> u64 {
    if n < 3 {
        return 1;
    }
    fib(n - 1) + fib(n - 2)
}

fn main() {
    timeit("hello", || {
        println!("Hello.");
    })
    .trace();

    const N: u32 = 10;
    let fib_res = timeit("fib", || fib(N)).trace();
    println!("fib({N}) is: {fib_res}.");
}
