/// Benchmark for per-caller session throughput
///
/// This benchmark measures how nested transaction scopes scale when many
/// callers run concurrently against the in-memory backend.

use graphtx::{MemoryBackend, QueryEngine, Session, TransactionDefinition, Value};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const ITERATIONS: usize = 1000;
const THREADS: usize = 8;
const QUERY: &str = "MATCH (p:Person) WHERE p.id = $1 RETURN p.name";

fn run_transaction(session: &mut Session, i: usize) {
    session
        .begin(&TransactionDefinition::required())
        .expect("Failed to begin");
    session
        .begin(&TransactionDefinition::nested())
        .expect("Failed to begin nested");
    let result = session
        .execute_params(QUERY, &[Value::from(i as i64)])
        .expect("Failed to execute");
    let _rows = result.collect_rows().expect("Failed to read rows");
    session.commit().expect("Failed to commit nested");
    session.commit().expect("Failed to commit");
}

fn main() {
    println!("=== Session Throughput Benchmark ===\n");

    let backend = MemoryBackend::new();
    backend
        .respond(
            r"^MATCH \(p:Person\)",
            &["p.name"],
            vec![vec![Value::from("Ada")]],
        )
        .expect("Failed to register response");
    let engine = QueryEngine::new(backend.clone());

    // Benchmark: one caller, sequential transactions
    println!("📊 Sequential Transactions:");
    let sequential_start = Instant::now();
    let mut session = engine.session();
    for i in 0..ITERATIONS {
        run_transaction(&mut session, i);
        // Keep the backend journal from growing across iterations
        backend.clear_events();
    }
    let sequential_duration = sequential_start.elapsed();
    let sequential_tps = ITERATIONS as f64 / sequential_duration.as_secs_f64();
    println!("  Transactions: {}", ITERATIONS);
    println!("  Time: {:?}", sequential_duration);
    println!("  Throughput: {:.0} tx/sec", sequential_tps);
    println!();

    // Benchmark: explicit sessions on concurrent threads
    println!("📊 Concurrent Sessions ({} threads):", THREADS);
    let engine = Arc::new(engine);
    let concurrent_start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let backend = backend.clone();
            thread::spawn(move || {
                let mut session = engine.session_for(format!("worker{}", t));
                for i in 0..ITERATIONS {
                    run_transaction(&mut session, i);
                    backend.clear_events();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }
    let concurrent_duration = concurrent_start.elapsed();
    let concurrent_total = THREADS * ITERATIONS;
    let concurrent_tps = concurrent_total as f64 / concurrent_duration.as_secs_f64();
    println!("  Transactions: {}", concurrent_total);
    println!("  Time: {:?}", concurrent_duration);
    println!("  Throughput: {:.0} tx/sec", concurrent_tps);
    println!();

    // Benchmark: implicit per-thread API
    println!("📊 Current-Thread API ({} threads):", THREADS);
    let implicit_start = Instant::now();
    thread::scope(|scope| {
        for _ in 0..THREADS {
            let engine = &engine;
            let backend = &backend;
            scope.spawn(move || {
                for i in 0..ITERATIONS {
                    engine.begin_default().expect("Failed to begin");
                    let result = engine
                        .execute_params(QUERY, &[Value::from(i as i64)])
                        .expect("Failed to execute");
                    let _rows = result.collect_rows().expect("Failed to read rows");
                    engine.commit().expect("Failed to commit");
                    backend.clear_events();
                }
            });
        }
    });
    let implicit_duration = implicit_start.elapsed();
    let implicit_tps = concurrent_total as f64 / implicit_duration.as_secs_f64();
    println!("  Transactions: {}", concurrent_total);
    println!("  Time: {:?}", implicit_duration);
    println!("  Throughput: {:.0} tx/sec", implicit_tps);
    println!();

    // Summary
    let stats = engine.stats();
    println!("=== Summary ===");
    println!("  Sequential:     {:.0} tx/sec", sequential_tps);
    println!("  Concurrent:     {:.0} tx/sec", concurrent_tps);
    println!("  Current-thread: {:.0} tx/sec", implicit_tps);
    println!();
    println!("{}", stats);
    println!("Connections still open: {}", backend.open_connections());
}
