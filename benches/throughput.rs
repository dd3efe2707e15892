use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use rewrite_rules::{Condition, Context, RuleSet, RuleSetBuilder, SkipLoading};

fn build_shared_ruleset() -> Arc<RuleSet> {
    let mut builder = RuleSetBuilder::new();
    for i in 0..20 {
        builder = builder.rule(&format!("/section{i}/**"), move |r| {
            r.wildcard().to(&format!("/s{i}/$1"))
        });
    }
    builder = builder.rule("^/s19/(.*)$", |r| {
        r.to("/mobile/$1")
            .condition(Condition::header("user-agent", "mobile"))
    });
    Arc::new(builder.compile(&SkipLoading))
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let ruleset = build_shared_ruleset();
        let ctx = Context::new().header("user-agent", "Mobile Safari");

        group.bench_function(format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let rs = Arc::clone(&ruleset);
                        let mut c = ctx.clone();
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = rs.process("/section19/a/b/c", &mut c);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
