use criterion::{criterion_group, criterion_main, Criterion};
use vow_core::{Future, Scheduler, Step};

fn chain_drain(c: &mut Criterion) {
    c.bench_function("chain_64_then_drain", |b| {
        b.iter(|| {
            let scheduler = Scheduler::new();
            let (root, completer) = Future::<u64, &str>::pending(&scheduler);

            let mut tip = root;
            for _ in 0..64 {
                tip = tip.then(|n| Step::Done(n + 1));
            }

            completer.resolve(0);
            scheduler.drain();
            assert_eq!(tip.result(), Some(Ok(64)));
        })
    });
}

fn fanout_drain(c: &mut Criterion) {
    c.bench_function("fanout_256_reactions_drain", |b| {
        b.iter(|| {
            let scheduler = Scheduler::new();
            let (root, completer) = Future::<u64, &str>::pending(&scheduler);

            let derived: Vec<_> = (0..256).map(|i| root.then(move |n| Step::Done(n + i))).collect();

            completer.resolve(1);
            scheduler.drain();
            assert_eq!(derived[255].result(), Some(Ok(256)));
        })
    });
}

criterion_group!(benches, chain_drain, fanout_drain);
criterion_main!(benches);
