use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    report::bench_encode_single,
    report::bench_encode_multi,
    report::bench_queue_cycle,
    link::bench_interpret_ack
);
criterion_main!(benches);
