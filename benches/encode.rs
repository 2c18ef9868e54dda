use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ledgif::{encode_packet, TransferPlan, MAX_PAYLOAD_SIZE};

fn max_payload() -> Vec<u8> {
    let mut payload = b"GIF89a".to_vec();
    payload.extend((0..MAX_PAYLOAD_SIZE - 6).map(|i| (i * 31 % 256) as u8));
    payload
}

fn bench_plan(c: &mut Criterion) {
    let payload = max_payload();
    c.bench_function("plan_255_chunks", |b| {
        b.iter(|| TransferPlan::from_payload(black_box(&payload)).unwrap())
    });
}

fn bench_encode(c: &mut Criterion) {
    let plan = TransferPlan::from_payload(&max_payload()).unwrap();
    let total = plan.chunks().len();

    c.bench_function("encode_255_packets", |b| {
        b.iter(|| {
            for (index, chunk) in plan.chunks().iter().enumerate() {
                black_box(encode_packet(chunk, index, total).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_plan, bench_encode);
criterion_main!(benches);
