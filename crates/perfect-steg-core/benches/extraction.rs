use criterion::{criterion_group, criterion_main, Criterion};
use perfect_steg_core::{extract, hide, Extensions};

pub fn extraction(c: &mut Criterion) {
    let carrier = vec![0x11; 512 * 1024];
    let payload: Vec<u8> = (0..1024 * 1024u32).map(|i| (i % 253) as u8).collect();
    let with_packet = hide(&carrier, &payload, "file", "payload.bin", Extensions::new())
        .expect("Failed to hide payload");

    let mut unframed = carrier.clone();
    unframed.extend_from_slice(b"%PDF-1.7");
    unframed.extend_from_slice(&payload);

    c.bench_function("Extract strict packet", |b| {
        b.iter(|| extract(&with_packet).expect("Failed to extract payload"))
    });

    c.bench_function("Extract without a packet", |b| {
        b.iter(|| extract(&unframed).expect("Failed to extract payload"))
    });
}

criterion_group!(benches, extraction);
criterion_main!(benches);
