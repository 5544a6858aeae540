use criterion::{criterion_group, criterion_main, Criterion};
use perfect_steg_core::{conceal, hide, Extensions};

pub fn hiding(c: &mut Criterion) {
    let carrier = vec![0x11; 512 * 1024];
    let payload: Vec<u8> = (0..1024 * 1024u32).map(|i| (i % 253) as u8).collect();

    c.bench_function("Hide 1 MiB", |b| {
        b.iter(|| {
            hide(&carrier, &payload, "file", "payload.bin", Extensions::new())
                .expect("Failed to hide payload")
        })
    });

    c.bench_function("Conceal 1 MiB", |b| {
        b.iter(|| conceal(&carrier, &payload, "payload.bin").expect("Failed to conceal payload"))
    });
}

criterion_group!(benches, hiding);
criterion_main!(benches);
