use std::io;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ddump::backend::MemorySession;
use ddump::{AllocPolicy, Session, Transfer, TransferConfig};

const FILE_SIZE: usize = 64 * 1024 * 1024;

fn bench_buffer_sizes(c: &mut Criterion) {
    let data: Vec<u8> = (0..FILE_SIZE).map(|i| (i % 251) as u8).collect();
    let session = MemorySession::new().with_file("/bench", data);

    let mut group = c.benchmark_group("transfer");
    group.throughput(Throughput::Bytes(FILE_SIZE as u64));
    group.sample_size(10);

    for (name, config) in [
        ("4k_plain", TransferConfig::legacy_small()),
        ("2m_plain", TransferConfig::huge_pages().with_alloc_policy(AllocPolicy::AnonymousOnly)),
        ("2m_huge", TransferConfig::huge_pages()),
    ] {
        let transfer = Transfer::new(TransferConfig {
            log_chunks: false,
            ..config
        });
        group.bench_with_input(BenchmarkId::from_parameter(name), &transfer, |b, transfer| {
            b.iter(|| {
                let (mut file, _) = session.open_file("/bench").unwrap();
                let report = transfer.run(file.as_mut(), io::sink());
                assert!(report.is_success());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_buffer_sizes);
criterion_main!(benches);
