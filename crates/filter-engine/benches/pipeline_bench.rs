//! 판정 파이프라인 벤치마크
//!
//! 디스패치 경로별 패킷당 처리 비용과 발신지 수에 따른 스케일링을 측정합니다.

use std::net::Ipv4Addr;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use flowgate_filter_engine::flowgate_filter_common::IPV4_SRC_OFFSET;
use flowgate_filter_engine::{BanTable, FilterPipeline, RateCounters};

fn frame(src: Ipv4Addr) -> Vec<u8> {
    let mut buf = vec![0u8; 64];
    buf[12] = 0x08;
    buf[14] = 0x45;
    buf[IPV4_SRC_OFFSET..IPV4_SRC_OFFSET + 4].copy_from_slice(&src.octets());
    buf
}

fn create_pipeline(capacity: usize) -> (FilterPipeline, Arc<BanTable>) {
    let bans = Arc::new(BanTable::new(capacity));
    let counters = Arc::new(RateCounters::new(capacity));
    (FilterPipeline::standard(Arc::clone(&bans), counters), bans)
}

fn bench_verdict_paths(c: &mut Criterion) {
    let (pipeline, bans) = create_pipeline(1024);
    let banned = Ipv4Addr::new(192, 168, 1, 100);
    bans.set(banned, true).unwrap();

    let banned_frame = frame(banned);
    let allowed_frame = frame(Ipv4Addr::new(10, 0, 0, 1));
    let truncated = [0u8; 10];

    let mut group = c.benchmark_group("verdict_path");
    group.throughput(Throughput::Elements(1));

    group.bench_function("ban_filter", |b| {
        b.iter(|| pipeline.process(black_box(&banned_frame)))
    });
    group.bench_function("rate_limiter", |b| {
        b.iter(|| pipeline.process(black_box(&allowed_frame)))
    });
    group.bench_function("truncated", |b| {
        b.iter(|| pipeline.process(black_box(&truncated)))
    });

    group.finish();
}

fn bench_source_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_scaling");

    for sources in [1u32, 64, 1024] {
        let (pipeline, _bans) = create_pipeline(sources as usize);
        let frames: Vec<Vec<u8>> = (0..sources)
            .map(|i| frame(Ipv4Addr::from(0x0a00_0000 + i)))
            .collect();

        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sources), &frames, |b, frames| {
            b.iter(|| {
                for f in frames {
                    black_box(pipeline.process(f));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_verdict_paths, bench_source_scaling);
criterion_main!(benches);
