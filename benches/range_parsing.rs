//! Benchmarks for range header parsing and chunked file reads.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::StreamExt;
use homily::streaming::{parse_range_header, STREAM_CHUNK_SIZE};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

fn bench_parse_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_range_header");

    for header in ["bytes=0-0", "bytes=1048576-", "bytes=  123456 - 654321 ", "bytes=-500"] {
        group.bench_function(header.trim(), |b| {
            b.iter(|| black_box(parse_range_header(black_box(header), 10 * 1024 * 1024)))
        });
    }

    group.finish();
}

/// Read a file through the same reader stack the stream handler uses.
fn bench_chunked_read(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut group = c.benchmark_group("chunked_read");

    for size in [256 * 1024, 4 * 1024 * 1024] {
        let path = dir.path().join(format!("{size}.mp3"));
        std::fs::write(&path, vec![0u8; size]).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("reader_stream_{}", size), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let file = tokio::fs::File::open(&path).await.unwrap();
                    let mut stream =
                        ReaderStream::with_capacity(file.take(size as u64), STREAM_CHUNK_SIZE);
                    let mut total = 0usize;
                    while let Some(chunk) = stream.next().await {
                        total += chunk.unwrap().len();
                    }
                    black_box(total)
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_range, bench_chunked_read);
criterion_main!(benches);
