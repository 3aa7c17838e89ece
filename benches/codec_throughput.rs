//! Codec throughput benchmark

use tsframe::codec::json::{BufferPool, FrameInclude, FrameJsonCache};
use tsframe::codec::{arrow, json};
use tsframe::config::ArrowFormat;
use tsframe::{Field, Frame, Labels};

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn create_test_frame(rows: usize) -> Frame {
    let start = Utc::now().timestamp_millis();
    let times: Vec<DateTime<Utc>> = (0..rows as i64)
        .map(|i| DateTime::from_timestamp_millis(start + i * 1_000).unwrap())
        .collect();
    let hosts: Vec<String> = (0..rows).map(|i| format!("server-{:02}", i % 10)).collect();
    let values: Vec<f64> = (0..rows)
        .map(|i| match i % 500 {
            0 => f64::NAN,
            1 => f64::INFINITY,
            n => n as f64 / 100.0,
        })
        .collect();
    let counts: Vec<Option<i64>> = (0..rows)
        .map(|i| if i % 7 == 0 { None } else { Some(i as i64) })
        .collect();

    Frame::new(
        "bench",
        vec![
            Field::new("time", Labels::new(), times),
            Field::new("host", Labels::new(), hosts),
            Field::new("value", Labels::from([("unit", "percent")]), values),
            Field::new("count", Labels::new(), counts),
        ],
    )
}

fn benchmark_arrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrow_ipc");

    for rows in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(rows as u64));

        let frame = create_test_frame(rows);
        let encoded = arrow::encode_with_format(&frame, ArrowFormat::Stream).unwrap();

        group.bench_function(format!("encode_{}_rows", rows), |b| {
            b.iter(|| {
                let _ = black_box(arrow::encode_with_format(&frame, ArrowFormat::Stream).unwrap());
            });
        });

        group.bench_function(format!("decode_{}_rows", rows), |b| {
            b.iter(|| {
                let _ = black_box(arrow::decode(&encoded).unwrap());
            });
        });
    }

    group.finish();
}

fn benchmark_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("json");
    let pool = BufferPool::new(4, 64 * 1024);

    for rows in [1_000, 10_000] {
        group.throughput(Throughput::Elements(rows as u64));

        let frame = create_test_frame(rows);
        let encoded = json::encode_with_pool(&frame, FrameInclude::All, &pool).unwrap();
        println!("Rows: {}, JSON size: {} bytes", rows, encoded.len());

        group.bench_function(format!("encode_{}_rows", rows), |b| {
            b.iter(|| {
                let _ = black_box(json::encode_with_pool(&frame, FrameInclude::All, &pool).unwrap());
            });
        });

        group.bench_function(format!("decode_{}_rows", rows), |b| {
            b.iter(|| {
                let _ = black_box(json::decode(&encoded).unwrap());
            });
        });

        let cache = FrameJsonCache::with_pool(&frame, &pool).unwrap();
        group.bench_function(format!("cached_data_{}_rows", rows), |b| {
            b.iter(|| {
                let _ = black_box(cache.bytes(FrameInclude::DataOnly));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_arrow, benchmark_json);

criterion_main!(benches);
