//! Codec telemetry instruments and recording helpers.

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

struct CodecInstruments {
    encodes: Counter<u64>,
    decodes: Counter<u64>,
    failures: Counter<u64>,
    encoded_bytes: Histogram<u64>,
    decoded_bytes: Histogram<u64>,
    duration_seconds: Histogram<f64>,
    cache_hits: Counter<u64>,
    pool_leases: Counter<u64>,
}

fn instruments() -> &'static CodecInstruments {
    static INSTRUMENTS: OnceLock<CodecInstruments> = OnceLock::new();
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("tsframe.codec");
        CodecInstruments {
            encodes: meter
                .u64_counter("tsframe.codec.encodes")
                .with_description("Frames encoded, by format")
                .init(),
            decodes: meter
                .u64_counter("tsframe.codec.decodes")
                .with_description("Frames decoded, by format")
                .init(),
            failures: meter
                .u64_counter("tsframe.codec.failures")
                .with_description("Encode or decode failures, by format and direction")
                .init(),
            encoded_bytes: meter
                .u64_histogram("tsframe.codec.encoded.bytes")
                .with_description("Size of encoded frame payloads")
                .with_unit("By")
                .init(),
            decoded_bytes: meter
                .u64_histogram("tsframe.codec.decoded.bytes")
                .with_description("Size of decoded frame payloads")
                .with_unit("By")
                .init(),
            duration_seconds: meter
                .f64_histogram("tsframe.codec.duration")
                .with_description("Encode or decode duration")
                .with_unit("s")
                .init(),
            cache_hits: meter
                .u64_counter("tsframe.codec.json.cache.hits")
                .with_description("Reads served from a warm JSON frame cache")
                .init(),
            pool_leases: meter
                .u64_counter("tsframe.codec.json.pool.leases")
                .with_description("JSON buffer leases, by outcome (reused or allocated)")
                .init(),
        }
    })
}

pub fn record_encode(format: &'static str, bytes: u64, duration_seconds: f64) {
    let i = instruments();
    let attrs = [KeyValue::new("format", format)];
    i.encodes.add(1, &attrs);
    i.encoded_bytes.record(bytes, &attrs);
    i.duration_seconds.record(
        duration_seconds,
        &[
            KeyValue::new("format", format),
            KeyValue::new("direction", "encode"),
        ],
    );
}

pub fn record_decode(format: &'static str, bytes: u64, duration_seconds: f64) {
    let i = instruments();
    let attrs = [KeyValue::new("format", format)];
    i.decodes.add(1, &attrs);
    i.decoded_bytes.record(bytes, &attrs);
    i.duration_seconds.record(
        duration_seconds,
        &[
            KeyValue::new("format", format),
            KeyValue::new("direction", "decode"),
        ],
    );
}

pub fn record_failure(format: &'static str, direction: &'static str) {
    instruments().failures.add(
        1,
        &[
            KeyValue::new("format", format),
            KeyValue::new("direction", direction),
        ],
    );
}

pub fn record_cache_hit() {
    instruments().cache_hits.add(1, &[]);
}

pub fn record_pool_lease(reused: bool) {
    let outcome = if reused { "reused" } else { "allocated" };
    instruments()
        .pool_leases
        .add(1, &[KeyValue::new("outcome", outcome)]);
}
