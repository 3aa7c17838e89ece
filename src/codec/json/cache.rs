//! Warm JSON cache for a frame that is read many times

use bytes::{BufMut, Bytes, BytesMut};

use super::{encode, BufferPool, FrameInclude};
use crate::codec::telemetry;
use crate::frame::Frame;
use crate::Result;

/// Encoded documents of one frame, computed once.
///
/// Every [`FrameInclude`] mode is assembled up front, so reads hand out
/// clones of shared [`Bytes`].
#[derive(Debug, Clone)]
pub struct FrameJsonCache {
    schema: Bytes,
    data: Bytes,
    all: Bytes,
    schema_only: Bytes,
    data_only: Bytes,
}

impl FrameJsonCache {
    pub fn new(frame: &Frame) -> Result<Self> {
        Self::with_pool(frame, BufferPool::global())
    }

    pub fn with_pool(frame: &Frame, pool: &BufferPool) -> Result<Self> {
        let mut buf = pool.lease();
        encode::write_schema(&mut buf, frame)?;
        let schema = Bytes::copy_from_slice(&buf);
        buf.clear();
        encode::write_data(&mut buf, frame)?;
        let data = Bytes::copy_from_slice(&buf);

        Ok(Self {
            all: assemble(Some(&schema), Some(&data)),
            schema_only: assemble(Some(&schema), None),
            data_only: assemble(None, Some(&data)),
            schema,
            data,
        })
    }

    /// The frame document with the requested sections.
    pub fn bytes(&self, include: FrameInclude) -> Bytes {
        telemetry::record_cache_hit();
        match include {
            FrameInclude::All => self.all.clone(),
            FrameInclude::SchemaOnly => self.schema_only.clone(),
            FrameInclude::DataOnly => self.data_only.clone(),
        }
    }

    /// The `schema` section object on its own.
    pub fn schema_json(&self) -> Bytes {
        self.schema.clone()
    }

    /// The `data` section object on its own.
    pub fn data_json(&self) -> Bytes {
        self.data.clone()
    }
}

fn assemble(schema: Option<&Bytes>, data: Option<&Bytes>) -> Bytes {
    let len = schema.map_or(0, Bytes::len) + data.map_or(0, Bytes::len) + 20;
    let mut out = BytesMut::with_capacity(len);
    out.put_u8(b'{');
    if let Some(schema) = schema {
        out.put_slice(b"\"schema\":");
        out.put_slice(schema);
    }
    if let Some(data) = data {
        if schema.is_some() {
            out.put_u8(b',');
        }
        out.put_slice(b"\"data\":");
        out.put_slice(data);
    }
    out.put_u8(b'}');
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::json::encode_with_pool;
    use crate::frame::{Field, Labels};

    fn frame() -> Frame {
        Frame::new(
            "cached",
            vec![Field::new("v", Labels::from([("a", "b")]), vec![Some(f64::NAN), Some(2.0), None])],
        )
        .with_ref_id("A")
    }

    #[test]
    fn test_cache_matches_direct_encode() {
        let pool = BufferPool::new(2, 128);
        let frame = frame();
        let cache = FrameJsonCache::with_pool(&frame, &pool).unwrap();
        for include in [FrameInclude::All, FrameInclude::SchemaOnly, FrameInclude::DataOnly] {
            assert_eq!(
                cache.bytes(include),
                encode_with_pool(&frame, include, &pool).unwrap(),
                "mode {}",
                include
            );
        }
    }

    #[test]
    fn test_every_mode_is_shared() {
        let cache = FrameJsonCache::with_pool(&frame(), &BufferPool::new(1, 16)).unwrap();
        for include in [FrameInclude::All, FrameInclude::SchemaOnly, FrameInclude::DataOnly] {
            let a = cache.bytes(include);
            let b = cache.bytes(include);
            assert_eq!(a.as_ptr(), b.as_ptr(), "mode {}", include);
        }
        assert!(cache.schema_json().starts_with(b"{\"name\":\"cached\""));
    }
}
