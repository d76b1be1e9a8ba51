//! Deflate adapters
//!
//! The same flate2 compression run two ways: `deflate-offload` moves it to the
//! blocking pool with `spawn_blocking`, `deflate-inline` runs it on the
//! scheduler thread inside an async fn.

use super::{timed, Adapter, AdapterFuture};
use crate::domain::{AdapterError, TaskKind};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

const PROBE_BYTES: usize = 4 * 1024;
const BULK_BYTES: usize = 4 * 1024 * 1024;

/// Mildly compressible input so the encoder has real work to do
fn payload(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if i % 4 == 0 {
                state.to_le_bytes()[0]
            } else {
                b'a' + (state % 8).to_le_bytes()[0]
            }
        })
        .collect()
}

fn compress(len: usize) -> Result<usize, AdapterError> {
    let input = payload(len);
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(len / 2), Compression::best());
    encoder.write_all(&input)?;
    let compressed = encoder.finish()?;
    if compressed.is_empty() {
        return Err(AdapterError::Corrupt("encoder produced no output".to_string()));
    }
    Ok(compressed.len())
}

fn input_len(kind: TaskKind) -> usize {
    match kind {
        TaskKind::Probe => PROBE_BYTES,
        TaskKind::Blocking => BULK_BYTES,
    }
}

pub struct DeflateOffload;

impl Adapter for DeflateOffload {
    fn name(&self) -> &'static str {
        "deflate-offload"
    }

    fn description(&self) -> &'static str {
        "flate2 compression moved to the blocking pool with spawn_blocking"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let len = input_len(kind);
        Box::pin(timed(async move { tokio::task::spawn_blocking(move || compress(len)).await? }))
    }
}

pub struct DeflateInline;

impl Adapter for DeflateInline {
    fn name(&self) -> &'static str {
        "deflate-inline"
    }

    fn description(&self) -> &'static str {
        "flate2 compression on the scheduler thread (fake async)"
    }

    fn perform(&self, kind: TaskKind) -> AdapterFuture<'_> {
        let len = input_len(kind);
        Box::pin(timed(async move { compress(len) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_deterministic() {
        assert_eq!(payload(64), payload(64));
        assert_eq!(payload(100).len(), 100);
    }

    #[test]
    fn test_compress_shrinks_payload() {
        let compressed = compress(PROBE_BYTES).unwrap();
        assert!(compressed > 0);
        assert!(compressed < PROBE_BYTES);
    }

    #[tokio::test]
    async fn test_offload_probe_succeeds() {
        DeflateOffload.perform(TaskKind::Probe).await.unwrap();
        DeflateInline.perform(TaskKind::Probe).await.unwrap();
    }
}
