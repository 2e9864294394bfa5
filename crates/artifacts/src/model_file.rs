// ---------------------------------------------------------------------------
// model_file – trained model artifact with magic, version and checksum
// ---------------------------------------------------------------------------
//
// Layout (24-byte header, little-endian, then payload):
//   [0..4]   Magic bytes: "ZCST"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = payload is lz4-compressed)
//   [12..16] Model kind (u32: 0 = linear, 1 = hourly profile)
//   [16..20] Payload size in bytes (u32)
//   [20..24] xxHash32 checksum of the payload
//
// Payload: bitcode-encoded `TrainedModel`, lz4 block with prepended size.

use std::path::Path;

use demand::{ModelKind, TrainedModel};
use xxhash_rust::xxh32::xxh32;

use crate::atomic_write::atomic_write;
use crate::error::{ArtifactError, Result};

pub const MAGIC: [u8; 4] = *b"ZCST";
pub const HEADER_SIZE: usize = 24;
pub const HEADER_FORMAT_VERSION: u32 = 1;
pub const FLAG_LZ4: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub format_version: u32,
    pub flags: u32,
    pub kind: ModelKind,
    pub payload_size: u32,
    pub checksum: u32,
}

fn kind_code(kind: ModelKind) -> u32 {
    match kind {
        ModelKind::Linear => 0,
        ModelKind::HourlyProfile => 1,
    }
}

fn kind_from_code(code: u32) -> Result<ModelKind> {
    match code {
        0 => Ok(ModelKind::Linear),
        1 => Ok(ModelKind::HourlyProfile),
        other => Err(ArtifactError::Corrupt(format!("unknown model kind {other}"))),
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Serialise a model: bitcode, lz4, then the header.
pub fn encode_model(model: &TrainedModel) -> Result<Vec<u8>> {
    let encoded = bitcode::encode(model);
    let payload = lz4_flex::compress_prepend_size(&encoded);
    let payload_size = u32::try_from(payload.len())
        .map_err(|_| ArtifactError::Encode(format!("payload of {} bytes is too large", payload.len())))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&FLAG_LZ4.to_le_bytes());
    out.extend_from_slice(&kind_code(model.kind()).to_le_bytes());
    out.extend_from_slice(&payload_size.to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Validate the header and return it with the payload bytes.
///
/// # Errors
///
/// - `Corrupt` on missing magic, a truncated file, an unknown model kind or
///   a checksum mismatch.
/// - `VersionMismatch` if the header comes from a newer format version.
pub fn read_header(bytes: &[u8]) -> Result<(ModelHeader, &[u8])> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(ArtifactError::Corrupt(
            "not a model file (missing ZCST magic bytes)".to_string(),
        ));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(ArtifactError::Corrupt(format!(
            "model file is {} bytes, shorter than its {HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }

    let format_version = read_u32(bytes, 4);
    if format_version > HEADER_FORMAT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }
    let header = ModelHeader {
        format_version,
        flags: read_u32(bytes, 8),
        kind: kind_from_code(read_u32(bytes, 12))?,
        payload_size: read_u32(bytes, 16),
        checksum: read_u32(bytes, 20),
    };

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != header.payload_size as usize {
        return Err(ArtifactError::Corrupt(format!(
            "payload is {} bytes, header says {}",
            payload.len(),
            header.payload_size
        )));
    }
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(ArtifactError::Corrupt(format!(
            "checksum mismatch (expected {:#010X}, got {:#010X})",
            header.checksum, computed
        )));
    }
    Ok((header, payload))
}

pub fn decode_model(bytes: &[u8]) -> Result<TrainedModel> {
    let (header, payload) = read_header(bytes)?;
    let raw = if header.flags & FLAG_LZ4 != 0 {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| ArtifactError::Decode(format!("lz4: {e}")))?
    } else {
        payload.to_vec()
    };
    let model: TrainedModel = bitcode::decode(&raw)?;
    if model.kind() != header.kind {
        return Err(ArtifactError::Corrupt(format!(
            "header declares a {:?} model but the payload holds {:?}",
            header.kind,
            model.kind()
        )));
    }
    Ok(model)
}

pub fn save_model(path: &Path, model: &TrainedModel) -> Result<()> {
    let bytes = encode_model(model)?;
    atomic_write(path, &bytes)?;
    tracing::info!(
        "saved {:?} model ({} bytes) to {}",
        model.kind(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

pub fn load_model(path: &Path) -> Result<TrainedModel> {
    let bytes = std::fs::read(path).map_err(|e| ArtifactError::io(path, e))?;
    decode_model(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand::predictor::LinearDemandModel;

    fn linear() -> TrainedModel {
        TrainedModel::Linear(LinearDemandModel {
            intercept: 1.5,
            coefficients: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
        })
    }

    #[test]
    fn test_encode_decode() {
        let bytes = encode_model(&linear()).unwrap();
        assert_eq!(&bytes[..4], b"ZCST");
        let (header, _) = read_header(&bytes).unwrap();
        assert_eq!(header.kind, ModelKind::Linear);
        assert_eq!(header.flags & FLAG_LZ4, FLAG_LZ4);
        assert_eq!(decode_model(&bytes).unwrap(), linear());
    }

    #[test]
    fn test_flipped_payload_byte_is_corrupt() {
        let mut bytes = encode_model(&linear()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode_model(&bytes).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
        assert!(format!("{err}").contains("checksum mismatch"), "got: {err}");
    }

    #[test]
    fn test_missing_magic_is_corrupt() {
        assert!(matches!(decode_model(b"MEGA0000"), Err(ArtifactError::Corrupt(_))));
        assert!(matches!(decode_model(b""), Err(ArtifactError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_header_is_corrupt() {
        let bytes = encode_model(&linear()).unwrap();
        let err = decode_model(&bytes[..10]).unwrap_err();
        assert!(format!("{err}").contains("shorter"), "got: {err}");
    }

    #[test]
    fn test_future_version_rejected() {
        let mut bytes = encode_model(&linear()).unwrap();
        bytes[4..8].copy_from_slice(&999u32.to_le_bytes());
        assert!(matches!(
            decode_model(&bytes),
            Err(ArtifactError::VersionMismatch { found: 999, .. })
        ));
    }
}
