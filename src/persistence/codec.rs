use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::types::WordEntry;

const MAGIC: &[u8; 4] = b"UHD\0";
const FORMAT_VERSION: u32 = 1;
const CHECKSUM_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 4 + CHECKSUM_LEN;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("Not a dictionary file")]
    BadMagic,
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("File truncated: {0} bytes")]
    Truncated(usize),
    #[error("Checksum mismatch: header says {expected}, payload hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl CodecError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CodecError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// On-disk format of a dictionary file.
pub trait DictionaryCodec: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<WordEntry>, CodecError>;

    /// Must replace `path` atomically: readers see the old file or the new
    /// one, never a partial write.
    fn save(&self, path: &Path, entries: &[WordEntry]) -> Result<(), CodecError>;
}

/// Magic, format version, SHA-256 of the payload, then the bincode payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl DictionaryCodec for BinaryCodec {
    fn load(&self, path: &Path) -> Result<Vec<WordEntry>, CodecError> {
        let bytes = fs::read(path)?;
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated(bytes.len()));
        }

        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(CodecError::BadMagic);
        }

        let (version, rest) = rest.split_at(4);
        let mut version_bytes = [0u8; 4];
        version_bytes.copy_from_slice(version);
        let version = u32::from_le_bytes(version_bytes);
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let (expected, payload) = rest.split_at(CHECKSUM_LEN);
        let actual = Sha256::digest(payload);
        if expected != actual.as_slice() {
            return Err(CodecError::ChecksumMismatch {
                expected: hex::encode(expected),
                actual: hex::encode(actual),
            });
        }

        Ok(bincode::deserialize(payload)?)
    }

    fn save(&self, path: &Path, entries: &[WordEntry]) -> Result<(), CodecError> {
        let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent_dir)?;

        let payload = bincode::serialize(entries)?;
        let checksum = Sha256::digest(&payload);

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            writer.write_all(MAGIC)?;
            writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
            writer.write_all(&checksum)?;
            writer.write_all(&payload)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;

        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
