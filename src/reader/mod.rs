//! Module metadata readers.
//!
//! `MetadataReader` is the seam between file discovery and the pure
//! indexing core. `CliMetadataReader` reads .NET assemblies: it locates the
//! CLI header inside the PE image (`pe`) and walks the metadata tables
//! (`tables`) to pull the assembly's own identity and its `AssemblyRef` rows.

pub mod pe;
pub mod tables;

use crate::models::{DependencyDeclaration, ModuleRecord};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a PE image")]
    NotPe,
    #[error("not a managed assembly (no CLI header)")]
    NotManaged,
    #[error("module has no assembly manifest")]
    NotAnAssembly,
    #[error("malformed metadata: {reason}")]
    Malformed { reason: String },
}

impl ReadError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ReadError::Malformed {
            reason: reason.into(),
        }
    }
}

/// Produces a `ModuleRecord` for one file, or explains why it cannot.
pub trait MetadataReader: Sync {
    fn read(&self, path: &Path) -> Result<ModuleRecord, ReadError>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Reader for ECMA-335 assemblies (`.dll`/`.exe` with a CLI header).
pub struct CliMetadataReader;

impl CliMetadataReader {
    /// Parse an in-memory image. `path` is only recorded on the result.
    pub fn read_bytes(&self, data: &[u8], path: &Path) -> Result<ModuleRecord, ReadError> {
        let metadata = pe::cli_metadata(data)?;
        let manifest = tables::read_manifest(metadata)?;
        Ok(ModuleRecord {
            name: manifest.name,
            version: manifest.version,
            path: path.to_path_buf(),
            dependencies: manifest
                .references
                .into_iter()
                .map(|r| DependencyDeclaration::new(r.name, r.version))
                .collect(),
        })
    }
}

impl MetadataReader for CliMetadataReader {
    fn read(&self, path: &Path) -> Result<ModuleRecord, ReadError> {
        let data = fs::read(path)?;
        self.read_bytes(&data, path)
    }
}

/// Little-endian reads that fail instead of panicking on short input.
pub(crate) mod bytes {
    use super::ReadError;

    pub fn slice(data: &[u8], off: usize, len: usize) -> Result<&[u8], ReadError> {
        off.checked_add(len)
            .and_then(|end| data.get(off..end))
            .ok_or_else(|| {
                ReadError::malformed(format!("truncated data: {} bytes at offset {:#x}", len, off))
            })
    }

    pub fn u8_at(data: &[u8], off: usize) -> Result<u8, ReadError> {
        Ok(slice(data, off, 1)?[0])
    }

    pub fn u16_at(data: &[u8], off: usize) -> Result<u16, ReadError> {
        let b = slice(data, off, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_at(data: &[u8], off: usize) -> Result<u32, ReadError> {
        let b = slice(data, off, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u64_at(data: &[u8], off: usize) -> Result<u64, ReadError> {
        let lo = u32_at(data, off)? as u64;
        let hi = u32_at(data, off.saturating_add(4))? as u64;
        Ok(lo | (hi << 32))
    }

    /// Read a 2- or 4-byte heap/table index.
    pub fn index_at(data: &[u8], off: usize, width: usize) -> Result<u32, ReadError> {
        match width {
            2 => u16_at(data, off).map(u32::from),
            _ => u32_at(data, off),
        }
    }
}
