//! PE image walking: just enough to find the CLI metadata blob.

use super::bytes::{slice, u16_at, u32_at};
use super::ReadError;

const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";
const E_LFANEW_OFFSET: usize = 0x3c;
const COFF_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;
const PE32_MAGIC: u16 = 0x10b;
const PE32_PLUS_MAGIC: u16 = 0x20b;
const CLI_HEADER_DIRECTORY: usize = 14;

#[derive(Debug, Clone, Copy)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_pointer: u32,
}

impl Section {
    fn file_offset(&self, rva: u32) -> Option<usize> {
        let span = self.virtual_size.max(self.raw_size);
        let end = self.virtual_address.checked_add(span)?;
        if rva >= self.virtual_address && rva < end {
            Some((rva - self.virtual_address) as usize + self.raw_pointer as usize)
        } else {
            None
        }
    }
}

fn rva_to_offset(sections: &[Section], rva: u32) -> Result<usize, ReadError> {
    sections
        .iter()
        .find_map(|s| s.file_offset(rva))
        .ok_or_else(|| ReadError::malformed(format!("RVA {:#x} is outside every section", rva)))
}

/// Locate the metadata root referenced by the image's CLI header.
///
/// Returns `NotPe` for anything without DOS/PE signatures and `NotManaged`
/// for valid images whose CLI header directory is empty (native modules).
pub fn cli_metadata(data: &[u8]) -> Result<&[u8], ReadError> {
    if data.len() < E_LFANEW_OFFSET + 4 || &data[..2] != b"MZ" {
        return Err(ReadError::NotPe);
    }
    let pe_offset = u32_at(data, E_LFANEW_OFFSET)? as usize;
    match slice(data, pe_offset, 4) {
        Ok(sig) if sig == PE_SIGNATURE => {}
        _ => return Err(ReadError::NotPe),
    }

    let coff = pe_offset + 4;
    let section_count = u16_at(data, coff + 2)? as usize;
    let optional_size = u16_at(data, coff + 16)? as usize;
    let optional = coff + COFF_HEADER_SIZE;

    let (count_offset, directories_offset) = match u16_at(data, optional)? {
        PE32_MAGIC => (92, 96),
        PE32_PLUS_MAGIC => (108, 112),
        other => {
            return Err(ReadError::malformed(format!(
                "unknown optional header magic {:#x}",
                other
            )))
        }
    };
    let directory_count = u32_at(data, optional + count_offset)? as usize;
    if directory_count <= CLI_HEADER_DIRECTORY {
        return Err(ReadError::NotManaged);
    }
    let cli_entry = optional + directories_offset + CLI_HEADER_DIRECTORY * 8;
    if cli_entry + 8 > optional + optional_size {
        return Err(ReadError::NotManaged);
    }
    let cli_rva = u32_at(data, cli_entry)?;
    if cli_rva == 0 {
        return Err(ReadError::NotManaged);
    }

    let section_table = optional + optional_size;
    let sections = (0..section_count)
        .map(|i| {
            let base = section_table + i * SECTION_HEADER_SIZE;
            Ok(Section {
                virtual_size: u32_at(data, base + 8)?,
                virtual_address: u32_at(data, base + 12)?,
                raw_size: u32_at(data, base + 16)?,
                raw_pointer: u32_at(data, base + 20)?,
            })
        })
        .collect::<Result<Vec<_>, ReadError>>()?;

    let cli_header = rva_to_offset(&sections, cli_rva)?;
    let metadata_rva = u32_at(data, cli_header + 8)?;
    let metadata_size = u32_at(data, cli_header + 12)? as usize;
    let metadata = rva_to_offset(&sections, metadata_rva)?;
    slice(data, metadata, metadata_size)
}
