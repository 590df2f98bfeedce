#![allow(dead_code)]

//! Builders for tiny PE32 images carrying CLI metadata.
//!
//! Images hold a single `.text` section with the CLI header followed by a
//! metadata root that has `#~` and `#Strings` streams. Tables present:
//! Module, optionally Assembly, and AssemblyRef. All heaps are small so
//! every index is two bytes wide.

use std::fs;
use std::path::{Path, PathBuf};

const FILE_ALIGNMENT: usize = 0x200;
const SECTION_RVA: u32 = 0x2000;
const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 0xe0;
const CLI_HEADER_SIZE: usize = 72;

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

struct Strings {
    heap: Vec<u8>,
}

impl Strings {
    fn new() -> Self {
        Strings { heap: vec![0] }
    }

    fn add(&mut self, s: &str) -> u16 {
        let at = self.heap.len() as u16;
        self.heap.extend_from_slice(s.as_bytes());
        self.heap.push(0);
        at
    }
}

fn version_bytes(out: &mut Vec<u8>, v: [u16; 4]) {
    for part in v {
        out.extend_from_slice(&part.to_le_bytes());
    }
}

/// Metadata root for a module; `assembly` is `None` for manifest-less modules.
fn metadata(
    module_file: &str,
    assembly: Option<(&str, [u16; 4])>,
    refs: &[(&str, [u16; 4])],
) -> Vec<u8> {
    let mut strings = Strings::new();
    let module_name = strings.add(module_file);

    let mut valid: u64 = 1; // Module
    let mut rows: Vec<u32> = vec![1];
    if assembly.is_some() {
        valid |= 1u64 << 0x20;
        rows.push(1);
    }
    if !refs.is_empty() {
        valid |= 1u64 << 0x23;
        rows.push(refs.len() as u32);
    }

    let mut tables = Vec::new();
    tables.extend_from_slice(&0u32.to_le_bytes()); // reserved
    tables.push(2); // major
    tables.push(0); // minor
    tables.push(0); // heap sizes: all narrow
    tables.push(1); // reserved
    tables.extend_from_slice(&valid.to_le_bytes());
    tables.extend_from_slice(&0u64.to_le_bytes()); // sorted
    for r in &rows {
        tables.extend_from_slice(&r.to_le_bytes());
    }

    // Module: Generation, Name, Mvid, EncId, EncBaseId
    tables.extend_from_slice(&0u16.to_le_bytes());
    tables.extend_from_slice(&module_name.to_le_bytes());
    tables.extend_from_slice(&[0u8; 6]);

    if let Some((name, version)) = assembly {
        let name_idx = strings.add(name);
        // HashAlgId, version, Flags, PublicKey, Name, Culture
        tables.extend_from_slice(&0x8004u32.to_le_bytes());
        version_bytes(&mut tables, version);
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&name_idx.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
    }

    for (name, version) in refs {
        let name_idx = strings.add(name);
        // version, Flags, PublicKeyOrToken, Name, Culture, HashValue
        version_bytes(&mut tables, *version);
        tables.extend_from_slice(&0u32.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&name_idx.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
        tables.extend_from_slice(&0u16.to_le_bytes());
    }
    pad4(&mut tables);
    pad4(&mut strings.heap);

    let version_string = b"v4.0.30319\0\0"; // 12 bytes, already aligned
    let header_len = 16 + version_string.len() + 4 + (8 + 4) + (8 + 12);
    let tables_offset = header_len;
    let strings_offset = tables_offset + tables.len();

    let mut md = Vec::new();
    md.extend_from_slice(b"BSJB");
    md.extend_from_slice(&1u16.to_le_bytes());
    md.extend_from_slice(&1u16.to_le_bytes());
    md.extend_from_slice(&0u32.to_le_bytes());
    md.extend_from_slice(&(version_string.len() as u32).to_le_bytes());
    md.extend_from_slice(version_string);
    md.extend_from_slice(&0u16.to_le_bytes()); // flags
    md.extend_from_slice(&2u16.to_le_bytes()); // streams
    md.extend_from_slice(&(tables_offset as u32).to_le_bytes());
    md.extend_from_slice(&(tables.len() as u32).to_le_bytes());
    md.extend_from_slice(b"#~\0\0");
    md.extend_from_slice(&(strings_offset as u32).to_le_bytes());
    md.extend_from_slice(&(strings.heap.len() as u32).to_le_bytes());
    md.extend_from_slice(b"#Strings\0\0\0\0");
    assert_eq!(md.len(), header_len);
    md.extend_from_slice(&tables);
    md.extend_from_slice(&strings.heap);
    md
}

/// Wrap `section` in a PE32 image; `cli` selects whether data directory 14
/// points at the start of the section.
fn pe_image(section: &[u8], cli: bool) -> Vec<u8> {
    let raw_size = section.len().div_ceil(FILE_ALIGNMENT).max(1) * FILE_ALIGNMENT;
    let mut img = vec![0u8; FILE_ALIGNMENT + raw_size];
    img[0] = b'M';
    img[1] = b'Z';
    put_u32(&mut img, 0x3c, PE_OFFSET as u32);
    img[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

    let coff = PE_OFFSET + 4;
    put_u16(&mut img, coff, 0x14c); // i386
    put_u16(&mut img, coff + 2, 1); // sections
    put_u16(&mut img, coff + 16, OPTIONAL_HEADER_SIZE as u16);
    put_u16(&mut img, coff + 18, 0x2102); // executable | 32-bit | dll

    let optional = coff + 20;
    put_u16(&mut img, optional, 0x10b);
    put_u32(&mut img, optional + 92, 16);
    if cli {
        let dir = optional + 96 + 14 * 8;
        put_u32(&mut img, dir, SECTION_RVA);
        put_u32(&mut img, dir + 4, CLI_HEADER_SIZE as u32);
    }

    let sh = optional + OPTIONAL_HEADER_SIZE;
    img[sh..sh + 5].copy_from_slice(b".text");
    put_u32(&mut img, sh + 8, section.len() as u32);
    put_u32(&mut img, sh + 12, SECTION_RVA);
    put_u32(&mut img, sh + 16, raw_size as u32);
    put_u32(&mut img, sh + 20, FILE_ALIGNMENT as u32);

    img[FILE_ALIGNMENT..FILE_ALIGNMENT + section.len()].copy_from_slice(section);
    img
}

fn managed_image(md: Vec<u8>) -> Vec<u8> {
    let mut section = vec![0u8; CLI_HEADER_SIZE];
    put_u32(&mut section, 0, CLI_HEADER_SIZE as u32);
    put_u16(&mut section, 4, 2);
    put_u16(&mut section, 6, 5);
    put_u32(&mut section, 8, SECTION_RVA + CLI_HEADER_SIZE as u32);
    put_u32(&mut section, 12, md.len() as u32);
    put_u32(&mut section, 16, 1); // IL only
    section.extend_from_slice(&md);
    pe_image(&section, true)
}

/// A managed assembly named `name` referencing `refs` in order.
pub fn assembly_image(name: &str, version: [u16; 4], refs: &[(&str, [u16; 4])]) -> Vec<u8> {
    managed_image(metadata(&format!("{}.dll", name), Some((name, version)), refs))
}

/// A managed module without an Assembly row (a netmodule).
pub fn netmodule_image(name: &str, refs: &[(&str, [u16; 4])]) -> Vec<u8> {
    managed_image(metadata(&format!("{}.netmodule", name), None, refs))
}

/// A valid PE image with no CLI header.
pub fn native_image() -> Vec<u8> {
    pe_image(&[0xc3], false)
}

pub fn write_assembly(dir: &Path, file: &str, name: &str, refs: &[(&str, [u16; 4])]) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, assembly_image(name, [1, 0, 0, 0], refs)).unwrap();
    path
}
