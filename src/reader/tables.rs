//! ECMA-335 metadata root and table stream decoding.
//!
//! Only the `Assembly` (0x20) and `AssemblyRef` (0x23) tables are read, but
//! locating them requires the row size of every table stored before them,
//! which in turn depends on heap index widths and coded index widths.

use super::bytes::{index_at, slice, u16_at, u32_at, u64_at, u8_at};
use super::ReadError;
use crate::models::Version;

const METADATA_SIGNATURE: u32 = 0x424a_5342;
const TABLE_COUNT: usize = 64;
const ASSEMBLY: u8 = 0x20;
const ASSEMBLY_REF: u8 = 0x23;

const HEAP_STRINGS_WIDE: u8 = 0x01;
const HEAP_GUID_WIDE: u8 = 0x02;
const HEAP_BLOB_WIDE: u8 = 0x04;
const HEAP_EXTRA_DATA: u8 = 0x40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReference {
    pub name: String,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identity of an assembly and the references it declares, in table order.
pub struct Manifest {
    pub name: String,
    pub version: Version,
    pub references: Vec<AssemblyReference>,
}

#[derive(Debug, Clone, Copy)]
enum Coded {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    CustomAttributeType,
    ResolutionScope,
}

impl Coded {
    /// Tag width in bits and the tables the index may point into.
    fn layout(self) -> (u32, &'static [u8]) {
        match self {
            Coded::TypeDefOrRef => (2, &[0x02, 0x01, 0x1b]),
            Coded::HasConstant => (2, &[0x04, 0x08, 0x17]),
            Coded::HasCustomAttribute => (
                5,
                &[
                    0x06, 0x04, 0x01, 0x02, 0x08, 0x09, 0x0a, 0x00, 0x0e, 0x17, 0x14, 0x11, 0x1a,
                    0x1b, 0x20, 0x23, 0x26, 0x27, 0x28, 0x2a, 0x2c, 0x2b,
                ],
            ),
            Coded::HasFieldMarshal => (1, &[0x04, 0x08]),
            Coded::HasDeclSecurity => (2, &[0x02, 0x06, 0x20]),
            Coded::MemberRefParent => (3, &[0x02, 0x01, 0x1a, 0x06, 0x1b]),
            Coded::HasSemantics => (1, &[0x14, 0x17]),
            Coded::MethodDefOrRef => (1, &[0x06, 0x0a]),
            Coded::MemberForwarded => (1, &[0x04, 0x06]),
            // three tag bits, but only MethodDef and MemberRef slots are used
            Coded::CustomAttributeType => (3, &[0x06, 0x0a]),
            Coded::ResolutionScope => (2, &[0x00, 0x1a, 0x23, 0x01]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Col {
    Fixed(usize),
    Str,
    Guid,
    Blob,
    Table(u8),
    Coded(Coded),
}

use Col::{Blob, Fixed, Guid, Str, Table};

/// Column schema for tables up to and including `AssemblyRef`.
fn schema(table: u8) -> Option<&'static [Col]> {
    let cols: &'static [Col] = match table {
        0x00 => &[Fixed(2), Str, Guid, Guid, Guid],
        0x01 => &[Col::Coded(Coded::ResolutionScope), Str, Str],
        0x02 => &[
            Fixed(4),
            Str,
            Str,
            Col::Coded(Coded::TypeDefOrRef),
            Table(0x04),
            Table(0x06),
        ],
        0x03 => &[Table(0x04)],
        0x04 => &[Fixed(2), Str, Blob],
        0x05 => &[Table(0x06)],
        0x06 => &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(0x08)],
        0x07 => &[Table(0x08)],
        0x08 => &[Fixed(2), Fixed(2), Str],
        0x09 => &[Table(0x02), Col::Coded(Coded::TypeDefOrRef)],
        0x0a => &[Col::Coded(Coded::MemberRefParent), Str, Blob],
        0x0b => &[Fixed(2), Col::Coded(Coded::HasConstant), Blob],
        0x0c => &[
            Col::Coded(Coded::HasCustomAttribute),
            Col::Coded(Coded::CustomAttributeType),
            Blob,
        ],
        0x0d => &[Col::Coded(Coded::HasFieldMarshal), Blob],
        0x0e => &[Fixed(2), Col::Coded(Coded::HasDeclSecurity), Blob],
        0x0f => &[Fixed(2), Fixed(4), Table(0x02)],
        0x10 => &[Fixed(4), Table(0x04)],
        0x11 => &[Blob],
        0x12 => &[Table(0x02), Table(0x14)],
        0x13 => &[Table(0x14)],
        0x14 => &[Fixed(2), Str, Col::Coded(Coded::TypeDefOrRef)],
        0x15 => &[Table(0x02), Table(0x17)],
        0x16 => &[Table(0x17)],
        0x17 => &[Fixed(2), Str, Blob],
        0x18 => &[Fixed(2), Table(0x06), Col::Coded(Coded::HasSemantics)],
        0x19 => &[
            Table(0x02),
            Col::Coded(Coded::MethodDefOrRef),
            Col::Coded(Coded::MethodDefOrRef),
        ],
        0x1a => &[Str],
        0x1b => &[Blob],
        0x1c => &[
            Fixed(2),
            Col::Coded(Coded::MemberForwarded),
            Str,
            Table(0x1a),
        ],
        0x1d => &[Fixed(4), Table(0x04)],
        0x1e => &[Fixed(4), Fixed(4)],
        0x1f => &[Fixed(4)],
        // Assembly: HashAlgId, Major, Minor, Build, Revision, Flags, PublicKey, Name, Culture
        0x20 => &[
            Fixed(4),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(4),
            Blob,
            Str,
            Str,
        ],
        0x21 => &[Fixed(4)],
        0x22 => &[Fixed(4), Fixed(4), Fixed(4)],
        // AssemblyRef: Major, Minor, Build, Revision, Flags, PublicKeyOrToken, Name, Culture, HashValue
        0x23 => &[
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(2),
            Fixed(4),
            Blob,
            Str,
            Str,
            Blob,
        ],
        _ => return None,
    };
    Some(cols)
}

struct Layout<'a> {
    data: &'a [u8],
    rows: [u32; TABLE_COUNT],
    table_offsets: [usize; TABLE_COUNT],
    string_width: usize,
    guid_width: usize,
    blob_width: usize,
}

impl<'a> Layout<'a> {
    fn parse(stream: &'a [u8]) -> Result<Self, ReadError> {
        let heap_sizes = u8_at(stream, 6)?;
        let valid = u64_at(stream, 8)?;
        let mut rows = [0u32; TABLE_COUNT];
        let mut pos = 24;
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = u32_at(stream, pos)?;
                pos += 4;
            }
        }
        if heap_sizes & HEAP_EXTRA_DATA != 0 {
            pos += 4;
        }
        let width = |flag: u8| if heap_sizes & flag != 0 { 4 } else { 2 };
        let mut layout = Layout {
            data: stream,
            rows,
            table_offsets: [0; TABLE_COUNT],
            string_width: width(HEAP_STRINGS_WIDE),
            guid_width: width(HEAP_GUID_WIDE),
            blob_width: width(HEAP_BLOB_WIDE),
        };
        for table in 0..=ASSEMBLY_REF {
            layout.table_offsets[table as usize] = pos;
            if layout.rows[table as usize] == 0 {
                continue;
            }
            let row = layout.row_size(table)?;
            let size = row
                .checked_mul(layout.rows[table as usize] as usize)
                .ok_or_else(|| ReadError::malformed("table size overflow"))?;
            pos = pos
                .checked_add(size)
                .ok_or_else(|| ReadError::malformed("table size overflow"))?;
        }
        Ok(layout)
    }

    fn table_index_width(&self, table: u8) -> usize {
        if self.rows[table as usize] < 0x1_0000 {
            2
        } else {
            4
        }
    }

    fn coded_index_width(&self, coded: Coded) -> usize {
        let (bits, tables) = coded.layout();
        let max_rows = tables
            .iter()
            .map(|t| self.rows[*t as usize])
            .max()
            .unwrap_or(0);
        if (max_rows as u64) < (1u64 << (16 - bits)) {
            2
        } else {
            4
        }
    }

    fn column_width(&self, col: Col) -> usize {
        match col {
            Fixed(n) => n,
            Str => self.string_width,
            Guid => self.guid_width,
            Blob => self.blob_width,
            Table(t) => self.table_index_width(t),
            Col::Coded(c) => self.coded_index_width(c),
        }
    }

    fn columns(&self, table: u8) -> Result<&'static [Col], ReadError> {
        schema(table)
            .ok_or_else(|| ReadError::malformed(format!("no schema for table {:#x}", table)))
    }

    fn row_size(&self, table: u8) -> Result<usize, ReadError> {
        Ok(self
            .columns(table)?
            .iter()
            .map(|c| self.column_width(*c))
            .sum())
    }

    /// Byte offset of `column` in row `row` (zero-based) of `table`.
    fn cell(&self, table: u8, row: usize, column: usize) -> Result<(usize, usize), ReadError> {
        let cols = self.columns(table)?;
        let within: usize = cols[..column].iter().map(|c| self.column_width(*c)).sum();
        let offset = self.table_offsets[table as usize] + row * self.row_size(table)? + within;
        Ok((offset, self.column_width(cols[column])))
    }

    fn read(&self, table: u8, row: usize, column: usize) -> Result<u32, ReadError> {
        let (offset, width) = self.cell(table, row, column)?;
        index_at(self.data, offset, width)
    }

    fn version(&self, table: u8, row: usize, first: usize) -> Result<Version, ReadError> {
        let field = |i: usize| -> Result<u16, ReadError> {
            let (offset, _) = self.cell(table, row, first + i)?;
            u16_at(self.data, offset)
        };
        Ok(Version::new(field(0)?, field(1)?, field(2)?, field(3)?))
    }
}

struct Streams<'a> {
    tables: &'a [u8],
    strings: &'a [u8],
}

fn locate_streams(metadata: &[u8]) -> Result<Streams<'_>, ReadError> {
    if u32_at(metadata, 0)? != METADATA_SIGNATURE {
        return Err(ReadError::malformed("bad metadata signature"));
    }
    let version_len = u32_at(metadata, 12)? as usize;
    let mut pos = 16 + align4(version_len);
    let count = u16_at(metadata, pos + 2)? as usize;
    pos += 4;

    let mut tables = None;
    let mut strings = None;
    for _ in 0..count {
        let offset = u32_at(metadata, pos)? as usize;
        let size = u32_at(metadata, pos + 4)? as usize;
        let name_start = pos + 8;
        let name_len = metadata
            .get(name_start..)
            .and_then(|rest| rest.iter().position(|b| *b == 0))
            .ok_or_else(|| ReadError::malformed("unterminated stream name"))?;
        let name = &metadata[name_start..name_start + name_len];
        let body = slice(metadata, offset, size)?;
        match name {
            b"#~" | b"#-" => tables = Some(body),
            b"#Strings" => strings = Some(body),
            _ => {}
        }
        pos = name_start + align4(name_len + 1);
    }
    Ok(Streams {
        tables: tables.ok_or_else(|| ReadError::malformed("missing #~ stream"))?,
        strings: strings.ok_or_else(|| ReadError::malformed("missing #Strings stream"))?,
    })
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn heap_string(strings: &[u8], index: u32) -> Result<String, ReadError> {
    let start = index as usize;
    let rest = strings
        .get(start..)
        .ok_or_else(|| ReadError::malformed(format!("string index {:#x} out of range", index)))?;
    let end = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| ReadError::malformed("unterminated string"))?;
    std::str::from_utf8(&rest[..end])
        .map(str::to_string)
        .map_err(|_| ReadError::malformed("string heap entry is not UTF-8"))
}

/// Decode the assembly manifest from a metadata root blob.
pub fn read_manifest(metadata: &[u8]) -> Result<Manifest, ReadError> {
    let streams = locate_streams(metadata)?;
    let layout = Layout::parse(streams.tables)?;
    if layout.rows[ASSEMBLY as usize] == 0 {
        return Err(ReadError::NotAnAssembly);
    }
    let name = heap_string(streams.strings, layout.read(ASSEMBLY, 0, 7)?)?;
    let version = layout.version(ASSEMBLY, 0, 1)?;
    let references = (0..layout.rows[ASSEMBLY_REF as usize] as usize)
        .map(|row| {
            Ok(AssemblyReference {
                name: heap_string(streams.strings, layout.read(ASSEMBLY_REF, row, 6)?)?,
                version: layout.version(ASSEMBLY_REF, row, 0)?,
            })
        })
        .collect::<Result<Vec<_>, ReadError>>()?;
    Ok(Manifest {
        name,
        version,
        references,
    })
}
