use std::{
    collections::{BTreeMap, btree_map},
    fmt,
};

use thiserror::Error;

use crate::{VeroCmapError, buffer::ByteCursor};

pub mod cmap;

/// A four byte table identifier such as `cmap` or `glyf`.
///
/// Tags are compared byte for byte, a tag containing bytes which are not
/// printable ASCII is still a valid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const CMAP: Tag = Tag(*b"cmap");

    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Builds a tag from a string of exactly four bytes
    pub fn from_name(s: &str) -> Option<Self> {
        let bytes: [u8; 4] = s.as_bytes().try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02X}")?;
            }
        }

        Ok(())
    }
}

/// Represents the error messages which may occur when trying
/// to parse the table directory of a font file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableDirectoryError {
    /// The header declares more table records than the buffer can hold
    #[error("The table directory declares {num_tables} tables which do not fit in a {len} bytes buffer")]
    Corrupt { num_tables: u16, len: usize },

    #[error("The font has no '{0}' table")]
    MissingTable(Tag),
}

/// Represents the offset subtable directory and it's metadata
/// providing us with a important info such as the number of tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTable {
    pub scalar_type: u32,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl OffsetTable {
    /// The offset subtable is always 12 bytes per the reference manual.
    pub const SIZE: usize = 12;

    pub(crate) fn from_cursor(cursor: &mut ByteCursor<'_>) -> Result<Self, VeroCmapError> {
        Ok(Self {
            scalar_type: cursor.read_u32()?,
            num_tables: cursor.read_u16()?,
            search_range: cursor.read_u16()?,
            entry_selector: cursor.read_u16()?,
            range_shift: cursor.read_u16()?,
        })
    }

    /// Returns the number of tables exists in the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }
}

/// Represents a single record of the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    /// The checksum of the table. This value can be used to verify the
    /// integrity of the table data.
    pub checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file.
    pub offset: u32,
    /// The length of this table in bytes, not including any padding.
    pub length: u32,
}

impl TableRecord {
    /// Every record is exactly 16 bytes: tag, checksum, offset and length.
    pub const SIZE: usize = 16;

    fn from_cursor(cursor: &mut ByteCursor<'_>) -> Result<Self, VeroCmapError> {
        let tag = cursor.read_bytes(4)?;

        Ok(Self {
            tag: Tag([tag[0], tag[1], tag[2], tag[3]]),
            checksum: cursor.read_u32()?,
            offset: cursor.read_u32()?,
            length: cursor.read_u32()?,
        })
    }

    fn fits_in(&self, len: usize) -> bool {
        (self.offset as u64) + (self.length as u64) <= len as u64
    }
}

/// The sfnt table directory, maps a table tag to it's record
#[derive(Debug, Clone)]
pub struct TableDirectory {
    offset: OffsetTable,
    /// Records keyed by tag. Every record here satisfies
    /// `offset + length <= buffer length`.
    records: BTreeMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Parses the offset table and every table record from the start of `data`.
    ///
    /// Duplicate tags are tolerated and the last record wins. Records whose
    /// span does not fit in `data` are dropped with a warning so that every
    /// record handed out can be sliced safely.
    ///
    /// # Errors
    ///
    /// * `TableDirectoryError::Corrupt` if the header or the declared number of
    ///   records does not fit in `data`.
    pub fn parse(data: &[u8]) -> Result<Self, VeroCmapError> {
        let mut cursor = ByteCursor::new(data);
        let offset = OffsetTable::from_cursor(&mut cursor).map_err(|_| {
            TableDirectoryError::Corrupt {
                num_tables: 0,
                len: data.len(),
            }
        })?;

        let needed = OffsetTable::SIZE + usize::from(offset.num_tables) * TableRecord::SIZE;
        if needed > data.len() {
            return Err(TableDirectoryError::Corrupt {
                num_tables: offset.num_tables,
                len: data.len(),
            }
            .into());
        }

        let mut records = BTreeMap::new();
        for _ in 0..offset.num_tables {
            let record = TableRecord::from_cursor(&mut cursor)?;

            if !record.fits_in(data.len()) {
                log::warn!(
                    "dropping table '{}': {} bytes at offset {} exceed the {} bytes buffer",
                    record.tag,
                    record.length,
                    record.offset,
                    data.len()
                );
                continue;
            }

            if records.insert(record.tag, record).is_some() {
                log::warn!("duplicate table '{}', keeping the last record", record.tag);
            }
        }

        log::debug!(
            "parsed table directory: scaler type {:#010X}, {} of {} records kept",
            offset.scalar_type,
            records.len(),
            offset.num_tables
        );

        Ok(Self { offset, records })
    }

    pub fn offset_table(&self) -> &OffsetTable {
        &self.offset
    }

    pub fn lookup(&self, tag: Tag) -> Option<TableRecord> {
        self.records.get(&tag).copied()
    }

    /// Returns the bytes of the table with the given tag
    pub fn table_data<'a>(&self, data: &'a [u8], tag: Tag) -> Result<&'a [u8], VeroCmapError> {
        let record = self
            .lookup(tag)
            .ok_or(TableDirectoryError::MissingTable(tag))?;
        let cursor = ByteCursor::new(data);

        Ok(cursor.bytes_at(record.offset as usize, record.length as usize)?)
    }

    /// Iterates over the records in tag order
    pub fn records(&self) -> btree_map::Values<'_, Tag, TableRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'d> IntoIterator for &'d TableDirectory {
    type Item = (&'d Tag, &'d TableRecord);

    type IntoIter = btree_map::Iter<'d, Tag, TableRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
