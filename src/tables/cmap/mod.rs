use std::fmt;

use thiserror::Error;

use crate::{VeroCmapError, buffer::ByteCursor};

use super::TableRecord;

mod format0;
mod format4;

pub use format0::Format0Subtable;
pub use format4::{Format4Subtable, Segment};

/// Represents the error messages which may occur while reading the
/// [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
/// or one of it's subtables
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CmapError {
    #[error("Unsupported cmap table version {0}, only version 0 exists")]
    UnsupportedVersion(u16),

    /// The subtable's fixed fields or arrays do not fit in the bytes available to it
    #[error("The {format} subtable at offset {offset} is truncated")]
    TruncatedSubtable { format: Format, offset: usize },

    #[error("The {0} subtable is not supported")]
    UnsupportedFormat(Format),

    /// The format 4 segment arrays break an invariant the lookup relies on
    #[error("Malformed format 4 segments: {reason}")]
    MalformedSegments { reason: &'static str },

    #[error("No cmap subtable matches {0}")]
    SubtableNotFound(SubtableSelector),
}

/// Represents the platform identifier of an encoding record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    /// ISO encodings, deprecated
    Iso,
    Windows,
    Custom,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Iso,
            3 => Self::Windows,
            4 => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

/// The layout of a cmap subtable, identified by the `format` field at it's start.
///
/// Only [`Format::ByteEncodingTable`] and [`Format::SegmentMappingToDeltaValues`]
/// can be decoded, every other format is reported as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    ByteEncodingTable,
    HighByteMappingThroughTable,
    SegmentMappingToDeltaValues,
    TrimmedTableMapping,
    MixedCoverage,
    TrimmedArray,
    SegmentedCoverage,
    ManyToOneRangeMappings,
    UnicodeVariationSequences,
    Unknown(u16),
}

impl Format {
    pub fn number(&self) -> u16 {
        match self {
            Self::ByteEncodingTable => 0,
            Self::HighByteMappingThroughTable => 2,
            Self::SegmentMappingToDeltaValues => 4,
            Self::TrimmedTableMapping => 6,
            Self::MixedCoverage => 8,
            Self::TrimmedArray => 10,
            Self::SegmentedCoverage => 12,
            Self::ManyToOneRangeMappings => 13,
            Self::UnicodeVariationSequences => 14,
            Self::Unknown(n) => *n,
        }
    }
}

impl From<u16> for Format {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::ByteEncodingTable,
            2 => Self::HighByteMappingThroughTable,
            4 => Self::SegmentMappingToDeltaValues,
            6 => Self::TrimmedTableMapping,
            8 => Self::MixedCoverage,
            10 => Self::TrimmedArray,
            12 => Self::SegmentedCoverage,
            13 => Self::ManyToOneRangeMappings,
            14 => Self::UnicodeVariationSequences,
            _ => Self::Unknown(value),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "format {}", self.number())
    }
}

/// The header at the start of the cmap table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmapHeader {
    /// The version of the cmap table, always zero
    pub version: u16,

    /// The number of encoding subtables
    pub num_tables: u16,
}

/// An encoding record, pointing at the subtable used for one
/// platform / encoding pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRecord {
    /// The platform identifier
    pub platform_id: u16,

    /// The platform specific encoding identifier
    pub encoding_id: u16,

    /// The offset of the mapping table from the start of the cmap table
    pub subtable_offset: u32,
}

impl EncodingRecord {
    pub const SIZE: usize = 8;

    fn from_cursor(cursor: &mut ByteCursor<'_>) -> Result<Self, VeroCmapError> {
        Ok(Self {
            platform_id: cursor.read_u16()?,
            encoding_id: cursor.read_u16()?,
            subtable_offset: cursor.read_u32()?,
        })
    }

    pub fn platform(&self) -> PlatformId {
        PlatformId::from(self.platform_id)
    }

    /// Checks whether this record claims a Unicode encoding: any Unicode
    /// platform record, or Windows with the BMP (1) or full repertoire (10) encoding.
    pub fn is_unicode(&self) -> bool {
        match self.platform() {
            PlatformId::Unicode => true,
            PlatformId::Windows => matches!(self.encoding_id, 1 | 10),
            _ => false,
        }
    }
}

/// Chooses which encoding subtable a lookup goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtableSelector {
    /// The n-th encoding record, in file order
    Index(u16),

    /// The first encoding record with this platform / encoding pair,
    /// e.g. `3 / 1` for Windows Unicode BMP
    Encoding { platform_id: u16, encoding_id: u16 },
}

impl fmt::Display for SubtableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "encoding record #{index}"),
            Self::Encoding {
                platform_id,
                encoding_id,
            } => write!(f, "platform {platform_id} encoding {encoding_id}"),
        }
    }
}

/// The parsed cmap header and encoding records.
///
/// Borrows the cmap table's bytes, subtables are parsed on demand with
/// [`CmapDirectory::subtable`].
#[derive(Debug, Clone)]
pub struct CmapDirectory<'a> {
    data: &'a [u8],
    table_offset: u32,
    header: CmapHeader,
    records: Vec<EncodingRecord>,
}

impl<'a> CmapDirectory<'a> {
    /// Parses the cmap table which `record` locates inside the font file `data`
    ///
    /// # Errors
    ///
    /// * `ByteCursorError::OutOfBounds` if the table or it's encoding records do not fit.
    /// * `CmapError::UnsupportedVersion` if the version field is not zero.
    pub fn parse(data: &'a [u8], record: &TableRecord) -> Result<Self, VeroCmapError> {
        let table = ByteCursor::new(data).bytes_at(record.offset as usize, record.length as usize)?;
        let mut directory = Self::from_table(table)?;
        directory.table_offset = record.offset;

        Ok(directory)
    }

    /// Parses a cmap table given just it's own bytes
    pub fn from_table(data: &'a [u8]) -> Result<Self, VeroCmapError> {
        let mut cursor = ByteCursor::new(data);
        let header = CmapHeader {
            version: cursor.read_u16()?,
            num_tables: cursor.read_u16()?,
        };

        if header.version != 0 {
            return Err(CmapError::UnsupportedVersion(header.version).into());
        }

        let records = (0..header.num_tables)
            .map(|_| EncodingRecord::from_cursor(&mut cursor))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("parsed cmap directory with {} encoding records", records.len());

        Ok(Self {
            data,
            table_offset: 0,
            header,
            records,
        })
    }

    pub fn header(&self) -> &CmapHeader {
        &self.header
    }

    /// The encoding records in file order
    pub fn subtables(&self) -> &[EncodingRecord] {
        &self.records
    }

    /// The first encoding record, in file order, for this platform / encoding pair
    pub fn select(&self, platform_id: u16, encoding_id: u16) -> Option<EncodingRecord> {
        self.records
            .iter()
            .find(|r| r.platform_id == platform_id && r.encoding_id == encoding_id)
            .copied()
    }

    pub fn find(&self, selector: SubtableSelector) -> Result<EncodingRecord, VeroCmapError> {
        let record = match selector {
            SubtableSelector::Index(index) => self.records.get(usize::from(index)).copied(),
            SubtableSelector::Encoding {
                platform_id,
                encoding_id,
            } => self.select(platform_id, encoding_id),
        };

        Ok(record.ok_or(CmapError::SubtableNotFound(selector))?)
    }

    /// The subtable's offset from the start of the font file
    pub fn absolute_offset(&self, record: &EncodingRecord) -> u64 {
        u64::from(self.table_offset) + u64::from(record.subtable_offset)
    }

    /// Reads the format field of the subtable `record` points at
    pub fn format_of(&self, record: &EncodingRecord) -> Result<Format, VeroCmapError> {
        let format = ByteCursor::new(self.data).peek_at(record.subtable_offset as usize)?;
        Ok(Format::from(format))
    }

    /// Parses the subtable which `selector` chooses
    pub fn subtable(&self, selector: SubtableSelector) -> Result<Subtable<'a>, VeroCmapError> {
        let record = self.find(selector)?;
        Subtable::parse(self.data, record.subtable_offset as usize)
    }
}

/// A decoded character to glyph mapping subtable
#[derive(Debug, Clone)]
pub enum Subtable<'a> {
    Format0(Format0Subtable),
    Format4(Format4Subtable<'a>),
}

impl<'a> Subtable<'a> {
    /// Parses the subtable starting at `offset` in the cmap table `data`,
    /// dispatching on it's format field.
    ///
    /// # Errors
    ///
    /// * `ByteCursorError::OutOfBounds` if `offset` leaves no room for the format field.
    /// * `CmapError::UnsupportedFormat` for anything but formats 0 and 4.
    /// * Whatever the format specific parser reports.
    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self, VeroCmapError> {
        let mut cursor = ByteCursor::at(data, offset)?;
        let format = Format::from(cursor.read_u16()?);

        log::debug!("parsing cmap {format} subtable at offset {offset}");

        match format {
            Format::ByteEncodingTable => Ok(Self::Format0(Format0Subtable::parse(&mut cursor)?)),
            Format::SegmentMappingToDeltaValues => {
                Ok(Self::Format4(Format4Subtable::parse(&mut cursor)?))
            }
            _ => Err(CmapError::UnsupportedFormat(format).into()),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Format0(_) => Format::ByteEncodingTable,
            Self::Format4(_) => Format::SegmentMappingToDeltaValues,
        }
    }

    pub fn language(&self) -> u16 {
        match self {
            Self::Format0(table) => table.language,
            Self::Format4(table) => table.language,
        }
    }

    /// Maps a code point to it's glyph, 0 means the code point is not mapped
    pub fn glyph_index(&self, code_point: u32) -> Result<u16, VeroCmapError> {
        match self {
            Self::Format0(table) => Ok(table.glyph_index(code_point)),
            Self::Format4(table) => table.glyph_index(code_point),
        }
    }

    /// Maps every code point in `0..=0xFFFF`, the returned vector is indexed by code point
    pub fn glyph_map(&self) -> Result<Vec<u16>, VeroCmapError> {
        (0..=u32::from(u16::MAX))
            .map(|code_point| self.glyph_index(code_point))
            .collect()
    }

    /// Calls `f` for every code point this subtable maps to a non zero glyph
    pub fn codepoints(&self, f: impl FnMut(u32)) -> Result<(), VeroCmapError> {
        match self {
            Self::Format0(table) => {
                table.codepoints(f);
                Ok(())
            }
            Self::Format4(table) => table.codepoints(f),
        }
    }
}

/// Resolves code points to glyph indices through a cmap directory
#[derive(Debug, Clone)]
pub struct CmapResolver<'a> {
    directory: CmapDirectory<'a>,
}

impl<'a> CmapResolver<'a> {
    pub fn new(directory: CmapDirectory<'a>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &CmapDirectory<'a> {
        &self.directory
    }

    /// Maps every code point through the selected subtable, the result has the
    /// same length and order as the input.
    ///
    /// Unmapped code points resolve to glyph 0, malformed data or an unsupported
    /// subtable format is an error for the whole call.
    pub fn resolve<I>(&self, selector: SubtableSelector, code_points: I) -> Result<Vec<u16>, VeroCmapError>
    where
        I: IntoIterator<Item = u32>,
    {
        let subtable = self.directory.subtable(selector)?;

        code_points
            .into_iter()
            .map(|code_point| subtable.glyph_index(code_point))
            .collect()
    }

    pub fn glyph_index(&self, selector: SubtableSelector, code_point: u32) -> Result<u16, VeroCmapError> {
        self.directory.subtable(selector)?.glyph_index(code_point)
    }
}
