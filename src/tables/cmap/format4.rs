// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html
// 'cmap' format 4, segment mapping to delta values

use crate::{
    VeroCmapError,
    buffer::{ByteCursor, ByteCursorError},
};

use super::{CmapError, Format};

/// Byte offset of the endCode array from the start of the subtable.
const END_CODES_OFFSET: usize = 14;

/// One contiguous range of code points sharing a mapping rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_code: u16,
    pub end_code: u16,
    /// Stored unsigned in the file, added modulo 65536
    pub id_delta: i16,
    /// Zero for a plain delta segment, otherwise a byte offset from this
    /// segment's own idRangeOffset entry into the glyph id array
    pub id_range_offset: u16,
}

impl Segment {
    pub fn contains(&self, code_point: u16) -> bool {
        self.start_code <= code_point && code_point <= self.end_code
    }
}

/// A segmented coverage subtable.
///
/// The parallel segment arrays are decoded once at parse time, glyph id array
/// reads go through the subtable's own bytes so a computed address can never
/// reach past the declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format4Subtable<'a> {
    /// The subtable's bytes, from the format field up to the declared length
    data: &'a [u8],
    pub length: u16,
    pub language: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<u16>,
    id_range_offsets: Vec<u16>,
}

impl<'a> Format4Subtable<'a> {
    /// Parses the subtable body, `cursor` must be positioned right after the format field.
    ///
    /// # Errors
    ///
    /// * `CmapError::TruncatedSubtable` if the declared length runs past the
    ///   available data, or the segment arrays do not fit in the declared length.
    /// * `CmapError::MalformedSegments` if `endCode` is not sorted, a segment
    ///   starts after it ends, or the final `0xFFFF` segment is missing.
    pub(crate) fn parse(cursor: &mut ByteCursor<'a>) -> Result<Self, VeroCmapError> {
        let start = cursor.position().saturating_sub(2);
        let truncated = CmapError::TruncatedSubtable {
            format: Format::SegmentMappingToDeltaValues,
            offset: start,
        };

        let length = cursor.read_u16().map_err(|_| truncated.clone())?;
        let data = cursor
            .bytes_at(start, usize::from(length))
            .map_err(|_| truncated.clone())?;

        let table = Self::parse_fields(data).map_err(|_| truncated)?;
        table.validate()?;

        log::debug!(
            "parsed format 4 subtable: {} bytes, {} segments",
            table.length,
            table.seg_count()
        );

        Ok(table)
    }

    fn parse_fields(data: &'a [u8]) -> Result<Self, ByteCursorError> {
        let mut s = ByteCursor::new(data);
        s.skip(2)?; // format
        let length = s.read_u16()?;
        let language = s.read_u16()?;
        let seg_count_x2 = s.read_u16()?;
        let search_range = s.read_u16()?;
        let entry_selector = s.read_u16()?;
        let range_shift = s.read_u16()?;

        let seg_count = usize::from(seg_count_x2 / 2);
        let read_array = |s: &mut ByteCursor<'a>| -> Result<Vec<u16>, ByteCursorError> {
            (0..seg_count).map(|_| s.read_u16()).collect()
        };

        let end_codes = read_array(&mut s)?;
        s.skip(2)?; // reservedPad
        let start_codes = read_array(&mut s)?;
        let id_deltas = read_array(&mut s)?;
        let id_range_offsets = read_array(&mut s)?;

        Ok(Self {
            data,
            length,
            language,
            search_range,
            entry_selector,
            range_shift,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
        })
    }

    fn validate(&self) -> Result<(), CmapError> {
        let malformed = |reason| CmapError::MalformedSegments { reason };

        if self.end_codes.is_empty() {
            return Err(malformed("no segments"));
        }
        if self.end_codes.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(malformed("endCode is not sorted"));
        }
        if self.end_codes.last() != Some(&0xFFFF) {
            return Err(malformed("the last segment does not end at 0xFFFF"));
        }
        if self.segments().any(|segment| segment.start_code > segment.end_code) {
            return Err(malformed("a segment starts after it ends"));
        }

        // searchRange = 2 * 2^floor(log2(segCount)), informational only
        let seg_count = self.seg_count();
        let expected = 2u32 << (u16::BITS - 1 - seg_count.leading_zeros());
        if u32::from(self.search_range) != expected {
            log::warn!(
                "format 4 searchRange is {} but {} segments imply {}",
                self.search_range,
                seg_count,
                expected
            );
        }

        Ok(())
    }

    pub fn seg_count(&self) -> u16 {
        // the arrays were read from a u16 segCountX2, their length fits
        self.end_codes.len() as u16
    }

    pub fn segment(&self, index: usize) -> Option<Segment> {
        Some(Segment {
            start_code: *self.start_codes.get(index)?,
            end_code: *self.end_codes.get(index)?,
            id_delta: *self.id_deltas.get(index)? as i16,
            id_range_offset: *self.id_range_offsets.get(index)?,
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.end_codes.len()).filter_map(|index| self.segment(index))
    }

    /// The trailing glyph id array, whatever follows idRangeOffset up to the declared length
    pub fn glyph_id_array(&self) -> impl Iterator<Item = u16> + 'a {
        let start = self.id_range_offsets_offset() + self.end_codes.len() * 2;
        self.data
            .get(start..)
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Finds the first segment whose end code covers `code_point`.
    ///
    /// `endCode` is sorted and ends with `0xFFFF`, so this always finds a segment;
    /// whether the segment actually contains the code point is up to the caller.
    pub fn segment_index(&self, code_point: u16) -> Option<usize> {
        let index = self.end_codes.partition_point(|end| *end < code_point);
        (index < self.end_codes.len()).then_some(index)
    }

    /// Maps a code point to a glyph, returning 0 when the code point is not
    /// covered. Code points above `0xFFFF` are never covered by this format.
    ///
    /// # Errors
    ///
    /// * `ByteCursorError::OutOfBounds` when a segment's idRangeOffset points
    ///   past the end of the subtable.
    pub fn glyph_index(&self, code_point: u32) -> Result<u16, VeroCmapError> {
        let Ok(code_point) = u16::try_from(code_point) else {
            return Ok(0);
        };
        let Some(index) = self.segment_index(code_point) else {
            return Ok(0);
        };

        let start_code = self.start_codes[index];
        if code_point < start_code {
            return Ok(0);
        }

        let id_delta = self.id_deltas[index];
        let id_range_offset = self.id_range_offsets[index];
        if id_range_offset == 0 {
            return Ok(code_point.wrapping_add(id_delta));
        }

        // idRangeOffset is relative to the address of it's own entry
        let address = self.id_range_offsets_offset()
            + index * 2
            + usize::from(id_range_offset)
            + usize::from(code_point - start_code) * 2;
        let glyph = ByteCursor::new(self.data).peek_at(address)?;

        if glyph == 0 {
            Ok(0)
        } else {
            Ok(glyph.wrapping_add(id_delta))
        }
    }

    /// Calls `f` for every code point mapped to a non zero glyph
    pub fn codepoints(&self, mut f: impl FnMut(u32)) -> Result<(), VeroCmapError> {
        for segment in self.segments() {
            for code_point in segment.start_code..=segment.end_code {
                if self.glyph_index(u32::from(code_point))? != 0 {
                    f(u32::from(code_point));
                }
            }
        }

        Ok(())
    }

    fn id_range_offsets_offset(&self) -> usize {
        // endCode, reservedPad, startCode, idDelta
        END_CODES_OFFSET + self.end_codes.len() * 6 + 2
    }
}
