// https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html
// 'cmap' format 0, byte encoding table

use crate::{VeroCmapError, buffer::ByteCursor};

use super::{CmapError, Format};

/// A byte encoding subtable, a plain 256 entry array indexed by code point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format0Subtable {
    /// Declared length in bytes, always 262 in well formed fonts
    pub length: u16,
    pub language: u16,
    glyph_ids: [u8; 256],
}

impl Format0Subtable {
    const SIZE: u16 = 6 + 256;

    /// Parses the subtable body, `cursor` must be positioned right after the format field
    pub(crate) fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self, VeroCmapError> {
        let truncated = CmapError::TruncatedSubtable {
            format: Format::ByteEncodingTable,
            offset: cursor.position().saturating_sub(2),
        };

        let length = cursor.read_u16().map_err(|_| truncated.clone())?;
        let language = cursor.read_u16().map_err(|_| truncated.clone())?;
        let bytes = cursor.read_bytes(256).map_err(|_| truncated)?;

        if length != Self::SIZE {
            log::warn!("format 0 subtable declares {length} bytes instead of {}", Self::SIZE);
        }

        let mut glyph_ids = [0u8; 256];
        glyph_ids.copy_from_slice(bytes);

        Ok(Self {
            length,
            language,
            glyph_ids,
        })
    }

    /// Code points above 255 are not covered and map to glyph 0
    pub fn glyph_index(&self, code_point: u32) -> u16 {
        usize::try_from(code_point)
            .ok()
            .and_then(|index| self.glyph_ids.get(index))
            .map_or(0, |glyph| u16::from(*glyph))
    }

    pub fn glyph_ids(&self) -> &[u8; 256] {
        &self.glyph_ids
    }

    /// Unlike format 4 every code point 0..256 is present in the array, so only
    /// those mapped to a non zero glyph are reported.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for (code_point, glyph) in (0u32..).zip(self.glyph_ids) {
            if glyph != 0 {
                f(code_point);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtable(mappings: &[(usize, u8)]) -> Vec<u8> {
        let mut data = vec![
            0x00, 0x00, // format: 0
            0x01, 0x06, // subtable size: 262
            0x00, 0x00, // language ID: 0
        ];
        data.extend(std::iter::repeat_n(0, 256));
        for (code_point, glyph) in mappings {
            data[6 + code_point] = *glyph;
        }
        data
    }

    fn parse(data: &[u8]) -> Result<Format0Subtable, VeroCmapError> {
        let mut cursor = ByteCursor::at(data, 2).unwrap();
        Format0Subtable::parse(&mut cursor)
    }

    #[test]
    fn maps_the_array() {
        let data = subtable(&[(65, 10), (0xFF, 3)]);
        let table = parse(&data).unwrap();

        assert_eq!(table.length, 262);
        assert_eq!(table.glyph_index(65), 10);
        assert_eq!(table.glyph_index(0xFF), 3);
        assert_eq!(table.glyph_index(66), 0);
        assert_eq!(table.glyph_index(300), 0);
        assert_eq!(table.glyph_index(u32::MAX), 0);
    }

    #[test]
    fn every_byte_code_point_matches_the_array() {
        let mappings: Vec<(usize, u8)> = (0..256).map(|c| (c, (c as u8).wrapping_mul(7))).collect();
        let table = parse(&subtable(&mappings)).unwrap();

        for (code_point, glyph) in mappings {
            assert_eq!(table.glyph_index(code_point as u32), u16::from(glyph));
        }
        for code_point in 256..1024 {
            assert_eq!(table.glyph_index(code_point), 0);
        }
    }

    #[test]
    fn collect_codepoints() {
        let table = parse(&subtable(&[(0x40, 100), (0x41, 0), (0x7A, 1)])).unwrap();

        let mut vec = vec![];
        table.codepoints(|c| vec.push(c));
        assert_eq!(vec, [0x40, 0x7A]);
    }

    #[test]
    fn truncated_array() {
        let mut data = subtable(&[]);
        data.truncate(6 + 255);

        assert!(matches!(
            parse(&data),
            Err(VeroCmapError::Cmap(CmapError::TruncatedSubtable {
                format: Format::ByteEncodingTable,
                offset: 0,
            }))
        ));
    }

    #[test]
    fn wrong_length_field_is_tolerated() {
        let mut data = subtable(&[(1, 2)]);
        data[3] = 0x00;

        let table = parse(&data).unwrap();
        assert_eq!(table.length, 0x0100);
        assert_eq!(table.glyph_index(1), 2);
    }
}
