#![allow(dead_code)]

pub mod rng;

use rng::XorShift64;

/// A format 4 segment as written to the file
#[derive(Debug, Clone, Copy)]
pub struct SegmentSpec {
    pub start: u16,
    pub end: u16,
    pub delta: i16,
    pub range_offset: u16,
}

impl SegmentSpec {
    pub fn direct(start: u16, end: u16, delta: i16) -> Self {
        Self {
            start,
            end,
            delta,
            range_offset: 0,
        }
    }

    /// The segment every format 4 table ends with
    pub fn sentinel() -> Self {
        Self::direct(0xFFFF, 0xFFFF, 1)
    }
}

/// The idRangeOffset value for segment `index` of `seg_count` whose first
/// code point should read `glyph_id_array[array_index]`
pub fn range_offset_to(index: usize, seg_count: usize, array_index: usize) -> u16 {
    (2 * (seg_count - index) + 2 * array_index) as u16
}

fn push_u16(data: &mut Vec<u8>, value: u16) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_be_bytes());
}

pub fn format0_subtable(mappings: &[(u8, u8)]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 0);
    push_u16(&mut data, 262);
    push_u16(&mut data, 0);
    let mut glyphs = [0u8; 256];
    for (code_point, glyph) in mappings {
        glyphs[usize::from(*code_point)] = *glyph;
    }
    data.extend_from_slice(&glyphs);
    data
}

pub fn format4_subtable(segments: &[SegmentSpec], glyph_id_array: &[u16]) -> Vec<u8> {
    let seg_count = segments.len();
    let length = 16 + 8 * seg_count + 2 * glyph_id_array.len();
    let search_range = if seg_count == 0 {
        0
    } else {
        2 * (1usize << seg_count.ilog2())
    };

    let mut data = Vec::new();
    push_u16(&mut data, 4);
    push_u16(&mut data, length as u16);
    push_u16(&mut data, 0);
    push_u16(&mut data, (seg_count * 2) as u16);
    push_u16(&mut data, search_range as u16);
    push_u16(&mut data, if seg_count == 0 { 0 } else { seg_count.ilog2() as u16 });
    push_u16(&mut data, (seg_count * 2).saturating_sub(search_range) as u16);
    for segment in segments {
        push_u16(&mut data, segment.end);
    }
    push_u16(&mut data, 0);
    for segment in segments {
        push_u16(&mut data, segment.start);
    }
    for segment in segments {
        push_u16(&mut data, segment.delta as u16);
    }
    for segment in segments {
        push_u16(&mut data, segment.range_offset);
    }
    for glyph in glyph_id_array {
        push_u16(&mut data, *glyph);
    }
    data
}

/// A cmap table with one encoding record per entry, subtables laid out in order
pub fn cmap_table(entries: &[(u16, u16, &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 0);
    push_u16(&mut data, entries.len() as u16);

    let mut offset = 4 + 8 * entries.len();
    for (platform_id, encoding_id, subtable) in entries {
        push_u16(&mut data, *platform_id);
        push_u16(&mut data, *encoding_id);
        push_u32(&mut data, offset as u32);
        offset += subtable.len();
    }
    for (_, _, subtable) in entries {
        data.extend_from_slice(subtable);
    }
    data
}

/// A whole sfnt file holding `tables`, each table 4 byte aligned
pub fn sfnt(tables: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    let num_tables = tables.len();
    push_u32(&mut data, 0x0001_0000);
    push_u16(&mut data, num_tables as u16);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);

    let mut offset = 12 + 16 * num_tables;
    for (tag, table) in tables {
        data.extend_from_slice(*tag);
        push_u32(&mut data, 0);
        push_u32(&mut data, offset as u32);
        push_u32(&mut data, table.len() as u32);
        offset += table.len().next_multiple_of(4);
    }
    for (_, table) in tables {
        data.extend_from_slice(table);
        data.resize(data.len().next_multiple_of(4), 0);
    }
    data
}

/// Letters A-Z map straight through, a-c go through the glyph id array
pub fn sample_font() -> Vec<u8> {
    let segments = [
        SegmentSpec::direct(0x41, 0x5A, 0),
        SegmentSpec {
            start: 0x61,
            end: 0x63,
            delta: 0,
            range_offset: range_offset_to(1, 3, 0),
        },
        SegmentSpec::sentinel(),
    ];
    let format4 = format4_subtable(&segments, &[100, 0, 102]);
    let format0 = format0_subtable(&[(65, 10), (97, 11)]);
    let cmap = cmap_table(&[(0, 3, &format4[..]), (1, 0, &format0[..]), (3, 1, &format4[..])]);

    sfnt(&[(b"cmap", &cmap[..]), (b"head", &[0u8; 54][..])])
}

/// Random sorted, non overlapping segments ending with the sentinel, together
/// with a glyph id array every indirect segment points into.
pub fn random_segments(rng: &mut XorShift64) -> (Vec<SegmentSpec>, Vec<u16>) {
    let mut ranges = Vec::new();
    let mut next = rng.below(64) as u32;
    while next < 0xFF00 && ranges.len() < 40 {
        let start = next;
        let end = (start + rng.below(48) as u32).min(0xFFFE);
        ranges.push((start as u16, end as u16));
        // leave gaps of varying size, sometimes none at all
        next = end + 1 + rng.below(2000) as u32 * u32::from(rng.chance(70));
    }

    let seg_count = ranges.len() + 1;
    let mut segments = Vec::new();
    let mut glyph_id_array = Vec::new();
    for (index, (start, end)) in ranges.into_iter().enumerate() {
        let delta = rng.next_u64() as i16;
        if rng.chance(40) {
            let range_offset = range_offset_to(index, seg_count, glyph_id_array.len());
            for _ in start..=end {
                let glyph = if rng.chance(15) { 0 } else { rng.below(5000) as u16 + 1 };
                glyph_id_array.push(glyph);
            }
            segments.push(SegmentSpec {
                start,
                end,
                delta,
                range_offset,
            });
        } else {
            segments.push(SegmentSpec::direct(start, end, delta));
        }
    }
    segments.push(SegmentSpec::sentinel());

    (segments, glyph_id_array)
}

/// The glyph a format 4 table should map `code_point` to, worked out with a
/// linear scan and plain array indexing
pub fn reference_glyph(segments: &[SegmentSpec], glyph_id_array: &[u16], code_point: u16) -> u16 {
    let seg_count = segments.len();
    let Some(index) = segments.iter().position(|s| s.end >= code_point) else {
        return 0;
    };

    let segment = segments[index];
    if code_point < segment.start {
        return 0;
    }
    if segment.range_offset == 0 {
        return code_point.wrapping_add(segment.delta as u16);
    }

    let array_index = usize::from(segment.range_offset / 2) + usize::from(code_point - segment.start)
        - (seg_count - index);
    match glyph_id_array[array_index] {
        0 => 0,
        glyph => glyph.wrapping_add(segment.delta as u16),
    }
}
