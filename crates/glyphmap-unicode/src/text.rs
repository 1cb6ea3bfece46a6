// this_file: crates/glyphmap-unicode/src/text.rs

//! UTF-16 text viewed through UTF-8 APIs
//!
//! The Rust Unicode crates speak `&str`; the mapper speaks UTF-16 offsets.
//! [`Utf16Text`] converts once and keeps both offset maps.

use icu_segmenter::GraphemeClusterSegmenter;

/// A UTF-16 string with its UTF-8 rendition and offset maps
///
/// Unpaired surrogates become U+FFFD in the UTF-8 copy and keep their one
/// code unit in the UTF-16 view.
#[derive(Debug, Clone)]
pub struct Utf16Text {
    utf8: String,
    /// UTF-8 byte offset of each code unit, plus one entry for the end
    byte_of_unit: Vec<usize>,
    /// UTF-16 offset of each UTF-8 byte, plus one entry for the end
    unit_of_byte: Vec<u32>,
}

impl Utf16Text {
    pub fn new(units: &[u16]) -> Self {
        let mut utf8 = String::with_capacity(units.len());
        let mut byte_of_unit = Vec::with_capacity(units.len() + 1);
        let mut unit_of_byte = Vec::with_capacity(units.len() + 1);

        let mut unit = 0u32;
        for decoded in char::decode_utf16(units.iter().copied()) {
            let (ch, width) = match decoded {
                Ok(ch) => (ch, ch.len_utf16()),
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            for _ in 0..width {
                byte_of_unit.push(utf8.len());
            }
            for _ in 0..ch.len_utf8() {
                unit_of_byte.push(unit);
            }
            utf8.push(ch);
            unit += width as u32;
        }
        byte_of_unit.push(utf8.len());
        unit_of_byte.push(unit);

        Self {
            utf8,
            byte_of_unit,
            unit_of_byte,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.utf8
    }

    /// Length in UTF-16 code units
    pub fn len_utf16(&self) -> u32 {
        (self.byte_of_unit.len() - 1) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.utf8.is_empty()
    }

    /// UTF-8 byte offset of a code unit offset, clamped to the end
    pub fn byte_offset(&self, unit: u32) -> usize {
        let last = self.byte_of_unit.len() - 1;
        self.byte_of_unit[(unit as usize).min(last)]
    }

    /// UTF-16 offset of a UTF-8 byte offset, clamped to the end
    pub fn unit_offset(&self, byte: usize) -> u32 {
        let last = self.unit_of_byte.len() - 1;
        self.unit_of_byte[byte.min(last)]
    }
}

/// Grapheme cluster boundaries in code units, including 0 and the end
pub fn grapheme_boundaries(units: &[u16]) -> Vec<usize> {
    if units.is_empty() {
        return vec![0];
    }
    GraphemeClusterSegmenter::new().segment_utf16(units).collect()
}

/// Length of the grapheme cluster starting at `units[0]`
pub fn first_cluster_len(units: &[u16]) -> usize {
    if units.is_empty() {
        return 0;
    }
    GraphemeClusterSegmenter::new()
        .segment_utf16(units)
        .find(|&boundary| boundary > 0)
        .unwrap_or(units.len())
}
