//! Segment assembly
//!
//! Shaping produces one [`GlyphArray`] per simple or complex run. A segment
//! collects those arrays while it is open and, once a boundary is crossed,
//! copies them into exactly-sized contiguous arrays in encounter order.

use std::sync::Arc;

use crate::{
    traits::FontFace,
    types::{GlyphArray, Segment},
};

/// Accumulates glyph arrays for the currently open segment
pub struct SegmentBuilder {
    face: Arc<dyn FontFace>,
    font_size: f32,
    bidi_level: u8,
    text_start: u32,
    text_length: u32,
    arrays: Vec<GlyphArray>,
    glyph_count: usize,
}

impl SegmentBuilder {
    pub fn new(face: Arc<dyn FontFace>, font_size: f32, bidi_level: u8, text_start: u32) -> Self {
        Self {
            face,
            font_size,
            bidi_level,
            text_start,
            text_length: 0,
            arrays: Vec::new(),
            glyph_count: 0,
        }
    }

    pub fn bidi_level(&self) -> u8 {
        self.bidi_level
    }

    pub fn text_end(&self) -> u32 {
        self.text_start + self.text_length
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    /// Appends the glyphs shaped from the next `text_length` code units
    pub fn push(&mut self, array: GlyphArray, text_length: u32) {
        self.text_length += text_length;
        self.glyph_count += array.len();
        if !array.is_empty() {
            self.arrays.push(array);
        }
    }

    /// Merges the collected arrays into a segment
    ///
    /// Returns `None` when no glyphs were collected.
    pub fn finish(self) -> Option<Segment> {
        if self.glyph_count == 0 {
            if self.text_length > 0 {
                log::debug!(
                    "Dropping empty segment for text {}..{}",
                    self.text_start,
                    self.text_end()
                );
            }
            return None;
        }

        let total = self.glyph_count;
        let mut indices = Vec::with_capacity(total);
        let mut advances = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(total);

        for array in self.arrays {
            indices.extend_from_slice(&array.indices);
            advances.extend_from_slice(&array.advances);
            offsets.extend_from_slice(&array.offsets);
        }

        Some(Segment {
            face: self.face,
            font_size: self.font_size,
            bidi_level: self.bidi_level,
            text_start: self.text_start,
            text_length: self.text_length,
            indices,
            advances,
            offsets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFace;
    use crate::types::GlyphOffset;

    fn array(indices: &[u16], advance: f32) -> GlyphArray {
        GlyphArray {
            indices: indices.to_vec(),
            advances: vec![advance; indices.len()],
            offsets: vec![GlyphOffset::default(); indices.len()],
        }
    }

    #[test]
    fn concatenates_in_encounter_order() {
        let mut builder = SegmentBuilder::new(Arc::new(MockFace::latin(1)), 16.0, 0, 3);
        builder.push(array(&[1, 2], 5.0), 2);
        builder.push(array(&[3], 7.0), 1);
        builder.push(array(&[4, 5, 6], 9.0), 4);

        let segment = builder.finish().unwrap();
        assert_eq!(segment.indices, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(segment.advances, vec![5.0, 5.0, 7.0, 9.0, 9.0, 9.0]);
        assert_eq!(segment.offsets.len(), 6);
        assert_eq!(segment.glyph_count(), 6);
        assert_eq!(segment.text_start, 3);
        assert_eq!(segment.text_length, 7);
    }

    #[test]
    fn empty_builder_yields_nothing() {
        let builder = SegmentBuilder::new(Arc::new(MockFace::latin(1)), 16.0, 1, 0);
        assert!(builder.finish().is_none());
    }

    #[test]
    fn empty_arrays_still_extend_the_text_range() {
        let mut builder = SegmentBuilder::new(Arc::new(MockFace::latin(1)), 16.0, 0, 0);
        builder.push(GlyphArray::default(), 2);
        builder.push(array(&[9], 1.0), 1);
        let segment = builder.finish().unwrap();
        assert_eq!(segment.text_length, 3);
        assert_eq!(segment.indices, vec![9]);
    }
}
