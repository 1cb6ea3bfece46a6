//! Handing segments to a renderer
//!
//! A [`GlyphRun`] is the borrowed view a draw call wants: face, em size,
//! glyph arrays and bidi level. [`BaselineLayout`] walks segments along a
//! baseline and turns them into absolute glyph positions, including the
//! right-to-left pre-advance.

use crate::{
    traits::FontFace,
    types::{GlyphId, GlyphOffset, MappingResult, Segment},
};

/// A segment as a draw call sees it
#[derive(Clone, Copy)]
pub struct GlyphRun<'a> {
    pub face: &'a dyn FontFace,
    pub em_size: f32,
    pub indices: &'a [GlyphId],
    pub advances: &'a [f32],
    pub offsets: &'a [GlyphOffset],
    pub bidi_level: u8,
    pub is_sideways: bool,
}

impl GlyphRun<'_> {
    pub fn is_right_to_left(&self) -> bool {
        self.bidi_level % 2 == 1
    }
}

impl Segment {
    /// Borrows the segment as a horizontal glyph run
    pub fn glyph_run(&self) -> GlyphRun<'_> {
        GlyphRun {
            face: self.face.as_ref(),
            em_size: self.font_size,
            indices: &self.indices,
            advances: &self.advances,
            offsets: &self.offsets,
            bidi_level: self.bidi_level,
            is_sideways: false,
        }
    }
}

/// One glyph at an absolute position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub glyph: GlyphId,
    pub x: f32,
    pub y: f32,
}

/// A segment after layout
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRun {
    /// Pen position the run was drawn from; the right edge for right-to-left runs
    pub origin: (f32, f32),
    pub bidi_level: u8,
    pub glyphs: Vec<PlacedGlyph>,
}

/// A pen moving along one horizontal baseline
///
/// Segments are placed in the order given. y grows downward, so a positive
/// `ascender_offset` moves a glyph up by subtracting from y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaselineLayout {
    pub origin_x: f32,
    pub origin_y: f32,
}

impl BaselineLayout {
    pub fn new(origin_x: f32, origin_y: f32) -> Self {
        Self { origin_x, origin_y }
    }

    /// Places one segment and moves the pen past it
    ///
    /// A right-to-left segment first moves the pen by its full advance. Its
    /// origin is then the right edge and each glyph sits to the left of the
    /// glyphs logically before it.
    pub fn place(&mut self, segment: &Segment) -> PlacedRun {
        let total = segment.total_advance();
        let rtl = segment.is_right_to_left();
        if rtl {
            self.origin_x += total;
        }
        let origin = (self.origin_x, self.origin_y);

        let mut pen = 0.0f32;
        let glyphs = segment
            .indices
            .iter()
            .zip(&segment.advances)
            .zip(&segment.offsets)
            .map(|((&glyph, &advance), offset)| {
                let x = if rtl {
                    pen += advance;
                    origin.0 - pen - offset.advance_offset
                } else {
                    let x = origin.0 + pen + offset.advance_offset;
                    pen += advance;
                    x
                };
                PlacedGlyph {
                    glyph,
                    x,
                    y: origin.1 - offset.ascender_offset,
                }
            })
            .collect();

        if !rtl {
            self.origin_x += total;
        }

        PlacedRun {
            origin,
            bidi_level: segment.bidi_level,
            glyphs,
        }
    }

    /// Places every segment of a mapping result in order
    pub fn layout_line(&mut self, result: &MappingResult) -> Vec<PlacedRun> {
        result.iter().map(|segment| self.place(segment)).collect()
    }
}
