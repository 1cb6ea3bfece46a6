//! Serializable view of a mapping result

use glyphmap::{BaselineLayout, MappingResult, ReadingDirection, Segment};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MappingReport {
    pub text: String,
    pub locale: String,
    pub family: String,
    pub font_size: f32,
    pub direction: &'static str,
    pub glyph_count: usize,
    pub segments: Vec<SegmentReport>,
    pub gaps: Vec<GapReport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub face_id: u64,
    pub family: String,
    pub bidi_level: u8,
    pub text_start: u32,
    pub text_length: u32,
    pub text: String,
    pub glyphs: Vec<u16>,
    pub advances: Vec<f32>,
    /// `[advance_offset, ascender_offset]` per glyph
    pub offsets: Vec<[f32; 2]>,
    pub total_advance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<PositionReport>>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub glyph: u16,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct GapReport {
    pub text_start: u32,
    pub text_length: u32,
}

/// Request parameters echoed back in the report
pub struct ReportContext<'a> {
    pub text: &'a [u16],
    pub locale: &'a str,
    pub family: &'a str,
    pub font_size: f32,
    pub direction: ReadingDirection,
    pub positions: bool,
}

fn slice_text(text: &[u16], start: u32, length: u32) -> String {
    let start = (start as usize).min(text.len());
    let end = (start + length as usize).min(text.len());
    String::from_utf16_lossy(&text[start..end])
}

fn segment_report(text: &[u16], segment: &Segment) -> SegmentReport {
    SegmentReport {
        face_id: segment.face_id().0,
        family: segment.face.family_name().to_string(),
        bidi_level: segment.bidi_level,
        text_start: segment.text_start,
        text_length: segment.text_length,
        text: slice_text(text, segment.text_start, segment.text_length),
        glyphs: segment.indices.clone(),
        advances: segment.advances.clone(),
        offsets: segment
            .offsets
            .iter()
            .map(|o| [o.advance_offset, o.ascender_offset])
            .collect(),
        total_advance: segment.total_advance(),
        positions: None,
    }
}

impl MappingReport {
    pub fn new(ctx: &ReportContext<'_>, result: &MappingResult) -> Self {
        let mut segments: Vec<SegmentReport> = result
            .iter()
            .map(|segment| segment_report(ctx.text, segment))
            .collect();

        if ctx.positions {
            let runs = BaselineLayout::new(0.0, 0.0).layout_line(result);
            for (report, run) in segments.iter_mut().zip(runs) {
                report.positions = Some(
                    run.glyphs
                        .iter()
                        .map(|g| PositionReport {
                            glyph: g.glyph,
                            x: g.x,
                            y: g.y,
                        })
                        .collect(),
                );
            }
        }

        Self {
            text: String::from_utf16_lossy(ctx.text),
            locale: ctx.locale.to_string(),
            family: ctx.family.to_string(),
            font_size: ctx.font_size,
            direction: match ctx.direction {
                ReadingDirection::LeftToRight => "ltr",
                ReadingDirection::RightToLeft => "rtl",
            },
            glyph_count: result.glyph_count(),
            segments,
            gaps: result
                .gaps
                .iter()
                .map(|gap| GapReport {
                    text_start: gap.text_start,
                    text_length: gap.text_length,
                })
                .collect(),
        }
    }

    /// Human-readable rendering, one block per segment
    pub fn to_text(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} segment(s), {} glyph(s), {} gap(s) at {}px ({})",
            self.segments.len(),
            self.glyph_count,
            self.gaps.len(),
            self.font_size,
            self.direction
        );
        for (index, segment) in self.segments.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{index}] {} (face#{}) level {} text {}..{} {:?}",
                segment.family,
                segment.face_id,
                segment.bidi_level,
                segment.text_start,
                segment.text_start + segment.text_length,
                segment.text
            );
            let _ = writeln!(out, "    glyphs:   {:?}", segment.glyphs);
            let _ = writeln!(out, "    advances: {:?}", segment.advances);
            if segment.offsets.iter().any(|o| o[0] != 0.0 || o[1] != 0.0) {
                let _ = writeln!(out, "    offsets:  {:?}", segment.offsets);
            }
            if let Some(positions) = &segment.positions {
                let points: Vec<(f32, f32)> = positions.iter().map(|p| (p.x, p.y)).collect();
                let _ = writeln!(out, "    at:       {points:?}");
            }
        }
        for gap in &self.gaps {
            let _ = writeln!(
                out,
                "gap: text {}..{} has no covering face",
                gap.text_start,
                gap.text_start + gap.text_length
            );
        }
        out
    }
}
