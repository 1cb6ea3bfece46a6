//! Mock services for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    analysis::{utf16_scalars, AnalysisSink, TextAnalysisSource},
    error::{GlyphMapError, Result},
    traits::{FontFace, FontFallback, TextAnalyzer},
    types::*,
};

/// A face covering printable ASCII; glyph id equals the code point
pub struct MockFace {
    id: u64,
}

impl MockFace {
    pub fn latin(id: u64) -> Self {
        Self { id }
    }
}

impl FontFace for MockFace {
    fn id(&self) -> FaceId {
        FaceId(self.id)
    }

    fn family_name(&self) -> &str {
        "Mock Sans"
    }

    fn data(&self) -> &[u8] {
        &[]
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics::default()
    }

    fn glyph_index(&self, ch: char) -> Option<GlyphId> {
        (' '..='~').contains(&ch).then_some(ch as GlyphId)
    }

    fn design_glyph_advance(&self, _glyph: GlyphId) -> Option<i32> {
        Some(500)
    }
}

/// Answers fallback queries from a fixed script of `(face, length)` pairs
pub struct ScriptedFallback {
    script: Vec<(Option<Arc<MockFace>>, u32)>,
    next: AtomicUsize,
    last_base_family: Mutex<Option<Option<String>>>,
    last_resort: Option<Arc<MockFace>>,
}

impl ScriptedFallback {
    pub fn new(script: Vec<(Option<Arc<MockFace>>, u32)>) -> Self {
        Self {
            script,
            next: AtomicUsize::new(0),
            last_base_family: Mutex::new(None),
            last_resort: None,
        }
    }

    pub fn with_last_resort(mut self, face: Arc<MockFace>) -> Self {
        self.last_resort = Some(face);
        self
    }

    pub fn calls(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    pub fn last_base_family(&self) -> Option<Option<String>> {
        self.last_base_family.lock().unwrap().clone()
    }
}

impl FontFallback for ScriptedFallback {
    fn map_characters(
        &self,
        _source: &TextAnalysisSource<'_>,
        _offset: u32,
        _length: u32,
        base_family: Option<&str>,
    ) -> Result<FallbackRun> {
        *self.last_base_family.lock().unwrap() = Some(base_family.map(str::to_string));
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let (face, mapped_length) = self
            .script
            .get(index)
            .cloned()
            .ok_or_else(|| GlyphMapError::platform("fallback script exhausted"))?;
        Ok(FallbackRun {
            face: face.map(|face| face as Arc<dyn FontFace>),
            mapped_length,
            scale: 1.0,
        })
    }

    fn last_resort_face(&self, _base_family: Option<&str>) -> Option<Arc<dyn FontFace>> {
        self.last_resort
            .clone()
            .map(|face| face as Arc<dyn FontFace>)
    }
}

fn is_rtl_char(unit: u16) -> bool {
    (0x0590..0x0900).contains(&unit)
}

/// Strong direction of a unit: `Some(true)` right-to-left, `Some(false)` left-to-right
fn strong_direction(unit: u16) -> Option<bool> {
    if is_rtl_char(unit) {
        Some(true)
    } else if unit < 0x80 && (unit as u8).is_ascii_alphabetic() {
        Some(false)
    } else {
        None
    }
}

fn is_digit(unit: u16) -> bool {
    (0x30..=0x39).contains(&unit)
}

/// A small slice of UAX #9: strong letters, European digits and neutrals
///
/// Digits after right-to-left text sit one level above it; a neutral takes
/// the direction of its neighbours when both agree (digits count as the
/// strong text before them), else the paragraph direction.
pub fn mock_levels(text: &[u16], base: u8) -> Vec<u8> {
    let base_rtl = base % 2 == 1;
    let level_of = |rtl: bool| if rtl == base_rtl { base } else { base + 1 };
    let before = |index: usize| {
        text[..index]
            .iter()
            .rev()
            .find_map(|&unit| strong_direction(unit))
            .unwrap_or(base_rtl)
    };

    (0..text.len())
        .map(|index| {
            let unit = text[index];
            if let Some(rtl) = strong_direction(unit) {
                return level_of(rtl);
            }
            let left = before(index);
            if is_digit(unit) {
                return if left || base_rtl { (base + 2) & !1 } else { base };
            }
            let right = text[index + 1..]
                .iter()
                .find_map(|&unit| {
                    strong_direction(unit).or_else(|| is_digit(unit).then_some(left))
                })
                .unwrap_or(base_rtl);
            level_of(if left == right { left } else { base_rtl })
        })
        .collect()
}

/// Analyzer with toy rules
///
/// ASCII is simple, Hebrew and Arabic blocks are right-to-left, everything
/// else is complex left-to-right. Bidi levels follow [`mock_levels`]. Each code unit shapes to
/// `glyph_multiplier` glyphs.
pub struct MockAnalyzer {
    glyph_multiplier: usize,
    complexity_calls: AtomicUsize,
    bidi_calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            glyph_multiplier: 1,
            complexity_calls: AtomicUsize::new(0),
            bidi_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_glyph_multiplier(mut self, multiplier: usize) -> Self {
        self.glyph_multiplier = multiplier;
        self
    }

    pub fn complexity_calls(&self) -> usize {
        self.complexity_calls.load(Ordering::SeqCst)
    }

    pub fn bidi_calls(&self) -> usize {
        self.bidi_calls.load(Ordering::SeqCst)
    }

    /// Reports maximal runs of equal `key` values over the range
    fn report_runs<K: PartialEq + Copy>(
        text: &[u16],
        offset: u32,
        length: u32,
        key: impl Fn(u16) -> K,
        mut emit: impl FnMut(u32, u32, K),
    ) {
        let end = (offset + length).min(text.len() as u32);
        let mut start = offset;
        while start < end {
            let current = key(text[start as usize]);
            let mut stop = start + 1;
            while stop < end && key(text[stop as usize]) == current {
                stop += 1;
            }
            emit(start, stop - start, current);
            start = stop;
        }
    }
}

impl TextAnalyzer for MockAnalyzer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn text_complexity(&self, text: &[u16], face: &dyn FontFace) -> Result<TextComplexity> {
        self.complexity_calls.fetch_add(1, Ordering::SeqCst);
        let simple = |unit: u16| {
            char::from_u32(unit as u32)
                .and_then(|ch| face.glyph_index(ch))
                .is_some()
        };
        let is_simple = text.first().copied().is_some_and(simple);
        let mapped_length = text
            .iter()
            .take_while(|&&unit| simple(unit) == is_simple)
            .count();
        let glyph_indices = if is_simple {
            text[..mapped_length].to_vec()
        } else {
            Vec::new()
        };
        Ok(TextComplexity {
            is_simple,
            mapped_length: mapped_length as u32,
            glyph_indices,
        })
    }

    fn analyze_script(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        Self::report_runs(source.text(), offset, length, is_rtl_char, |start, len, rtl| {
            let script = if rtl { ScriptTag::new(b"Arab") } else { ScriptTag::LATIN };
            sink.set_script_analysis(
                start,
                len,
                ScriptAnalysis {
                    script,
                    shapes: ScriptShapes::Default,
                },
            );
        });
        Ok(())
    }

    fn analyze_bidi(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        self.bidi_calls.fetch_add(1, Ordering::SeqCst);
        let base = source.paragraph_reading_direction().base_level();
        let levels = mock_levels(source.text(), base);
        let end = (offset + length).min(levels.len() as u32);
        let mut start = offset;
        while start < end {
            let level = levels[start as usize];
            let mut stop = start + 1;
            while stop < end && levels[stop as usize] == level {
                stop += 1;
            }
            sink.set_bidi_level(start, stop - start, base, level);
            start = stop;
        }
        Ok(())
    }

    fn get_glyphs(
        &self,
        text: &[u16],
        face: &dyn FontFace,
        _is_right_to_left: bool,
        _script: ScriptAnalysis,
        _locale: &str,
        max_glyph_count: usize,
    ) -> Result<ShapedGlyphs> {
        let glyph_count = text.len() * self.glyph_multiplier;
        if glyph_count > max_glyph_count {
            return Err(GlyphMapError::InsufficientBuffer {
                capacity: max_glyph_count,
            });
        }

        let mut glyph_indices = Vec::with_capacity(glyph_count);
        let mut cluster_map = Vec::with_capacity(text.len());
        for (_, ch, width) in utf16_scalars(text) {
            let glyph = face.glyph_index(ch).unwrap_or(0);
            for _ in 0..width {
                cluster_map.push(glyph_indices.len() as u16);
            }
            for _ in 0..(width as usize * self.glyph_multiplier) {
                glyph_indices.push(glyph);
            }
        }

        let glyph_props = glyph_indices
            .iter()
            .map(|&glyph| ShapingGlyphProperties {
                is_cluster_start: true,
                design_advance: face.design_glyph_advance(glyph).unwrap_or(0),
                ..Default::default()
            })
            .collect();

        Ok(ShapedGlyphs {
            cluster_map,
            text_props: vec![ShapingTextProperties::default(); text.len()],
            glyph_indices,
            glyph_props,
        })
    }

    fn get_glyph_placements(
        &self,
        _text: &[u16],
        shaped: &ShapedGlyphs,
        face: &dyn FontFace,
        font_size: f32,
        _is_right_to_left: bool,
        _script: ScriptAnalysis,
        _locale: &str,
    ) -> Result<GlyphPlacements> {
        let scale = font_size / face.metrics().design_units_per_em as f32;
        Ok(GlyphPlacements {
            advances: shaped
                .glyph_props
                .iter()
                .map(|props| props.design_advance as f32 * scale)
                .collect(),
            offsets: vec![GlyphOffset::default(); shaped.glyph_count()],
        })
    }
}
