//! Properties every mapping result must satisfy, checked against mock services

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glyphmap_core::analysis::utf16_scalars;
use glyphmap_core::mapper::initial_glyph_estimate;
use glyphmap_core::*;
use proptest::prelude::*;

/// Covers the code points in `[low, high]`; glyph id = code point - low + 1
struct RangeFace {
    id: u64,
    low: u32,
    high: u32,
    advance: i32,
    upem: u16,
}

impl FontFace for RangeFace {
    fn id(&self) -> FaceId {
        FaceId(self.id)
    }

    fn family_name(&self) -> &str {
        "Range"
    }

    fn data(&self) -> &[u8] {
        &[]
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics {
            design_units_per_em: self.upem,
            ..FontMetrics::default()
        }
    }

    fn glyph_index(&self, ch: char) -> Option<GlyphId> {
        let cp = ch as u32;
        (self.low..=self.high)
            .contains(&cp)
            .then(|| (cp - self.low + 1) as GlyphId)
    }

    fn design_glyph_advance(&self, glyph: GlyphId) -> Option<i32> {
        (glyph != 0).then_some(self.advance)
    }
}

fn latin_face() -> Arc<RangeFace> {
    Arc::new(RangeFace {
        id: 1,
        low: 0x20,
        high: 0x7E,
        advance: 1229,
        upem: 2048,
    })
}

fn hebrew_face() -> Arc<RangeFace> {
    Arc::new(RangeFace {
        id: 2,
        low: 0x05D0,
        high: 0x05EA,
        advance: 600,
        upem: 1000,
    })
}

/// Picks the first face covering the first scalar, then extends while it keeps covering
struct CoverageFallback {
    faces: Vec<Arc<RangeFace>>,
}

impl FontFallback for CoverageFallback {
    fn map_characters(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        _base_family: Option<&str>,
    ) -> Result<FallbackRun> {
        let text = source.slice(offset, length);
        let covering = |ch: char| self.faces.iter().find(|face| face.glyph_index(ch).is_some());

        let mut scalars = utf16_scalars(text);
        let Some((_, first, first_width)) = scalars.next() else {
            return Err(GlyphMapError::InvalidInput("empty fallback query".into()));
        };
        let face = covering(first);
        let mut mapped = first_width;
        for (_, ch, width) in scalars {
            if covering(ch).map(|f| f.id) != face.map(|f| f.id) {
                break;
            }
            mapped += width;
        }

        Ok(FallbackRun {
            face: face.map(|face| face.clone() as Arc<dyn FontFace>),
            mapped_length: mapped,
            scale: 1.0,
        })
    }
}

fn is_hebrew(unit: u16) -> bool {
    (0x0590..0x0600).contains(&unit)
}

/// ASCII letters and spaces are simple; Hebrew is right-to-left
struct ToyAnalyzer {
    glyphs_per_unit: usize,
    get_glyphs_calls: AtomicUsize,
}

impl ToyAnalyzer {
    fn new(glyphs_per_unit: usize) -> Self {
        Self {
            glyphs_per_unit,
            get_glyphs_calls: AtomicUsize::new(0),
        }
    }

    fn runs(text: &[u16], offset: u32, length: u32, mut emit: impl FnMut(u32, u32, bool)) {
        let end = offset + length;
        let mut start = offset;
        while start < end {
            let rtl = is_hebrew(text[start as usize]);
            let mut stop = start + 1;
            while stop < end && is_hebrew(text[stop as usize]) == rtl {
                stop += 1;
            }
            emit(start, stop - start, rtl);
            start = stop;
        }
    }
}

impl TextAnalyzer for ToyAnalyzer {
    fn name(&self) -> &'static str {
        "toy"
    }

    fn text_complexity(&self, text: &[u16], face: &dyn FontFace) -> Result<TextComplexity> {
        let simple = |unit: u16| {
            (unit as u8 as u16 == unit)
                && (unit as u8).is_ascii_alphanumeric()
                && face.glyph_index(unit as u8 as char).is_some()
        };
        let is_simple = simple(text[0]);
        let len = text.iter().take_while(|&&u| simple(u) == is_simple).count();
        Ok(TextComplexity {
            is_simple,
            mapped_length: len as u32,
            glyph_indices: if is_simple {
                text[..len]
                    .iter()
                    .map(|&u| face.glyph_index(u as u8 as char).unwrap_or(0))
                    .collect()
            } else {
                Vec::new()
            },
        })
    }

    fn analyze_script(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        Self::runs(source.text(), offset, length, |start, len, rtl| {
            let script = if rtl { ScriptTag::new(b"Hebr") } else { ScriptTag::LATIN };
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
        let base = source.paragraph_reading_direction().base_level();
        Self::runs(source.text(), offset, length, |start, len, rtl| {
            let level = if rtl == (base == 1) { base } else { base + 1 };
            sink.set_bidi_level(start, len, base, level);
        });
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
        self.get_glyphs_calls.fetch_add(1, Ordering::SeqCst);
        let count = text.len() * self.glyphs_per_unit;
        if count > max_glyph_count {
            return Err(GlyphMapError::InsufficientBuffer {
                capacity: max_glyph_count,
            });
        }
        let mut glyph_indices = Vec::with_capacity(count);
        for (_, ch, width) in utf16_scalars(text) {
            let glyph = face.glyph_index(ch).unwrap_or(0);
            glyph_indices.extend(std::iter::repeat(glyph).take(width as usize * self.glyphs_per_unit));
        }
        let glyph_props = glyph_indices
            .iter()
            .map(|&g| ShapingGlyphProperties {
                is_cluster_start: true,
                design_advance: face.design_glyph_advance(g).unwrap_or(0),
                ..Default::default()
            })
            .collect();
        Ok(ShapedGlyphs {
            cluster_map: (0..text.len())
                .map(|i| (i * self.glyphs_per_unit) as u16)
                .collect(),
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
                .map(|p| p.design_advance as f32 * scale)
                .collect(),
            offsets: vec![GlyphOffset::default(); shaped.glyph_count()],
        })
    }
}

fn mapper_with(analyzer: Arc<ToyAnalyzer>) -> GlyphMapper {
    GlyphMapper::new(
        Arc::new(CoverageFallback {
            faces: vec![latin_face(), hebrew_face()],
        }),
        analyzer,
    )
}

fn mapper() -> GlyphMapper {
    mapper_with(Arc::new(ToyAnalyzer::new(1)))
}

fn utf16(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Segments and gaps tile `[0, len)` in order, without overlap
fn assert_tiles(result: &MappingResult, len: u32) {
    let mut spans: Vec<(u32, u32)> = result
        .segments
        .iter()
        .map(|s| (s.text_start, s.text_end()))
        .chain(result.gaps.iter().map(|g| (g.text_start, g.text_start + g.text_length)))
        .collect();
    spans.sort_unstable();
    let mut cursor = 0;
    for (start, end) in spans {
        assert_eq!(start, cursor, "hole or overlap at {cursor}");
        assert!(end > start);
        cursor = end;
    }
    assert_eq!(cursor, len);
}

fn assert_homogeneous(result: &MappingResult) {
    for segment in result {
        assert_eq!(segment.indices.len(), segment.advances.len());
        assert_eq!(segment.indices.len(), segment.offsets.len());
        assert!(segment.glyph_count() > 0);
    }
}

#[test]
fn hello_world_is_one_segment() {
    let text = utf16("Hello->world");
    let result = mapper().map_text_to_glyphs("en-US", "Range", 16.0, &text).unwrap();
    assert_tiles(&result, text.len() as u32);
    assert_homogeneous(&result);
    assert_eq!(result.len(), 1);
    assert_eq!(result.segments[0].bidi_level, 0);
    assert_eq!(result.glyph_count(), text.len());
}

#[test]
fn simple_path_scales_design_advances() {
    let text = utf16("abc");
    let result = mapper().map_text_to_glyphs("en-US", "", 16.0, &text).unwrap();
    let segment = &result.segments[0];
    assert_eq!(segment.indices, vec![0x61 - 0x20 + 1, 0x62 - 0x20 + 1, 0x63 - 0x20 + 1]);
    let expected = 1229.0 * (16.0 / 2048.0);
    for advance in &segment.advances {
        assert!((advance - expected).abs() < 1e-4);
    }
}

#[test]
fn embedded_rtl_splits_into_three_segments() {
    let text = utf16("A\u{05D0}\u{05D1}B");
    let result = mapper().map_text_to_glyphs("en-US", "Range", 16.0, &text).unwrap();
    assert_tiles(&result, 4);
    assert_homogeneous(&result);

    let levels: Vec<u8> = result.iter().map(|s| s.bidi_level).collect();
    assert_eq!(levels, vec![0, 1, 0]);
    assert_eq!(result.segments[1].face_id(), FaceId(2));
    assert!(result.segments[1].is_right_to_left());
}

#[test]
fn rtl_paragraph_routes_latin_through_complex_path() {
    let analyzer = Arc::new(ToyAnalyzer::new(1));
    let text = utf16("abc");
    let result = mapper_with(analyzer.clone())
        .map_paragraph("he", "Range", 16.0, &text, ReadingDirection::RightToLeft)
        .unwrap();
    assert_eq!(analyzer.get_glyphs_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.segments[0].bidi_level, 2);
}

#[test]
fn uncovered_text_becomes_a_gap() {
    let text = utf16("ab\u{4E00}cd");
    let result = mapper().map_text_to_glyphs("en-US", "Range", 16.0, &text).unwrap();
    assert_tiles(&result, 5);
    assert_eq!(
        result.gaps,
        vec![CoverageGap {
            text_start: 2,
            text_length: 1
        }]
    );
}

#[test]
fn retries_succeed_at_the_last_doubling() {
    // First estimate for 2 units is 19; 19 << 8 = 4864 fits 2 * 2400 glyphs
    let analyzer = Arc::new(ToyAnalyzer::new(2400));
    let text = utf16("\u{05D0}\u{05D1}");
    let result = mapper_with(analyzer.clone())
        .map_text_to_glyphs("he", "Range", 16.0, &text)
        .unwrap();
    assert_eq!(result.glyph_count(), 4800);
    assert_eq!(analyzer.get_glyphs_calls.load(Ordering::SeqCst), 9);
    assert!(4800 <= initial_glyph_estimate(2) << 8);
}

#[test]
fn retries_fail_cleanly_beyond_the_bound() {
    let analyzer = Arc::new(ToyAnalyzer::new(2500));
    let text = utf16("\u{05D0}\u{05D1}");
    let result = mapper_with(analyzer.clone()).map_text_to_glyphs("he", "Range", 16.0, &text);
    assert!(matches!(
        result,
        Err(GlyphMapError::ResourceExhaustion {
            text_start: 0,
            text_length: 2,
            attempts: 9,
            ..
        })
    ));
    assert_eq!(analyzer.get_glyphs_calls.load(Ordering::SeqCst), 9);
}

#[test]
fn fewer_retries_are_configurable() {
    let analyzer = Arc::new(ToyAnalyzer::new(40));
    let text = utf16("\u{05D0}");
    let result = mapper_with(analyzer.clone())
        .with_config(MapperConfig::default().with_max_glyph_retries(0))
        .map_text_to_glyphs("he", "Range", 16.0, &text);
    assert!(matches!(result, Err(GlyphMapError::ResourceExhaustion { attempts: 1, .. })));
}

fn text_strategy() -> impl Strategy<Value = String> {
    let pieces = prop_oneof![
        "[a-zA-Z0-9]{1,6}",
        "[ .,!?-]{1,3}",
        "[\u{05D0}-\u{05EA}]{1,5}",
        "[\u{4E00}-\u{4E10}]{1,2}",
    ];
    prop::collection::vec(pieces, 0..8).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn results_tile_the_input(text in text_strategy(), size in 1.0f32..96.0) {
        let utf16 = utf16(&text);
        let result = mapper().map_text_to_glyphs("en-US", "Range", size, &utf16).unwrap();
        assert_tiles(&result, utf16.len() as u32);
        assert_homogeneous(&result);
    }

    #[test]
    fn mapping_is_deterministic(text in text_strategy()) {
        let utf16 = utf16(&text);
        let a = mapper().map_text_to_glyphs("en-US", "Range", 12.0, &utf16).unwrap();
        let b = mapper().map_text_to_glyphs("en-US", "Range", 12.0, &utf16).unwrap();
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert_eq!(&x.indices, &y.indices);
            prop_assert_eq!(&x.advances, &y.advances);
            prop_assert_eq!(x.bidi_level, y.bidi_level);
            prop_assert_eq!(x.text_start, y.text_start);
        }
        prop_assert_eq!(a.gaps, b.gaps);
    }

    #[test]
    fn adjacent_segments_differ(text in text_strategy()) {
        let utf16 = utf16(&text);
        let result = mapper().map_text_to_glyphs("en-US", "Range", 12.0, &utf16).unwrap();
        for pair in result.segments.windows(2) {
            let touching = pair[0].text_end() == pair[1].text_start;
            if touching && pair[0].face_id() == pair[1].face_id() {
                prop_assert_ne!(pair[0].bidi_level, pair[1].bidi_level);
            }
        }
    }
}
