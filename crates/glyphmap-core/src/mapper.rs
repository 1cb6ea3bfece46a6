//! The text-to-glyphs mapper
//!
//! Drives one logical string through fallback, classification, analysis,
//! shaping and assembly:
//!
//! ```text
//! text ─► fallback walk ─► (face, range) mappings
//!                              │
//!                              ├─ simple prefix  ─► nominal glyphs + scaled design advances
//!                              └─ complex prefix ─► script + bidi runs ─► get_glyphs ─► placements
//!                                                                            │
//!                              segments keyed by (face, bidi level) ◄────────┘
//! ```
//!
//! Bidi levels are resolved once per paragraph. Nominal glyphs only ever
//! sit at the paragraph level: a simple prefix stops at the first code unit
//! that resolves to another level, and the rest goes down the complex path.
//!
//! A call either returns a complete [`MappingResult`] or an error; a failure
//! halfway through drops every buffer built so far.

use std::sync::Arc;

use crate::{
    analysis::{utf16_scalars, AnalysisCollector, AnalysisSink, TextAnalysisSource},
    assembler::SegmentBuilder,
    config::{MapperConfig, MissingGlyphPolicy},
    error::{GlyphMapError, Result},
    fallback::FallbackWalker,
    traits::{FontFace, FontFallback, TextAnalyzer},
    types::*,
};

/// First glyph-buffer size tried for a run of `char_count` code units
///
/// Leaves room for scripts that produce more glyphs than characters through
/// decomposition or inserted marks.
pub fn initial_glyph_estimate(char_count: usize) -> usize {
    char_count * 3 / 2 + 16
}

/// Scales design-unit advances to `font_size`
///
/// `advance = design_advance * (font_size / units_per_em)`, with the scale
/// computed once.
pub fn scale_design_advances(design_advances: &[i32], font_size: f32, units_per_em: u16) -> Vec<f32> {
    let scale = font_size / units_per_em.max(1) as f32;
    design_advances
        .iter()
        .map(|&advance| advance as f32 * scale)
        .collect()
}

/// Maps logical text to shaped glyph segments
///
/// Holds the two platform services and a configuration. Nothing is cached
/// between calls, so identical inputs on an unchanged font environment give
/// identical output.
#[derive(Clone)]
pub struct GlyphMapper {
    fallback: Arc<dyn FontFallback>,
    analyzer: Arc<dyn TextAnalyzer>,
    config: MapperConfig,
}

impl GlyphMapper {
    pub fn new(fallback: Arc<dyn FontFallback>, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self {
            fallback,
            analyzer,
            config: MapperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn fallback(&self) -> &Arc<dyn FontFallback> {
        &self.fallback
    }

    pub fn analyzer(&self) -> &Arc<dyn TextAnalyzer> {
        &self.analyzer
    }

    /// Maps a left-to-right paragraph of UTF-16 text
    ///
    /// `base_family` may be empty to use the system default. `font_size` is
    /// the em size in the caller's layout units.
    pub fn map_text_to_glyphs(
        &self,
        locale: &str,
        base_family: &str,
        font_size: f32,
        text: &[u16],
    ) -> Result<MappingResult> {
        self.map_paragraph(
            locale,
            base_family,
            font_size,
            text,
            ReadingDirection::LeftToRight,
        )
    }

    /// Same as [`GlyphMapper::map_text_to_glyphs`] with UTF-8 input
    pub fn map_str(
        &self,
        locale: &str,
        base_family: &str,
        font_size: f32,
        text: &str,
    ) -> Result<MappingResult> {
        let utf16: Vec<u16> = text.encode_utf16().collect();
        self.map_text_to_glyphs(locale, base_family, font_size, &utf16)
    }

    /// Maps one paragraph with an explicit reading direction
    pub fn map_paragraph(
        &self,
        locale: &str,
        base_family: &str,
        font_size: f32,
        text: &[u16],
        direction: ReadingDirection,
    ) -> Result<MappingResult> {
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(GlyphMapError::InvalidInput(format!(
                "font size must be positive and finite, got {font_size}"
            )));
        }
        if text.len() > u32::MAX as usize {
            return Err(GlyphMapError::InvalidInput(format!(
                "text of {} code units is too long",
                text.len()
            )));
        }
        if text.is_empty() {
            return Ok(MappingResult::default());
        }

        let source = TextAnalysisSource::new(text, locale, direction);
        let base_family = Some(base_family);
        let mappings = FallbackWalker::new(self.fallback.as_ref(), source, base_family).walk()?;
        log::debug!(
            "Mapping {} code units through {} fallback runs ({})",
            text.len(),
            mappings.len(),
            self.analyzer.name()
        );

        let base_level = direction.base_level();
        let levels = paragraph_levels(self.analyzer.as_ref(), &source, base_level)?;

        let mut pass = MappingPass {
            mapper: self,
            source,
            locale,
            base_family: base_family.filter(|family| !family.trim().is_empty()),
            font_size,
            base_level,
            levels,
            result: MappingResult::default(),
        };

        for mapping in mappings {
            pass.map_fallback_run(mapping)?;
        }

        log::debug!(
            "Mapped {} code units into {} segments, {} glyphs, {} gaps",
            text.len(),
            pass.result.segments.len(),
            pass.result.glyph_count(),
            pass.result.gaps.len()
        );
        Ok(pass.result)
    }
}

/// Resolved bidi level of every code unit of the paragraph
///
/// Units the analyzer reports nothing for stay at `base_level`.
fn paragraph_levels(
    analyzer: &dyn TextAnalyzer,
    source: &TextAnalysisSource<'_>,
    base_level: u8,
) -> Result<Vec<u8>> {
    let mut collector = AnalysisCollector::new();
    analyzer.analyze_bidi(source, 0, source.len(), &mut collector)?;

    let mut levels = vec![base_level; source.len() as usize];
    for run in collector.bidi_runs() {
        let start = (run.text_start as usize).min(levels.len());
        let end = start
            .saturating_add(run.text_length as usize)
            .min(levels.len());
        levels[start..end].fill(run.resolved_level);
    }
    Ok(levels)
}

/// State of one mapping call
struct MappingPass<'a> {
    mapper: &'a GlyphMapper,
    source: TextAnalysisSource<'a>,
    locale: &'a str,
    base_family: Option<&'a str>,
    font_size: f32,
    base_level: u8,
    levels: Vec<u8>,
    result: MappingResult,
}

impl MappingPass<'_> {
    fn map_fallback_run(&mut self, mapping: FallbackMapping) -> Result<()> {
        let (start, length) = (mapping.text_start, mapping.text_length);
        match mapping.face {
            Some(face) => self.shape_face_run(&face, start, length),
            None => self.handle_missing_font(start, length),
        }
    }

    fn handle_missing_font(&mut self, start: u32, length: u32) -> Result<()> {
        match self.mapper.config.missing_glyphs {
            MissingGlyphPolicy::Fail => Err(GlyphMapError::NoFontAvailable {
                text_start: start,
                text_length: length,
            }),
            MissingGlyphPolicy::Notdef => {
                match self.mapper.fallback.last_resort_face(self.base_family) {
                    Some(face) => self.notdef_run(&face, start, length),
                    None => {
                        self.report_gap(start, length);
                        Ok(())
                    },
                }
            },
            MissingGlyphPolicy::Report => {
                self.report_gap(start, length);
                Ok(())
            },
        }
    }

    fn report_gap(&mut self, start: u32, length: u32) {
        log::warn!(
            "No installed font covers text {}..{}; leaving a coverage gap",
            start,
            start + length
        );
        self.result.gaps.push(CoverageGap {
            text_start: start,
            text_length: length,
        });
    }

    /// One `.notdef` glyph per scalar, drawn with a last-resort face
    fn notdef_run(&mut self, face: &Arc<dyn FontFace>, start: u32, length: u32) -> Result<()> {
        let text = self.source.slice(start, length);
        let glyph_count = utf16_scalars(text).count();
        let indices: Vec<GlyphId> = vec![0; glyph_count];
        let design = face.design_glyph_advances(&indices)?;
        let advances =
            scale_design_advances(&design, self.font_size, face.metrics().design_units_per_em);

        let mut builder = SegmentBuilder::new(face.clone(), self.font_size, self.base_level, start);
        builder.push(
            GlyphArray {
                indices,
                advances,
                offsets: vec![GlyphOffset::default(); glyph_count],
            },
            length,
        );
        self.flush(Some(builder));
        Ok(())
    }

    /// Splits one fallback run into simple and complex prefixes
    fn shape_face_run(&mut self, face: &Arc<dyn FontFace>, start: u32, length: u32) -> Result<()> {
        let end = start + length;
        let use_simple_path = self.mapper.config.simple_path && self.base_level == 0;
        let mut open: Option<SegmentBuilder> = None;
        let mut position = start;

        log::debug!(
            "Shaping {}..{} with {} ({})",
            start,
            end,
            face.family_name(),
            face.id()
        );

        while position < end {
            let remaining = end - position;
            let text = self.source.slice(position, remaining);

            let complexity = if use_simple_path {
                self.mapper.analyzer.text_complexity(text, face.as_ref())?
            } else {
                TextComplexity {
                    is_simple: false,
                    mapped_length: remaining,
                    glyph_indices: Vec::new(),
                }
            };

            if complexity.mapped_length == 0 {
                return Err(GlyphMapError::platform(format!(
                    "complexity analysis mapped zero characters at offset {position}"
                )));
            }
            let mut is_simple = complexity.is_simple;
            let mut run_length = complexity.mapped_length.min(remaining);
            if is_simple {
                let at_base = self.level_extent(position, run_length, true);
                if at_base == 0 {
                    is_simple = false;
                    run_length = self.level_extent(position, run_length, false);
                } else {
                    run_length = at_base;
                }
            }

            if is_simple {
                let array = self.simple_glyphs(face, &complexity.glyph_indices, run_length)?;
                self.append(&mut open, face, self.base_level, position, array, run_length);
            } else {
                self.complex_glyphs(&mut open, face, position, run_length)?;
            }

            position += run_length;
        }

        self.flush(open);
        Ok(())
    }

    /// The fast path: nominal glyphs, design advances scaled once
    fn simple_glyphs(
        &self,
        face: &Arc<dyn FontFace>,
        glyph_indices: &[GlyphId],
        run_length: u32,
    ) -> Result<GlyphArray> {
        let count = run_length as usize;
        if glyph_indices.len() < count {
            return Err(GlyphMapError::platform(format!(
                "complexity analysis returned {} glyphs for a simple run of {}",
                glyph_indices.len(),
                count
            )));
        }

        let indices = glyph_indices[..count].to_vec();
        let design = face.design_glyph_advances(&indices)?;
        let advances =
            scale_design_advances(&design, self.font_size, face.metrics().design_units_per_em);

        Ok(GlyphArray {
            indices,
            advances,
            offsets: vec![GlyphOffset::default(); count],
        })
    }

    /// Script and bidi analysis, then two-phase shaping per analysis run
    fn complex_glyphs(
        &mut self,
        open: &mut Option<SegmentBuilder>,
        face: &Arc<dyn FontFace>,
        start: u32,
        length: u32,
    ) -> Result<()> {
        let mapper = self.mapper;
        let analyzer = mapper.analyzer.as_ref();
        let mut collector = AnalysisCollector::new();
        analyzer.analyze_script(&self.source, start, length, &mut collector)?;
        self.report_levels(start, length, &mut collector);

        for run in collector.runs(start, length, self.base_level) {
            let text = self.source.slice(run.text_start, run.text_length);
            let is_rtl = run.is_right_to_left();

            let shaped = self.shape_with_retry(face, text, &run)?;
            let placements = analyzer.get_glyph_placements(
                text,
                &shaped,
                face.as_ref(),
                self.font_size,
                is_rtl,
                run.script,
                self.locale,
            )?;

            let glyph_count = shaped.glyph_count();
            if placements.advances.len() != glyph_count || placements.offsets.len() != glyph_count {
                return Err(GlyphMapError::platform(format!(
                    "placement returned {} advances and {} offsets for {} glyphs",
                    placements.advances.len(),
                    placements.offsets.len(),
                    glyph_count
                )));
            }

            let array = GlyphArray {
                indices: shaped.glyph_indices,
                advances: placements.advances,
                offsets: placements.offsets,
            };
            self.append(open, face, run.bidi_level, run.text_start, array, run.text_length);
        }

        Ok(())
    }

    /// Length of the prefix of `[start, start + length)` whose units are at
    /// the paragraph level (`at_base`) or all away from it (`!at_base`)
    fn level_extent(&self, start: u32, length: u32, at_base: bool) -> u32 {
        let start = start as usize;
        let end = start.saturating_add(length as usize).min(self.levels.len());
        self.levels[start.min(end)..end]
            .iter()
            .take_while(|&&level| (level == self.base_level) == at_base)
            .count() as u32
    }

    /// Replays the paragraph levels of `[start, start + length)` into a sink
    fn report_levels(&self, start: u32, length: u32, sink: &mut dyn AnalysisSink) {
        let end = (start as usize)
            .saturating_add(length as usize)
            .min(self.levels.len());
        let mut run_start = start as usize;
        while run_start < end {
            let level = self.levels[run_start];
            let run_end = self.levels[run_start..end]
                .iter()
                .position(|&other| other != level)
                .map_or(end, |offset| run_start + offset);
            sink.set_bidi_level(
                run_start as u32,
                (run_end - run_start) as u32,
                self.base_level,
                level,
            );
            run_start = run_end;
        }
    }

    /// Calls `get_glyphs`, doubling the buffer on each shortfall
    fn shape_with_retry(
        &self,
        face: &Arc<dyn FontFace>,
        text: &[u16],
        run: &AnalysisRun,
    ) -> Result<ShapedGlyphs> {
        let max_retries = self.mapper.config.max_glyph_retries;
        let mut capacity = initial_glyph_estimate(text.len());
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.mapper.analyzer.get_glyphs(
                text,
                face.as_ref(),
                run.is_right_to_left(),
                run.script,
                self.locale,
                capacity,
            ) {
                Ok(shaped) => return Ok(shaped),
                Err(GlyphMapError::InsufficientBuffer { .. }) if attempts <= max_retries => {
                    log::trace!(
                        "Glyph buffer of {} too small for {}..{}, retrying with {}",
                        capacity,
                        run.text_start,
                        run.text_start + run.text_length,
                        capacity.saturating_mul(2)
                    );
                    capacity = capacity.saturating_mul(2);
                },
                Err(GlyphMapError::InsufficientBuffer { .. }) => {
                    return Err(GlyphMapError::ResourceExhaustion {
                        text_start: run.text_start,
                        text_length: run.text_length,
                        attempts,
                        last_capacity: capacity,
                    });
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Adds glyphs to the open segment, starting a new one on a level change
    fn append(
        &mut self,
        open: &mut Option<SegmentBuilder>,
        face: &Arc<dyn FontFace>,
        bidi_level: u8,
        text_start: u32,
        array: GlyphArray,
        text_length: u32,
    ) {
        if open
            .as_ref()
            .is_some_and(|builder| builder.bidi_level() != bidi_level)
        {
            self.flush(open.take());
        }

        open.get_or_insert_with(|| {
            SegmentBuilder::new(face.clone(), self.font_size, bidi_level, text_start)
        })
        .push(array, text_length);
    }

    fn flush(&mut self, builder: Option<SegmentBuilder>) {
        if let Some(segment) = builder.and_then(SegmentBuilder::finish) {
            log::trace!(
                "Segment {}..{} level {} with {} glyphs",
                segment.text_start,
                segment.text_end(),
                segment.bidi_level,
                segment.glyph_count()
            );
            self.result.segments.push(segment);
        }
    }
}
