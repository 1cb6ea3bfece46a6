//! Text analysis source and sink
//!
//! The analyzers pull text out of a [`TextAnalysisSource`] and push their
//! findings into an [`AnalysisSink`]. [`AnalysisCollector`] is the sink the
//! mapper uses: it records script and bidi runs and intersects them into
//! runs that are homogeneous in both.

use crate::types::{AnalysisRun, BidiRun, ReadingDirection, ScriptAnalysis, ScriptRun};

/// Read-only view of the logical string handed to the analyzers
#[derive(Debug, Clone, Copy)]
pub struct TextAnalysisSource<'a> {
    text: &'a [u16],
    locale: &'a str,
    reading_direction: ReadingDirection,
}

impl<'a> TextAnalysisSource<'a> {
    pub fn new(text: &'a [u16], locale: &'a str, reading_direction: ReadingDirection) -> Self {
        Self {
            text,
            locale,
            reading_direction,
        }
    }

    /// The whole logical string
    pub fn text(&self) -> &'a [u16] {
        self.text
    }

    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text from `position` to the end; empty past the end
    pub fn text_at_position(&self, position: u32) -> &'a [u16] {
        let position = (position as usize).min(self.text.len());
        &self.text[position..]
    }

    /// Text from the start up to `position`
    pub fn text_before_position(&self, position: u32) -> &'a [u16] {
        let position = (position as usize).min(self.text.len());
        &self.text[..position]
    }

    /// Text in `[start, start + length)`, clamped to the string
    pub fn slice(&self, start: u32, length: u32) -> &'a [u16] {
        let start = (start as usize).min(self.text.len());
        let end = start.saturating_add(length as usize).min(self.text.len());
        &self.text[start..end]
    }

    /// Locale at `position` and how many code units it stays in effect
    pub fn locale_name(&self, position: u32) -> (&'a str, u32) {
        (self.locale, self.len().saturating_sub(position))
    }

    pub fn paragraph_reading_direction(&self) -> ReadingDirection {
        self.reading_direction
    }
}

/// Receives analysis results
pub trait AnalysisSink {
    fn set_script_analysis(&mut self, text_start: u32, text_length: u32, analysis: ScriptAnalysis);

    fn set_bidi_level(
        &mut self,
        text_start: u32,
        text_length: u32,
        explicit_level: u8,
        resolved_level: u8,
    );
}

/// Sink that keeps every reported run
#[derive(Debug, Clone, Default)]
pub struct AnalysisCollector {
    scripts: Vec<ScriptRun>,
    bidi: Vec<BidiRun>,
}

impl AnalysisCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_runs(&self) -> &[ScriptRun] {
        &self.scripts
    }

    pub fn bidi_runs(&self) -> &[BidiRun] {
        &self.bidi
    }

    pub fn clear(&mut self) {
        self.scripts.clear();
        self.bidi.clear();
    }

    /// Splits `[text_start, text_start + text_length)` at every script and
    /// bidi boundary
    ///
    /// Code units nobody reported on get the default script and `base_level`.
    /// The returned runs tile the range exactly.
    pub fn runs(&self, text_start: u32, text_length: u32, base_level: u8) -> Vec<AnalysisRun> {
        let text_end = text_start + text_length;
        if text_length == 0 {
            return Vec::new();
        }

        let mut boundaries = vec![text_start, text_end];
        for run in &self.scripts {
            boundaries.push(run.text_start);
            boundaries.push(run.text_start + run.text_length);
        }
        for run in &self.bidi {
            boundaries.push(run.text_start);
            boundaries.push(run.text_start + run.text_length);
        }
        boundaries.retain(|&b| b >= text_start && b <= text_end);
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut runs: Vec<AnalysisRun> = Vec::with_capacity(boundaries.len());
        for pair in boundaries.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let script = self
                .scripts
                .iter()
                .rev()
                .find(|run| contains(run.text_start, run.text_length, start))
                .map(|run| run.analysis)
                .unwrap_or_default();
            let bidi_level = self
                .bidi
                .iter()
                .rev()
                .find(|run| contains(run.text_start, run.text_length, start))
                .map(|run| run.resolved_level)
                .unwrap_or(base_level);

            // Neighbours that ended up identical merge back together
            if let Some(last) = runs.last_mut() {
                if last.script == script && last.bidi_level == bidi_level {
                    last.text_length += end - start;
                    continue;
                }
            }
            runs.push(AnalysisRun {
                text_start: start,
                text_length: end - start,
                script,
                bidi_level,
            });
        }
        runs
    }
}

fn contains(start: u32, length: u32, position: u32) -> bool {
    position >= start && position < start + length
}

impl AnalysisSink for AnalysisCollector {
    fn set_script_analysis(&mut self, text_start: u32, text_length: u32, analysis: ScriptAnalysis) {
        if text_length == 0 {
            return;
        }
        self.scripts.push(ScriptRun {
            text_start,
            text_length,
            analysis,
        });
    }

    fn set_bidi_level(
        &mut self,
        text_start: u32,
        text_length: u32,
        explicit_level: u8,
        resolved_level: u8,
    ) {
        if text_length == 0 {
            return;
        }
        self.bidi.push(BidiRun {
            text_start,
            text_length,
            explicit_level,
            resolved_level,
        });
    }
}

/// Decodes UTF-16 into scalars with their code unit offsets and widths
///
/// Unpaired surrogates come out as U+FFFD, one code unit wide.
pub fn utf16_scalars(text: &[u16]) -> impl Iterator<Item = (u32, char, u32)> + '_ {
    let mut offset = 0u32;
    char::decode_utf16(text.iter().copied()).map(move |decoded| {
        let (ch, width) = match decoded {
            Ok(ch) => (ch, ch.len_utf16() as u32),
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        let start = offset;
        offset += width;
        (start, ch, width)
    })
}
