// this_file: crates/glyphmap-unicode/src/lib.rs

//! Unicode analysis shared across analyzers.
//!
//! Script itemization from the ICU script property, bidi levels from UAX #9,
//! grapheme cluster boundaries and simple-path classification, all over
//! UTF-16 offsets.

pub mod bidi;
pub mod classify;
pub mod script;
pub mod text;

pub use bidi::BidiResolver;
pub use classify::SimpleTextClassifier;
pub use script::{script_tag, ScriptItemizer};
pub use text::{first_cluster_len, grapheme_boundaries, Utf16Text};

use glyphmap_core::{AnalysisSink, Result, TextAnalysisSource};

/// Script and bidi analysis that reports into an [`AnalysisSink`]
///
/// Holds only immutable ICU data, so one instance serves any number of
/// threads.
#[derive(Default)]
pub struct UnicodeAnalysis {
    itemizer: ScriptItemizer,
    bidi: BidiResolver,
    classifier: SimpleTextClassifier,
}

impl UnicodeAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(&self) -> &SimpleTextClassifier {
        &self.classifier
    }

    pub fn itemizer(&self) -> &ScriptItemizer {
        &self.itemizer
    }

    /// Reports script runs for `[offset, offset + length)`
    pub fn analyze_script(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        for run in self.itemizer.itemize(source.text(), offset, length) {
            sink.set_script_analysis(run.text_start, run.text_length, run.analysis);
        }
        Ok(())
    }

    /// Reports bidi level runs for `[offset, offset + length)`
    ///
    /// Levels are resolved over the whole paragraph first.
    pub fn analyze_bidi(
        &self,
        source: &TextAnalysisSource<'_>,
        offset: u32,
        length: u32,
        sink: &mut dyn AnalysisSink,
    ) -> Result<()> {
        let runs = self.bidi.resolve_range(
            source.text(),
            source.paragraph_reading_direction(),
            offset,
            length,
        );
        for run in runs {
            sink.set_bidi_level(
                run.text_start,
                run.text_length,
                run.explicit_level,
                run.resolved_level,
            );
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests;
