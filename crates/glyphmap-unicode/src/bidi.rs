// this_file: crates/glyphmap-unicode/src/bidi.rs

//! Bidi level resolution over UTF-16 text
//!
//! Levels depend on the whole paragraph: a neutral between two Arabic words
//! resolves differently than the same neutral between Latin words. Callers
//! therefore resolve the full text and clip to the range they care about.

use glyphmap_core::types::{BidiRun, ReadingDirection};
use unicode_bidi::{BidiInfo, Level};

use crate::text::Utf16Text;

/// Resolves embedding levels with the Unicode Bidirectional Algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct BidiResolver;

impl BidiResolver {
    pub fn new() -> Self {
        Self
    }

    /// One resolved level per code unit of `text`
    pub fn levels(&self, text: &[u16], direction: ReadingDirection) -> Vec<u8> {
        let text = Utf16Text::new(text);
        if text.is_empty() {
            return Vec::new();
        }

        let base = match direction {
            ReadingDirection::LeftToRight => Level::ltr(),
            ReadingDirection::RightToLeft => Level::rtl(),
        };
        let info = BidiInfo::new(text.as_str(), Some(base));

        (0..text.len_utf16())
            .map(|unit| {
                info.levels
                    .get(text.byte_offset(unit))
                    .map(|level| level.number())
                    .unwrap_or(base.number())
            })
            .collect()
    }

    /// Level runs covering `[offset, offset + length)` of a paragraph
    ///
    /// Levels are resolved against the whole paragraph; only the runs inside
    /// the range are returned, clipped to it.
    pub fn resolve_range(
        &self,
        text: &[u16],
        direction: ReadingDirection,
        offset: u32,
        length: u32,
    ) -> Vec<BidiRun> {
        let levels = self.levels(text, direction);
        let start = (offset as usize).min(levels.len());
        let end = start.saturating_add(length as usize).min(levels.len());
        let explicit_level = direction.base_level();

        let mut runs: Vec<BidiRun> = Vec::new();
        for (index, &level) in levels[start..end].iter().enumerate() {
            let position = (start + index) as u32;
            match runs.last_mut() {
                Some(last) if last.resolved_level == level => last.text_length += 1,
                _ => runs.push(BidiRun {
                    text_start: position,
                    text_length: 1,
                    explicit_level,
                    resolved_level: level,
                }),
            }
        }
        runs
    }
}
