// this_file: crates/glyphmap-unicode/src/classify.rs

//! Which characters can skip shaping
//!
//! A character is simple when its nominal glyph, advanced by its design
//! width, is exactly what a shaper would produce: no reordering, no
//! contextual forms, no marks to attach, no direction to resolve.

use icu_properties::{
    props::{GeneralCategory, Script},
    CodePointMapData, CodePointMapDataBorrowed,
};
use unicode_bidi::{bidi_class, BidiClass};

/// Classifies single scalars for the simple path
pub struct SimpleTextClassifier {
    scripts: CodePointMapDataBorrowed<'static, Script>,
    categories: CodePointMapDataBorrowed<'static, GeneralCategory>,
}

impl SimpleTextClassifier {
    pub fn new() -> Self {
        Self {
            scripts: CodePointMapData::<Script>::new(),
            categories: CodePointMapData::<GeneralCategory>::new(),
        }
    }

    /// Whether `ch` renders correctly from its nominal glyph alone
    ///
    /// Characters outside the Basic Multilingual Plane are never simple:
    /// the simple path keeps one glyph per code unit.
    pub fn is_simple_char(&self, ch: char) -> bool {
        if ch.len_utf16() != 1 {
            return false;
        }

        if matches!(
            self.categories.get(ch),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::EnclosingMark
                | GeneralCategory::Format
                | GeneralCategory::Control
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
        ) {
            return false;
        }

        if matches!(
            bidi_class(ch),
            BidiClass::R
                | BidiClass::AL
                | BidiClass::AN
                | BidiClass::NSM
                | BidiClass::LRE
                | BidiClass::LRO
                | BidiClass::RLE
                | BidiClass::RLO
                | BidiClass::PDF
                | BidiClass::LRI
                | BidiClass::RLI
                | BidiClass::FSI
                | BidiClass::PDI
        ) {
            return false;
        }

        match self.scripts.get(ch) {
            Script::Latin
            | Script::Greek
            | Script::Cyrillic
            | Script::Common
            | Script::Han
            | Script::Hiragana
            | Script::Katakana
            | Script::Bopomofo => true,
            // Precomposed syllables only; conjoining jamo need shaping
            Script::Hangul => ('\u{AC00}'..='\u{D7A3}').contains(&ch),
            _ => false,
        }
    }

    /// Whether `ch` joins the character before it into one cluster
    pub fn attaches_to_previous(&self, ch: char) -> bool {
        matches!(
            self.categories.get(ch),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::EnclosingMark
        ) || matches!(ch, '\u{200C}' | '\u{200D}')
    }

    /// Splits off the longest prefix of `text` that is uniformly simple or
    /// uniformly complex
    ///
    /// `has_glyph` reports whether the target face maps a character. A
    /// simple character followed by a mark or joiner counts as complex so the
    /// cluster is shaped as a whole. Unpaired surrogates are complex.
    pub fn classify_prefix(&self, text: &[u16], has_glyph: impl Fn(char) -> bool) -> (bool, usize) {
        let unit_is_simple = |index: usize| {
            let Some(ch) = char::from_u32(text[index] as u32) else {
                return false;
            };
            if !self.is_simple_char(ch) || !has_glyph(ch) {
                return false;
            }
            match text.get(index + 1).and_then(|&next| char::from_u32(next as u32)) {
                Some(next) => !self.attaches_to_previous(next),
                None => true,
            }
        };

        if text.is_empty() {
            return (false, 0);
        }
        let is_simple = unit_is_simple(0);
        let length = 1 + (1..text.len())
            .take_while(|&index| unit_is_simple(index) == is_simple)
            .count();
        (is_simple, length)
    }
}

impl Default for SimpleTextClassifier {
    fn default() -> Self {
        Self::new()
    }
}
