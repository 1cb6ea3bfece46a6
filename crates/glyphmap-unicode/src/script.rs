// this_file: crates/glyphmap-unicode/src/script.rs

//! Script itemization
//!
//! Splits text into runs of one script. Common and inherited characters
//! (spaces, punctuation, combining marks) join the run around them instead
//! of starting their own, and a run that opens with them takes the script of
//! the first real letter that follows.

use glyphmap_core::{
    analysis::utf16_scalars,
    types::{ScriptAnalysis, ScriptRun, ScriptShapes, ScriptTag},
};
use icu_properties::{props::Script, CodePointMapData, CodePointMapDataBorrowed};

/// Script lookup backed by ICU data baked into the binary
pub struct ScriptItemizer {
    script_map: CodePointMapDataBorrowed<'static, Script>,
}

impl ScriptItemizer {
    pub fn new() -> Self {
        Self {
            script_map: CodePointMapData::<Script>::new(),
        }
    }

    /// The Unicode script property of one character
    pub fn script_of(&self, ch: char) -> Script {
        self.script_map.get(ch)
    }

    /// Script runs over `text[offset..offset + length]`, offsets absolute
    pub fn itemize(&self, text: &[u16], offset: u32, length: u32) -> Vec<ScriptRun> {
        let start = (offset as usize).min(text.len());
        let end = start.saturating_add(length as usize).min(text.len());
        let slice = &text[start..end];

        let mut runs = Vec::new();
        let mut run_start = offset;
        let mut run_script: Option<Script> = None;
        let mut run_hidden: Option<bool> = None;

        for (relative, ch, _) in utf16_scalars(slice) {
            let position = offset + relative;
            let script = self.script_of(ch);
            let hidden = is_no_visual(ch);
            let significant = is_significant(script);

            let changed = run_hidden.is_some_and(|h| h != hidden)
                || (!hidden && significant && run_script.is_some_and(|s| s != script));
            if changed && position > run_start {
                runs.push(build_run(run_start, position, run_script, run_hidden));
                run_start = position;
                run_script = None;
            }

            run_hidden = Some(hidden);
            if run_script.is_none() && significant && !hidden {
                run_script = Some(script);
            }
        }

        let run_end = offset + slice.len() as u32;
        if run_end > run_start {
            runs.push(build_run(run_start, run_end, run_script, run_hidden));
        }
        runs
    }
}

impl Default for ScriptItemizer {
    fn default() -> Self {
        Self::new()
    }
}

fn build_run(start: u32, end: u32, script: Option<Script>, hidden: Option<bool>) -> ScriptRun {
    ScriptRun {
        text_start: start,
        text_length: end - start,
        analysis: ScriptAnalysis {
            script: script_tag(script.unwrap_or(Script::Common)),
            shapes: if hidden.unwrap_or(false) {
                ScriptShapes::NoVisual
            } else {
                ScriptShapes::Default
            },
        },
    }
}

/// Control characters shape but draw nothing; tab keeps its advance
fn is_no_visual(ch: char) -> bool {
    ch.is_control() && ch != '\t'
}

pub fn is_significant(script: Script) -> bool {
    !matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

/// ISO 15924 code for an ICU script value
///
/// Scripts outside this table come back as `Zzzz`; shapers guess those
/// from the text itself.
pub fn script_tag(script: Script) -> ScriptTag {
    // ICU 2.x keeps the name mapper private, hence the table
    let tag: &[u8; 4] = match script {
        Script::Common => b"Zyyy",
        Script::Inherited => b"Zinh",
        Script::Arabic => b"Arab",
        Script::Armenian => b"Armn",
        Script::Bengali => b"Beng",
        Script::Bopomofo => b"Bopo",
        Script::Cherokee => b"Cher",
        Script::Cyrillic => b"Cyrl",
        Script::Devanagari => b"Deva",
        Script::Georgian => b"Geor",
        Script::Greek => b"Grek",
        Script::Gujarati => b"Gujr",
        Script::Gurmukhi => b"Guru",
        Script::Han => b"Hani",
        Script::Hangul => b"Hang",
        Script::Hebrew => b"Hebr",
        Script::Hiragana => b"Hira",
        Script::Kannada => b"Knda",
        Script::Katakana => b"Kana",
        Script::Khmer => b"Khmr",
        Script::Lao => b"Laoo",
        Script::Latin => b"Latn",
        Script::Malayalam => b"Mlym",
        Script::Mongolian => b"Mong",
        Script::Myanmar => b"Mymr",
        Script::Oriya => b"Orya",
        Script::Sinhala => b"Sinh",
        Script::Syriac => b"Syrc",
        Script::Tamil => b"Taml",
        Script::Telugu => b"Telu",
        Script::Thaana => b"Thaa",
        Script::Thai => b"Thai",
        Script::Tibetan => b"Tibt",
        _ => b"Zzzz",
    };
    ScriptTag::new(tag)
}

