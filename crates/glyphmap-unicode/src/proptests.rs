// this_file: crates/glyphmap-unicode/src/proptests.rs

use super::*;
use glyphmap_core::ReadingDirection;
use proptest::prelude::*;

fn mixed_text() -> impl Strategy<Value = String> {
    let pieces = prop_oneof![
        "[a-zA-Z ]{1,8}",
        "[0-9.,;!?() ]{1,4}",
        "[\u{05D0}-\u{05EA} ]{1,6}",
        "[\u{0627}-\u{064A}]{1,6}",
        "[\u{0300}-\u{036F}]{1,2}",
        "[\u{1F600}-\u{1F64F}]{1,2}",
        "[\u{4E00}-\u{4E40}]{1,3}",
    ];
    prop::collection::vec(pieces, 0..10).prop_map(|parts| parts.concat())
}

/// (start, length) pairs must tile `[offset, offset + length)` in order
fn assert_tiles(spans: &[(u32, u32)], offset: u32, length: u32) -> std::result::Result<(), TestCaseError> {
    let mut cursor = offset;
    for &(start, len) in spans {
        prop_assert_eq!(start, cursor);
        prop_assert!(len > 0);
        cursor += len;
    }
    prop_assert_eq!(cursor, offset + length);
    Ok(())
}

proptest! {
    #[test]
    fn prop_script_runs_tile_the_range(s in mixed_text(), cut in 0usize..64) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let offset = cut.min(units.len()) as u32;
        let length = units.len() as u32 - offset;
        let runs = ScriptItemizer::new().itemize(&units, offset, length);
        let spans: Vec<(u32, u32)> = runs.iter().map(|r| (r.text_start, r.text_length)).collect();
        assert_tiles(&spans, offset, length)?;
    }

    #[test]
    fn prop_bidi_runs_tile_the_range(s in mixed_text(), rtl in any::<bool>()) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let direction = if rtl { ReadingDirection::RightToLeft } else { ReadingDirection::LeftToRight };
        let runs = BidiResolver::new().resolve_range(&units, direction, 0, units.len() as u32);
        let spans: Vec<(u32, u32)> = runs.iter().map(|r| (r.text_start, r.text_length)).collect();
        assert_tiles(&spans, 0, units.len() as u32)?;
        for pair in runs.windows(2) {
            prop_assert_ne!(pair[0].resolved_level, pair[1].resolved_level);
        }
    }

    #[test]
    fn prop_levels_never_drop_below_base(s in mixed_text(), rtl in any::<bool>()) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let direction = if rtl { ReadingDirection::RightToLeft } else { ReadingDirection::LeftToRight };
        let levels = BidiResolver::new().levels(&units, direction);
        prop_assert_eq!(levels.len(), units.len());
        for level in levels {
            prop_assert!(level >= direction.base_level());
        }
    }

    #[test]
    fn prop_classify_prefix_is_nonempty(s in mixed_text()) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let classifier = SimpleTextClassifier::new();
        let mut position = 0;
        while position < units.len() {
            let (_, length) = classifier.classify_prefix(&units[position..], |_| true);
            prop_assert!(length >= 1);
            position += length;
        }
        prop_assert_eq!(position, units.len());
    }

    #[test]
    fn prop_offset_maps_agree(s in mixed_text()) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let text = Utf16Text::new(&units);
        prop_assert_eq!(text.as_str(), s.as_str());
        for (byte, _) in s.char_indices() {
            prop_assert_eq!(text.byte_offset(text.unit_offset(byte)), byte);
        }
    }
}
