//! `glyphmap info`

use anyhow::Result;
use glyphmap::analysis::TextAnalysisSource;
use glyphmap::fallback::FallbackWalker;
use glyphmap::ReadingDirection;

use crate::cli::InfoArgs;

use super::{builder_for, utf16};

pub fn run(args: &InfoArgs) -> Result<()> {
    let fallback = builder_for(&args.fonts).build_fallback()?;

    println!("glyphmap v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Faces: {}", fallback.face_count());
    for face in fallback.database().faces() {
        let family = face
            .families
            .first()
            .map(|(name, _)| name.as_str())
            .unwrap_or("<unnamed>");
        println!("  {family} ({}, index {})", face.post_script_name, face.index);
    }

    let Some(text) = &args.text else {
        return Ok(());
    };

    let units = utf16(text);
    let source = TextAnalysisSource::new(&units, "en-US", ReadingDirection::LeftToRight);
    let mappings = FallbackWalker::new(&fallback, source, args.family.as_deref()).walk()?;

    println!();
    println!("Fallback for {text:?}:");
    for mapping in mappings {
        let range = mapping.text_start as usize..mapping.text_end() as usize;
        let covered = String::from_utf16_lossy(&units[range]);
        match &mapping.face {
            Some(face) => println!(
                "  {}..{} {covered:?} -> {} ({})",
                mapping.text_start,
                mapping.text_end(),
                face.family_name(),
                face.id()
            ),
            None => println!(
                "  {}..{} {covered:?} -> no face",
                mapping.text_start,
                mapping.text_end()
            ),
        }
    }
    Ok(())
}
