//! `glyphmap map`

use std::io::Read;

use anyhow::{bail, Context, Result};
use glyphmap::{MapperConfig, MissingGlyphPolicy, ReadingDirection};

use crate::cli::{MapArgs, OutputFormat};
use crate::output::{MappingReport, ReportContext};

use super::{builder_for, read_text_file, utf16};

fn input_text(args: &MapArgs) -> Result<String> {
    if let Some(text) = args.text.as_ref().or(args.text_arg.as_ref()) {
        return Ok(text.clone());
    }
    if let Some(path) = &args.text_file {
        return read_text_file(path);
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading text from stdin")?;
    // A trailing newline from `echo` is not part of the paragraph
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

/// Environment defaults with the command-line overrides applied
pub fn mapper_config(args: &MapArgs) -> Result<MapperConfig> {
    let mut config = MapperConfig::from_env();
    if let Some(policy) = &args.missing {
        config = config.with_missing_glyphs(policy.parse::<MissingGlyphPolicy>()?);
    }
    if let Some(retries) = args.max_retries {
        config = config.with_max_glyph_retries(retries);
    }
    if args.no_simple_path {
        config = config.with_simple_path(false);
    }
    Ok(config)
}

pub fn run(args: &MapArgs) -> Result<()> {
    if !args.font_size.is_finite() || args.font_size <= 0.0 {
        bail!("font size must be a positive number, got {}", args.font_size);
    }

    let text = utf16(&input_text(args)?);
    let config = mapper_config(args)?;
    log::info!(
        "Mapping {} code units at {}px (missing glyphs: {})",
        text.len(),
        args.font_size,
        config.missing_glyphs
    );

    let mapper = builder_for(&args.fonts).config(config).build()?;
    let direction = if args.rtl {
        ReadingDirection::RightToLeft
    } else {
        ReadingDirection::LeftToRight
    };
    let result =
        mapper.map_paragraph(&args.locale, &args.family, args.font_size, &text, direction)?;

    let report = MappingReport::new(
        &ReportContext {
            text: &text,
            locale: &args.locale,
            family: &args.family,
            font_size: args.font_size,
            direction,
            positions: args.positions,
        },
        &result,
    );

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.to_text()),
    }
    Ok(())
}
