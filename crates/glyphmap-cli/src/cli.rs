//! Argument parsing for the `glyphmap` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "glyphmap")]
#[command(version, about = "Map text to font faces and positioned glyphs", long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map text to glyph segments
    #[command(alias = "m")]
    Map(Box<MapArgs>),

    /// List available faces and show which one covers each run of text
    #[command(alias = "i")]
    Info(InfoArgs),
}

/// Font sources shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct FontArgs {
    /// Extra font file to load (repeatable)
    #[arg(short = 'f', long = "font-file")]
    pub font_files: Vec<PathBuf>,

    /// Do not load installed system fonts
    #[arg(long = "no-system-fonts")]
    pub no_system_fonts: bool,

    /// Family tried before database order when the base family lacks a character (repeatable)
    #[arg(long = "fallback-family")]
    pub fallback_families: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Text to map (reads stdin when no text source is given)
    #[arg(conflicts_with_all = ["text_arg", "text_file"])]
    pub text: Option<String>,

    /// Text to map, as an option
    #[arg(short = 't', long = "text", id = "text_arg", conflicts_with = "text_file")]
    pub text_arg: Option<String>,

    /// Read the text from a file
    #[arg(short = 'T', long = "text-file", id = "text_file")]
    pub text_file: Option<PathBuf>,

    #[command(flatten)]
    pub fonts: FontArgs,

    /// Preferred family; empty means the system default
    #[arg(short = 'F', long = "family", default_value = "")]
    pub family: String,

    /// Em size in pixels
    #[arg(short = 's', long = "font-size", default_value_t = 16.0)]
    pub font_size: f32,

    /// BCP 47 locale of the text
    #[arg(short = 'l', long = "locale", default_value = "en-US")]
    pub locale: String,

    /// Lay the paragraph out right to left
    #[arg(long = "rtl")]
    pub rtl: bool,

    /// What to do with characters no face covers: report, notdef or fail
    #[arg(long = "missing")]
    pub missing: Option<String>,

    /// Glyph-buffer doublings allowed after the first estimate
    #[arg(long = "max-retries")]
    pub max_retries: Option<u32>,

    /// Shape everything, even text the nominal-glyph path could handle
    #[arg(long = "no-simple-path")]
    pub no_simple_path: bool,

    /// Include baseline positions for every glyph
    #[arg(long = "positions")]
    pub positions: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub fonts: FontArgs,

    /// Show the face chosen for each run of this text
    #[arg(long = "text")]
    pub text: Option<String>,

    /// Base family for the fallback walk over --text
    #[arg(short = 'F', long = "family")]
    pub family: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
