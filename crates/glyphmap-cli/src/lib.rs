//! glyphmap command-line tool
//!
//! `glyphmap map` prints the segments a string maps to; `glyphmap info`
//! lists the faces the fallback service can see.

pub mod cli;
pub mod commands;
pub mod output;
