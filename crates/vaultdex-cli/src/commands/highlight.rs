//! Highlight command

use crate::app::{HighlightArgs, OutputFormat};
use crate::output::format_snippet;
use anyhow::Result;
use vaultdex_core::Engine;

pub fn run(args: HighlightArgs, engine: &Engine, format: OutputFormat) -> Result<()> {
    let snippet = engine.snippet(&args.path, &args.keywords)?;
    print!("{}", format_snippet(&args.path, &snippet, format));
    Ok(())
}
