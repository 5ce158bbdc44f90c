//! Status and tags commands

use crate::app::OutputFormat;
use anyhow::Result;
use vaultdex_core::Engine;

pub fn run(engine: &Engine, format: OutputFormat) -> Result<()> {
    let stats = engine.stats()?;
    let pending = engine.pending_reindex()?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "stats": stats,
                    "pending_reindex": pending,
                }))?
            );
        }
        OutputFormat::Cli => {
            println!("Documents:       {}", stats.document_count);
            println!("  PDF pages:     {}", stats.pdf_page_count);
            println!("Postings:        {}", stats.term_count);
            println!("Distinct terms:  {}", stats.distinct_terms);
            println!();
            match (stats.index_built, stats.built_at) {
                (true, Some(at)) => println!("Index built:     {}", at),
                (true, None) => println!("Index built:     yes"),
                (false, _) => println!("Index built:     no (run `vaultdex index`)"),
            }
            if let Some(request) = pending {
                println!("Pending reindex: {} ({})", request.reason, request.requested_at);
            }
        }
    }
    Ok(())
}

pub fn run_tags(engine: &Engine, format: OutputFormat) -> Result<()> {
    let tags = engine.tags()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tags)?),
        OutputFormat::Cli => {
            if tags.is_empty() {
                println!("No tags");
            }
            for (tag, count) in tags {
                println!("{:>5} #{}", count, tag);
            }
        }
    }
    Ok(())
}
