//! Search command

use crate::app::{OutputFormat, SearchArgs};
use crate::output::format_search_page;
use anyhow::Result;
use vaultdex_core::{Engine, MatchMode, Operation, PropertyFilter, Snippet};

pub fn run(args: SearchArgs, engine: &Engine, format: OutputFormat) -> Result<()> {
    let operation = build_operation(&args)?;
    let mode = args.any.then_some(MatchMode::Any);

    let page = engine.search(std::slice::from_ref(&operation), mode, args.page, args.limit)?;

    let snippets: Vec<Option<Snippet>> = if args.highlight {
        page.results
            .items
            .iter()
            .map(|r| match engine.snippet(&r.document.path, &operation.keywords) {
                Ok(snippet) => Some(snippet),
                Err(e) => {
                    tracing::warn!("No snippet for {}: {}", r.document.path, e);
                    None
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    print!("{}", format_search_page(&page, &snippets, format));
    Ok(())
}

fn build_operation(args: &SearchArgs) -> Result<Operation> {
    let properties = args
        .properties
        .iter()
        .map(|p| PropertyFilter::parse(p))
        .collect::<vaultdex_core::Result<Vec<_>>>()?;

    Ok(Operation {
        keywords: args.keywords.clone(),
        filenames: args.filenames.clone(),
        folders: args.folders.clone(),
        properties,
    })
}
