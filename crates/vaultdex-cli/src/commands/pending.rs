//! Pending reindex commands

use super::index::run_with_progress;
use crate::app::{OutputFormat, PendingAction, PendingArgs};
use crate::output::format_report;
use anyhow::Result;
use vaultdex_core::Engine;

pub async fn run(args: PendingArgs, engine: Engine, format: OutputFormat) -> Result<Engine> {
    match args.action {
        PendingAction::Show => {
            let pending = engine.pending_reindex()?;
            match (format, pending) {
                (OutputFormat::Json, pending) => {
                    println!("{}", serde_json::to_string_pretty(&pending)?)
                }
                (OutputFormat::Cli, Some(request)) => {
                    println!("Reason:     {}", request.reason);
                    println!("Requested:  {}", request.requested_at);
                    println!("Force:      {}", request.force);
                }
                (OutputFormat::Cli, None) => println!("No pending reindex"),
            }
            Ok(engine)
        }
        PendingAction::Request { force, reason } => {
            let request = engine.request_reindex(force, &reason)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&request)?),
                OutputFormat::Cli => {
                    println!("Reindex requested: {}", request.reason);
                    println!("Run `vaultdex pending confirm` to start it");
                }
            }
            Ok(engine)
        }
        PendingAction::Confirm => {
            let (engine, report) = run_with_progress(engine, format, |engine, progress, cancel| {
                engine.confirm_reindex(Some(progress), cancel)
            })
            .await?;
            match report {
                Some(report) => print!("{}", format_report(&report, format)),
                None => println!("No pending reindex"),
            }
            Ok(engine)
        }
        PendingAction::Discard => {
            if engine.discard_reindex()? {
                println!("Pending reindex discarded");
            } else {
                println!("No pending reindex");
            }
            Ok(engine)
        }
    }
}
