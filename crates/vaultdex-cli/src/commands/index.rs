//! Index command

use crate::app::{IndexArgs, OutputFormat};
use crate::output::format_report;
use crate::progress::ProgressReporter;
use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use vaultdex_core::{CancellationFlag, Engine, IndexProgress};

pub async fn run(args: IndexArgs, engine: Engine, format: OutputFormat) -> Result<Engine> {
    let force = args.force;
    let (engine, report) = run_with_progress(engine, format, move |engine, progress, cancel| {
        engine.reindex(force, Some(progress), cancel)
    })
    .await?;

    print!("{}", format_report(&report, format));
    Ok(engine)
}

/// Run an indexing job on the blocking pool while progress is drained on
/// its own task. Ctrl-C cancels the job between files.
pub async fn run_with_progress<T, F>(engine: Engine, format: OutputFormat, job: F) -> Result<(Engine, T)>
where
    T: Send + 'static,
    F: FnOnce(&Engine, UnboundedSender<IndexProgress>, &CancellationFlag) -> vaultdex_core::Result<T>
        + Send
        + 'static,
{
    let cancel = CancellationFlag::new();
    let (progress, reporter) = ProgressReporter::new(format == OutputFormat::Cli).spawn();

    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current file");
            on_interrupt.cancel();
        }
    });

    let (engine, result) = tokio::task::spawn_blocking(move || {
        let result = job(&engine, progress, &cancel);
        (engine, result)
    })
    .await?;

    interrupt.abort();
    // The sender was dropped with the job, so the reporter finishes
    reporter.await?;

    Ok((engine, result?))
}
