//! The `folio generate` command.

use std::path::Path;

use folio_attrs::Format;
use folio_cache::StepCache;
use folio_config::{load_workspace, Workspace};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::host::{Host, HostReport};
use crate::layout::cache_dir;
use crate::pipeline::{render_diagnostics, resolve_workspace_root, select_unit};
use crate::plan::{BuildPlan, PlanOptions};
use crate::{GenerateArgs, GlobalArgs};

/// Runs the generate command.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_workspace_root(global)?;
    let workspace = load_workspace(&root)?;
    let options = PlanOptions {
        format: args.format.as_deref().map(Format::new).transpose()?,
        unit: args
            .unit
            .as_deref()
            .map(|u| select_unit(&workspace, u))
            .transpose()?,
        only: None,
    };
    let jobs = args.jobs.unwrap_or_else(|| workspace.jobs());
    execute(&root, &workspace, &options, jobs, global)
}

/// Plans and runs steps, then reports the outcome. Shared with `folio package`.
pub fn execute(
    root: &Path,
    workspace: &Workspace,
    options: &PlanOptions,
    jobs: usize,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let plan = BuildPlan::new(workspace.resolve_units()?, options)?;
    if plan.is_empty() {
        if !global.quiet {
            eprintln!("nothing to do");
        }
        return Ok(0);
    }
    for step in plan.steps() {
        debug!(step = %step, "planned");
    }
    let cache = StepCache::load_or_create(&cache_dir(root), env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let (host, report) = runtime.block_on(async {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling running steps");
                let _ = cancel_tx.send(true);
            }
        });
        let host = Host::new(plan, cache, cancel_rx);
        let report = host.run(jobs).await;
        (host, report)
    });

    host.save_cache()?;
    let has_errors = host.sink().has_errors();
    render_diagnostics(host.sink(), global);
    if !global.quiet {
        print_summary(&report);
    }
    Ok(if report.success() && !has_errors { 0 } else { 1 })
}

fn print_summary(report: &HostReport) {
    for (step, message) in &report.failed {
        eprintln!("failed: {step}: {message}");
    }
    let mut line = format!(
        "{} ran, {} up to date",
        report.ran.len(),
        report.up_to_date.len()
    );
    if !report.failed.is_empty() {
        line.push_str(&format!(", {} failed", report.failed.len()));
    }
    if !report.skipped.is_empty() {
        line.push_str(&format!(", {} skipped", report.skipped.len()));
    }
    if report.cancelled {
        line.push_str(" (cancelled)");
    }
    eprintln!("{line}");
}
