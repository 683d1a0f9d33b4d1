//! The `folio package` command: only the packaging steps.

use folio_attrs::Format;
use folio_config::load_workspace;

use crate::generate::execute;
use crate::pipeline::{resolve_workspace_root, select_unit};
use crate::plan::{PlanOptions, StepKind};
use crate::{GlobalArgs, PackageArgs};

/// Runs the package command.
pub fn run(args: &PackageArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_workspace_root(global)?;
    let workspace = load_workspace(&root)?;
    let options = PlanOptions {
        format: args.format.as_deref().map(Format::new).transpose()?,
        unit: args
            .unit
            .as_deref()
            .map(|u| select_unit(&workspace, u))
            .transpose()?,
        only: Some(StepKind::Package),
    };
    execute(&root, &workspace, &options, workspace.jobs(), global)
}
