//! The `folio clean` command.

use folio_config::load_workspace;
use tracing::debug;

use crate::layout::BUILD_DIR;
use crate::pipeline::resolve_workspace_root;
use crate::GlobalArgs;

/// Removes `build/folio` below the workspace root and every unit.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_workspace_root(global)?;
    let workspace = load_workspace(&root)?;

    let mut dirs = vec![root.join(BUILD_DIR)];
    dirs.extend(workspace.units.iter().map(|u| u.dir.join(BUILD_DIR)));
    dirs.sort();
    dirs.dedup();

    let mut removed = 0;
    for dir in dirs.iter().filter(|d| d.exists()) {
        debug!(dir = %dir.display(), "removing");
        std::fs::remove_dir_all(dir).map_err(|e| format!("failed to remove '{}': {e}", dir.display()))?;
        removed += 1;
    }
    if !global.quiet {
        eprintln!("removed {removed} output director{}", if removed == 1 { "y" } else { "ies" });
    }
    Ok(0)
}
