//! Shared helpers for CLI commands: workspace discovery and diagnostic output.

use std::path::{Path, PathBuf};

use folio_config::{Workspace, CONFIG_FILE};
use folio_diagnostics::{DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer};

use crate::{GlobalArgs, MessageFormat};

/// Walks up from `start` looking for `folio.toml`.
///
/// The outermost file with a `[workspace]` table wins, so running inside a
/// member unit still operates on the whole workspace. Without one, the
/// nearest `folio.toml` is used.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut nearest = None;
    let mut workspace = None;
    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILE);
        if !candidate.is_file() {
            continue;
        }
        if nearest.is_none() {
            nearest = Some(dir.to_path_buf());
        }
        if declares_workspace(&candidate) {
            workspace = Some(dir.to_path_buf());
        }
    }
    workspace.or(nearest)
}

fn declares_workspace(config: &Path) -> bool {
    std::fs::read_to_string(config)
        .map(|content| content.lines().any(|l| l.trim() == "[workspace]"))
        .unwrap_or(false)
}

/// Resolves the workspace root from `--config` or the current directory.
pub fn resolve_workspace_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(config) = &global.config {
        let path = PathBuf::from(config);
        let dir = if path.is_file() {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            path
        };
        let dir = if dir.as_os_str().is_empty() {
            std::env::current_dir()?
        } else {
            dir
        };
        if !dir.join(CONFIG_FILE).is_file() {
            return Err(format!("no {CONFIG_FILE} found at '{}'", dir.display()).into());
        }
        return Ok(std::fs::canonicalize(&dir)?);
    }
    let cwd = std::env::current_dir()?;
    let root = find_workspace_root(&cwd).ok_or_else(|| {
        format!(
            "could not find {CONFIG_FILE} in '{}' or any parent directory",
            cwd.display()
        )
    })?;
    Ok(std::fs::canonicalize(root)?)
}

/// Maps a `--unit` argument to a unit id.
///
/// Accepts a unit id, a directory relative to the current directory, or a
/// directory relative to the workspace root.
pub fn select_unit(workspace: &Workspace, arg: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(unit) = workspace.unit(arg.trim_end_matches('/')) {
        return Ok(unit.id.clone());
    }
    let local = std::env::current_dir()?.join(arg);
    let dir = if local.is_dir() {
        std::fs::canonicalize(local)?
    } else {
        PathBuf::from(arg)
    };
    Ok(workspace.unit_for_dir(&dir)?.id.clone())
}

/// The unit whose directory contains the current directory.
///
/// A workspace with a single unit needs no `--unit`.
pub fn unit_for_cwd(workspace: &Workspace) -> Result<String, Box<dyn std::error::Error>> {
    let cwd = std::fs::canonicalize(std::env::current_dir()?)?;
    let nearest = workspace
        .units
        .iter()
        .filter(|u| cwd.starts_with(&u.dir))
        .max_by_key(|u| u.dir.components().count());
    match (nearest, workspace.units.as_slice()) {
        (Some(unit), _) => Ok(unit.id.clone()),
        (None, [only]) => Ok(only.id.clone()),
        _ => Err("not inside a build unit; pass --unit".into()),
    }
}

/// Prints every diagnostic in the sink to stderr.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) {
    for line in rendered_diagnostics(sink, global) {
        eprintln!("{line}");
    }
}

fn rendered_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) -> Vec<String> {
    let renderer: Box<dyn DiagnosticRenderer> = match global.message_format {
        MessageFormat::Human => Box::new(TerminalRenderer::new(global.color)),
        MessageFormat::Json => Box::new(JsonRenderer),
    };
    sink.take_all()
        .into_iter()
        .filter(|diag| !global.quiet || diag.severity.is_error())
        .map(|diag| renderer.render(&diag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearest_unit_config() {
        let tmp = tempfile::tempdir().unwrap();
        let unit = tmp.path().join("hello");
        std::fs::create_dir_all(unit.join("src")).unwrap();
        std::fs::write(unit.join(CONFIG_FILE), "[unit]\nname = \"hello\"\n").unwrap();
        assert_eq!(find_workspace_root(&unit.join("src")), Some(unit));
    }

    #[test]
    fn workspace_root_wins_over_member() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "[workspace]\nmembers = [\"hello\"]\n",
        )
        .unwrap();
        let unit = tmp.path().join("hello");
        std::fs::create_dir_all(&unit).unwrap();
        std::fs::write(unit.join(CONFIG_FILE), "[unit]\n").unwrap();
        assert_eq!(find_workspace_root(&unit), Some(tmp.path().to_path_buf()));
    }

    #[test]
    fn nothing_found() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a/b");
        std::fs::create_dir_all(&dir).unwrap();
        // A folio.toml may exist above the temp dir on a developer machine.
        if let Some(found) = find_workspace_root(&dir) {
            assert!(!found.starts_with(tmp.path()));
        }
    }

    #[test]
    fn config_flag_accepts_file_or_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "[unit]\n").unwrap();
        let canonical = std::fs::canonicalize(tmp.path()).unwrap();
        for config in [
            tmp.path().join(CONFIG_FILE),
            tmp.path().to_path_buf(),
        ] {
            let global = GlobalArgs {
                quiet: false,
                verbose: false,
                color: false,
                message_format: MessageFormat::Human,
                config: Some(config.to_string_lossy().into_owned()),
            };
            assert_eq!(resolve_workspace_root(&global).unwrap(), canonical);
        }
    }

    #[test]
    fn unit_argument_accepts_id_or_root_relative_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(tmp.path()).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "[workspace]\nmembers = [\"libs/core\"]\n").unwrap();
        std::fs::create_dir_all(root.join("libs/core")).unwrap();
        std::fs::write(root.join("libs/core").join(CONFIG_FILE), "[unit]\n").unwrap();
        let workspace = folio_config::load_workspace(&root).unwrap();

        assert_eq!(select_unit(&workspace, "libs/core").unwrap(), "libs/core");
        assert_eq!(
            select_unit(&workspace, &root.join("libs/core").to_string_lossy()).unwrap(),
            "libs/core"
        );
        assert!(select_unit(&workspace, "missing").is_err());
    }

    #[test]
    fn config_flag_without_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            message_format: MessageFormat::Human,
            config: Some(tmp.path().to_string_lossy().into_owned()),
        };
        assert!(resolve_workspace_root(&global).is_err());
    }

    #[test]
    fn json_message_format_renders_one_object_per_diagnostic() {
        use folio_diagnostics::{Diagnostic, DiagnosticCode};

        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(DiagnosticCode::STALE_BUNDLE, "stale").in_unit("hello"));
        sink.emit(Diagnostic::error(DiagnosticCode::ENGINE_FAILED, "boom").in_unit("docs"));
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            color: false,
            message_format: MessageFormat::Json,
            config: None,
        };
        let lines = rendered_diagnostics(&sink, &global);
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["unit"], "docs");

        sink.emit(Diagnostic::warning(DiagnosticCode::STALE_BUNDLE, "stale").in_unit("hello"));
        global.quiet = true;
        assert!(rendered_diagnostics(&sink, &global).is_empty());
    }
}
