//! The engine command line.

use folio_config::ResolvedEngine;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variables passed through to the engine process.
///
/// Everything else, including `CLASSPATH`, is cleared.
pub const ALLOWED_ENV_VARS: &[&str] = &["PATH", "HOME", "LANG", "LC_ALL", "TMPDIR", "JAVA_HOME"];

/// Carries the generator classpath to a non-JVM launcher.
pub const CLASSPATH_ENV: &str = "FOLIO_ENGINE_CLASSPATH";

/// A fully assembled engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Program to execute.
    pub program: String,
    /// Arguments, ending with the manifest path.
    pub args: Vec<OsString>,
    /// Joined generator classpath.
    pub classpath: OsString,
}

impl EngineCommand {
    /// Builds the launch command for `manifest`.
    ///
    /// With an empty `program` override the JVM command line is used:
    /// heap bounds, `-Dfile.encoding=UTF-8`, the configured system
    /// properties and JVM arguments, `-cp`, the main class, then the
    /// manifest path. An override runs as given with the manifest path
    /// appended and the classpath exported in [`CLASSPATH_ENV`].
    ///
    /// Returns `None` if the classpath cannot be joined (an entry contains
    /// the platform separator).
    pub fn build(engine: &ResolvedEngine, classpath: &[PathBuf], manifest: &Path) -> Option<Self> {
        let classpath = std::env::join_paths(classpath).ok()?;

        if let Some((program, rest)) = engine.program.split_first() {
            let mut args: Vec<OsString> = rest.iter().map(OsString::from).collect();
            args.push(manifest.as_os_str().to_owned());
            return Some(Self {
                program: program.clone(),
                args,
                classpath,
            });
        }

        let mut args: Vec<OsString> = Vec::new();
        if let Some(min) = &engine.min_heap {
            args.push(format!("-Xms{min}").into());
        }
        if let Some(max) = &engine.max_heap {
            args.push(format!("-Xmx{max}").into());
        }
        args.push("-Dfile.encoding=UTF-8".into());
        for (key, value) in &engine.system_properties {
            args.push(format!("-D{key}={value}").into());
        }
        args.extend(engine.jvm_args.iter().map(OsString::from));
        args.push("-cp".into());
        args.push(classpath.clone());
        args.push(engine.main_class.clone().into());
        args.push(manifest.as_os_str().to_owned());

        Some(Self {
            program: engine.java.clone(),
            args,
            classpath,
        })
    }

    /// The command as one display string.
    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.to_string_lossy());
        }
        out
    }
}
