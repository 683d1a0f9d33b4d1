//! One engine run.

use std::path::PathBuf;
use std::process::Stdio;

use folio_attrs::Format;
use folio_common::ContentHash;
use folio_config::ResolvedEngine;
use folio_params::{manifest_hash, write_manifest, GenerationMode, ParameterManifest};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::command::{EngineCommand, ALLOWED_ENV_VARS, CLASSPATH_ENV};
use crate::error::WorkerError;
use crate::log::tail;
use crate::state::WorkerState;

/// Manifest file name inside the work directory.
pub const MANIFEST_FILE: &str = "parameters.json";

/// Engine log file name inside the work directory.
pub const LOG_FILE: &str = "engine.log";

/// Lines of the engine log included in a failure report.
const LOG_TAIL_LINES: usize = 20;

/// Everything one run needs, as plain values.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The generating unit.
    pub unit: String,
    /// Output format.
    pub format: Format,
    /// Module or publication run.
    pub mode: GenerationMode,
    /// The manifest to hand to the engine. Its `output_dir` receives the output.
    pub manifest: ParameterManifest,
    /// Directory for the manifest file, the log, and the engine's working directory.
    pub work_dir: PathBuf,
    /// The resolved generator classpath.
    pub classpath: Vec<PathBuf>,
    /// Launch settings.
    pub engine: ResolvedEngine,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The engine's output directory.
    pub output_dir: PathBuf,
    /// The written manifest.
    pub manifest_path: PathBuf,
    /// Hash of the manifest bytes.
    pub manifest_hash: ContentHash,
    /// The dedicated engine log.
    pub log_file: PathBuf,
}

/// Runs the engine once for a [`GenerationRequest`].
pub struct GenerationWorker {
    request: GenerationRequest,
    state: WorkerState,
}

impl GenerationWorker {
    /// Creates an idle worker.
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            state: WorkerState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Path of the manifest file this worker writes.
    pub fn manifest_path(&self) -> PathBuf {
        self.request.work_dir.join(MANIFEST_FILE)
    }

    /// Path of the engine log.
    pub fn log_path(&self) -> PathBuf {
        self.request.work_dir.join(LOG_FILE)
    }

    /// Prepares and dispatches the run, waiting for the engine to exit.
    ///
    /// When `cancel` becomes `true` the engine process is killed and the
    /// run fails with [`WorkerError::Cancelled`].
    pub async fn run(
        &mut self,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<GenerationOutcome, WorkerError> {
        self.advance(WorkerState::Preparing)?;
        let prepared = self.prepare();
        let (command, hash) = match prepared {
            Ok(p) => p,
            Err(e) => {
                self.advance(WorkerState::Failed)?;
                return Err(e);
            }
        };

        self.advance(WorkerState::Dispatched)?;
        let result = self.dispatch(&command, &mut cancel).await;
        match &result {
            Ok(()) => self.advance(WorkerState::Completed)?,
            Err(_) => self.advance(WorkerState::Failed)?,
        }
        result?;

        Ok(GenerationOutcome {
            output_dir: self.request.manifest.output_dir.clone(),
            manifest_path: self.manifest_path(),
            manifest_hash: hash,
            log_file: self.log_path(),
        })
    }

    fn advance(&mut self, next: WorkerState) -> Result<(), WorkerError> {
        if !self.state.can_transition_to(next) {
            return Err(WorkerError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(unit = %self.request.unit, from = %self.state, to = %next, "worker state");
        self.state = next;
        Ok(())
    }

    /// Writes the manifest and clears any previous output.
    fn prepare(&self) -> Result<(EngineCommand, ContentHash), WorkerError> {
        let request = &self.request;
        if request.classpath.is_empty() {
            return Err(WorkerError::EmptyClasspath {
                unit: request.unit.clone(),
                format: request.format.to_string(),
            });
        }

        let output_dir = &request.manifest.output_dir;
        if output_dir.exists() {
            debug!(output = %output_dir.display(), "clearing previous output");
            std::fs::remove_dir_all(output_dir).map_err(|source| WorkerError::Io {
                path: output_dir.clone(),
                source,
            })?;
        }
        std::fs::create_dir_all(output_dir).map_err(|source| WorkerError::Io {
            path: output_dir.clone(),
            source,
        })?;

        let manifest_path = self.manifest_path();
        let bytes = write_manifest(&request.manifest, &manifest_path)?;
        let command = EngineCommand::build(&request.engine, &request.classpath, &manifest_path)
            .ok_or_else(|| WorkerError::InvalidClasspath {
                unit: request.unit.clone(),
            })?;
        Ok((command, manifest_hash(&bytes)))
    }

    async fn dispatch(
        &self,
        command: &EngineCommand,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(), WorkerError> {
        let request = &self.request;
        let log_path = self.log_path();
        let io = |source| WorkerError::Io {
            path: log_path.clone(),
            source,
        };
        let log = std::fs::File::create(&log_path).map_err(io)?;
        let log_err = log.try_clone().map_err(io)?;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&request.work_dir)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true);
        for var in ALLOWED_ENV_VARS {
            if let Some(value) = std::env::var_os(var) {
                cmd.env(var, value);
            }
        }
        if !request.engine.program.is_empty() {
            cmd.env(CLASSPATH_ENV, &command.classpath);
        }

        info!(
            unit = %request.unit,
            format = %request.format,
            mode = %request.mode,
            log = %log_path.display(),
            "starting engine"
        );
        debug!(command = %command.display(), "engine command line");
        let mut child = cmd.spawn().map_err(|source| WorkerError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let cancelled = async {
            while !*cancel.borrow_and_update() {
                if cancel.changed().await.is_err() {
                    // Sender gone without cancelling: never resolves.
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|source| WorkerError::Io {
                    path: log_path.clone(),
                    source,
                })?;
                if status.success() {
                    info!(unit = %request.unit, format = %request.format, mode = %request.mode, "engine finished");
                    Ok(())
                } else {
                    let status = match status.code() {
                        Some(code) => format!("exit code {code}"),
                        None => "terminated by signal".to_string(),
                    };
                    warn!(unit = %request.unit, %status, "engine failed");
                    Err(WorkerError::EngineFailed {
                        unit: request.unit.clone(),
                        status,
                        tail: tail(&log_path, LOG_TAIL_LINES),
                        log: log_path.clone(),
                    })
                }
            }
            () = cancelled => {
                warn!(unit = %request.unit, "cancelling engine");
                // A failed kill means the process already exited.
                let _ = child.kill().await;
                Err(WorkerError::Cancelled { unit: request.unit.clone() })
            }
        }
    }
}

/// Convenience for callers that never cancel.
pub fn never_cancelled() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}
