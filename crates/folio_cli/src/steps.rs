//! What each host step does.
//!
//! Steps share one [`HostContext`]. Generation steps build their manifest
//! from plain resolved values and hand it to a [`GenerationWorker`].
//! Hashing, packaging and copying run on the blocking pool.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_aggregate::{check_aggregation_plugin, validate_modules, Aggregator};
use folio_attrs::{ComponentKind, Format};
use folio_bundle::{BundleSpec, ComponentBundle, SyncPlan};
use folio_cache::{StepCache, StepRecord};
use folio_channels::{ChannelError, ChannelRegistry, Resolution, ResolveRequest, UnitId};
use folio_common::ContentHash;
use folio_config::ResolvedUnit;
use folio_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use folio_params::{to_json, GenerationMode, ManifestBuilder, ModuleManifest};
use folio_worker::{GenerationRequest, GenerationWorker, WorkerError};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, warn};

use crate::fingerprint::{engine_key, fingerprint, manifest_inputs};
use crate::layout::UnitLayout;
use crate::plan::{Step, StepKind};

/// Error of a failed step.
pub type StepError = Box<dyn std::error::Error + Send + Sync>;

/// How a step finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// The step did its work.
    Ran,
    /// The cache showed nothing changed.
    UpToDate,
}

/// Outcome of repackaging one stale bundle, shared by its consumers.
type Repackaged = Arc<OnceCell<Result<(), String>>>;

/// State shared by every step of one host run.
pub struct HostContext {
    /// Resolved units by id.
    pub units: BTreeMap<String, ResolvedUnit>,
    /// Channels of every unit.
    pub registry: ChannelRegistry,
    /// Step cache.
    pub cache: Mutex<StepCache>,
    /// Collected diagnostics.
    pub sink: DiagnosticSink,
    /// Becomes `true` when the run is cancelled.
    pub cancel: watch::Receiver<bool>,
    repackaged: Mutex<HashMap<String, Repackaged>>,
}

impl HostContext {
    /// Context for one run over `units`.
    pub fn new(
        units: BTreeMap<String, ResolvedUnit>,
        registry: ChannelRegistry,
        cache: StepCache,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            units,
            registry,
            cache: Mutex::new(cache),
            sink: DiagnosticSink::new(),
            cancel,
            repackaged: Mutex::new(HashMap::new()),
        }
    }

    fn unit(&self, id: &str) -> Result<&ResolvedUnit, StepError> {
        self.units
            .get(id)
            .ok_or_else(|| format!("unknown build unit '{id}'").into())
    }

    fn cache(&self) -> MutexGuard<'_, StepCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // The lock only guards the record map; output trees are digested without it.
    fn is_fresh(&self, step: &str, key: ContentHash, output: &Path) -> bool {
        let recorded = self.cache().recorded(step);
        match recorded {
            Some(record) => record.matches(step, key, output),
            None => false,
        }
    }

    fn record(&self, step: &str, key: ContentHash, output: &Path) -> Result<(), StepError> {
        let record = StepRecord::capture(key, output)?;
        self.cache().insert(step, record);
        Ok(())
    }

    fn invalidate(&self, step: &str) {
        self.cache().invalidate(step);
    }

    fn repackaged(&self, step: &str) -> Repackaged {
        self.repackaged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(step.to_string())
            .or_default()
            .clone()
    }
}

/// Runs `f` on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, StepError>
where
    F: FnOnce() -> Result<T, StepError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Resolves `kind` for `unit`, reporting empty producers and discarded artifacts.
pub fn resolve_reporting(
    registry: &ChannelRegistry,
    sink: &DiagnosticSink,
    unit: &str,
    kind: ComponentKind,
    format: &Format,
) -> Result<Resolution, ChannelError> {
    let resolution = registry.resolve(&UnitId::new(unit), &ResolveRequest::new(kind, format.clone()))?;
    for mismatch in &resolution.discarded {
        sink.emit(
            Diagnostic::warning(
                DiagnosticCode::ATTRIBUTE_MISMATCH,
                format!(
                    "discarded '{}' from build unit '{}': its attributes {} do not match the {kind} request",
                    mismatch.path.display(),
                    mismatch.producer,
                    mismatch.attributes
                ),
            )
            .in_unit(unit)
            .with_note(format!("published on channel '{}'", mismatch.channel)),
        );
    }
    // Only module files are expected from every dependency.
    if kind == ComponentKind::ModuleFiles {
        for producer in &resolution.empty_producers {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::EMPTY_RESOLUTION,
                    format!("build unit '{producer}' provides no {kind} for format '{format}'"),
                )
                .in_unit(unit)
                .with_help(format!(
                    "add \"{format}\" to [unit] formats in {producer}/folio.toml, or remove it from [dependencies] modules"
                )),
            );
        }
    }
    Ok(resolution)
}

/// Runs one step to completion.
pub async fn run_step(ctx: Arc<HostContext>, step: Step) -> Result<StepStatus, StepError> {
    match step.kind {
        StepKind::GenerateModule | StepKind::GeneratePublication => {
            generate(&ctx, &step, Vec::new()).await
        }
        StepKind::Package => blocking(move || package(&ctx, &step.unit, &step.format)).await,
        StepKind::Aggregate => aggregate(&ctx, &step).await,
    }
}

async fn generate(
    ctx: &Arc<HostContext>,
    step: &Step,
    modules: Vec<ModuleManifest>,
) -> Result<StepStatus, StepError> {
    let unit = ctx.unit(&step.unit)?;
    let mode = step.kind.mode().unwrap_or(GenerationMode::Publication);
    let layout = UnitLayout::new(&unit.dir, &step.format);
    let output = layout.output(mode);

    let plugins = resolve_reporting(
        &ctx.registry,
        &ctx.sink,
        &unit.id,
        ComponentKind::PluginsClasspath,
        &step.format,
    )?
    .files;
    let generator = resolve_reporting(
        &ctx.registry,
        &ctx.sink,
        &unit.id,
        ComponentKind::GeneratorClasspath,
        &step.format,
    )?
    .files;
    let manifest = ManifestBuilder::new(unit, mode, output.clone())
        .plugins_classpath(plugins)
        .modules(modules.clone())
        .diagnostics(&ctx.sink)
        .build()?;

    let id = step.id();
    let input = to_json(&manifest)?;
    let paths = manifest_inputs(&manifest, &generator);
    let engine = engine_key(&unit.engine)?;
    let (key, fresh) = {
        let (ctx, id, output) = (Arc::clone(ctx), id.clone(), output.clone());
        blocking(move || {
            let key = fingerprint(&input, &paths, &[&engine])?;
            Ok((key, ctx.is_fresh(&id, key, &output)))
        })
        .await?
    };
    if fresh {
        info!(step = %id, "up to date");
        return Ok(StepStatus::UpToDate);
    }

    let work_dir = layout.work(mode);
    std::fs::create_dir_all(&work_dir).map_err(|e| format!("{}: {e}", work_dir.display()))?;
    let mut worker = GenerationWorker::new(GenerationRequest {
        unit: unit.id.clone(),
        format: step.format.clone(),
        mode,
        manifest,
        work_dir,
        classpath: generator,
        engine: unit.engine.clone(),
    });
    match worker.run(ctx.cancel.clone()).await {
        Ok(outcome) => debug!(step = %id, hash = %outcome.manifest_hash, "engine run complete"),
        Err(e) => {
            if let WorkerError::EngineFailed { status, log, tail, .. } = &e {
                let mut diag = Diagnostic::error(
                    DiagnosticCode::ENGINE_FAILED,
                    format!("generation engine failed for {id} ({status})"),
                )
                .in_unit(&unit.id)
                .with_note(format!("engine log: {}", log.display()));
                if !tail.is_empty() {
                    diag = diag.with_note(format!("last lines of the log:\n{tail}"));
                }
                ctx.sink.emit(diag);
            }
            return Err(e.into());
        }
    }

    let ctx = Arc::clone(ctx);
    let step = step.clone();
    blocking(move || {
        if step.kind == StepKind::Aggregate {
            let unit = ctx.unit(&step.unit)?;
            let report = Aggregator::new(&unit.id, &unit.module_name, &step.format, &output)
                .assemble(&modules)?;
            info!(
                step = %id,
                modules = report.modules,
                copied = report.copied_files,
                fallback_index = report.wrote_fallback_index,
                "publication assembled"
            );
        }
        ctx.record(&id, key, &output)
    })
    .await?;
    Ok(StepStatus::Ran)
}

/// Packages one unit's module output into its component bundle.
pub fn package(ctx: &HostContext, unit_id: &str, format: &Format) -> Result<StepStatus, StepError> {
    let unit = ctx.unit(unit_id)?;
    let layout = UnitLayout::new(&unit.dir, format);
    let id = Step {
        unit: unit.id.clone(),
        format: format.clone(),
        kind: StepKind::Package,
    }
    .id();

    let plan = SyncPlan::build(&BundleSpec::for_unit(unit, Some(layout.module())))?;
    let key = plan.fingerprint()?;
    let dest = layout.component();
    if ctx.is_fresh(&id, key, &dest) {
        info!(step = %id, "up to date");
        return Ok(StepStatus::UpToDate);
    }
    let report = plan.sync(&dest)?;
    debug!(
        step = %id,
        written = report.written,
        unchanged = report.unchanged,
        removed = report.removed,
        "bundle synced"
    );
    ctx.record(&id, key, &dest)?;
    Ok(StepStatus::Ran)
}

async fn aggregate(ctx: &Arc<HostContext>, step: &Step) -> Result<StepStatus, StepError> {
    let unit = ctx.unit(&step.unit)?;
    let bundles = resolve_reporting(
        &ctx.registry,
        &ctx.sink,
        &unit.id,
        ComponentKind::ModuleFiles,
        &step.format,
    )?
    .files;

    let mut modules = Vec::with_capacity(bundles.len());
    for dir in bundles {
        let bundle = open_or_repackage(ctx, &unit.id, &dir, &step.format).await?;
        match bundle.module_manifest() {
            Some(module) => modules.push(module),
            None => warn!(bundle = %dir.display(), "bundle carries no module output"),
        }
    }
    validate_modules(&unit.id, &modules)?;

    let generator = ctx
        .registry
        .resolve(
            &UnitId::new(&unit.id),
            &ResolveRequest::new(ComponentKind::GeneratorClasspath, step.format.clone()),
        )?
        .files;
    check_aggregation_plugin(&unit.id, &step.format, modules.len(), &generator, &ctx.sink);
    generate(ctx, step, modules).await
}

/// Opens a bundle; a stale one is packaged again once before giving up.
///
/// Consumers of the same stale bundle share one repackaging run.
async fn open_or_repackage(
    ctx: &Arc<HostContext>,
    consumer: &str,
    dir: &Path,
    format: &Format,
) -> Result<ComponentBundle, StepError> {
    let error = match ComponentBundle::open(dir) {
        Ok(bundle) => return Ok(bundle),
        Err(e) if e.is_stale() => e,
        Err(e) => return Err(e.into()),
    };
    let Some(producer) = producer_of(ctx, dir, format) else {
        return Err(error.into());
    };
    let step = Step {
        unit: producer.clone(),
        format: format.clone(),
        kind: StepKind::Package,
    };
    let cell = ctx.repackaged(&step.id());
    let outcome = cell
        .get_or_init(|| {
            let ctx = Arc::clone(ctx);
            let stale = Diagnostic::warning(DiagnosticCode::STALE_BUNDLE, error.to_string())
                .in_unit(consumer)
                .with_note(format!("packaging build unit '{producer}' again"));
            async move {
                ctx.sink.emit(stale);
                ctx.invalidate(&step.id());
                let repackage = Arc::clone(&ctx);
                blocking(move || package(&repackage, &step.unit, &step.format))
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            }
        })
        .await;
    if let Err(message) = outcome {
        return Err(format!("repackaging build unit '{producer}' failed: {message}").into());
    }
    Ok(ComponentBundle::open(dir)?)
}

fn producer_of(ctx: &HostContext, dir: &Path, format: &Format) -> Option<String> {
    ctx.units
        .values()
        .find(|u| UnitLayout::new(&u.dir, format).component() == dir)
        .map(|u| u.id.clone())
}

/// Module manifests of every packaged dependency, for previews.
///
/// Dependencies that are not packaged yet are skipped with a warning.
pub fn packaged_modules(
    registry: &ChannelRegistry,
    sink: &DiagnosticSink,
    unit: &str,
    format: &Format,
) -> Result<Vec<ModuleManifest>, ChannelError> {
    let bundles: Vec<PathBuf> =
        resolve_reporting(registry, sink, unit, ComponentKind::ModuleFiles, format)?.files;
    let mut modules = Vec::new();
    for dir in bundles {
        match ComponentBundle::open(&dir) {
            Ok(bundle) => modules.extend(bundle.module_manifest()),
            Err(e) => warn!(bundle = %dir.display(), error = %e, "skipping unpackaged module; run `folio package` first"),
        }
    }
    Ok(modules)
}
