//! Turns a resolved workspace into a DAG of host steps.
//!
//! Units are registered in a [`ChannelRegistry`]; step edges are read back
//! from the `built_by` tags of what each step would resolve, so a consumer
//! always runs after the packaging of everything it pulls.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use folio_attrs::{ComponentKind, Format};
use folio_channels::{channel_name, ChannelRegistry, Direction, ResolveRequest, UnitId, BASE_CHANNEL};
use folio_config::ResolvedUnit;
use folio_params::GenerationMode;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::layout::UnitLayout;
use folio_bundle::SOURCE_SETS_DIR;

/// What a step does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepKind {
    /// Module-mode generation of a consumed unit.
    GenerateModule,
    /// Packaging of module output into a component bundle.
    Package,
    /// Publication-mode generation over the unit's module dependencies.
    Aggregate,
    /// Publication-mode generation of a standalone unit.
    GeneratePublication,
}

impl StepKind {
    /// Name used in step ids.
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::GenerateModule => "generate-module",
            StepKind::Package => "package",
            StepKind::Aggregate => "aggregate",
            StepKind::GeneratePublication => "generate-publication",
        }
    }

    /// The generation mode of a generating step.
    pub fn mode(self) -> Option<GenerationMode> {
        match self {
            StepKind::GenerateModule => Some(GenerationMode::Module),
            StepKind::Aggregate | StepKind::GeneratePublication => {
                Some(GenerationMode::Publication)
            }
            StepKind::Package => None,
        }
    }
}

/// One schedulable unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// Unit id.
    pub unit: String,
    /// Output format.
    pub format: Format,
    /// What the step does.
    pub kind: StepKind,
}

impl Step {
    /// Stable id, also the step cache key.
    pub fn id(&self) -> String {
        step_id(&self.unit, self.kind, &self.format)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

fn step_id(unit: &str, kind: StepKind, format: &Format) -> String {
    format!("{unit}:{}:{format}", kind.as_str())
}

/// Which steps to plan.
#[derive(Clone, Debug, Default)]
pub struct PlanOptions {
    /// Restrict to one format.
    pub format: Option<Format>,
    /// Restrict to one unit and the units it aggregates.
    pub unit: Option<String>,
    /// Restrict to one kind of step.
    pub only: Option<StepKind>,
}

/// The planned workspace: units, their channels, and the step graph.
pub struct BuildPlan {
    /// Resolved units by id.
    pub units: BTreeMap<String, ResolvedUnit>,
    /// Channels of every unit.
    pub registry: ChannelRegistry,
    /// Steps with data-dependency edges.
    pub graph: DiGraph<Step, ()>,
    /// The nodes of `graph` in a valid execution order.
    pub order: Vec<NodeIndex>,
}

impl BuildPlan {
    /// Plans `units` according to `options`.
    pub fn new(units: Vec<ResolvedUnit>, options: &PlanOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let units: BTreeMap<String, ResolvedUnit> =
            units.into_iter().map(|u| (u.id.clone(), u)).collect();
        check_unit_cycles(&units)?;

        if let Some(format) = &options.format {
            if !units.values().any(|u| u.formats.contains(format)) {
                return Err(format!("no build unit generates format '{format}'").into());
            }
        }
        let selected = select(&units, options.unit.as_deref())?;
        let registry = build_registry(&units)?;

        let mut graph = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        for unit in units.values().filter(|u| selected.contains(&u.id)) {
            let id = UnitId::new(&unit.id);
            let consumed = !registry.dependents(&id).is_empty();
            let aggregates = !unit.module_dependencies.is_empty();
            for format in &unit.formats {
                if options.format.as_ref().is_some_and(|f| f != format) {
                    continue;
                }
                let mut kinds = Vec::new();
                if consumed {
                    kinds.push(StepKind::GenerateModule);
                    kinds.push(StepKind::Package);
                }
                if aggregates {
                    kinds.push(StepKind::Aggregate);
                }
                if !consumed && !aggregates {
                    kinds.push(StepKind::GeneratePublication);
                }
                for kind in kinds {
                    if options.only.is_some_and(|only| only != kind) {
                        continue;
                    }
                    let step = Step {
                        unit: unit.id.clone(),
                        format: format.clone(),
                        kind,
                    };
                    nodes.insert(step.id(), graph.add_node(step));
                }
            }
        }

        let indices: Vec<NodeIndex> = graph.node_indices().collect();
        for node in indices {
            let step = graph[node].clone();
            for upstream in upstream_steps(&registry, &step)? {
                if let Some(&from) = nodes.get(&upstream) {
                    debug!(from = %upstream, to = %step, "step dependency");
                    graph.add_edge(from, node, ());
                }
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            format!("step graph has a cycle through '{}'", graph[cycle.node_id()])
        })?;
        Ok(Self {
            units,
            registry,
            graph,
            order,
        })
    }

    /// The steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.order.iter().map(|&n| &self.graph[n])
    }

    /// Returns `true` if no step was planned.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

/// Step ids that produce what `step` reads.
fn upstream_steps(registry: &ChannelRegistry, step: &Step) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let unit = UnitId::new(&step.unit);
    let mut upstream = Vec::new();
    match step.kind {
        StepKind::GenerateModule => {}
        StepKind::Package => {
            upstream.push(step_id(&step.unit, StepKind::GenerateModule, &step.format));
        }
        StepKind::Aggregate | StepKind::GeneratePublication => {
            for kind in [ComponentKind::ModuleFiles, ComponentKind::GeneratorClasspath] {
                let request = ResolveRequest::new(kind, step.format.clone());
                upstream.extend(registry.resolve(&unit, &request)?.built_by);
            }
        }
    }
    Ok(upstream)
}

fn check_unit_cycles(units: &BTreeMap<String, ResolvedUnit>) -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for unit in units.values() {
        graph.add_node(unit.id.as_str());
        for dep in &unit.module_dependencies {
            graph.add_edge(dep.as_str(), unit.id.as_str(), ());
        }
    }
    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| format!("module dependencies form a cycle through build unit '{}'", cycle.node_id()).into())
}

/// The requested unit and everything it transitively aggregates.
fn select(
    units: &BTreeMap<String, ResolvedUnit>,
    unit: Option<&str>,
) -> Result<BTreeSet<String>, Box<dyn std::error::Error>> {
    let Some(start) = unit else {
        return Ok(units.keys().cloned().collect());
    };
    if !units.contains_key(start) {
        return Err(format!("unknown build unit '{start}'").into());
    }
    let mut selected = BTreeSet::new();
    let mut pending = vec![start.to_string()];
    while let Some(id) = pending.pop() {
        if !selected.insert(id.clone()) {
            continue;
        }
        if let Some(u) = units.get(&id) {
            pending.extend(u.module_dependencies.iter().cloned());
        }
    }
    Ok(selected)
}

/// Registers every unit's channels and publishes what each step will produce.
pub fn build_registry(units: &BTreeMap<String, ResolvedUnit>) -> Result<ChannelRegistry, Box<dyn std::error::Error>> {
    let mut registry = ChannelRegistry::new();
    for unit in units.values() {
        let id = UnitId::new(&unit.id);
        registry.register_unit(id.clone(), &unit.module_name)?;
        for jar in &unit.provides_plugins {
            registry.publish_path(&id, BASE_CHANNEL, jar.clone(), None)?;
        }
        for format in &unit.formats {
            registry.register_format(&id, format)?;
            let plugins = unit.format_plugins.get(format).cloned().unwrap_or_default();
            registry.declare_files(
                &id,
                &channel_name(format, ComponentKind::PluginsClasspath, Direction::Consumer),
                plugins,
            )?;
            registry.declare_files(
                &id,
                &channel_name(format, ComponentKind::GeneratorClasspath, Direction::Consumer),
                unit.engine.classpath.clone(),
            )?;
        }
    }
    for unit in units.values() {
        for dep in &unit.module_dependencies {
            registry.declare_dependency(&UnitId::new(&unit.id), &UnitId::new(dep))?;
        }
    }

    // Only consumed units package their module output.
    for unit in units.values() {
        let id = UnitId::new(&unit.id);
        if registry.dependents(&id).is_empty() {
            continue;
        }
        for format in &unit.formats {
            let layout = UnitLayout::new(&unit.dir, format);
            let package = Some(step_id(&unit.id, StepKind::Package, format));
            registry.publish_path(
                &id,
                &channel_name(format, ComponentKind::ModuleFiles, Direction::Producer),
                layout.component(),
                package.clone(),
            )?;
            for ss in unit.source_sets.iter().filter(|ss| !ss.suppress) {
                let channel =
                    registry.register_source_set(&id, format, &format!("{}/{}", unit.id, ss.name))?;
                registry.publish_path(
                    &id,
                    &channel,
                    layout.component().join(SOURCE_SETS_DIR).join(&ss.name),
                    package.clone(),
                )?;
            }
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_config::load_workspace;
    use std::path::Path;

    fn workspace(root: &Path) -> Vec<ResolvedUnit> {
        let write = |rel: &str, content: &str| {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        };
        write(
            "folio.toml",
            "[workspace]\nmembers = [\"hello\", \"goodbye\", \"docs\"]\n",
        );
        write("hello/folio.toml", "[unit]\nname = \"hello\"\nformats = [\"html\", \"gfm\"]\n");
        write("goodbye/folio.toml", "[unit]\nname = \"goodbye\"\n");
        write(
            "docs/folio.toml",
            "[unit]\nname = \"docs\"\n[dependencies]\nmodules = [\"../hello\", \"../goodbye\"]\n",
        );
        load_workspace(root).unwrap().resolve_units().unwrap()
    }

    fn ids(plan: &BuildPlan) -> Vec<String> {
        plan.steps().map(Step::id).collect()
    }

    fn position(ids: &[String], id: &str) -> usize {
        ids.iter().position(|s| s == id).unwrap_or_else(|| panic!("missing {id}"))
    }

    #[test]
    fn packaging_runs_before_aggregation() {
        let tmp = tempfile::tempdir().unwrap();
        let plan = BuildPlan::new(workspace(tmp.path()), &PlanOptions::default()).unwrap();
        let ids = ids(&plan);

        assert!(position(&ids, "hello:generate-module:html") < position(&ids, "hello:package:html"));
        assert!(position(&ids, "hello:package:html") < position(&ids, "docs:aggregate:html"));
        assert!(position(&ids, "goodbye:package:html") < position(&ids, "docs:aggregate:html"));
        // docs only generates html, but hello still packages gfm.
        assert!(ids.contains(&"hello:package:gfm".to_string()));
        assert!(!ids.iter().any(|id| id.contains("generate-publication")));
    }

    #[test]
    fn aggregate_edges_come_from_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let plan = BuildPlan::new(workspace(tmp.path()), &PlanOptions::default()).unwrap();
        let aggregate = plan
            .graph
            .node_indices()
            .find(|&n| plan.graph[n].id() == "docs:aggregate:html")
            .unwrap();
        let mut upstream: Vec<String> = plan
            .graph
            .neighbors_directed(aggregate, petgraph::Direction::Incoming)
            .map(|n| plan.graph[n].id())
            .collect();
        upstream.sort();
        assert_eq!(upstream, vec!["goodbye:package:html", "hello:package:html"]);
    }

    #[test]
    fn standalone_unit_generates_publication() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("folio.toml"), "[unit]\nname = \"solo\"\n").unwrap();
        let units = load_workspace(tmp.path()).unwrap().resolve_units().unwrap();
        let plan = BuildPlan::new(units, &PlanOptions::default()).unwrap();
        assert_eq!(ids(&plan), vec![".:generate-publication:html"]);
    }

    #[test]
    fn options_narrow_the_plan() {
        let tmp = tempfile::tempdir().unwrap();
        let options = PlanOptions {
            format: Some(Format::gfm()),
            ..PlanOptions::default()
        };
        let plan = BuildPlan::new(workspace(tmp.path()), &options).unwrap();
        assert_eq!(ids(&plan), vec!["hello:generate-module:gfm", "hello:package:gfm"]);

        let options = PlanOptions {
            unit: Some("hello".to_string()),
            only: Some(StepKind::Package),
            ..PlanOptions::default()
        };
        let plan = BuildPlan::new(workspace(tmp.path()), &options).unwrap();
        let mut ids = ids(&plan);
        ids.sort();
        assert_eq!(ids, vec!["hello:package:gfm", "hello:package:html"]);
    }

    #[test]
    fn unknown_unit_and_format_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let options = PlanOptions {
            unit: Some("nope".to_string()),
            ..PlanOptions::default()
        };
        assert!(BuildPlan::new(workspace(tmp.path()), &options).is_err());
        let options = PlanOptions {
            format: Some(Format::jekyll()),
            ..PlanOptions::default()
        };
        assert!(BuildPlan::new(workspace(tmp.path()), &options).is_err());
    }

    #[test]
    fn cyclic_module_dependencies_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("folio.toml"), "[workspace]\nmembers = [\"a\", \"b\"]\n").unwrap();
        for (name, dep) in [("a", "../b"), ("b", "../a")] {
            std::fs::create_dir_all(root.join(name)).unwrap();
            std::fs::write(
                root.join(name).join("folio.toml"),
                format!("[unit]\nname = \"{name}\"\n[dependencies]\nmodules = [\"{dep}\"]\n"),
            )
            .unwrap();
        }
        let units = load_workspace(root).unwrap().resolve_units().unwrap();
        let err = BuildPlan::new(units, &PlanOptions::default()).err().unwrap();
        assert!(err.to_string().contains("cycle"));
    }
}
