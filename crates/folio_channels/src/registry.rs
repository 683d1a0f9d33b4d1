//! The channel registry and its pull API.

use crate::channel::{Artifact, Channel, Direction, UnitId};
use crate::error::ChannelError;
use folio_attrs::{
    compatibility, disambiguate, AttrError, Attribute, AttributeSet, ComponentKind, Format,
    ProducerScope,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Name of the format-agnostic producer every registered unit exposes.
pub const BASE_CHANNEL: &str = "folio";

/// Builds the conventional channel name for a `(format, kind, direction)` triple.
pub fn channel_name(format: &Format, kind: ComponentKind, direction: Direction) -> String {
    let suffix = match direction {
        Direction::Producer => "out",
        Direction::Consumer => "in",
    };
    format!("folio-{format}-{kind}-{suffix}")
}

/// What a consumer asks for.
#[derive(Clone, Debug)]
pub struct ResolveRequest {
    /// The component kind.
    pub kind: ComponentKind,
    /// The output format.
    pub format: Format,
    /// Optional module id (for `ModuleFiles`) or source-set id (for `SourceSetFiles`).
    pub id: Option<String>,
}

impl ResolveRequest {
    /// Requests every artifact of `kind` for `format`.
    pub fn new(kind: ComponentKind, format: Format) -> Self {
        Self {
            kind,
            format,
            id: None,
        }
    }

    /// Narrows the request to one module or source set.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The attribute tuple sent to producers.
    pub fn attributes(&self) -> Result<AttributeSet, AttrError> {
        let mut set = AttributeSet::of(&self.format, self.kind);
        if let Some(id) = &self.id {
            set = match self.kind {
                ComponentKind::SourceSetFiles => set.with(Attribute::SourceSetId(id.clone())),
                _ => set.with(Attribute::ModuleId(id.clone())),
            };
        }
        set.validate()?;
        Ok(set)
    }
}

/// An artifact dropped after resolution because its tags did not match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    /// The unit that published it.
    pub producer: UnitId,
    /// The channel it was published on.
    pub channel: String,
    /// The artifact location.
    pub path: PathBuf,
    /// The tags it actually carried.
    pub attributes: AttributeSet,
}

/// The outcome of one pull.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// Resolved files in declaration order, without duplicates.
    pub files: Vec<PathBuf>,
    /// Steps that must complete before `files` may be read.
    pub built_by: Vec<String>,
    /// Declared dependencies that contributed nothing.
    pub empty_producers: Vec<UnitId>,
    /// Artifacts discarded by the post-resolution attribute check.
    pub discarded: Vec<Mismatch>,
}

impl Resolution {
    /// Returns `true` when nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, artifact: &Artifact) {
        if !self.files.contains(&artifact.path) {
            self.files.push(artifact.path.clone());
        }
        if let Some(step) = &artifact.built_by {
            if !self.built_by.contains(step) {
                self.built_by.push(step.clone());
            }
        }
    }
}

#[derive(Debug)]
struct UnitEntry {
    module_name: String,
    channels: BTreeMap<String, Channel>,
}

/// Per-unit producer and consumer channels plus the declared unit graph.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    units: BTreeMap<UnitId, UnitEntry>,
    dependencies: BTreeMap<UnitId, BTreeSet<UnitId>>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit and its format-agnostic base channel.
    ///
    /// The base channel carries plugin jars the unit offers to every format.
    pub fn register_unit(&mut self, unit: UnitId, module_name: &str) -> Result<(), ChannelError> {
        if self.units.contains_key(&unit) {
            return Err(ChannelError::DuplicateUnit(unit.0));
        }
        debug!(unit = %unit, module = module_name, "registering build unit");
        self.units.insert(
            unit.clone(),
            UnitEntry {
                module_name: module_name.to_string(),
                channels: BTreeMap::new(),
            },
        );
        let base = AttributeSet::new().with(Attribute::Component(ComponentKind::PluginsClasspath));
        self.add_producer(&unit, BASE_CHANNEL, base, ProducerScope::FormatAgnostic)
    }

    /// Registers the standard channels of one format for a unit.
    ///
    /// Producers: module files tagged with the unit's module id. Consumers:
    /// module files, plugins classpath, and a generator classpath that extends
    /// the plugins classpath.
    pub fn register_format(&mut self, unit: &UnitId, format: &Format) -> Result<(), ChannelError> {
        let module_name = self.entry(unit)?.module_name.clone();
        let module_out = AttributeSet::of(format, ComponentKind::ModuleFiles)
            .with(Attribute::ModuleId(module_name));
        self.add_producer(
            unit,
            &channel_name(format, ComponentKind::ModuleFiles, Direction::Producer),
            module_out,
            ProducerScope::FormatBound,
        )?;

        let module_in = channel_name(format, ComponentKind::ModuleFiles, Direction::Consumer);
        let plugins_in = channel_name(format, ComponentKind::PluginsClasspath, Direction::Consumer);
        let generator_in =
            channel_name(format, ComponentKind::GeneratorClasspath, Direction::Consumer);
        self.add_consumer(
            unit,
            &module_in,
            AttributeSet::of(format, ComponentKind::ModuleFiles),
            &[],
        )?;
        self.add_consumer(
            unit,
            &plugins_in,
            AttributeSet::of(format, ComponentKind::PluginsClasspath),
            &[],
        )?;
        self.add_consumer(
            unit,
            &generator_in,
            AttributeSet::of(format, ComponentKind::GeneratorClasspath),
            &[plugins_in.as_str()],
        )
    }

    /// Registers a producer for one source set's files and returns its name.
    pub fn register_source_set(
        &mut self,
        unit: &UnitId,
        format: &Format,
        source_set_id: &str,
    ) -> Result<String, ChannelError> {
        let name = format!(
            "{}-{}",
            channel_name(format, ComponentKind::SourceSetFiles, Direction::Producer),
            source_set_id.replace('/', "-")
        );
        let attributes = AttributeSet::of(format, ComponentKind::SourceSetFiles)
            .with(Attribute::SourceSetId(source_set_id.to_string()));
        self.add_producer(unit, &name, attributes, ProducerScope::FormatBound)?;
        Ok(name)
    }

    /// Adds a producer channel.
    pub fn add_producer(
        &mut self,
        unit: &UnitId,
        name: &str,
        attributes: AttributeSet,
        scope: ProducerScope,
    ) -> Result<(), ChannelError> {
        attributes.validate()?;
        self.insert_channel(
            unit,
            Channel {
                name: name.to_string(),
                direction: Direction::Producer,
                attributes,
                scope,
                extends: Vec::new(),
                artifacts: Vec::new(),
            },
        )
    }

    /// Adds a consumer channel that also includes the contents of `extends`.
    ///
    /// Extended channels must already exist, so the extends relation is acyclic.
    pub fn add_consumer(
        &mut self,
        unit: &UnitId,
        name: &str,
        attributes: AttributeSet,
        extends: &[&str],
    ) -> Result<(), ChannelError> {
        attributes.validate()?;
        for parent in extends {
            self.channel_with(unit, parent, Direction::Consumer)?;
        }
        self.insert_channel(
            unit,
            Channel {
                name: name.to_string(),
                direction: Direction::Consumer,
                attributes,
                scope: ProducerScope::FormatBound,
                extends: extends.iter().map(|s| s.to_string()).collect(),
                artifacts: Vec::new(),
            },
        )
    }

    /// Publishes an artifact on a producer channel.
    pub fn publish(
        &mut self,
        unit: &UnitId,
        channel: &str,
        artifact: Artifact,
    ) -> Result<(), ChannelError> {
        artifact.attributes.validate()?;
        let target = self.channel_with_mut(unit, channel, Direction::Producer)?;
        debug!(unit = %unit, channel, path = %artifact.path.display(), "publishing artifact");
        target.artifacts.push(artifact);
        Ok(())
    }

    /// Publishes a path tagged with its channel's own attributes.
    pub fn publish_path(
        &mut self,
        unit: &UnitId,
        channel: &str,
        path: impl Into<PathBuf>,
        built_by: Option<String>,
    ) -> Result<(), ChannelError> {
        let attributes = self
            .channel_with(unit, channel, Direction::Producer)?
            .attributes
            .clone();
        let mut artifact = Artifact::new(path, attributes);
        artifact.built_by = built_by;
        self.publish(unit, channel, artifact)
    }

    /// Attaches local files (e.g. plugin jars) directly to a consumer channel.
    pub fn declare_files<I>(
        &mut self,
        unit: &UnitId,
        channel: &str,
        files: I,
    ) -> Result<(), ChannelError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let target = self.channel_with_mut(unit, channel, Direction::Consumer)?;
        let attributes = target.attributes.clone();
        target
            .artifacts
            .extend(files.into_iter().map(|f| Artifact::new(f, attributes.clone())));
        Ok(())
    }

    /// Declares that `consumer` resolves artifacts from `producer`.
    pub fn declare_dependency(
        &mut self,
        consumer: &UnitId,
        producer: &UnitId,
    ) -> Result<(), ChannelError> {
        if consumer == producer {
            return Err(ChannelError::SelfDependency(consumer.0.clone()));
        }
        self.entry(consumer)?;
        self.entry(producer)?;
        self.dependencies
            .entry(consumer.clone())
            .or_default()
            .insert(producer.clone());
        Ok(())
    }

    /// Units `unit` declared a dependency on.
    pub fn dependencies(&self, unit: &UnitId) -> Vec<&UnitId> {
        self.dependencies
            .get(unit)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Units that declared a dependency on `unit`.
    pub fn dependents(&self, unit: &UnitId) -> Vec<&UnitId> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.contains(unit))
            .map(|(consumer, _)| consumer)
            .collect()
    }

    /// All registered units in id order.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.units.keys()
    }

    /// The module name a unit was registered with.
    pub fn module_name(&self, unit: &UnitId) -> Option<&str> {
        self.units.get(unit).map(|e| e.module_name.as_str())
    }

    /// Looks up a channel by name.
    pub fn channel(&self, unit: &UnitId, name: &str) -> Option<&Channel> {
        self.units.get(unit)?.channels.get(name)
    }

    /// Pulls every artifact matching `request` into `unit`.
    ///
    /// The consumer channel for `(kind, format)` and every channel it extends
    /// contribute their locally declared files, then each declared dependency
    /// is matched against the channel's tuple. Dependencies that publish
    /// nothing compatible contribute an empty set. Artifacts whose own tags
    /// contradict the request are discarded and reported in
    /// [`Resolution::discarded`].
    pub fn resolve(
        &self,
        unit: &UnitId,
        request: &ResolveRequest,
    ) -> Result<Resolution, ChannelError> {
        let entry = self.entry(unit)?;
        let root = self.consumer_for(unit, request.kind, &request.format)?;
        let root_attributes = request.attributes()?;

        let mut resolution = Resolution::default();
        let mut contributors = BTreeSet::new();
        for (depth, name) in extends_closure(entry, &root.name).into_iter().enumerate() {
            let channel = entry
                .channels
                .get(&name)
                .ok_or_else(|| ChannelError::UnknownChannel {
                    unit: unit.0.clone(),
                    name: name.clone(),
                })?;
            let wanted = if depth == 0 {
                &root_attributes
            } else {
                &channel.attributes
            };
            for artifact in &channel.artifacts {
                resolution.push(artifact);
            }
            for producer in self.dependencies(unit) {
                if self.pull(producer, wanted, &mut resolution)? {
                    contributors.insert(producer.clone());
                }
            }
        }

        resolution.empty_producers = self
            .dependencies(unit)
            .into_iter()
            .filter(|p| !contributors.contains(*p))
            .cloned()
            .collect();
        for producer in &resolution.empty_producers {
            debug!(
                unit = %unit,
                producer = %producer,
                kind = %request.kind,
                format = %request.format,
                "dependency publishes nothing for request"
            );
        }
        if resolution.is_empty() && !self.dependencies(unit).is_empty() {
            warn!(
                unit = %unit,
                kind = %request.kind,
                format = %request.format,
                "no declared dependency produced a compatible artifact"
            );
        }
        Ok(resolution)
    }

    /// Returns the consumer channel serving `(kind, format)` in `unit`.
    pub fn consumer_for(
        &self,
        unit: &UnitId,
        kind: ComponentKind,
        format: &Format,
    ) -> Result<&Channel, ChannelError> {
        self.entry(unit)?
            .channels
            .values()
            .find(|c| {
                c.direction == Direction::Consumer
                    && c.attributes.component == Some(kind)
                    && c.attributes.format.as_ref() == Some(format)
            })
            .ok_or_else(|| ChannelError::NoConsumer {
                unit: unit.0.clone(),
                kind,
                format: format.clone(),
            })
    }

    fn pull(
        &self,
        producer: &UnitId,
        wanted: &AttributeSet,
        resolution: &mut Resolution,
    ) -> Result<bool, ChannelError> {
        let entry = self.entry(producer)?;
        let candidates = entry
            .channels
            .values()
            .filter(|c| c.direction == Direction::Producer)
            .map(|c| (c, compatibility(wanted, &c.attributes, c.scope)))
            .collect();

        let mut contributed = false;
        for channel in disambiguate(candidates) {
            for artifact in &channel.artifacts {
                if compatibility(wanted, &artifact.attributes, channel.scope).is_compatible() {
                    resolution.push(artifact);
                    contributed = true;
                } else {
                    warn!(
                        producer = %producer,
                        channel = %channel.name,
                        path = %artifact.path.display(),
                        requested = %wanted,
                        actual = %artifact.attributes,
                        "discarding artifact with mismatched attributes"
                    );
                    resolution.discarded.push(Mismatch {
                        producer: producer.clone(),
                        channel: channel.name.clone(),
                        path: artifact.path.clone(),
                        attributes: artifact.attributes.clone(),
                    });
                }
            }
        }
        Ok(contributed)
    }

    fn entry(&self, unit: &UnitId) -> Result<&UnitEntry, ChannelError> {
        self.units
            .get(unit)
            .ok_or_else(|| ChannelError::UnknownUnit(unit.0.clone()))
    }

    fn insert_channel(&mut self, unit: &UnitId, channel: Channel) -> Result<(), ChannelError> {
        let entry = self
            .units
            .get_mut(unit)
            .ok_or_else(|| ChannelError::UnknownUnit(unit.0.clone()))?;
        if entry.channels.contains_key(&channel.name) {
            return Err(ChannelError::DuplicateChannel {
                unit: unit.0.clone(),
                name: channel.name,
            });
        }
        entry.channels.insert(channel.name.clone(), channel);
        Ok(())
    }

    fn channel_with(
        &self,
        unit: &UnitId,
        name: &str,
        direction: Direction,
    ) -> Result<&Channel, ChannelError> {
        let channel = self
            .entry(unit)?
            .channels
            .get(name)
            .ok_or_else(|| ChannelError::UnknownChannel {
                unit: unit.0.clone(),
                name: name.to_string(),
            })?;
        check_direction(unit, channel, direction)?;
        Ok(channel)
    }

    fn channel_with_mut(
        &mut self,
        unit: &UnitId,
        name: &str,
        direction: Direction,
    ) -> Result<&mut Channel, ChannelError> {
        let channel = self
            .units
            .get_mut(unit)
            .ok_or_else(|| ChannelError::UnknownUnit(unit.0.clone()))?
            .channels
            .get_mut(name)
            .ok_or_else(|| ChannelError::UnknownChannel {
                unit: unit.0.clone(),
                name: name.to_string(),
            })?;
        check_direction(unit, channel, direction)?;
        Ok(channel)
    }
}

fn check_direction(
    unit: &UnitId,
    channel: &Channel,
    direction: Direction,
) -> Result<(), ChannelError> {
    if channel.direction == direction {
        return Ok(());
    }
    Err(ChannelError::WrongDirection {
        unit: unit.0.clone(),
        name: channel.name.clone(),
        expected: match direction {
            Direction::Producer => "producer",
            Direction::Consumer => "consumer",
        },
    })
}

/// `root` followed by every channel it transitively extends, depth first.
fn extends_closure(entry: &UnitEntry, root: &str) -> Vec<String> {
    let mut order = Vec::new();
    let mut stack = vec![root.to_string()];
    while let Some(name) = stack.pop() {
        if order.contains(&name) {
            continue;
        }
        if let Some(channel) = entry.channels.get(&name) {
            stack.extend(channel.extends.iter().rev().cloned());
        }
        order.push(name);
    }
    order
}
