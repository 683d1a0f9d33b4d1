//! Attribute kinds, values, and tuples.

use crate::error::AttrError;
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of artifact flowing through a channel.
///
/// This is a closed set: adding a kind changes the exchange protocol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    /// Files of one source set (roots, classpath, samples, includes).
    SourceSetFiles,
    /// A packaged module: its generated output plus its descriptor.
    ModuleFiles,
    /// Generation engine plugin jars for one format.
    PluginsClasspath,
    /// The full classpath the isolated engine process runs with.
    GeneratorClasspath,
}

impl ComponentKind {
    /// All kinds, in declaration order.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::SourceSetFiles,
        ComponentKind::ModuleFiles,
        ComponentKind::PluginsClasspath,
        ComponentKind::GeneratorClasspath,
    ];

    /// Stable kebab-case name used in channel names and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::SourceSetFiles => "source-set-files",
            ComponentKind::ModuleFiles => "module-files",
            ComponentKind::PluginsClasspath => "plugins-classpath",
            ComponentKind::GeneratorClasspath => "generator-classpath",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one attribute slot of an [`AttributeSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AttributeKey {
    /// The output format.
    Format,
    /// The component kind.
    Component,
    /// The source-set id (`scope/name`).
    SourceSetId,
    /// The module id (module name).
    ModuleId,
}

impl AttributeKey {
    /// All keys in matching order.
    pub const ALL: [AttributeKey; 4] = [
        AttributeKey::Format,
        AttributeKey::Component,
        AttributeKey::SourceSetId,
        AttributeKey::ModuleId,
    ];
}

/// A single typed attribute value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Attribute {
    /// An output format tag.
    Format(Format),
    /// A component kind tag.
    Component(ComponentKind),
    /// A source-set id tag.
    SourceSetId(String),
    /// A module id tag.
    ModuleId(String),
}

impl Attribute {
    /// Returns the slot this attribute occupies.
    pub fn key(&self) -> AttributeKey {
        match self {
            Attribute::Format(_) => AttributeKey::Format,
            Attribute::Component(_) => AttributeKey::Component,
            Attribute::SourceSetId(_) => AttributeKey::SourceSetId,
            Attribute::ModuleId(_) => AttributeKey::ModuleId,
        }
    }
}

/// A tuple of optional attributes tagging a channel or an artifact.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct AttributeSet {
    /// Output format, absent for format-agnostic channels.
    pub format: Option<Format>,
    /// Component kind.
    pub component: Option<ComponentKind>,
    /// Source-set id, only meaningful for [`ComponentKind::SourceSetFiles`].
    pub source_set_id: Option<String>,
    /// Module id, only meaningful for [`ComponentKind::ModuleFiles`].
    pub module_id: Option<String>,
}

impl AttributeSet {
    /// Creates an empty tuple.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for the common `(format, kind)` tuple.
    pub fn of(format: &Format, kind: ComponentKind) -> Self {
        Self {
            format: Some(format.clone()),
            component: Some(kind),
            ..Self::default()
        }
    }

    /// Sets one attribute, replacing any previous value in that slot.
    pub fn with(mut self, attribute: Attribute) -> Self {
        match attribute {
            Attribute::Format(f) => self.format = Some(f),
            Attribute::Component(c) => self.component = Some(c),
            Attribute::SourceSetId(id) => self.source_set_id = Some(id),
            Attribute::ModuleId(id) => self.module_id = Some(id),
        }
        self
    }

    /// Returns the attribute stored in the given slot.
    pub fn get(&self, key: AttributeKey) -> Option<Attribute> {
        match key {
            AttributeKey::Format => self.format.clone().map(Attribute::Format),
            AttributeKey::Component => self.component.map(Attribute::Component),
            AttributeKey::SourceSetId => self.source_set_id.clone().map(Attribute::SourceSetId),
            AttributeKey::ModuleId => self.module_id.clone().map(Attribute::ModuleId),
        }
    }

    /// Rejects tuples whose tags contradict each other.
    ///
    /// A source-set id is only valid on `SourceSetFiles`, a module id only on
    /// `ModuleFiles`, and classpath kinds never carry either id.
    pub fn validate(&self) -> Result<(), AttrError> {
        let malformed = |reason: &str| AttrError::Malformed {
            tuple: self.to_string(),
            reason: reason.to_string(),
        };
        if self.source_set_id.is_some() && self.component != Some(ComponentKind::SourceSetFiles) {
            return Err(malformed("a source-set id requires component source-set-files"));
        }
        if self.module_id.is_some() && self.component != Some(ComponentKind::ModuleFiles) {
            return Err(malformed("a module id requires component module-files"));
        }
        if matches!(self.source_set_id.as_deref(), Some("")) {
            return Err(malformed("empty source-set id"));
        }
        if matches!(self.module_id.as_deref(), Some("")) {
            return Err(malformed("empty module id"));
        }
        Ok(())
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<&str>| v.unwrap_or("*").to_string();
        write!(
            f,
            "format={}, component={}, source-set={}, module={}",
            show(self.format.as_ref().map(Format::name)),
            show(self.component.map(ComponentKind::as_str)),
            show(self.source_set_id.as_deref()),
            show(self.module_id.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_replaces_slot() {
        let set = AttributeSet::of(&Format::html(), ComponentKind::ModuleFiles)
            .with(Attribute::Format(Format::javadoc()));
        assert_eq!(set.format, Some(Format::javadoc()));
        assert_eq!(set.component, Some(ComponentKind::ModuleFiles));
    }

    #[test]
    fn get_round_trips_each_key() {
        let set = AttributeSet::of(&Format::html(), ComponentKind::SourceSetFiles)
            .with(Attribute::SourceSetId(":hello/main".to_string()));
        assert_eq!(
            set.get(AttributeKey::SourceSetId),
            Some(Attribute::SourceSetId(":hello/main".to_string()))
        );
        assert_eq!(set.get(AttributeKey::ModuleId), None);
        for key in AttributeKey::ALL {
            if let Some(attr) = set.get(key) {
                assert_eq!(attr.key(), key);
            }
        }
    }

    #[test]
    fn validate_rejects_misplaced_ids() {
        let bad = AttributeSet::of(&Format::html(), ComponentKind::PluginsClasspath)
            .with(Attribute::ModuleId("hello".to_string()));
        assert!(matches!(bad.validate(), Err(AttrError::Malformed { .. })));

        let good = AttributeSet::of(&Format::html(), ComponentKind::ModuleFiles)
            .with(Attribute::ModuleId("hello".to_string()));
        assert!(good.validate().is_ok());
    }

    #[test]
    fn display_marks_absent_slots() {
        let set = AttributeSet::new().with(Attribute::Component(ComponentKind::GeneratorClasspath));
        assert_eq!(
            set.to_string(),
            "format=*, component=generator-classpath, source-set=*, module=*"
        );
    }

    #[test]
    fn component_kind_serde_is_kebab_case() {
        let json = serde_json::to_string(&ComponentKind::ModuleFiles).unwrap();
        assert_eq!(json, "\"module-files\"");
    }
}
