//! On-disk layout of generated output.

use std::path::{Path, PathBuf};

use folio_attrs::Format;
use folio_params::GenerationMode;

/// Directory below every unit that holds generated output.
pub const BUILD_DIR: &str = "build/folio";

/// Step cache directory below the workspace root.
pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(BUILD_DIR).join(".cache")
}

/// Output directories of one `(unit, format)` pair.
#[derive(Clone, Debug)]
pub struct UnitLayout {
    base: PathBuf,
}

impl UnitLayout {
    /// Layout for `format` below `unit_dir`.
    pub fn new(unit_dir: &Path, format: &Format) -> Self {
        Self {
            base: unit_dir.join(BUILD_DIR).join(format.name()),
        }
    }

    /// Module-mode engine output.
    pub fn module(&self) -> PathBuf {
        self.base.join("module")
    }

    /// The packaged component bundle.
    pub fn component(&self) -> PathBuf {
        self.base.join("component")
    }

    /// Final publication output.
    pub fn publication(&self) -> PathBuf {
        self.base.join("publication")
    }

    /// Engine working directory (manifest and log) for one mode.
    pub fn work(&self, mode: GenerationMode) -> PathBuf {
        self.base.join("work").join(mode.as_str())
    }

    /// Output directory of a generation run in `mode`.
    pub fn output(&self, mode: GenerationMode) -> PathBuf {
        match mode {
            GenerationMode::Module => self.module(),
            GenerationMode::Publication => self.publication(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_per_format() {
        let layout = UnitLayout::new(Path::new("/w/hello"), &Format::javadoc());
        assert_eq!(layout.module(), Path::new("/w/hello/build/folio/javadoc/module"));
        assert_eq!(layout.component(), Path::new("/w/hello/build/folio/javadoc/component"));
        assert_eq!(
            layout.work(GenerationMode::Publication),
            Path::new("/w/hello/build/folio/javadoc/work/publication")
        );
        assert_eq!(layout.output(GenerationMode::Publication), layout.publication());
        assert_eq!(cache_dir(Path::new("/w")), Path::new("/w/build/folio/.cache"));
    }
}
