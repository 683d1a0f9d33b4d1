//! The merged multi-module `package-list`.
//!
//! A module's list starts with `$dokka.` header lines followed by one
//! package per line. The merged list keeps a single header and groups each
//! module's packages under a `module:<name>` line.

use std::path::{Path, PathBuf};

use folio_attrs::Format;

/// File name of package lists, per module and at the aggregate root.
pub const PACKAGE_LIST_FILE: &str = "package-list";

const FORMAT_KEY: &str = "$dokka.format:";
const LINK_EXTENSION_KEY: &str = "$dokka.linkExtension:";

/// One module's contribution to the merged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePackages {
    /// Module name.
    pub name: String,
    /// Lines after the header, such as package names and `$dokka.location:` entries.
    pub lines: Vec<String>,
}

impl ModulePackages {
    /// Parses a module's package list, dropping blank and header lines.
    pub fn parse(name: &str, content: &str) -> Self {
        let lines = content
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .filter(|l| !l.starts_with(FORMAT_KEY) && !l.starts_with(LINK_EXTENSION_KEY))
            .map(str::to_string)
            .collect();
        Self {
            name: name.to_string(),
            lines,
        }
    }
}

/// Extension of page links for `format`.
pub fn link_extension(format: &Format) -> &'static str {
    match format.name() {
        "gfm" | "jekyll" => "md",
        _ => "html",
    }
}

/// Merges module lists, ordered by module name.
pub fn merge_package_lists(format: &Format, modules: &[ModulePackages]) -> String {
    let mut sorted: Vec<&ModulePackages> = modules.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = format!(
        "{FORMAT_KEY}{}-v1\n{LINK_EXTENSION_KEY}{}\n\n",
        format.name(),
        link_extension(format)
    );
    for module in sorted {
        out.push_str("module:");
        out.push_str(&module.name);
        out.push('\n');
        for line in &module.lines {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Finds a module's package list: at the output root, or one level down
/// under the module's name.
pub fn find_package_list(output: &Path, module_name: &str) -> Option<PathBuf> {
    [
        output.join(PACKAGE_LIST_FILE),
        output.join(module_name).join(PACKAGE_LIST_FILE),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lines_are_dropped() {
        let parsed = ModulePackages::parse(
            "hello",
            "$dokka.format:html-v1\n$dokka.linkExtension:html\n\ndemo.hello\n",
        );
        assert_eq!(parsed.lines, vec!["demo.hello"]);
    }

    #[test]
    fn merged_list_groups_by_module_name() {
        let merged = merge_package_lists(
            &Format::html(),
            &[
                ModulePackages {
                    name: "hello".to_string(),
                    lines: vec!["demo.hello".to_string()],
                },
                ModulePackages {
                    name: "goodbye".to_string(),
                    lines: vec![
                        "$dokka.location:demo.goodbye/Goodbye///PointingToDeclaration/goodbye/demo.goodbye/-goodbye/index.html".to_string(),
                        "demo.goodbye".to_string(),
                    ],
                },
            ],
        );
        let expected = "$dokka.format:html-v1\n$dokka.linkExtension:html\n\n\
                        module:goodbye\n\
                        $dokka.location:demo.goodbye/Goodbye///PointingToDeclaration/goodbye/demo.goodbye/-goodbye/index.html\n\
                        demo.goodbye\n\
                        module:hello\n\
                        demo.hello\n";
        assert_eq!(merged, expected);
    }

    #[test]
    fn markdown_formats_link_to_md() {
        let gfm = Format::gfm();
        assert_eq!(link_extension(&gfm), "md");
        assert!(merge_package_lists(&gfm, &[]).starts_with("$dokka.format:gfm-v1\n$dokka.linkExtension:md\n"));
    }
}
