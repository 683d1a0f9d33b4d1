//! Manifests built from the same configuration are byte-identical.

use folio_config::load_workspace;
use folio_params::{to_json, GenerationMode, ManifestBuilder, ModuleManifest};
use std::path::{Path, PathBuf};

const UNIT: &str = r##"
[unit]
name = "hello"
version = "1.0.0"
includes = ["Module.md"]

[publication]
fail_on_warning = true

[source_sets.main]
source_roots = ["src/main/kotlin", "src/gen/kotlin"]
classpath = ["libs/b.jar", "libs/a.jar"]
depends_on = ["common"]
[[source_sets.main.source_links]]
local_directory = "src/main/kotlin"
remote_url = "https://example.com/hello/src/main/kotlin"
remote_line_suffix = "#L"

[source_sets.common]
platform = "common"

[source_sets.test]
suppress = true

[[plugin]]
id = "org.jetbrains.dokka.base.DokkaBase"
values = { footerMessage = "(c) 2026", separateInheritedMembers = false, customStyleSheets = ["a.css"] }

[[plugin]]
id = "org.jetbrains.dokka.versioning.VersioningPlugin"
values = { version = "1.0.0" }
"##;

fn manifest_bytes(root: &Path) -> Vec<u8> {
    let ws = load_workspace(root).unwrap();
    let unit = ws.resolve_units().unwrap().remove(0);
    let manifest = ManifestBuilder::new(
        &unit,
        GenerationMode::Publication,
        root.join("build/folio/html/publication"),
    )
    .plugins_classpath(vec![root.join("engine/base.jar")])
    .modules(vec![
        ModuleManifest {
            name: "z".to_string(),
            module_path: "z".to_string(),
            source_output_directory: PathBuf::from("/w/z"),
            includes: Vec::new(),
        },
        ModuleManifest {
            name: "a".to_string(),
            module_path: "a".to_string(),
            source_output_directory: PathBuf::from("/w/a"),
            includes: Vec::new(),
        },
    ])
    .build()
    .unwrap();
    to_json(&manifest).unwrap()
}

#[test]
fn two_invocations_produce_identical_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("folio.toml"), UNIT).unwrap();

    let first = manifest_bytes(tmp.path());
    let second = manifest_bytes(tmp.path());
    assert_eq!(first, second);
}

#[test]
fn suppressed_test_source_set_never_appears() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("folio.toml"), UNIT).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&manifest_bytes(tmp.path())).unwrap();
    let names: Vec<_> = json["sourceSets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sourceSetId"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["common", "main"]);
    assert_eq!(json["moduleVersion"], "1.0.0");
    assert_eq!(json["failOnWarning"], true);
    assert_eq!(json["delayTemplateSubstitution"], false);
    assert_eq!(json["modules"][0]["name"], "a");
}
