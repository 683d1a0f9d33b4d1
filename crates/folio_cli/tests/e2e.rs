//! Full `folio` runs over a small workspace with a `sh` script as the engine.
#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

/// Module mode writes one page per `.kt` file (embedding its source) plus a
/// package list;
/// publication mode only leaves a marker.
const ENGINE: &str = r#"
manifest="$1"
out=$(sed -n 's/^ *"outputDir": "\(.*\)",$/\1/p' "$manifest")
mkdir -p "$out"
if grep -q '"delayTemplateSubstitution": true' "$manifest"; then
  mkdir -p "$out/demo"
  for root in $(grep -o '"/[^"]*/src/main/kotlin"' "$manifest" | tr -d '"'); do
    for file in "$root"/*.kt; do
      class=$(basename "$file" .kt)
      { echo "<html>"; cat "$file"; echo "</html>"; } > "$out/demo/$class.html"
    done
  done
  printf '$dokka.format:html-v1\n$dokka.linkExtension:html\n\ndemo\n' > "$out/package-list"
else
  echo "publication" > "$out/engine-ran.txt"
fi
echo "engine done"
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn workspace(root: &Path, engine: &str) {
    write(root, "engine.sh", engine);
    write(root, "engine/engine.jar", "jar");
    write(
        root,
        "folio.toml",
        &format!(
            r#"
[workspace]
members = ["hello", "goodbye", "docs"]
jobs = 2

[engine]
classpath = ["engine/engine.jar"]
program = ["sh", "{}"]
"#,
            root.join("engine.sh").display()
        ),
    );
    for (name, class) in [("hello", "Hello"), ("goodbye", "Goodbye")] {
        write(
            root,
            &format!("{name}/folio.toml"),
            &format!(
                "[unit]\nname = \"{name}\"\n\n[source_sets.main]\nsource_roots = [\"src/main/kotlin\"]\n"
            ),
        );
        write(
            root,
            &format!("{name}/src/main/kotlin/{class}.kt"),
            &format!("package demo\n\nclass {class}\n"),
        );
    }
    write(
        root,
        "docs/folio.toml",
        "[unit]\nname = \"docs\"\n\n[dependencies]\nmodules = [\"../hello\", \"../goodbye\"]\n",
    );
}

fn folio(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_folio"))
        .args(["--color", "never"])
        .args(args)
        .current_dir(root)
        .env_remove("FOLIO_LOG")
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn hello_and_goodbye_are_aggregated() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);

    let output = folio(root, &["generate"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let publication = root.join("docs/build/folio/html/publication");
    assert!(publication.join("hello/demo/Hello.html").is_file());
    assert!(publication.join("goodbye/demo/Goodbye.html").is_file());
    assert!(publication.join("engine-ran.txt").is_file());

    let index = std::fs::read_to_string(publication.join("index.html")).unwrap();
    assert!(index.contains("hello"));
    assert!(index.contains("goodbye"));
    let packages = std::fs::read_to_string(publication.join("package-list")).unwrap();
    assert!(packages.contains("module:goodbye"));
    assert!(packages.contains("module:hello"));

    // Two modules without the aggregation plugin on the classpath.
    assert!(stderr(&output).contains("warning[A201]"));
}

#[test]
fn second_run_is_up_to_date() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);

    assert!(folio(root, &["generate"]).status.success());
    let second = folio(root, &["generate"]);
    assert!(second.status.success());
    assert!(stderr(&second).contains("0 ran, 5 up to date"), "{}", stderr(&second));

    // Editing a source file reruns that module and the aggregate only.
    write(root, "hello/src/main/kotlin/Hello.kt", "package demo\n\nclass Hello(val x: Int)\n");
    let third = folio(root, &["generate"]);
    assert!(third.status.success());
    assert!(stderr(&third).contains("3 ran, 2 up to date"), "{}", stderr(&third));
}

#[test]
fn damaged_bundle_is_repackaged_on_the_next_run() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);
    assert!(folio(root, &["generate"]).status.success());

    let component = root.join("hello/build/folio/html/component");
    std::fs::remove_file(component.join("component.json")).unwrap();
    let second = folio(root, &["generate"]);
    assert!(second.status.success(), "{}", stderr(&second));
    assert!(stderr(&second).contains("1 ran, 4 up to date"), "{}", stderr(&second));
    assert!(component.join("component.json").is_file());
}

#[test]
fn json_message_format_prints_diagnostics_as_json() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);

    let output = folio(root, &["--message-format", "json", "generate"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let err = stderr(&output);
    let aggregation = err
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find(|value| value["code"]["number"] == 201)
        .unwrap_or_else(|| panic!("no A201 diagnostic in {err}"));
    assert_eq!(aggregation["severity"], "warning");
    assert_eq!(aggregation["unit"], "docs");
}

#[test]
fn engine_failure_fails_the_command() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, "echo broken; exit 2\n");

    let output = folio(root, &["generate"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("error[G401]"), "{err}");
    assert!(err.contains("engine.log"));
    assert!(err.contains("broken"));
    assert!(err.contains("skipped"));
}

#[test]
fn manifest_prints_module_mode_json() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);

    let output = folio(root, &["manifest", "--unit", "hello"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["moduleName"], "hello");
    assert_eq!(json["delayTemplateSubstitution"], true);
    assert!(json["outputDir"]
        .as_str()
        .unwrap()
        .ends_with("hello/build/folio/html/module"));
}

#[test]
fn package_then_clean() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    workspace(root, ENGINE);

    // Packaging needs module output first.
    assert_eq!(folio(root, &["package"]).status.code(), Some(1));

    assert!(folio(root, &["generate", "--unit", "docs"]).status.success());
    let component = root.join("hello/build/folio/html/component");
    std::fs::remove_file(component.join("module-descriptor.json")).unwrap();
    assert!(folio(root, &["package", "--unit", "hello"]).status.success());
    assert!(component.join("module-descriptor.json").is_file());

    assert!(folio(root, &["clean"]).status.success());
    assert!(!root.join("hello/build/folio").exists());
    assert!(!root.join("docs/build/folio").exists());
}
