use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ARTICLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article [
  <!ENTITY product "Foo">
]>
<!-- keep me -->
<article xmlns="http://docbook.org/ns/docbook" version="5.0" xml:lang="en">
  <title>About &product;</title>
  <para>Hello</para>
</article>
"#;

const PLAIN: &str = r#"<article xmlns="http://docbook.org/ns/docbook" version="5.0">
  <title>Plain</title>
</article>
"#;

const NOT_DOCBOOK: &str = r#"<article xmlns="urn:other">
  <title>Other</title>
</article>
"#;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    /// The binary, isolated from the user's config and log settings.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("docmanager").unwrap();
        cmd.env("NO_COLOR", "1")
            .env_remove("DOCMANAGER_LOG")
            .arg("--config")
            .arg(self.config());
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn set_then_get_single_value() {
    let env = Env::new();
    let file = env.file("a.xml", ARTICLE);

    env.cmd()
        .args(["set", "-p", "maintainer=tux", "--status", "edited"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ok ]"))
        .stdout(predicate::str::contains("Wrote 1 valid XML file."));

    env.cmd()
        .args(["g", "-p", "status"])
        .arg(&file)
        .assert()
        .success()
        .stdout("edited\n");
}

#[test]
fn set_keeps_the_header_and_entities() {
    let env = Env::new();
    let file = env.file("a.xml", ARTICLE);

    env.cmd()
        .args(["set", "-p", "priority=3"])
        .arg(&file)
        .assert()
        .success();

    let text = read(&file);
    assert!(text.starts_with(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE article [\n  <!ENTITY product \"Foo\">\n]>\n<!-- keep me -->\n"
    ));
    assert!(text.contains(
        r#"<article xmlns="http://docbook.org/ns/docbook" version="5.0" xml:lang="en">"#
    ));
    assert!(text.contains("<title>About &product;</title>"));
    assert!(text.contains("<dm:priority>3</dm:priority>"));
}

#[test]
fn get_several_properties_and_files() {
    let env = Env::new();
    let a = env.file("a.xml", PLAIN);
    let b = env.file("b.xml", PLAIN);

    env.cmd()
        .args(["s", "-p", "maintainer=tux;release=15"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 valid XML files."));

    env.cmd()
        .args(["get", "-p", "maintainer,release"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{} -> maintainer=tux release=15",
            a.display()
        )))
        .stdout(predicate::str::contains(format!(
            "{} -> maintainer=tux release=15",
            b.display()
        )));
}

#[test]
fn get_as_json() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);
    env.cmd()
        .args(["set", "--maintainer", "tux"])
        .arg(&file)
        .assert()
        .success();

    let output = env
        .cmd()
        .args(["get", "-p", "maintainer", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["properties"][0]["name"], "maintainer");
    assert_eq!(value[0]["properties"][0]["value"], "tux");
}

#[test]
fn invalid_value_is_rejected_before_writing() {
    let env = Env::new();
    let file = env.file("a.xml", ARTICLE);

    env.cmd()
        .args(["set", "--status", "done"])
        .arg(&file)
        .assert()
        .code(12)
        .stderr(predicate::str::contains("Value of 'status' is incorrect"));
    assert_eq!(read(&file), ARTICLE);
}

#[test]
fn pair_without_equals_is_a_usage_error() {
    let env = Env::new();
    let file = env.file("a.xml", ARTICLE);

    env.cmd()
        .args(["set", "-p", "maintainer"])
        .arg(&file)
        .assert()
        .code(5);
}

#[test]
fn missing_file_does_not_stop_the_others() {
    let env = Env::new();
    let good = env.file("good.xml", PLAIN);
    let missing = env.dir.path().join("missing.xml");

    env.cmd()
        .args(["set", "-p", "maintainer=tux"])
        .arg(&missing)
        .arg(&good)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[ error ]"))
        .stdout(predicate::str::contains("Skipped 1 XML file due to errors."));
    assert!(read(&good).contains("<dm:maintainer>tux</dm:maintainer>"));
}

#[test]
fn stop_on_error_leaves_every_file_alone() {
    let env = Env::new();
    let good = env.file("good.xml", PLAIN);
    let other = env.file("other.xml", NOT_DOCBOOK);

    env.cmd()
        .args(["set", "--stop-on-error", "-j", "1", "-p", "maintainer=tux"])
        .arg(&good)
        .arg(&other)
        .assert()
        .code(13);
    assert_eq!(read(&good), PLAIN);
}

#[test]
fn delete_only_when_value_matches() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);
    env.cmd()
        .args(["set", "-p", "maintainer=tux", "-p", "release=15"])
        .arg(&file)
        .assert()
        .success();

    env.cmd()
        .args(["del", "-p", "maintainer=geeko,release"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Couldn't delete these properties: maintainer=geeko",
        ))
        .stdout(predicate::str::contains(
            "Deleted successfully 1 property, 1 property couldn't be deleted, and 0 files were invalid.",
        ));

    let text = read(&file);
    assert!(text.contains("<dm:maintainer>tux</dm:maintainer>"));
    assert!(!text.contains("dm:release"));
}

#[test]
fn init_creates_defaults() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);

    env.cmd()
        .args(["init", "--with-bugtracker", "--priority", "2"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Initialized successfully 1 files. 0 files failed.",
        ));

    let text = read(&file);
    assert!(text.contains("<dm:priority>2</dm:priority>"));
    assert!(text.contains("<dm:bugtracker>"));
    assert!(text.contains("<dm:url/>") || text.contains("<dm:url></dm:url>"));
}

#[test]
fn bugtracker_fields_have_their_own_options() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);

    env.cmd()
        .args(["set", "--bugtracker-url", "https://bugs", "--bugtracker-product", "Foo"])
        .arg(&file)
        .assert()
        .success();

    let text = read(&file);
    assert!(text.contains("<dm:bugtracker>"), "{}", text);
    assert!(text.contains("<dm:url>https://bugs</dm:url>"), "{}", text);
    assert!(text.contains("<dm:product>Foo</dm:product>"), "{}", text);

    env.cmd()
        .args(["get", "-p", "bugtracker/product"])
        .arg(&file)
        .assert()
        .success()
        .stdout("Foo\n");
}

#[test]
fn attributes_round_trip() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);
    env.cmd()
        .args(["set", "--status", "editing"])
        .arg(&file)
        .assert()
        .success();

    env.cmd()
        .args(["sa", "-p", "status", "-a", "since=2026-10-01"])
        .arg(&file)
        .assert()
        .success();

    env.cmd()
        .args(["ga", "-p", "status"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"status: since="2026-10-01""#));

    env.cmd()
        .args(["da", "-p", "status", "-a", "since,missing"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "These attributes couldn't be deleted: missing",
        ));
}

#[test]
fn set_attr_on_missing_property_fails() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);

    env.cmd()
        .args(["set-attr", "-p", "deadline", "-a", "a=b"])
        .arg(&file)
        .assert()
        .code(11);
}

#[test]
fn analyze_sorts_and_filters() {
    let env = Env::new();
    let files: Vec<PathBuf> = [("a.xml", "10"), ("b.xml", "2"), ("c.xml", "1")]
        .iter()
        .map(|(name, priority)| {
            let file = env.file(name, PLAIN);
            env.cmd()
                .args(["set", "-p", &format!("priority={}", priority)])
                .arg(&file)
                .assert()
                .success();
            file
        })
        .collect();

    env.cmd()
        .args(["a", "-qf", "{priority}", "-s", "priority", "-q"])
        .args(&files)
        .assert()
        .success()
        .stdout("1\n2\n10\n");

    env.cmd()
        .args(["analyze", "-qf", "{os.file}", "-f", "-priority=2", "-q"])
        .args(&files)
        .assert()
        .success()
        .stdout(format!("{}\n{}\n", files[0].display(), files[2].display()));
}

#[test]
fn analyze_uses_configured_queryformat() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);

    env.cmd()
        .args(["config", "queryformat", "[{maintainer}]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queryformat set to [{maintainer}]"));

    env.cmd()
        .args(["analyze", "-do", "none"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("[none]"))
        .stdout(predicate::str::contains("Successfully analyzed 1 XML files."));
}

#[test]
fn analyze_without_queryformat_fails() {
    let env = Env::new();
    let file = env.file("a.xml", PLAIN);

    env.cmd()
        .arg("analyze")
        .arg(&file)
        .assert()
        .code(10)
        .stderr(predicate::str::starts_with("Error: Missing argument"));
}

#[test]
fn config_shows_and_sets_keys() {
    let env = Env::new();

    env.cmd().args(["config", "jobs", "3"]).assert().success();
    env.cmd()
        .args(["config", "jobs"])
        .assert()
        .success()
        .stdout("3\n");
    env.cmd()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("jobs = 3"))
        .stdout(predicate::str::contains("stop_on_error = false"));

    env.cmd()
        .args(["config", "colour", "red"])
        .assert()
        .code(16);
}

#[test]
fn only_directories_means_no_files() {
    let env = Env::new();

    env.cmd()
        .args(["get", "-p", "status"])
        .arg(env.dir.path())
        .assert()
        .code(8)
        .stderr(predicate::str::contains("No XML files given"));
}

#[test]
fn version_starts_with_the_package_version() {
    let env = Env::new();
    env.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "docmanager {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn not_docbook_is_reported() {
    let env = Env::new();
    let file = env.file("a.xml", NOT_DOCBOOK);

    env.cmd()
        .args(["get", "-p", "status"])
        .arg(&file)
        .assert()
        .code(13)
        .stdout(predicate::str::contains("[ error ]"));
}
