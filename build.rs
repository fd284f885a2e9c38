//! Stamps development builds with the commit they were built from.
//!
//! `DM_BUILD_INFO` is empty for a clean checkout of the release tag and
//! `@<short hash> <commit date>` otherwise.

use std::process::Command;

fn main() {
    for path in [".git/HEAD", ".git/index"] {
        println!("cargo:rerun-if-changed={}", path);
    }
    println!(
        "cargo:rustc-env=DM_BUILD_INFO={}",
        build_info().unwrap_or_default()
    );
}

fn build_info() -> Option<String> {
    let version = std::env::var("CARGO_PKG_VERSION").ok()?;
    // --dirty appends "-dirty", so a modified tree never equals the tag
    if let Some(tag) = git(&["describe", "--tags", "--exact-match", "--dirty"]) {
        if tag.trim_start_matches('v') == version {
            return None;
        }
    }
    let hash = git(&["rev-parse", "--short", "HEAD"])?;
    match git(&["show", "-s", "--format=%cd", "--date=format:%Y-%m-%d %H:%M", "HEAD"]) {
        Some(date) => Some(format!("@{} {}", hash, date)),
        None => Some(format!("@{}", hash)),
    }
}

/// Trimmed stdout of a successful, non-empty git call.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
