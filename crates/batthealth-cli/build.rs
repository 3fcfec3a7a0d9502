use std::env;
use std::process::Command;

const COMMIT_LEN: usize = 7;

/// Stamp `--version` with the commit the binary was built from.
///
/// Lookup order: an explicit `BATTHEALTH_BUILD_COMMIT`, CI's `GITHUB_SHA`,
/// then the local checkout.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=BATTHEALTH_BUILD_COMMIT");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    let commit = ["BATTHEALTH_BUILD_COMMIT", "GITHUB_SHA"]
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .or_else(git_head)
        .map(|sha| sha.trim().chars().take(COMMIT_LEN).collect::<String>())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BATTHEALTH_BUILD_COMMIT={commit}");
}

fn git_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|sha| !sha.is_empty())
}
