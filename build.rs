use anyhow::{Context, Result};
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

const LIB_NAME: &str = "ac3";

fn main() -> Result<()> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating git instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }

    // Reproducible builds pin the timestamp
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val.parse::<i64>().context("SOURCE_DATE_EPOCH is not a number")?;
            chrono::Utc
                .timestamp_opt(secs, 0)
                .single()
                .context("SOURCE_DATE_EPOCH out of range")?
        }
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let lib_version = lib_version_from_metadata()
        .or_else(|_| lib_version_from_manifest())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=AC3_VERSION={lib_version}");

    println!("cargo:rerun-if-changed={LIB_NAME}/Cargo.toml");

    Ok(())
}

/// Looks the library up in `cargo metadata`, as a workspace member or as a
/// resolved registry dependency.
fn lib_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let member = metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some(LIB_NAME))
        .and_then(|package| package["version"].as_str());

    if let Some(version) = member {
        return Ok(version.to_string());
    }

    // Node ids look like "ac3 0.1.0 (registry+...)"
    let resolved = metadata["resolve"]["nodes"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|node| node["id"].as_str())
        .find_map(|id| {
            let mut parts = id.split(' ');
            (parts.next() == Some(LIB_NAME))
                .then(|| parts.next())
                .flatten()
        });

    resolved
        .map(str::to_string)
        .with_context(|| format!("{LIB_NAME} package not found in metadata"))
}

fn lib_version_from_manifest() -> Result<String> {
    let manifest = fs::read_to_string(format!("{LIB_NAME}/Cargo.toml"))?;

    manifest
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("version"))
        .find_map(|line| line.split_once('='))
        .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\'').to_string())
        .with_context(|| format!("no version in {LIB_NAME}/Cargo.toml"))
}
