//! Status command implementation

use std::path::Path;

use colored::Colorize;
use skillsync_core::ManifestStore;

use super::project_root;
use crate::error::Result;

/// Run the status command
///
/// Summarises the manifest: files per package and profile, and the
/// managed entries of every configuration document.
pub fn run_status(path: &Path, json: bool) -> Result<()> {
    let store = ManifestStore::new(project_root(path)?);
    let loaded = store.load()?;
    let manifest = loaded.manifest;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    for warning in &loaded.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    if manifest.is_empty() {
        println!("{}", "Nothing installed".dimmed());
        println!();
        println!("Run {} to install content.", "skillsync apply".cyan());
        return Ok(());
    }

    println!("{}", "skillsync Status".bold());
    println!();
    println!("{}: {}", "Manifest".dimmed(), store.path());
    println!();

    println!("{}:", "Content".bold());
    if manifest.packages.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (package, record) in &manifest.packages {
        println!("  {}", package.green());
        for (profile, files) in &record.files {
            println!("    {:<10} {} file(s)", profile.cyan(), files.len());
        }
    }
    println!();

    println!("{}:", "Configuration".bold());
    if manifest.config.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for (profile, record) in &manifest.config {
        let keys: Vec<&str> = record.managed_keys.iter().map(String::as_str).collect();
        println!("  {:<10} {} [{}]", profile.cyan(), record.path, keys.join(", "));
    }

    Ok(())
}
