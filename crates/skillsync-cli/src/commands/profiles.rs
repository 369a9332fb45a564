//! Profiles command implementation

use std::path::Path;

use colored::Colorize;
use skillsync_profiles::Profile;

use super::open_engine;
use crate::cli::SelectionArgs;
use crate::error::Result;

/// Run the profiles command
pub fn run_profiles(path: &Path, selection: &SelectionArgs, all: bool) -> Result<()> {
    let engine = open_engine(path, selection)?;
    let resolved = engine.resolve_profiles(selection.profiles.as_deref());

    println!("{}", "Active Profiles".bold());
    println!("{}: {}", "Source".dimmed(), resolved.source.as_str().cyan());
    println!();

    if resolved.is_empty() {
        println!("  {} (use {} or add a marker directory)", "None".dimmed(), "--profiles".cyan());
    }
    for id in &resolved.ids {
        print_profile(&engine.registry().profile(id), true);
    }

    if all {
        let inactive: Vec<&Profile> = engine
            .registry()
            .iter()
            .filter(|p| !resolved.ids.contains(&p.id))
            .collect();
        if !inactive.is_empty() {
            println!();
            println!("{}", "Other Registered Profiles".bold());
            println!();
            for profile in inactive {
                print_profile(profile, false);
            }
        }
    }

    for warning in &resolved.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    Ok(())
}

fn print_profile(profile: &Profile, active: bool) {
    let id = if active {
        profile.id.green().bold()
    } else {
        profile.id.normal()
    };
    println!("  {:<12} {}", id, profile.name.dimmed());
    println!("    {:<8} {}", "content".dimmed(), profile.content_root);
    println!("    {:<8} {} ({})", "config".dimmed(), profile.config_path, profile.root_key);
    if !profile.transform.is_identity() {
        println!("    {:<8} {}", "entries".dimmed(), "reshaped".yellow());
    }
}
