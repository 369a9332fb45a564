//! Built-in profile definitions
//!
//! # Adding a new profile
//!
//! 1. Add a `fn <id>_profile() -> Profile` function below.
//! 2. Append it to [`builtin_profiles`]; the position is the detection order.
//!
//! Projects can also add or override profiles from settings without
//! touching this table.

use crate::transform::EntryTransform;
use crate::types::{CANONICAL_ROOT_KEY, Profile, ProfileOrigin};
use serde_json::json;

/// Number of built-in profiles.
pub const BUILTIN_COUNT: usize = 5;

/// All built-in profiles, in registry (detection) order.
pub fn builtin_profiles() -> Vec<Profile> {
    vec![
        claude_profile(),
        cursor_profile(),
        copilot_profile(),
        gemini_profile(),
        opencode_profile(),
    ]
}

fn builtin(
    id: &str,
    name: &str,
    marker: &str,
    content_root: &str,
    config_path: &str,
    root_key: &str,
) -> Profile {
    Profile {
        id: id.into(),
        name: name.into(),
        marker: marker.into(),
        content_root: content_root.into(),
        config_path: config_path.into(),
        root_key: root_key.into(),
        transform: EntryTransform::identity(),
        origin: ProfileOrigin::Builtin,
    }
}

// The shared `.mcp.json` sits at the project root rather than under `.claude`.
fn claude_profile() -> Profile {
    builtin(
        "claude",
        "Claude Code",
        ".claude",
        ".claude/skills",
        ".mcp.json",
        CANONICAL_ROOT_KEY,
    )
}

fn cursor_profile() -> Profile {
    builtin(
        "cursor",
        "Cursor",
        ".cursor",
        ".cursor/rules",
        ".cursor/mcp.json",
        CANONICAL_ROOT_KEY,
    )
}

fn copilot_profile() -> Profile {
    builtin(
        "copilot",
        "GitHub Copilot",
        ".github",
        ".github/skills",
        ".vscode/mcp.json",
        "servers",
    )
}

fn gemini_profile() -> Profile {
    builtin(
        "gemini",
        "Gemini CLI",
        ".gemini",
        ".gemini/skills",
        ".gemini/settings.json",
        CANONICAL_ROOT_KEY,
    )
}

fn opencode_profile() -> Profile {
    Profile {
        transform: EntryTransform::identity()
            .rename_type("stdio", "local")
            .collapse(["command", "args"], "command")
            .rename_field("env", "environment")
            .inject("enabled", json!(true)),
        ..builtin(
            "opencode",
            "OpenCode",
            ".opencode",
            ".opencode/skills",
            "opencode.json",
            "mcp",
        )
    }
}
