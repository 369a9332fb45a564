//! Scenario tests across repeated runs
//!
//! Each test drives a project through several engine runs the way a
//! package manager would: install, upgrade, switch profiles, uninstall.

use pretty_assertions::assert_eq;
use serde_json::json;
use skillsync_core::{ContentItem, DesiredState, FragmentSource, Settings, SettingsLoader, SyncEngine};
use skillsync_fs::NormalizedPath;
use skillsync_profiles::SelectionSource;
use skillsync_test_utils::TestProject;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn engine(project: &TestProject) -> SyncEngine {
    engine_with(project, Settings::default())
}

fn engine_with(project: &TestProject, settings: Settings) -> SyncEngine {
    SyncEngine::new(NormalizedPath::new(project.root()), settings).unwrap()
}

/// Engine built from the project's settings files, isolated from any
/// global configuration.
fn configured_engine(project: &TestProject) -> SyncEngine {
    let root = NormalizedPath::new(project.root());
    let settings = SettingsLoader::with_global_config_dir(root.clone(), project.path(".global"))
        .load()
        .unwrap();
    SyncEngine::new(root, settings).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// A package `name` shipping `skills` under `packages/<name>/skills`.
fn package(project: &TestProject, name: &str, skills: &[(&str, &str)]) -> Vec<ContentItem> {
    skills
        .iter()
        .map(|(skill, body)| {
            let rel = format!("packages/{name}/skills/{skill}/SKILL.md");
            project.write_file(&rel, body);
            ContentItem::new(
                name,
                format!("packages/{name}/skills"),
                format!("packages/{name}/skills/{skill}"),
            )
        })
        .collect()
}

fn mcp_fragment(project: &TestProject, name: &str, servers: serde_json::Value) -> FragmentSource {
    let rel = format!("packages/{name}/mcp.json");
    project.write_json(&rel, &json!({ "mcpServers": servers }));
    FragmentSource::new(name, rel)
}

// =============================================================================
// Package lifecycle
// =============================================================================

#[test]
fn package_upgrade_replaces_renamed_skill() {
    let project = TestProject::new();
    let engine = engine(&project);
    let v1 = package(&project, "acme", &[("review", "v1"), ("lint", "v1")]);
    engine.apply_content(&ids(&["claude"]), &v1);

    project.remove("packages/acme");
    let v2 = package(&project, "acme", &[("review", "v2"), ("format", "v2")]);
    let report = engine.apply_content(&ids(&["claude"]), &v2);

    assert!(report.success);
    assert_eq!(project.read_file(".claude/skills/review/SKILL.md"), "v2");
    project.assert_exists(".claude/skills/format/SKILL.md");
    project.assert_not_exists(".claude/skills/lint");
    let hints = project.read_file(".claude/skills/.gitignore");
    assert!(hints.contains("/format/SKILL.md"));
    assert!(!hints.contains("/lint/SKILL.md"));
}

#[test]
fn uninstalling_one_package_keeps_the_other() {
    let project = TestProject::new();
    let engine = engine(&project);
    let mut items = package(&project, "acme", &[("review", "a")]);
    items.extend(package(&project, "beta", &[("deploy", "b")]));
    let fragments = vec![
        mcp_fragment(&project, "acme", json!({"acme-server": {"command": "acme"}})),
        mcp_fragment(&project, "beta", json!({"beta-server": {"command": "beta"}})),
    ];
    let state = DesiredState { items: items.clone(), fragments: fragments.clone() };
    engine.apply(&ids(&["claude"]), &state);

    let remaining = DesiredState {
        items: items[1..].to_vec(),
        fragments: fragments[1..].to_vec(),
    };
    let report = engine.apply(&ids(&["claude"]), &remaining);

    assert!(report.success);
    project.assert_not_exists(".claude/skills/review");
    project.assert_exists(".claude/skills/deploy/SKILL.md");
    assert_eq!(
        project.read_json(".mcp.json"),
        json!({"mcpServers": {"beta-server": {"command": "beta"}}})
    );
    let manifest = engine.manifest().unwrap();
    assert_eq!(manifest.packages.keys().collect::<Vec<_>>(), vec!["beta"]);
    assert_eq!(
        manifest.config["claude"].managed_keys.iter().collect::<Vec<_>>(),
        vec!["beta-server"]
    );
}

#[test]
fn skill_moving_between_packages_survives() {
    let project = TestProject::new();
    let engine = engine(&project);
    let first = package(&project, "acme", &[("review", "acme")]);
    engine.apply_content(&ids(&["claude"]), &first);

    let second = package(&project, "beta", &[("review", "beta")]);
    let report = engine.apply_content(&ids(&["claude"]), &second);

    assert!(report.success);
    assert_eq!(project.read_file(".claude/skills/review/SKILL.md"), "beta");
    let manifest = engine.manifest().unwrap();
    assert_eq!(manifest.owner_of("claude", ".claude/skills/review/SKILL.md"), Some("beta"));
}

// =============================================================================
// Profile switching
// =============================================================================

#[test]
fn switching_profiles_moves_content_and_config() {
    let project = TestProject::new();
    let engine = engine(&project);
    let state = DesiredState {
        items: package(&project, "acme", &[("review", "r")]),
        fragments: vec![mcp_fragment(&project, "acme", json!({"alpha": {"type": "stdio", "command": "run"}}))],
    };
    engine.apply(&ids(&["claude"]), &state);

    let report = engine.apply(&ids(&["opencode"]), &state);

    assert!(report.success);
    project.assert_not_exists(".claude");
    project.assert_not_exists(".mcp.json");
    project.assert_exists(".opencode/skills/review/SKILL.md");
    assert_eq!(
        project.read_json("opencode.json"),
        json!({"mcp": {"alpha": {"type": "local", "command": ["run"], "enabled": true}}})
    );
    let manifest = engine.manifest().unwrap();
    assert_eq!(manifest.config.keys().collect::<Vec<_>>(), vec!["opencode"]);
}

#[test]
fn selecting_no_profiles_retires_everything() {
    let project = TestProject::new();
    let engine = engine(&project);
    let state = DesiredState {
        items: package(&project, "acme", &[("review", "r")]),
        fragments: vec![mcp_fragment(&project, "acme", json!({"alpha": {}}))],
    };
    engine.apply(&ids(&["claude", "cursor"]), &state);

    let resolved = engine.resolve_profiles(Some("none"));
    assert!(resolved.is_empty());
    let report = engine.apply(&resolved.ids, &state);

    assert!(report.success);
    project.assert_not_exists(".claude");
    project.assert_not_exists(".cursor");
    project.assert_not_exists(".mcp.json");
    project.assert_not_exists(".skillsync");
}

// =============================================================================
// Settings driven behaviour
// =============================================================================

#[test]
fn settings_define_profile_and_defaults() {
    let project = TestProject::new();
    project.write_file(
        "skillsync.toml",
        r#"
profiles = ["windsurf"]
auto_detect = false

[prefix]
default = "team"
always = true

[profile.windsurf]
content_root = ".windsurf/rules"
config_path = ".windsurf/mcp_config.json"
"#,
    );
    let engine = configured_engine(&project);
    let state = DesiredState {
        items: package(&project, "acme", &[("review", "r")]),
        fragments: vec![mcp_fragment(&project, "acme", json!({"alpha": {}}))],
    };

    let resolved = engine.resolve_profiles(None);
    assert_eq!(resolved.source, SelectionSource::Default);
    let report = engine.apply(&resolved.ids, &state);

    assert!(report.success);
    project.assert_exists(".windsurf/rules/team-review/SKILL.md");
    assert!(project.read_json(".windsurf/mcp_config.json")["mcpServers"]["alpha"].is_object());
}

#[test]
fn local_settings_override_project_settings() {
    let project = TestProject::new();
    project.add_marker(".cursor");
    project.write_file("skillsync.toml", "profiles = [\"gemini\"]\nauto_detect = false\n");
    project.write_file("skillsync.local.toml", "auto_detect = true\n");

    let resolved = configured_engine(&project).resolve_profiles(None);

    assert_eq!(resolved.ids, vec!["cursor"]);
    assert_eq!(resolved.source, SelectionSource::Detected);
}

// =============================================================================
// Coexistence with user data
// =============================================================================

#[test]
fn user_ignore_lines_survive_the_whole_lifecycle() {
    let project = TestProject::new();
    project.write_file(".claude/skills/.gitignore", "scratch/\n");
    let engine = engine(&project);
    let items = package(&project, "acme", &[("review", "r")]);

    engine.apply_content(&ids(&["claude"]), &items);
    let hints = project.read_file(".claude/skills/.gitignore");
    assert!(hints.starts_with("scratch/\n"));
    assert!(hints.contains("/review/SKILL.md"));

    engine.undo_content();
    assert_eq!(project.read_file(".claude/skills/.gitignore"), "scratch/\n");
}

#[test]
fn user_settings_keys_survive_merge_and_undo() {
    let project = TestProject::new();
    let original = json!({
        "theme": "dark",
        "mcpServers": {"personal": {"command": "me"}}
    });
    project.write_json(".gemini/settings.json", &original);
    let engine = engine(&project);
    let fragments = vec![mcp_fragment(&project, "acme", json!({"alpha": {"command": "run"}}))];

    engine.apply_config(&ids(&["gemini"]), &fragments);
    let merged = project.read_json(".gemini/settings.json");
    assert_eq!(merged["theme"], "dark");
    assert_eq!(merged["mcpServers"]["personal"]["command"], "me");
    assert_eq!(merged["mcpServers"]["alpha"]["command"], "run");

    engine.undo_config();
    assert_eq!(project.read_json(".gemini/settings.json"), original);
}

#[test]
fn manifest_with_absolute_paths_is_understood() {
    let project = TestProject::new();
    project.write_file(".claude/skills/old/SKILL.md", "old");
    let absolute = NormalizedPath::new(project.path(".claude/skills/old/SKILL.md"));
    project.write_json(
        ".skillsync/manifest.json",
        &json!({
            "version": 1,
            "packages": {"acme": {"files": {"claude": [absolute.as_str()]}}}
        }),
    );

    let report = engine(&project).apply_content(&ids(&["claude"]), &[]);

    assert!(report.success);
    project.assert_not_exists(".claude/skills/old");
    project.assert_not_exists(".skillsync");
}

#[test]
fn corrupt_manifest_is_a_warning() {
    let project = TestProject::new();
    project.write_file(".skillsync/manifest.json", "{ not json");
    let items = package(&project, "acme", &[("review", "r")]);

    let report = engine(&project).apply_content(&ids(&["claude"]), &items);

    assert!(report.success);
    assert!(report.has_warnings());
    project.assert_exists(".claude/skills/review/SKILL.md");
    assert_eq!(project.read_json(".skillsync/manifest.json")["version"], 1);
}
