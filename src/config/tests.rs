use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_config() {
    let content = r#"---
specification: adobe_fonts
run:
  jobs: 3
  timeout_ms: 1500
inputs:
  group_by: vendor
checks:
  include: [name/]
  exclude: [kerning]
output:
  format: json
---

# Config
"#;
    let config = Config::parse(content).unwrap();
    assert_eq!(config.specification, "adobe_fonts");
    assert_eq!(config.run.jobs, 3);
    assert_eq!(config.run.timeout(), Some(std::time::Duration::from_millis(1500)));
    assert_eq!(config.inputs.group_by, "vendor");
    assert_eq!(config.checks.include, vec!["name/"]);
    assert_eq!(config.output.format, OutputFormat::Json);

    let selection = config.checks.selection();
    assert!(selection.admits("org.bakery/check/name/line_breaks"));
    assert!(!selection.admits("org.bakery/check/name/kerning"));
}

#[test]
fn test_parse_minimal_config() {
    let content = "---\nspecification: general\n---\n";
    let config = Config::parse(content).unwrap();
    assert_eq!(config.inputs.group_by, "family_name");
    assert!(config.run.jobs >= 1);
    assert_eq!(config.run.timeout_ms, None);
    assert_eq!(config.output.format, OutputFormat::Text);
}

#[test]
fn test_parse_requires_frontmatter() {
    assert!(Config::parse("# just a heading\n").is_err());
}

#[test]
fn test_validation_rejects_zero_jobs() {
    let err = Config::parse("---\nrun:\n  jobs: 0\n---\n").unwrap_err();
    assert!(err.to_string().contains("run.jobs"));
}

#[test]
fn test_validation_rejects_zero_timeout() {
    let err = Config::parse("---\nrun:\n  timeout_ms: 0\n---\n").unwrap_err();
    assert!(err.to_string().contains("run.timeout_ms"));
}

#[test]
fn test_split_frontmatter() {
    let (frontmatter, body) = split_frontmatter("---\na: 1\n---\n\n# Body\n");
    assert_eq!(frontmatter.as_deref(), Some("\na: 1"));
    assert_eq!(body, "# Body\n");

    let (frontmatter, body) = split_frontmatter("no frontmatter");
    assert!(frontmatter.is_none());
    assert_eq!(body, "no frontmatter");
}

#[test]
fn test_global_config_path_points_into_bakery_dir() {
    if let Some(path) = global_config_path() {
        assert!(path.ends_with("bakery/config.md"));
    }
}

#[test]
fn test_load_merged_no_files_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let global = tmp.path().join("missing.md");
    let config = Config::load_merged_from(Some(global.as_path()), &tmp.path().join("also.md")).unwrap();
    assert_eq!(config.specification, "general");
    assert_eq!(config.inputs.group_by, "family_name");
}

#[test]
fn test_load_merged_project_overrides_global() {
    let tmp = TempDir::new().unwrap();
    let global = tmp.path().join("global.md");
    let project = tmp.path().join("project.md");
    fs::write(
        &global,
        "---\nspecification: adobe_fonts\nrun:\n  jobs: 8\n  timeout_ms: 500\nchecks:\n  exclude: [x]\n---\n",
    )
    .unwrap();
    fs::write(&project, "---\nrun:\n  jobs: 2\n---\n").unwrap();

    let config = Config::load_merged_from(Some(global.as_path()), &project).unwrap();
    assert_eq!(config.specification, "adobe_fonts");
    assert_eq!(config.run.jobs, 2);
    // Field-level merge keeps the global timeout
    assert_eq!(config.run.timeout_ms, Some(500));
    assert_eq!(config.checks.exclude, vec!["x"]);
}

#[test]
fn test_load_merged_validates_result() {
    let tmp = TempDir::new().unwrap();
    let project = tmp.path().join("project.md");
    fs::write(&project, "---\ninputs:\n  group_by: \"\"\n---\n").unwrap();
    let err = Config::load_merged_from(None, &project).unwrap_err();
    assert!(err.to_string().contains("inputs.group_by"));
}

#[test]
fn test_load_from_reports_missing_file() {
    let tmp = TempDir::new().unwrap();
    let err = Config::load_from(&tmp.path().join("nope.md")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config"));
}
