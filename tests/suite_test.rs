// tests/suite_test.rs — Integration test: skill discovery and suite building on disk

use std::fs;
use std::path::Path;

use skillbench::evaluator::suite::TestSuiteBuilder;
use skillbench::infra::fs::LocalFileSystem;
use skillbench::skills::loader::{discover_skills, filter_skills};
use skillbench::skills::Severity;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_suite_round_trip_preserves_count_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let skill_dir = dir.path().join("skills/ps-naming");
    write(
        &skill_dir.join("SKILL.md"),
        "---\ndescription: Names carry intent\nseverity: BLOCK\n---\n# Naming\n",
    );

    let names: Vec<String> = (1..=7).map(|i| format!("case-{:02}", i)).collect();
    let records: Vec<serde_json::Value> = names
        .iter()
        .map(|n| serde_json::json!({ "name": n, "spec": format!("prompt for {}", n), "expected": {} }))
        .collect();
    write(
        &skill_dir.join("test.json"),
        &serde_json::to_string_pretty(&records).unwrap(),
    );

    let skills = discover_skills(&dir.path().join("skills"), &LocalFileSystem);
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].severity, Severity::Block);

    let suite = TestSuiteBuilder::new(&LocalFileSystem).build(&skills[0]);
    assert_eq!(suite.test_count(), names.len());
    let built: Vec<&str> = suite.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(built, names.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(suite.severity, Severity::Block);
}

#[test]
fn test_injected_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let skill_dir = dir.path().join("skills/ps-small-functions");
    write(&skill_dir.join("SKILL.md"), "# Small functions\n");
    write(&skill_dir.join("legacy.js"), "function big() {\n  return 1;\n}\n");
    write(
        &skill_dir.join("tests.json"),
        r#"{"tests": [{"name": "split", "input": "Split this function:\nlegacy.js"}]}"#,
    );

    let skills = discover_skills(&dir.path().join("skills"), &LocalFileSystem);
    let suite = TestSuiteBuilder::new(&LocalFileSystem).build(&skills[0]);
    assert_eq!(
        suite.tests[0].input_prompt,
        "Split this function:\n```javascript\nfunction big() {\n  return 1;\n}\n```"
    );
}

#[test]
fn test_markdown_fallback_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let skill_dir = dir.path().join("skills/ps-errors");
    write(
        &skill_dir.join("SKILL.md"),
        "# Errors\n\n## Principle\nHandle errors explicitly.\n\n## Tests\n\n```json\n[{\"name\": \"a\", \"spec\": \"p1\"}, {\"spec\": \"p2\"}]\n```\n",
    );
    write(&skill_dir.join("test.json"), "this is not json");

    let skills = discover_skills(&dir.path().join("skills"), &LocalFileSystem);
    assert_eq!(skills[0].principle(), "Handle errors explicitly.");

    let suite = TestSuiteBuilder::new(&LocalFileSystem).build(&skills[0]);
    let names: Vec<&str> = suite.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["a", "test_2"]);
}

#[test]
fn test_filter_by_substring() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["ps-composition", "ps-local-reasoning", "ps-naming"] {
        write(&dir.path().join("skills").join(name).join("SKILL.md"), "# Skill\n");
    }
    let skills = discover_skills(&dir.path().join("skills"), &LocalFileSystem);
    assert_eq!(skills.len(), 3);

    let picked = filter_skills(skills, &["nam".to_string(), "compo".to_string()]);
    let names: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ps-composition", "ps-naming"]);
}
