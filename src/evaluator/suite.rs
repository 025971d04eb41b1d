// src/evaluator/suite.rs — Test suite resolution
//
// Sources, first one that yields tests wins (no merging):
//   1. <skill>/test.json
//   2. <skill>/tests.json
//   3. fenced ```json blocks under a "Test Scenarios" / "Tests" heading of SKILL.md

use std::path::{Component, Path};

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use serde::Deserialize;

use super::matcher::ExpectationRules;
use super::types::{TestCase, TestSuite};
use crate::infra::fs::FileSystem;
use crate::skills::Skill;

pub const TEST_FILES: [&str; 2] = ["test.json", "tests.json"];

const SECTION_TITLES: [&str; 2] = ["test scenarios", "tests"];

/// A test record as written on disk. `spec` is preferred over the legacy `input`.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawTestRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    spec: Option<String>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    expected: ExpectationRules,
}

impl RawTestRecord {
    fn prompt(&self) -> Option<&str> {
        [self.spec.as_deref(), self.input.as_deref()]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTestRecords {
    List(Vec<RawTestRecord>),
    Wrapped { tests: Vec<RawTestRecord> },
    Single(RawTestRecord),
}

impl RawTestRecords {
    fn into_vec(self) -> Vec<RawTestRecord> {
        match self {
            RawTestRecords::List(v) | RawTestRecords::Wrapped { tests: v } => v,
            RawTestRecords::Single(r) => vec![r],
        }
    }
}

/// Resolves a skill's test definitions into an ordered `TestSuite`.
pub struct TestSuiteBuilder<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> TestSuiteBuilder<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Never fails: unreadable or malformed sources are skipped, and a skill
    /// with no usable source gets an empty suite.
    pub fn build(&self, skill: &Skill) -> TestSuite {
        let tests = self
            .from_test_files(&skill.path)
            .or_else(|| self.from_guidance(skill))
            .unwrap_or_default();

        TestSuite {
            skill_name: skill.name.clone(),
            severity: skill.severity,
            tests,
        }
    }

    /// A file only wins when it yields at least one usable test case.
    fn from_test_files(&self, skill_dir: &Path) -> Option<Vec<TestCase>> {
        for file in TEST_FILES {
            let path = skill_dir.join(file);
            if !self.fs.is_file(&path) {
                continue;
            }
            let text = match self.fs.read_text(&path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<RawTestRecords>(&text) {
                Ok(records) => {
                    let tests = self.to_test_cases(records.into_vec(), skill_dir);
                    if !tests.is_empty() {
                        return Some(tests);
                    }
                    tracing::warn!("{} has no usable test records", path.display());
                }
                Err(e) => tracing::warn!("Invalid JSON in {}: {}", path.display(), e),
            }
        }
        None
    }

    fn from_guidance(&self, skill: &Skill) -> Option<Vec<TestCase>> {
        let tests = self.to_test_cases(extract_markdown_records(&skill.guidance()), &skill.path);
        (!tests.is_empty()).then_some(tests)
    }

    fn to_test_cases(&self, records: Vec<RawTestRecord>, skill_dir: &Path) -> Vec<TestCase> {
        records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| self.to_test_case(i + 1, record, skill_dir))
            .collect()
    }

    fn to_test_case(&self, position: usize, record: RawTestRecord, skill_dir: &Path) -> Option<TestCase> {
        let name = record
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("test_{}", position));
        let Some(prompt) = record.prompt() else {
            tracing::warn!(test = %name, "Test record has no prompt, skipping");
            return None;
        };
        Some(TestCase {
            input_prompt: self.inject_files(prompt, skill_dir),
            name,
            expected: record.expected,
        })
    }

    /// Replace lines that name a file in the skill directory with a fenced
    /// block holding that file's content.
    pub fn inject_files(&self, prompt: &str, skill_dir: &Path) -> String {
        prompt
            .lines()
            .map(|line| {
                let candidate = line.trim();
                if !is_bare_filename(candidate) {
                    return line.to_string();
                }
                let path = skill_dir.join(candidate);
                if !self.fs.is_file(&path) {
                    return line.to_string();
                }
                match self.fs.read_text(&path) {
                    Ok(content) => format!(
                        "```{}\n{}\n```",
                        language_for(&path),
                        content.trim_end()
                    ),
                    Err(e) => {
                        tracing::warn!("Failed to inject {}: {}", path.display(), e);
                        line.to_string()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// No whitespace, has a dot, and stays inside the skill directory.
fn is_bare_filename(s: &str) -> bool {
    !s.is_empty()
        && s.contains('.')
        && !s.chars().any(char::is_whitespace)
        && Path::new(s)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn language_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "py" => "python",
        "rs" => "rust",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "rb" => "ruby",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "swift" => "swift",
        "sh" => "bash",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        "sql" => "sql",
        _ => "text",
    }
}

/// Test records from fenced JSON blocks in the first "Test Scenarios" or
/// "Tests" section. Each block is parsed on its own; a bad block is skipped.
fn extract_markdown_records(markdown: &str) -> Vec<RawTestRecord> {
    let mut records = Vec::new();
    let mut section_level: Option<usize> = None;
    let mut heading: Option<(usize, String)> = None;
    let mut block: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let level = level as usize;
                if section_level.is_some_and(|s| level <= s) {
                    break;
                }
                heading = Some((level, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = heading.take() {
                    let title = text.trim().to_lowercase();
                    if section_level.is_none() && SECTION_TITLES.contains(&title.as_str()) {
                        section_level = Some(level);
                    }
                }
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if section_level.is_some() => {
                if info.split_whitespace().next() == Some("json") {
                    block = Some(String::new());
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(body) = block.take() {
                    match serde_json::from_str::<RawTestRecords>(&body) {
                        Ok(parsed) => records.extend(parsed.into_vec()),
                        Err(e) => tracing::warn!("Skipping malformed test block: {}", e),
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, h)) = heading.as_mut() {
                    h.push_str(&text);
                } else if let Some(b) = block.as_mut() {
                    b.push_str(&text);
                }
            }
            _ => {}
        }
    }

    records
}
