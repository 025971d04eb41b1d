// src/skills/types.rs — Skill type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A discovered skill: one principle, with the guidance text shown to the model.
///
/// Read-only for the whole evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub name: String,
    /// Skill directory; test definitions and injected files live here.
    pub path: PathBuf,
    pub description: String,
    /// Full SKILL.md content, frontmatter included.
    pub content: String,
    pub severity: Severity,
}

impl Skill {
    /// Guidance text: the markdown with the frontmatter block removed.
    pub fn guidance(&self) -> String {
        super::frontmatter::strip_frontmatter(&self.content)
            .trim()
            .to_string()
    }

    /// Instruction block prepended to the prompt for the with-skill run.
    pub fn instruction(&self) -> String {
        format!(
            "Apply the following programming skill:\n\n{}\n\n",
            self.guidance()
        )
    }

    /// The principle under test: the first line after a `## Principle`
    /// heading, else the description.
    pub fn principle(&self) -> String {
        let mut lines = self.content.lines();
        while let Some(line) = lines.next() {
            if line.trim().starts_with("## Principle") {
                if let Some(next) = lines.by_ref().map(str::trim).find(|l| !l.is_empty()) {
                    if !next.starts_with('#') {
                        return next.to_string();
                    }
                }
                break;
            }
        }
        self.description.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Suggest,
    Warn,
    Block,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Suggest => "SUGGEST",
            Severity::Warn => "WARN",
            Severity::Block => "BLOCK",
        }
    }

    /// Case-insensitive parse; anything unrecognised is `Suggest`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "WARN" => Severity::Warn,
            "BLOCK" => Severity::Block,
            _ => Severity::Suggest,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw frontmatter parsed from a SKILL.md file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrontmatter {
    pub description: Option<String>,
    pub severity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_skill(content: &str) -> Skill {
        Skill {
            name: "test".into(),
            path: PathBuf::from("skills/test"),
            description: "desc".into(),
            content: content.into(),
            severity: Severity::Suggest,
        }
    }

    // ─── guidance / instruction ─────────────────────────────────

    #[test]
    fn test_guidance_strips_frontmatter() {
        let s = make_skill("---\nname: x\n---\n# Title\n\nBody\n");
        assert_eq!(s.guidance(), "# Title\n\nBody");
    }

    #[test]
    fn test_instruction_wraps_guidance() {
        let s = make_skill("G");
        assert_eq!(
            s.instruction(),
            "Apply the following programming skill:\n\nG\n\n"
        );
    }

    // ─── principle ──────────────────────────────────────────────

    #[test]
    fn test_principle_from_heading() {
        let s = make_skill("# Skill\n\n## Principle\n\nCompose, don't coordinate.\n\n## Rules\n");
        assert_eq!(s.principle(), "Compose, don't coordinate.");
    }

    #[test]
    fn test_principle_falls_back_to_description() {
        let s = make_skill("# Skill\n\nNo principle section here.");
        assert_eq!(s.principle(), "desc");
    }

    #[test]
    fn test_principle_heading_followed_by_heading() {
        let s = make_skill("## Principle\n## Rules\n");
        assert_eq!(s.principle(), "desc");
    }

    // ─── Severity ───────────────────────────────────────────────

    #[test]
    fn test_severity_parse_lenient() {
        assert_eq!(Severity::parse_lenient("warn"), Severity::Warn);
        assert_eq!(Severity::parse_lenient("BLOCK"), Severity::Block);
        assert_eq!(Severity::parse_lenient("critical"), Severity::Suggest);
    }

    #[test]
    fn test_severity_serde() {
        let json = serde_json::to_string(&Severity::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");
        let back: Severity = serde_json::from_str("\"BLOCK\"").unwrap();
        assert_eq!(back, Severity::Block);
    }
}
