// src/skills/loader.rs — Skill discovery from a skills directory

use std::path::Path;

use super::frontmatter::{first_paragraph_line, parse_frontmatter};
use super::types::*;
use crate::infra::fs::FileSystem;

pub const SKILL_FILE: &str = "SKILL.md";

/// Discover every `<dir>/<name>/SKILL.md`, sorted by name.
///
/// Unreadable skill files are skipped with a warning.
pub fn discover_skills(dir: &Path, fs: &dyn FileSystem) -> Vec<Skill> {
    let mut skills = Vec::new();

    if !fs.is_dir(dir) {
        tracing::warn!("Skills directory not found: {}", dir.display());
        return skills;
    }

    for entry in fs.list_dir(dir) {
        if !fs.is_dir(&entry) {
            continue;
        }
        let skill_file = entry.join(SKILL_FILE);
        if !fs.is_file(&skill_file) {
            continue;
        }

        let content = match fs.read_text(&skill_file) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", skill_file.display(), e);
                continue;
            }
        };

        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        skills.push(parse_skill(name, &entry, content));
    }

    skills.sort_by(|a, b| a.name.cmp(&b.name));
    skills
}

/// Build a `Skill` from a SKILL.md body.
pub fn parse_skill(name: String, dir: &Path, content: String) -> Skill {
    let (frontmatter, body) = parse_frontmatter(&content);
    let description = frontmatter
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| first_paragraph_line(body));
    let severity = frontmatter
        .severity
        .as_deref()
        .map(Severity::parse_lenient)
        .unwrap_or_default();

    Skill {
        name,
        path: dir.to_path_buf(),
        description,
        content,
        severity,
    }
}

/// Keep skills whose name contains any of `filters`. Empty filters keep all.
pub fn filter_skills(skills: Vec<Skill>, filters: &[String]) -> Vec<Skill> {
    if filters.is_empty() {
        return skills;
    }
    skills
        .into_iter()
        .filter(|s| filters.iter().any(|f| s.name.contains(f.as_str())))
        .collect()
}
