// src/skills/frontmatter.rs — YAML frontmatter parser for SKILL.md files

use super::types::*;

/// Split a SKILL.md file into its YAML frontmatter (if any) and body.
///
/// Format:
/// ```text
/// ---
/// description: ...
/// severity: SUGGEST | WARN | BLOCK
/// ---
/// # Body content (markdown)
/// ```
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;
    let end_idx = rest.find("\n---")?;
    let yaml = &rest[..end_idx];
    let after = &rest[end_idx + 4..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    Some((yaml, body))
}

/// Content with the frontmatter block removed. Unchanged when there is none.
pub fn strip_frontmatter(content: &str) -> &str {
    split_frontmatter(content)
        .map(|(_, body)| body)
        .unwrap_or(content)
}

/// Parse frontmatter into description and severity.
///
/// Missing or malformed frontmatter yields an empty description and
/// `Severity::Suggest`.
pub fn parse_frontmatter(content: &str) -> (RawFrontmatter, &str) {
    let Some((yaml, body)) = split_frontmatter(content) else {
        return (RawFrontmatter::default(), content);
    };
    match serde_yml::from_str::<RawFrontmatter>(yaml) {
        Ok(fm) => (fm, body),
        Err(e) => {
            tracing::warn!("Malformed SKILL.md frontmatter: {}", e);
            (RawFrontmatter::default(), body)
        }
    }
}

/// First meaningful line of the body: not blank, not a heading, not a delimiter.
pub fn first_paragraph_line(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("---"))
        .unwrap_or_default()
        .to_string()
}
