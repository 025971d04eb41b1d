// src/skills/mod.rs — Skill discovery and parsing

pub mod frontmatter;
pub mod loader;
pub mod types;

pub use types::{Severity, Skill};
