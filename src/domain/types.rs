use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;
use thiserror::Error;

/// A named, tagged block of reusable text, backed by one file on disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Prompt {
    pub name: String,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub template_origin: Option<String>,
    pub modified_at: Option<SystemTime>,
}

/// Immutable point-in-time view of the prompt library: all prompts sorted by
/// name plus a derived tag index. Rebuilt from disk after every mutation,
/// never patched in place.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    prompts: Vec<Prompt>,
    tag_index: BTreeMap<String, BTreeSet<String>>,
}

impl Snapshot {
    pub fn from_prompts(mut prompts: Vec<Prompt>) -> Self {
        prompts.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tag_index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for prompt in &prompts {
            for tag in &prompt.tags {
                tag_index
                    .entry(tag.clone())
                    .or_default()
                    .insert(prompt.name.clone());
            }
        }

        Self { prompts, tag_index }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Prompt> {
        self.prompts
            .binary_search_by(|prompt| prompt.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.prompts[index])
    }

    /// All tags present in the library, in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_index.keys().map(|tag| tag.as_str())
    }

    pub fn names_with_tag(&self, tag: &str) -> Option<&BTreeSet<String>> {
        self.tag_index.get(tag)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidNameError {
    #[error("prompt name is empty")]
    Empty,

    #[error("prompt name contains a path separator: {0}")]
    PathSeparator(String),

    #[error("prompt name starts with a dot: {0}")]
    LeadingDot(String),

    #[error("prompt name contains a control character: {0}")]
    ControlCharacter(String),
}

/// A name doubles as the filename stem, so it must stay within the safe
/// subset: non-empty, no separators, not hidden, no control characters.
pub fn validate_name(name: &str) -> Result<(), InvalidNameError> {
    if name.is_empty() {
        return Err(InvalidNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(InvalidNameError::PathSeparator(name.to_string()));
    }
    if name.starts_with('.') {
        return Err(InvalidNameError::LeadingDot(name.to_string()));
    }
    if name.chars().any(char::is_control) {
        return Err(InvalidNameError::ControlCharacter(name.to_string()));
    }
    Ok(())
}

/// Canonical form used when a name is taken from user input: lowercase with
/// runs of whitespace collapsed to single dashes.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::new();
    let mut last_was_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_dash && !out.is_empty() {
                out.push('-');
                last_was_dash = true;
            }
            continue;
        }
        last_was_dash = false;
        for lowered in ch.to_lowercase() {
            out.push(lowered);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(name: &str, tags: &[&str]) -> Prompt {
        Prompt {
            name: name.to_string(),
            content: String::new(),
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            template_origin: None,
            modified_at: None,
        }
    }

    #[test]
    fn snapshot_sorts_prompts_and_indexes_tags() {
        let snapshot = Snapshot::from_prompts(vec![
            prompt("zeta", &["work"]),
            prompt("alpha", &["work", "urgent"]),
        ]);

        let names: Vec<&str> = snapshot
            .prompts()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let tags: Vec<&str> = snapshot.tags().collect();
        assert_eq!(tags, vec!["urgent", "work"]);
        assert_eq!(snapshot.names_with_tag("work").map(BTreeSet::len), Some(2));
        assert_eq!(snapshot.names_with_tag("urgent").map(BTreeSet::len), Some(1));
    }

    #[test]
    fn snapshot_get_finds_by_name() {
        let snapshot = Snapshot::from_prompts(vec![prompt("b", &[]), prompt("a", &[])]);
        assert_eq!(snapshot.get("a").map(|p| p.name.as_str()), Some("a"));
        assert!(snapshot.get("missing").is_none());
    }

    #[test]
    fn validate_name_rejects_unsafe_names() {
        assert_eq!(validate_name(""), Err(InvalidNameError::Empty));
        assert!(matches!(
            validate_name("a/b"),
            Err(InvalidNameError::PathSeparator(_))
        ));
        assert!(matches!(
            validate_name("a\\b"),
            Err(InvalidNameError::PathSeparator(_))
        ));
        assert!(matches!(
            validate_name(".hidden"),
            Err(InvalidNameError::LeadingDot(_))
        ));
        assert!(validate_name("code-review").is_ok());
    }

    #[test]
    fn normalize_name_lowercases_and_dashes() {
        assert_eq!(normalize_name("Code Review"), "code-review");
        assert_eq!(normalize_name("  spaced   out  "), "spaced-out");
        assert_eq!(normalize_name("already-fine"), "already-fine");
    }
}
