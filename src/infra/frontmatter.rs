use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// YAML frontmatter carried at the top of a prompt file. The prompt name is
/// the filename stem and is never stored here.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Frontmatter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PromptDocument {
    pub frontmatter: Frontmatter,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("unterminated frontmatter block")]
    Unterminated,

    #[error("failed to parse frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

const DELIMITER: &str = "---";

/// Splits a prompt file into frontmatter and body. A file that does not open
/// with a `---` line is a valid prompt with no frontmatter. The body is taken
/// as a byte slice of the input, so it survives parsing byte-exact (trailing
/// newlines included).
pub fn parse_document(raw: &str) -> Result<PromptDocument, FrontmatterError> {
    let Some(rest) = strip_opening_delimiter(raw) else {
        return Ok(PromptDocument {
            frontmatter: Frontmatter::default(),
            body: raw.to_string(),
        });
    };

    let mut cursor = 0usize;
    loop {
        let line_end = rest[cursor..].find('\n').map(|offset| cursor + offset);
        let line = match line_end {
            Some(end) => &rest[cursor..end],
            None => &rest[cursor..],
        };
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..cursor];
            let body = match line_end {
                Some(end) => &rest[end + 1..],
                None => "",
            };
            let frontmatter = if yaml.trim().is_empty() {
                Frontmatter::default()
            } else {
                serde_yaml::from_str(yaml)?
            };
            return Ok(PromptDocument {
                frontmatter,
                body: body.to_string(),
            });
        }
        let Some(end) = line_end else {
            return Err(FrontmatterError::Unterminated);
        };
        cursor = end + 1;
    }
}

fn strip_opening_delimiter(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix(DELIMITER)?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    rest.strip_prefix('\n')
}

/// Renders a prompt file. Prompts with no tags and no template origin are
/// written without a frontmatter block.
pub fn render_document(
    tags: &BTreeSet<String>,
    template_origin: Option<&str>,
    body: &str,
) -> Result<String, FrontmatterError> {
    let frontmatter = Frontmatter {
        tags: tags.iter().cloned().collect(),
        template: template_origin.map(str::to_string),
    };

    if frontmatter == Frontmatter::default() {
        return Ok(body.to_string());
    }

    let yaml = serde_yaml::to_string(&frontmatter)?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}
