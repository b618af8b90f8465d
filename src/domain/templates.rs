use thiserror::Error;

/// Built-in scaffolds for new prompts. The chosen template name is recorded in
/// the prompt's frontmatter as its origin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Template {
    Default,
    Sectioned,
}

pub const TEMPLATES: [Template; 2] = [Template::Default, Template::Sectioned];

#[derive(Debug, Error)]
#[error("unknown template: {0}")]
pub struct UnknownTemplateError(pub String);

impl Template {
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Sectioned => "sectioned",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownTemplateError> {
        match value {
            "default" => Ok(Self::Default),
            "sectioned" => Ok(Self::Sectioned),
            other => Err(UnknownTemplateError(other.to_string())),
        }
    }

    /// Renders the initial prompt body for `name`.
    pub fn render(self, name: &str) -> String {
        match self {
            Self::Default => format!("# {name}\n\n"),
            Self::Sectioned => format!(
                "# {name}\n\n\
                 # Instruction\n\n\
                 # Context\n\n\
                 # Input Data\n\n\
                 # Output Indicator\n"
            ),
        }
    }
}
