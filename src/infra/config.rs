use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROMPTS_DIR_ENV: &str = "PROMPTBOX_DIR";
const EDITOR_ENV: &str = "EDITOR";
const FALLBACK_EDITOR: &str = "vi";

/// Read-only settings loaded once at startup and threaded explicitly into the
/// store and collaborator construction.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,

    #[serde(default)]
    pub editor: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("promptbox").join("config.json"))
}

/// Loads `<config_dir>/promptbox/config.json`; a missing file means defaults.
pub fn load_config() -> Result<Config, LoadConfigError> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(error) => return Err(error.into()),
    };
    Ok(serde_json::from_str(&raw)?)
}

#[derive(Debug, Error)]
pub enum ResolvePromptsDirError {
    #[error("no home directory found to place the prompt library")]
    DataDirNotFound,
}

/// Precedence: explicit `--path` override, then `PROMPTBOX_DIR`, then the
/// config value, then the platform data directory.
pub fn resolve_prompts_dir(
    override_dir: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, ResolvePromptsDirError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(PROMPTS_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = &config.prompts_dir {
        return Ok(dir.clone());
    }

    let Some(data) = dirs::data_dir() else {
        return Err(ResolvePromptsDirError::DataDirNotFound);
    };
    Ok(data.join("promptbox").join("prompts"))
}

/// Editor resolution: config value, then `EDITOR`, then `vi`.
pub fn resolve_editor(config: &Config) -> String {
    if let Some(editor) = &config.editor {
        if !editor.trim().is_empty() {
            return editor.clone();
        }
    }
    match std::env::var(EDITOR_ENV) {
        Ok(editor) if !editor.trim().is_empty() => editor,
        _ => FALLBACK_EDITOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_dir_wins_over_config() {
        let config = Config {
            prompts_dir: Some(PathBuf::from("/from/config")),
            editor: None,
        };
        let resolved = resolve_prompts_dir(Some(Path::new("/from/flag")), &config).expect("dir");
        assert_eq!(resolved, PathBuf::from("/from/flag"));
    }

    #[test]
    fn config_dir_used_without_override() {
        let config = Config {
            prompts_dir: Some(PathBuf::from("/from/config")),
            editor: None,
        };
        // The env override is not set in tests that rely on this path.
        if std::env::var_os(PROMPTS_DIR_ENV).is_none() {
            let resolved = resolve_prompts_dir(None, &config).expect("dir");
            assert_eq!(resolved, PathBuf::from("/from/config"));
        }
    }

    #[test]
    fn editor_prefers_config_value() {
        let config = Config {
            prompts_dir: None,
            editor: Some("hx".to_string()),
        };
        assert_eq!(resolve_editor(&config), "hx");
    }

    #[test]
    fn blank_config_editor_falls_through() {
        let config = Config {
            prompts_dir: None,
            editor: Some("   ".to_string()),
        };
        let resolved = resolve_editor(&config);
        assert_ne!(resolved.trim(), "");
    }
}
