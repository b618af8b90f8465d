use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to launch editor '{editor}': {source}")]
    Spawn { editor: String, source: io::Error },

    #[error("editor '{editor}' exited with status {status}")]
    NonZeroExit { editor: String, status: i32 },

    #[error("editor buffer I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// What came back from the external editor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EditOutcome {
    Saved(String),
    /// The user left the buffer untouched or emptied it; treated as "no
    /// change" by every caller.
    Cancelled,
}

/// Hands a temp buffer seeded with `initial` to the configured editor and
/// waits for it to exit. The caller is responsible for ceding the terminal
/// first. A nonzero exit, an unchanged buffer, or an emptied buffer all count
/// as cancellation.
pub fn edit_text(editor: &str, initial: &str) -> Result<EditOutcome, EditorError> {
    let buffer_path = scratch_path();
    fs::write(&buffer_path, initial)?;

    let result = run_editor(editor, &buffer_path);
    let text = fs::read_to_string(&buffer_path);
    let _ = fs::remove_file(&buffer_path);

    result?;
    let text = text?;
    if text.trim().is_empty() || text == initial {
        return Ok(EditOutcome::Cancelled);
    }
    Ok(EditOutcome::Saved(text))
}

fn run_editor(editor: &str, buffer_path: &Path) -> Result<(), EditorError> {
    // Honor multi-word editor values like "code --wait".
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(EditorError::Spawn {
            editor: editor.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "empty editor command"),
        });
    };

    let status = Command::new(program)
        .args(parts)
        .arg(buffer_path)
        .status()
        .map_err(|source| EditorError::Spawn {
            editor: editor.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(EditorError::NonZeroExit {
            editor: editor.to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

fn scratch_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("promptbox-edit-{}-{nanos}.md", std::process::id()))
}
