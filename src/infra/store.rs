use crate::domain::{InvalidNameError, Prompt, Snapshot, validate_name};
use crate::infra::frontmatter::{FrontmatterError, parse_document, render_document};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PROMPT_EXTENSION: &str = "md";
const SEED_FLAG_FILE: &str = ".promptbox-seeded";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("prompt not found: {0}")]
    NotFound(String),

    #[error("prompt already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),

    #[error("deletion not confirmed. Use --force to skip confirmation")]
    ConfirmationRequired,

    #[error("storage error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
}

/// Result of loading the prompt directory. Files that fail to parse are
/// skipped and counted instead of failing the whole load.
#[derive(Clone, Debug)]
pub struct SnapshotLoad {
    pub snapshot: Snapshot,
    pub skipped: usize,
}

/// Sole reader/writer of the prompt directory. Every mutation goes through
/// here; consumers only ever see immutable `Snapshot` values.
#[derive(Clone, Debug)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prompt_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PROMPT_EXTENSION}"))
    }

    /// Reads every prompt file into a fresh snapshot. A missing directory is
    /// an empty library; any other directory failure is a storage error.
    pub fn load(&self) -> Result<SnapshotLoad, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(SnapshotLoad {
                    snapshot: Snapshot::default(),
                    skipped: 0,
                });
            }
            Err(error) => return Err(error.into()),
        };

        let mut prompts = Vec::new();
        let mut skipped = 0usize;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(PROMPT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                skipped += 1;
                continue;
            };
            if validate_name(name).is_err() {
                skipped += 1;
                continue;
            }
            match read_prompt_file(&path, name) {
                Ok(prompt) => prompts.push(prompt),
                Err(_) => skipped += 1,
            }
        }

        Ok(SnapshotLoad {
            snapshot: Snapshot::from_prompts(prompts),
            skipped,
        })
    }

    pub fn get(&self, name: &str) -> Result<Prompt, StoreError> {
        validate_name(name)?;
        let path = self.prompt_path(name);
        match read_prompt_file(&path, name) {
            Ok(prompt) => Ok(prompt),
            Err(StoreError::Io(error)) if error.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    pub fn create(
        &self,
        name: &str,
        content: &str,
        tags: &BTreeSet<String>,
        template_origin: Option<&str>,
    ) -> Result<(), StoreError> {
        validate_name(name)?;
        let path = self.prompt_path(name);
        if path.exists() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        let raw = render_document(tags, template_origin, content)?;
        fs::create_dir_all(&self.dir)?;
        write_atomic(&path, &raw)?;
        Ok(())
    }

    /// Rewrites content and tags, preserving the recorded template origin.
    pub fn update(
        &self,
        name: &str,
        content: &str,
        tags: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        let existing = self.get(name)?;
        let raw = render_document(tags, existing.template_origin.as_deref(), content)?;
        write_atomic(&self.prompt_path(name), &raw)?;
        Ok(())
    }

    /// Existence is checked before the force gate, so a missing prompt always
    /// reports `NotFound` rather than asking for confirmation.
    pub fn delete(&self, name: &str, force: bool) -> Result<(), StoreError> {
        validate_name(name)?;
        let path = self.prompt_path(name);
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if !force {
            return Err(StoreError::ConfirmationRequired);
        }
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Seeds the built-in default prompts exactly once. The flag file alone
    /// gates seeding: a user who deletes every default stays with an empty
    /// library on the next launch.
    pub fn ensure_initialized(&self) -> Result<(), StoreError> {
        let flag = self.dir.join(SEED_FLAG_FILE);
        if flag.exists() {
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;
        for seed in DEFAULT_PROMPTS {
            let tags: BTreeSet<String> = seed.tags.iter().map(|tag| (*tag).to_string()).collect();
            match self.create(seed.name, seed.content, &tags, None) {
                Ok(()) | Err(StoreError::AlreadyExists(_)) => {}
                Err(error) => return Err(error),
            }
        }
        fs::write(&flag, b"")?;
        Ok(())
    }
}

fn read_prompt_file(path: &Path, name: &str) -> Result<Prompt, StoreError> {
    let raw = fs::read_to_string(path)?;
    let modified_at = fs::metadata(path).and_then(|meta| meta.modified()).ok();
    let document = parse_document(&raw)?;
    Ok(Prompt {
        name: name.to_string(),
        content: document.body,
        tags: document.frontmatter.tags.into_iter().collect(),
        template_origin: document.frontmatter.template,
        modified_at,
    })
}

// Write to a sibling tmp file first, then rename into place, so a crash
// mid-write never leaves a half-written prompt observable.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = path.with_extension(format!("{PROMPT_EXTENSION}.tmp"));
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

struct SeedPrompt {
    name: &'static str,
    tags: &'static [&'static str],
    content: &'static str,
}

const DEFAULT_PROMPTS: &[SeedPrompt] = &[
    SeedPrompt {
        name: "code-review",
        tags: &["code", "review"],
        content: "Review the following change. Point out correctness issues, \
                  missing edge cases, and anything that will surprise the next reader.\n",
    },
    SeedPrompt {
        name: "bug-report",
        tags: &["bug", "triage"],
        content: "Describe the bug: expected behavior, actual behavior, \
                  steps to reproduce, and environment details.\n",
    },
    SeedPrompt {
        name: "explain-code",
        tags: &["code", "docs"],
        content: "Explain what the following code does, then call out any \
                  non-obvious behavior or hidden assumptions.\n",
    },
    SeedPrompt {
        name: "standup-summary",
        tags: &["work"],
        content: "Summarize into three sections: done yesterday, planned today, blockers.\n",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn create_then_get_round_trips_content_and_tags() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());

        store
            .create("greeting", "Hello there.\n", &tags(&["social", "intro"]), None)
            .expect("create");

        let prompt = store.get("greeting").expect("get");
        assert_eq!(prompt.content, "Hello there.\n");
        assert_eq!(prompt.tags, tags(&["social", "intro"]));
        assert_eq!(prompt.template_origin, None);
        assert!(prompt.modified_at.is_some());
    }

    #[test]
    fn create_duplicate_fails_and_leaves_original_untouched() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store
            .create("only", "original", &tags(&[]), None)
            .expect("create");

        let error = store
            .create("only", "clobbered", &tags(&["x"]), None)
            .unwrap_err();
        assert!(matches!(error, StoreError::AlreadyExists(name) if name == "only"));

        let prompt = store.get("only").expect("get");
        assert_eq!(prompt.content, "original");
        assert!(prompt.tags.is_empty());
    }

    #[test]
    fn create_rejects_invalid_names() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.create("", "x", &tags(&[]), None),
            Err(StoreError::InvalidName(InvalidNameError::Empty))
        ));
        assert!(matches!(
            store.create("a/b", "x", &tags(&[]), None),
            Err(StoreError::InvalidName(InvalidNameError::PathSeparator(_)))
        ));
    }

    #[test]
    fn delete_requires_force_and_then_removes() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store.create("gone", "body", &tags(&[]), None).expect("create");

        assert!(matches!(
            store.delete("gone", false),
            Err(StoreError::ConfirmationRequired)
        ));
        assert!(store.get("gone").is_ok());

        store.delete("gone", true).expect("delete");
        assert!(matches!(
            store.get("gone"),
            Err(StoreError::NotFound(name)) if name == "gone"
        ));
    }

    #[test]
    fn delete_missing_prompt_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.delete("ghost", true),
            Err(StoreError::NotFound(_))
        ));
        // Without force the missing prompt still wins over the confirmation
        // gate.
        assert!(matches!(
            store.delete("ghost", false),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn update_preserves_template_origin() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store
            .create("tpl", "v1", &tags(&["a"]), Some("sectioned"))
            .expect("create");

        store.update("tpl", "v2", &tags(&["b"])).expect("update");

        let prompt = store.get("tpl").expect("get");
        assert_eq!(prompt.content, "v2");
        assert_eq!(prompt.tags, tags(&["b"]));
        assert_eq!(prompt.template_origin.as_deref(), Some("sectioned"));
    }

    #[test]
    fn update_missing_prompt_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.update("absent", "x", &tags(&[])),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn load_skips_foreign_and_unparsable_files() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store.create("ok", "fine", &tags(&[]), None).expect("create");
        fs::write(dir.path().join("notes.txt"), "not a prompt").expect("write");
        fs::write(dir.path().join("broken.md"), "---\ntags: [oops\n").expect("write");

        let load = store.load().expect("load");
        assert_eq!(load.snapshot.len(), 1);
        assert_eq!(load.skipped, 1);
    }

    #[test]
    fn load_missing_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().join("nope"));
        let load = store.load().expect("load");
        assert!(load.snapshot.is_empty());
        assert_eq!(load.skipped, 0);
    }

    #[test]
    fn ensure_initialized_seeds_once_and_only_once() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());

        store.ensure_initialized().expect("seed");
        let seeded = store.load().expect("load").snapshot.len();
        assert_eq!(seeded, DEFAULT_PROMPTS.len());

        store.ensure_initialized().expect("idempotent");
        assert_eq!(store.load().expect("load").snapshot.len(), seeded);
    }

    #[test]
    fn ensure_initialized_does_not_reseed_after_user_deletes_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store.ensure_initialized().expect("seed");

        for seed in DEFAULT_PROMPTS {
            store.delete(seed.name, true).expect("delete");
        }

        store.ensure_initialized().expect("no reseed");
        assert!(store.load().expect("load").snapshot.is_empty());
    }

    #[test]
    fn seed_flag_is_not_listed_as_a_prompt() {
        let dir = tempdir().expect("tempdir");
        let store = PromptStore::new(dir.path().to_path_buf());
        store.ensure_initialized().expect("seed");
        let load = store.load().expect("load");
        assert!(load.snapshot.get(".promptbox-seeded").is_none());
        assert_eq!(load.skipped, 0);
    }
}
