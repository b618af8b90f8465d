use crate::domain::{Template, UnknownTemplateError, normalize_name, search};
use crate::infra::{
    ClipboardError, Config, EditOutcome, EditorError, PromptStore, StoreError, copy_to_clipboard,
    edit_text, parse_document, render_document, resolve_editor,
};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui {
        manage: bool,
        path: Option<PathBuf>,
    },
    Command {
        command: CliCommand,
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    List,
    Get { name: String },
    Create { name: String, template: Option<String> },
    Edit { name: String },
    Delete { name: String, force: bool },
    Copy { name: String },
    Search { query: String },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut path: Option<PathBuf> = None;
    let mut manage = false;

    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--path" | "-p" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--path".to_string()))?;
                path = Some(PathBuf::from(value));
            }
            "--manage" | "-m" => {
                let _ = iter.next();
                manage = true;
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui { manage, path });
    };

    if manage {
        return Err(CliParseError::UnexpectedArgument(subcommand.to_string()));
    }

    let mut positionals: Vec<String> = Vec::new();
    let mut template: Option<String> = None;
    let mut force = false;

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--path" | "-p" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--path".to_string()))?;
                path = Some(PathBuf::from(value));
            }
            "--template" | "-t" if subcommand == "create" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--template".to_string()))?;
                template = Some(value.to_string());
            }
            "--force" | "-f" if subcommand == "delete" => force = true,
            _ if arg.starts_with('-') => {
                return Err(CliParseError::UnknownFlag(arg.to_string()));
            }
            _ => positionals.push(arg.to_string()),
        }
    }

    let command = match subcommand.as_str() {
        "list" => {
            expect_no_positionals(&positionals)?;
            CliCommand::List
        }
        "get" => CliCommand::Get {
            name: take_single(positionals, "NAME")?,
        },
        "create" => CliCommand::Create {
            name: take_single(positionals, "NAME")?,
            template,
        },
        "edit" => CliCommand::Edit {
            name: take_single(positionals, "NAME")?,
        },
        "delete" => CliCommand::Delete {
            name: take_single(positionals, "NAME")?,
            force,
        },
        "copy" => CliCommand::Copy {
            name: take_single(positionals, "NAME")?,
        },
        "search" => CliCommand::Search {
            query: take_single(positionals, "QUERY")?,
        },
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };

    Ok(CliInvocation::Command { command, path })
}

fn take_single(mut positionals: Vec<String>, label: &'static str) -> Result<String, CliParseError> {
    if positionals.is_empty() {
        return Err(CliParseError::MissingArgument(label));
    }
    if positionals.len() > 1 {
        return Err(CliParseError::UnexpectedArgument(positionals.remove(1)));
    }
    Ok(positionals.remove(0))
}

fn expect_no_positionals(positionals: &[String]) -> Result<(), CliParseError> {
    match positionals.first() {
        Some(extra) => Err(CliParseError::UnexpectedArgument(extra.clone())),
        None => Ok(()),
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] UnknownTemplateError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Runs one non-interactive subcommand straight against the store. No
/// seeding happens here: an empty directory lists as empty.
pub fn run(command: CliCommand, store: &PromptStore, config: &Config) -> Result<(), CliRunError> {
    match command {
        CliCommand::List => run_list(store),
        CliCommand::Get { name } => run_get(store, &name),
        CliCommand::Create { name, template } => run_create(store, &name, template.as_deref()),
        CliCommand::Edit { name } => run_edit(store, config, &name),
        CliCommand::Delete { name, force } => run_delete(store, &name, force),
        CliCommand::Copy { name } => run_copy(store, &name),
        CliCommand::Search { query } => run_search(store, &query),
    }
}

fn run_list(store: &PromptStore) -> Result<(), CliRunError> {
    let load = store.load()?;
    let mut out = io::stdout().lock();
    if load.snapshot.is_empty() {
        writeln!(out, "No prompts found")?;
        return Ok(());
    }
    for prompt in load.snapshot.prompts() {
        writeln!(out, "{}", format_prompt_line(prompt))?;
    }
    if load.skipped > 0 {
        let mut err = io::stderr().lock();
        writeln!(err, "warning: skipped {} unreadable prompt file(s)", load.skipped)?;
    }
    Ok(())
}

fn run_get(store: &PromptStore, name: &str) -> Result<(), CliRunError> {
    let prompt = store.get(name)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", prompt.content.trim_end())?;
    Ok(())
}

fn run_create(store: &PromptStore, name: &str, template: Option<&str>) -> Result<(), CliRunError> {
    let name = normalize_name(name);
    let template = match template {
        Some(label) => Template::parse(label)?,
        None => Template::Default,
    };
    let content = template.render(&name);
    store.create(&name, &content, &std::collections::BTreeSet::new(), Some(template.label()))?;
    let mut out = io::stdout().lock();
    writeln!(out, "Created '{name}'")?;
    Ok(())
}

fn run_edit(store: &PromptStore, config: &Config, name: &str) -> Result<(), CliRunError> {
    let prompt = store.get(name)?;
    let seeded = render_document(&prompt.tags, prompt.template_origin.as_deref(), &prompt.content)
        .map_err(StoreError::from)?;

    let editor = resolve_editor(config);
    match edit_text(&editor, &seeded)? {
        EditOutcome::Saved(text) => {
            let document = parse_document(&text).map_err(StoreError::from)?;
            let tags = document.frontmatter.tags.into_iter().collect();
            store.update(name, &document.body, &tags)?;
            let mut out = io::stdout().lock();
            writeln!(out, "Updated '{name}'")?;
        }
        EditOutcome::Cancelled => {
            let mut out = io::stdout().lock();
            writeln!(out, "No changes")?;
        }
    }
    Ok(())
}

fn run_delete(store: &PromptStore, name: &str, force: bool) -> Result<(), CliRunError> {
    store.delete(name, force)?;
    let mut out = io::stdout().lock();
    writeln!(out, "Deleted '{name}'")?;
    Ok(())
}

fn run_copy(store: &PromptStore, name: &str) -> Result<(), CliRunError> {
    let prompt = store.get(name)?;
    copy_to_clipboard(&prompt.content)?;
    let mut out = io::stdout().lock();
    writeln!(out, "Copied to clipboard")?;
    Ok(())
}

fn run_search(store: &PromptStore, query: &str) -> Result<(), CliRunError> {
    let load = store.load()?;
    let hits = search(&load.snapshot, query);
    let mut out = io::stdout().lock();
    if hits.is_empty() {
        writeln!(out, "No prompts found matching '{query}'")?;
        return Ok(());
    }
    for hit in hits {
        writeln!(out, "{}", format_prompt_line(hit.prompt))?;
    }
    Ok(())
}

fn format_prompt_line(prompt: &crate::domain::Prompt) -> String {
    if prompt.tags.is_empty() {
        return prompt.name.clone();
    }
    let tags: Vec<&str> = prompt.tags.iter().map(String::as_str).collect();
    format!("{} [{}]", prompt.name, tags.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn no_args_launches_quick_select_tui() {
        let parsed = parse_invocation(&args(&["promptbox"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Tui {
                manage: false,
                path: None
            }
        );
    }

    #[test]
    fn manage_flag_launches_management_tui() {
        for flag in ["--manage", "-m"] {
            let parsed = parse_invocation(&args(&["promptbox", flag])).expect("parse");
            assert_eq!(
                parsed,
                CliInvocation::Tui {
                    manage: true,
                    path: None
                }
            );
        }
    }

    #[test]
    fn path_flag_applies_to_tui() {
        let parsed =
            parse_invocation(&args(&["promptbox", "--path", "/tmp/lib"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Tui {
                manage: false,
                path: Some(PathBuf::from("/tmp/lib"))
            }
        );
    }

    #[test]
    fn help_flag_wins_over_everything() {
        let parsed = parse_invocation(&args(&["promptbox", "list", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
    }

    #[test]
    fn list_parses_with_trailing_path_flag() {
        let parsed =
            parse_invocation(&args(&["promptbox", "list", "--path", "/tmp/lib"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                command: CliCommand::List,
                path: Some(PathBuf::from("/tmp/lib"))
            }
        );
    }

    #[test]
    fn get_requires_a_name() {
        let parsed = parse_invocation(&args(&["promptbox", "get", "code-review"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                command: CliCommand::Get {
                    name: "code-review".to_string()
                },
                path: None
            }
        );

        let error = parse_invocation(&args(&["promptbox", "get"])).unwrap_err();
        assert!(matches!(error, CliParseError::MissingArgument("NAME")));
    }

    #[test]
    fn create_accepts_template_flag() {
        let parsed = parse_invocation(&args(&[
            "promptbox",
            "create",
            "new-prompt",
            "--template",
            "sectioned",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                command: CliCommand::Create {
                    name: "new-prompt".to_string(),
                    template: Some("sectioned".to_string())
                },
                path: None
            }
        );
    }

    #[test]
    fn delete_accepts_force_flag() {
        let parsed =
            parse_invocation(&args(&["promptbox", "delete", "old", "--force"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command {
                command: CliCommand::Delete {
                    name: "old".to_string(),
                    force: true
                },
                path: None
            }
        );
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        let error = parse_invocation(&args(&["promptbox", "frobnicate"])).unwrap_err();
        assert!(matches!(error, CliParseError::UnknownSubcommand(_)));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let error = parse_invocation(&args(&["promptbox", "list", "--wat"])).unwrap_err();
        assert!(matches!(error, CliParseError::UnknownFlag(_)));
    }

    #[test]
    fn template_flag_is_create_only() {
        let error =
            parse_invocation(&args(&["promptbox", "list", "--template", "x"])).unwrap_err();
        assert!(matches!(error, CliParseError::UnknownFlag(_)));
    }

    #[test]
    fn manage_flag_rejects_a_subcommand() {
        let error = parse_invocation(&args(&["promptbox", "--manage", "list"])).unwrap_err();
        assert!(matches!(error, CliParseError::UnexpectedArgument(_)));
    }

    #[test]
    fn extra_positional_is_rejected() {
        let error = parse_invocation(&args(&["promptbox", "get", "a", "b"])).unwrap_err();
        assert!(matches!(error, CliParseError::UnexpectedArgument(_)));
    }

    mod run_tests {
        use super::*;
        use std::collections::BTreeSet;
        use tempfile::tempdir;

        fn store() -> (tempfile::TempDir, PromptStore) {
            let dir = tempdir().expect("tempdir");
            let store = PromptStore::new(dir.path().to_path_buf());
            (dir, store)
        }

        #[test]
        fn create_writes_template_content() {
            let (_dir, store) = store();
            run(
                CliCommand::Create {
                    name: "New Prompt".to_string(),
                    template: Some("sectioned".to_string()),
                },
                &store,
                &Config::default(),
            )
            .expect("create");

            let prompt = store.get("new-prompt").expect("get");
            assert!(prompt.content.contains("# Instruction"));
            assert_eq!(prompt.template_origin.as_deref(), Some("sectioned"));
        }

        #[test]
        fn create_with_unknown_template_fails() {
            let (_dir, store) = store();
            let error = run(
                CliCommand::Create {
                    name: "x".to_string(),
                    template: Some("fancy".to_string()),
                },
                &store,
                &Config::default(),
            )
            .unwrap_err();
            assert!(matches!(error, CliRunError::Template(_)));
        }

        #[test]
        fn create_duplicate_fails() {
            let (_dir, store) = store();
            store
                .create("taken", "body", &BTreeSet::new(), None)
                .expect("seed");
            let error = run(
                CliCommand::Create {
                    name: "taken".to_string(),
                    template: None,
                },
                &store,
                &Config::default(),
            )
            .unwrap_err();
            assert!(matches!(
                error,
                CliRunError::Store(StoreError::AlreadyExists(_))
            ));
        }

        #[test]
        fn delete_without_force_fails_and_keeps_the_prompt() {
            let (_dir, store) = store();
            store
                .create("keep", "body", &BTreeSet::new(), None)
                .expect("seed");
            let error = run(
                CliCommand::Delete {
                    name: "keep".to_string(),
                    force: false,
                },
                &store,
                &Config::default(),
            )
            .unwrap_err();
            assert!(matches!(
                error,
                CliRunError::Store(StoreError::ConfirmationRequired)
            ));
            assert!(store.get("keep").is_ok());
        }

        #[test]
        fn delete_missing_prompt_reports_not_found_even_without_force() {
            let (_dir, store) = store();
            let error = run(
                CliCommand::Delete {
                    name: "ghost".to_string(),
                    force: false,
                },
                &store,
                &Config::default(),
            )
            .unwrap_err();
            assert!(matches!(error, CliRunError::Store(StoreError::NotFound(_))));
        }

        #[test]
        fn delete_with_force_removes_the_prompt() {
            let (_dir, store) = store();
            store
                .create("gone", "body", &BTreeSet::new(), None)
                .expect("seed");
            run(
                CliCommand::Delete {
                    name: "gone".to_string(),
                    force: true,
                },
                &store,
                &Config::default(),
            )
            .expect("delete");
            assert!(matches!(
                store.get("gone"),
                Err(StoreError::NotFound(_))
            ));
        }

        #[test]
        fn get_missing_prompt_fails() {
            let (_dir, store) = store();
            let error = run(
                CliCommand::Get {
                    name: "nope".to_string(),
                },
                &store,
                &Config::default(),
            )
            .unwrap_err();
            assert!(matches!(error, CliRunError::Store(StoreError::NotFound(_))));
        }
    }
}
