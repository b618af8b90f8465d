mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppData, AppEvent, AppModel, BrowseMode};
use crate::cli::CliInvocation;
use crate::domain::{Template, compose};
use crate::infra::{
    Config, EditOutcome, PromptStore, copy_to_clipboard, edit_text, load_config, parse_document,
    render_document, resolve_editor, resolve_prompts_dir,
};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Tui { manage, path } => {
            let mode = if manage {
                BrowseMode::Manage
            } else {
                BrowseMode::Quick
            };
            Ok(run_tui(mode, path.as_deref())?)
        }
        CliInvocation::Command { command, path } => {
            let config = load_config().map_err(app::AppError::from)?;
            let prompts_dir =
                resolve_prompts_dir(path.as_deref(), &config).map_err(app::AppError::from)?;
            let store = PromptStore::new(prompts_dir);
            crate::cli::run(command, &store, &config)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} \u{2014} keep a library of reusable prompts one keystroke away\n\nUSAGE:\n  {name} [--path DIR]                     Start quick-select (Enter copies and exits)\n  {name} --manage [--path DIR]            Start the management TUI\n  {name} list                             List prompts\n  {name} get NAME                         Print a prompt's content\n  {name} create NAME [--template T]       Create a prompt from a template\n  {name} edit NAME                        Edit a prompt in $EDITOR\n  {name} delete NAME [--force]            Delete a prompt\n  {name} copy NAME                        Copy a prompt to the clipboard\n  {name} search QUERY                     Search prompts by name, content, or tag\n  {name} --help | --version\n\nFLAGS:\n  --path, -p DIR    Use DIR as the prompt library\n  --manage, -m      Open the management TUI instead of quick-select\n  --template, -t T  Template for create: default|sectioned\n  --force, -f       Skip the delete confirmation\n\nENV:\n  PROMPTBOX_DIR     Override the prompt library directory\n  EDITOR            Editor for create/edit (default: vi)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(mode: BrowseMode, path: Option<&Path>) -> Result<(), crate::app::AppError> {
    let config = load_config()?;
    let prompts_dir = resolve_prompts_dir(path, &config)?;
    let store = PromptStore::new(prompts_dir.clone());

    let mut seed_error = None;
    if let Err(error) = store.ensure_initialized() {
        seed_error = Some(error.to_string());
    }

    let mut model = AppModel::new(load_data(&store, prompts_dir), mode);
    if let Some(error) = seed_error {
        model = model.with_notice(Some(format!("Seeding default prompts failed: {error}")));
    }

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut model, &store, &config);
    restore_terminal(&mut terminal)?;

    match result? {
        Some(report) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{report}");
            Ok(())
        }
        None => Ok(()),
    }
}

fn load_data(store: &PromptStore, prompts_dir: PathBuf) -> AppData {
    match store.load() {
        Ok(load) => AppData::new(prompts_dir, load.snapshot, load.skipped),
        Err(error) => AppData::failed(prompts_dir, error.to_string()),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Drives the pure state machine: draw, read a key, apply `update`, execute
/// the returned command. Returns an optional message to print to stderr after
/// the terminal is restored.
fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    store: &PromptStore,
    config: &Config,
) -> Result<Option<String>, app::AppError> {
    loop {
        terminal.draw(|frame| ui::render(frame, model))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind == KeyEventKind::Release {
            continue;
        }

        let (next, command) = app::update(model.clone(), AppEvent::Key(key));
        *model = next;
        match command {
            AppCommand::None => {}
            AppCommand::Quit => return Ok(None),
            AppCommand::Rescan => {
                let data = load_data(store, model.data.prompts_dir.clone());
                let notice = data
                    .load_error
                    .is_none()
                    .then(|| "Rescanned.".to_string());
                *model = model.with_data(data).with_notice(notice);
            }
            AppCommand::CopyAndQuit { name } => {
                // Quick-select is one-shot: copy best-effort and terminate
                // either way, reporting a failed copy after teardown.
                return Ok(copy_prompt(store, &name).err());
            }
            AppCommand::CopyPrompt { name } => {
                let notice = match copy_prompt(store, &name) {
                    Ok(()) => "Copied to clipboard".to_string(),
                    Err(error) => error,
                };
                *model = model.with_notice(Some(notice));
            }
            AppCommand::CopyComposed { names } => {
                let count = names.len();
                let composed = compose(&model.data.snapshot, &names);
                let notice = match copy_to_clipboard(&composed) {
                    Ok(()) => format!("Copied {count} prompt(s) to clipboard"),
                    Err(error) => error.to_string(),
                };
                *model = model.with_notice(Some(notice));
            }
            AppCommand::EditPrompt { name } => {
                let notice = run_edit_prompt(terminal, store, config, &name)?;
                let data = load_data(store, model.data.prompts_dir.clone());
                *model = model.with_data(data).with_notice(Some(notice));
            }
            AppCommand::CreatePrompt { name, template } => {
                let notice = run_create_prompt(terminal, store, config, &name, template)?;
                let data = load_data(store, model.data.prompts_dir.clone());
                *model = model.with_data(data).with_notice(Some(notice));
            }
            AppCommand::DeletePrompt { name } => {
                let notice = match store.delete(&name, true) {
                    Ok(()) => format!("Deleted '{name}'"),
                    Err(error) => format!("Failed to delete '{name}': {error}"),
                };
                let data = load_data(store, model.data.prompts_dir.clone());
                *model = model.with_data(data).with_notice(Some(notice));
            }
        }
    }
}

fn copy_prompt(store: &PromptStore, name: &str) -> Result<(), String> {
    let prompt = store
        .get(name)
        .map_err(|error| format!("Failed to read '{name}': {error}"))?;
    copy_to_clipboard(&prompt.content).map_err(|error| error.to_string())
}

fn run_edit_prompt(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    store: &PromptStore,
    config: &Config,
    name: &str,
) -> Result<String, app::AppError> {
    let prompt = match store.get(name) {
        Ok(prompt) => prompt,
        Err(error) => return Ok(format!("Failed to read '{name}': {error}")),
    };
    let seeded =
        match render_document(&prompt.tags, prompt.template_origin.as_deref(), &prompt.content) {
            Ok(seeded) => seeded,
            Err(error) => return Ok(format!("Failed to open '{name}': {error}")),
        };

    let outcome = with_suspended_terminal(terminal, || {
        edit_text(&resolve_editor(config), &seeded)
    })?;

    let notice = match outcome {
        Ok(EditOutcome::Saved(text)) => match commit_edit(store, name, &text) {
            Ok(()) => format!("Updated '{name}'"),
            Err(error) => format!("Failed to save '{name}': {error}"),
        },
        Ok(EditOutcome::Cancelled) => "Edit cancelled".to_string(),
        Err(error) => format!("Editor failed: {error}"),
    };
    Ok(notice)
}

fn commit_edit(store: &PromptStore, name: &str, text: &str) -> Result<(), String> {
    let document = parse_document(text).map_err(|error| error.to_string())?;
    let tags = document.frontmatter.tags.into_iter().collect();
    store
        .update(name, &document.body, &tags)
        .map_err(|error| error.to_string())
}

fn run_create_prompt(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    store: &PromptStore,
    config: &Config,
    name: &str,
    template: Template,
) -> Result<String, app::AppError> {
    if store.get(name).is_ok() {
        return Ok(format!("Prompt '{name}' already exists"));
    }

    let seeded = template.render(name);
    let outcome = with_suspended_terminal(terminal, || {
        edit_text(&resolve_editor(config), &seeded)
    })?;

    let notice = match outcome {
        Ok(EditOutcome::Saved(text)) => match commit_create(store, name, &text, template) {
            Ok(()) => format!("Created '{name}'"),
            Err(error) => format!("Failed to create '{name}': {error}"),
        },
        Ok(EditOutcome::Cancelled) => "Creation cancelled".to_string(),
        Err(error) => format!("Editor failed: {error}"),
    };
    Ok(notice)
}

fn commit_create(
    store: &PromptStore,
    name: &str,
    text: &str,
    template: Template,
) -> Result<(), String> {
    let document = parse_document(text).map_err(|error| error.to_string())?;
    let tags = document.frontmatter.tags.into_iter().collect();
    store
        .create(name, &document.body, &tags, Some(template.label()))
        .map_err(|error| error.to_string())
}

// Leaves the alternate screen and raw mode while the external editor owns the
// terminal, then re-enters and forces a full redraw.
fn with_suspended_terminal<T>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    body: impl FnOnce() -> T,
) -> Result<T, app::AppError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    let value = body();

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    Ok(value)
}
