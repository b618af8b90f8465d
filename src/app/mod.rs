mod line_editor;

use crate::domain::{
    Prompt, Snapshot, TEMPLATES, Template, normalize_name, validate_name, visible_indices,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

pub use line_editor::LineEditor;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ResolvePromptsDir(#[from] crate::infra::ResolvePromptsDirError),

    #[error(transparent)]
    Config(#[from] crate::infra::LoadConfigError),
}

/// Snapshot of the library as seen by the session, plus any startup load
/// failure. A failed load renders as an empty list with a persistent banner;
/// Ctrl+R retries.
#[derive(Clone, Debug)]
pub struct AppData {
    pub prompts_dir: PathBuf,
    pub snapshot: Snapshot,
    pub load_error: Option<String>,
    pub skipped: usize,
}

impl AppData {
    pub fn new(prompts_dir: PathBuf, snapshot: Snapshot, skipped: usize) -> Self {
        Self {
            prompts_dir,
            snapshot,
            load_error: None,
            skipped,
        }
    }

    pub fn failed(prompts_dir: PathBuf, error: String) -> Self {
        Self {
            prompts_dir,
            snapshot: Snapshot::default(),
            load_error: Some(error),
            skipped: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BrowseMode {
    Quick,
    Manage,
}

impl BrowseMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Quick => Self::Manage,
            Self::Manage => Self::Quick,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Quick => "Quick Select",
            Self::Manage => "Management",
        }
    }
}

/// The resident list view. `filtered` holds indices into the snapshot in
/// display order (search rank, then tag narrowing); `selected` indexes
/// `filtered` and is meaningless while the list is empty.
#[derive(Clone, Debug)]
pub struct BrowseView {
    pub mode: BrowseMode,
    pub query: String,
    pub tag_filter: BTreeSet<String>,
    pub filtered: Vec<usize>,
    pub selected: usize,
}

impl BrowseView {
    pub fn new(mode: BrowseMode, snapshot: &Snapshot) -> Self {
        Self {
            mode,
            query: String::new(),
            tag_filter: BTreeSet::new(),
            filtered: visible_indices(snapshot, "", &BTreeSet::new()),
            selected: 0,
        }
    }

    /// Recomputes the visible list against the same snapshot the current
    /// indices point into, keeping the cursor on the same prompt when it
    /// survives the change and clamping otherwise.
    pub fn refilter(&mut self, snapshot: &Snapshot) {
        let kept_name = self.selected_prompt(snapshot).map(|p| p.name.clone());
        self.refilter_keeping(snapshot, kept_name);
    }

    // `kept_name` must be resolved against the snapshot the current indices
    // were built from; when the snapshot is being replaced that is the OLD
    // one, not `snapshot`.
    fn refilter_keeping(&mut self, snapshot: &Snapshot, kept_name: Option<String>) {
        self.filtered = visible_indices(snapshot, &self.query, &self.tag_filter);
        if let Some(name) = kept_name {
            if let Some(pos) = self
                .filtered
                .iter()
                .position(|index| snapshot.prompts()[*index].name == name)
            {
                self.selected = pos;
                return;
            }
        }
        self.clamp_cursor();
    }

    pub fn clamp_cursor(&mut self) {
        if self.filtered.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.filtered.len() - 1);
        }
    }

    pub fn selected_prompt<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a Prompt> {
        self.filtered
            .get(self.selected)
            .and_then(|index| snapshot.prompts().get(*index))
    }

    fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn move_down(&mut self) {
        if !self.filtered.is_empty() {
            self.selected = (self.selected + 1).min(self.filtered.len() - 1);
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchView {
    pub from: BrowseView,
    pub prior_query: String,
    pub editor: LineEditor,
}

impl SearchView {
    pub fn new(from: BrowseView) -> Self {
        let prior_query = from.query.clone();
        let editor = LineEditor::from_text(from.query.clone());
        Self {
            from,
            prior_query,
            editor,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TagFilterView {
    pub from: BrowseView,
    pub all_tags: Vec<String>,
    pub highlighted: usize,
    pub chosen: BTreeSet<String>,
}

impl TagFilterView {
    pub fn new(from: BrowseView, snapshot: &Snapshot) -> Self {
        let all_tags: Vec<String> = snapshot.tags().map(str::to_string).collect();
        let chosen = from.tag_filter.clone();
        Self {
            from,
            all_tags,
            highlighted: 0,
            chosen,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CreateField {
    Name,
    Template,
}

#[derive(Clone, Debug)]
pub struct CreateView {
    pub from: BrowseView,
    pub name: LineEditor,
    pub template_index: usize,
    pub field: CreateField,
}

impl CreateView {
    pub fn new(from: BrowseView) -> Self {
        Self {
            from,
            name: LineEditor::new(),
            template_index: 0,
            field: CreateField::Name,
        }
    }

    pub fn template(&self) -> Template {
        TEMPLATES[self.template_index % TEMPLATES.len()]
    }
}

#[derive(Clone, Debug)]
pub struct DeleteConfirmView {
    pub from: BrowseView,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct BuildView {
    pub from: BrowseView,
    /// Prompt names in the order they were picked; this order, not snapshot
    /// order, drives the final concatenation.
    pub picked: Vec<String>,
    pub selected: usize,
}

impl BuildView {
    pub fn new(from: BrowseView) -> Self {
        let selected = from.selected;
        Self {
            from,
            picked: Vec::new(),
            selected,
        }
    }
}

#[derive(Clone, Debug)]
pub enum View {
    Browse(BrowseView),
    Search(SearchView),
    TagFilter(TagFilterView),
    Create(CreateView),
    DeleteConfirm(DeleteConfirmView),
    Build(BuildView),
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: AppData,
    pub view: View,
    pub notice: Option<String>,
}

impl AppModel {
    pub fn new(data: AppData, mode: BrowseMode) -> Self {
        let view = View::Browse(BrowseView::new(mode, &data.snapshot));
        Self {
            data,
            view,
            notice: None,
        }
    }

    pub fn with_notice(&self, notice: Option<String>) -> Self {
        Self {
            data: self.data.clone(),
            view: self.view.clone(),
            notice,
        }
    }

    /// Installs a fresh snapshot after a mutation or rescan. Whatever view
    /// was active collapses back to its underlying browse list, refiltered
    /// against the new data.
    pub fn with_data(&self, data: AppData) -> Self {
        let mut browse = take_browse(self.view.clone());
        // The cursor name has to come from the snapshot the old indices were
        // built against, before the new one is installed.
        let kept_name = browse
            .selected_prompt(&self.data.snapshot)
            .map(|p| p.name.clone());
        browse.refilter_keeping(&data.snapshot, kept_name);
        Self {
            data,
            view: View::Browse(browse),
            notice: self.notice.clone(),
        }
    }
}

fn take_browse(view: View) -> BrowseView {
    match view {
        View::Browse(browse) => browse,
        View::Search(search) => search.from,
        View::TagFilter(filter) => filter.from,
        View::Create(create) => create.from,
        View::DeleteConfirm(confirm) => confirm.from,
        View::Build(build) => build.from,
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
}

/// Side effects requested by the state machine, executed by the event loop.
#[derive(Clone, Debug)]
pub enum AppCommand {
    None,
    Quit,
    Rescan,
    /// Quick-select one-shot: copy then terminate, copy being best-effort.
    CopyAndQuit { name: String },
    CopyPrompt { name: String },
    CopyComposed { names: Vec<String> },
    EditPrompt { name: String },
    CreatePrompt { name: String, template: Template },
    DeletePrompt { name: String },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
    }
}

fn update_on_key(model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    let mut model = model;
    model.notice = None;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return (model, AppCommand::Quit);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
        return (model, AppCommand::Rescan);
    }

    match model.view {
        View::Browse(view) => update_browse(model.data, model.notice, view, key),
        View::Search(view) => update_search(model.data, model.notice, view, key),
        View::TagFilter(view) => update_tag_filter(model.data, model.notice, view, key),
        View::Create(view) => update_create(model.data, model.notice, view, key),
        View::DeleteConfirm(view) => update_delete_confirm(model.data, model.notice, view, key),
        View::Build(view) => update_build(model.data, model.notice, view, key),
    }
}

fn model_with(data: AppData, notice: Option<String>, view: View) -> AppModel {
    AppModel { data, view, notice }
}

fn update_browse(
    data: AppData,
    notice: Option<String>,
    mut view: BrowseView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            return (model_with(data, notice, View::Browse(view)), AppCommand::Quit);
        }
        KeyCode::Up | KeyCode::Char('k') => view.move_up(),
        KeyCode::Down | KeyCode::Char('j') => view.move_down(),
        KeyCode::Tab => view.mode = view.mode.toggle(),
        KeyCode::Char('/') => {
            let search = SearchView::new(view);
            return (
                model_with(data, notice, View::Search(search)),
                AppCommand::None,
            );
        }
        KeyCode::Enter => {
            if view.mode == BrowseMode::Quick {
                if let Some(prompt) = view.selected_prompt(&data.snapshot) {
                    let name = prompt.name.clone();
                    return (
                        model_with(data, notice, View::Browse(view)),
                        AppCommand::CopyAndQuit { name },
                    );
                }
            }
        }
        KeyCode::Char('t') if view.mode == BrowseMode::Quick => {
            let filter = TagFilterView::new(view, &data.snapshot);
            return (
                model_with(data, notice, View::TagFilter(filter)),
                AppCommand::None,
            );
        }
        KeyCode::Char(' ') if view.mode == BrowseMode::Manage => {
            let filter = TagFilterView::new(view, &data.snapshot);
            return (
                model_with(data, notice, View::TagFilter(filter)),
                AppCommand::None,
            );
        }
        KeyCode::Char('n') if view.mode == BrowseMode::Manage => {
            let create = CreateView::new(view);
            return (
                model_with(data, notice, View::Create(create)),
                AppCommand::None,
            );
        }
        KeyCode::Char('e') if view.mode == BrowseMode::Manage => {
            if let Some(prompt) = view.selected_prompt(&data.snapshot) {
                let name = prompt.name.clone();
                return (
                    model_with(data, notice, View::Browse(view)),
                    AppCommand::EditPrompt { name },
                );
            }
        }
        KeyCode::Char('d') if view.mode == BrowseMode::Manage => {
            if let Some(prompt) = view.selected_prompt(&data.snapshot) {
                let name = prompt.name.clone();
                let confirm = DeleteConfirmView { from: view, name };
                return (
                    model_with(data, notice, View::DeleteConfirm(confirm)),
                    AppCommand::None,
                );
            }
        }
        KeyCode::Char('b') if view.mode == BrowseMode::Manage => {
            let build = BuildView::new(view);
            return (
                model_with(data, notice, View::Build(build)),
                AppCommand::None,
            );
        }
        KeyCode::Char('y') if view.mode == BrowseMode::Manage => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if let Some(prompt) = view.selected_prompt(&data.snapshot) {
                    let name = prompt.name.clone();
                    return (
                        model_with(data, notice, View::Browse(view)),
                        AppCommand::CopyPrompt { name },
                    );
                }
            }
        }
        _ => {}
    }

    (model_with(data, notice, View::Browse(view)), AppCommand::None)
}

fn update_search(
    data: AppData,
    notice: Option<String>,
    mut view: SearchView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            let mut browse = view.from;
            browse.query = view.prior_query;
            browse.refilter(&data.snapshot);
            return (
                model_with(data, notice, View::Browse(browse)),
                AppCommand::None,
            );
        }
        KeyCode::Enter => {
            let mut browse = view.from;
            browse.query = view.editor.text.clone();
            browse.refilter(&data.snapshot);
            return (
                model_with(data, notice, View::Browse(browse)),
                AppCommand::None,
            );
        }
        KeyCode::Backspace => view.editor.backspace(),
        KeyCode::Left => view.editor.move_left(),
        KeyCode::Right => view.editor.move_right(),
        KeyCode::Home => view.editor.move_home(),
        KeyCode::End => view.editor.move_end(),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view.editor.insert_char(ch);
        }
        _ => {
            return (
                model_with(data, notice, View::Search(view)),
                AppCommand::None,
            );
        }
    }

    // Live narrowing: the underlying list tracks every keystroke.
    view.from.query = view.editor.text.clone();
    view.from.refilter(&data.snapshot);
    (
        model_with(data, notice, View::Search(view)),
        AppCommand::None,
    )
}

fn update_tag_filter(
    data: AppData,
    notice: Option<String>,
    mut view: TagFilterView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            let mut browse = view.from;
            browse.tag_filter = view.chosen;
            browse.refilter(&data.snapshot);
            return (
                model_with(data, notice, View::Browse(browse)),
                AppCommand::None,
            );
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view.highlighted = view.highlighted.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if !view.all_tags.is_empty() {
                view.highlighted = (view.highlighted + 1).min(view.all_tags.len() - 1);
            }
        }
        KeyCode::Char(' ') => {
            if let Some(tag) = view.all_tags.get(view.highlighted) {
                if !view.chosen.remove(tag) {
                    view.chosen.insert(tag.clone());
                }
            }
        }
        KeyCode::Char('c') => view.chosen.clear(),
        _ => {}
    }

    (
        model_with(data, notice, View::TagFilter(view)),
        AppCommand::None,
    )
}

fn update_create(
    data: AppData,
    notice: Option<String>,
    mut view: CreateView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            return (
                model_with(data, notice, View::Browse(view.from)),
                AppCommand::None,
            );
        }
        KeyCode::Tab => {
            view.field = match view.field {
                CreateField::Name => CreateField::Template,
                CreateField::Template => CreateField::Name,
            };
        }
        KeyCode::Enter => {
            let name = normalize_name(&view.name.text);
            match validate_name(&name) {
                Ok(()) => {
                    let template = view.template();
                    return (
                        model_with(data, notice, View::Browse(view.from)),
                        AppCommand::CreatePrompt { name, template },
                    );
                }
                Err(error) => {
                    return (
                        model_with(data, Some(error.to_string()), View::Create(view)),
                        AppCommand::None,
                    );
                }
            }
        }
        KeyCode::Left => match view.field {
            CreateField::Template => {
                view.template_index =
                    (view.template_index + TEMPLATES.len() - 1) % TEMPLATES.len();
            }
            CreateField::Name => view.name.move_left(),
        },
        KeyCode::Right => match view.field {
            CreateField::Template => {
                view.template_index = (view.template_index + 1) % TEMPLATES.len();
            }
            CreateField::Name => view.name.move_right(),
        },
        KeyCode::Backspace => {
            if view.field == CreateField::Name {
                view.name.backspace();
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if view.field == CreateField::Name {
                view.name.insert_char(ch);
            }
        }
        _ => {}
    }

    (
        model_with(data, notice, View::Create(view)),
        AppCommand::None,
    )
}

fn update_delete_confirm(
    data: AppData,
    notice: Option<String>,
    view: DeleteConfirmView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let name = view.name;
            (
                model_with(data, notice, View::Browse(view.from)),
                AppCommand::DeletePrompt { name },
            )
        }
        // Anything else aborts the deletion.
        _ => (
            model_with(data, notice, View::Browse(view.from)),
            AppCommand::None,
        ),
    }
}

fn update_build(
    data: AppData,
    notice: Option<String>,
    mut view: BuildView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    match key.code {
        KeyCode::Esc => {
            return (
                model_with(data, notice, View::Browse(view.from)),
                AppCommand::None,
            );
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view.selected = view.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if !view.from.filtered.is_empty() {
                view.selected = (view.selected + 1).min(view.from.filtered.len() - 1);
            }
        }
        KeyCode::Char(' ') => {
            let highlighted = view
                .from
                .filtered
                .get(view.selected)
                .and_then(|index| data.snapshot.prompts().get(*index))
                .map(|prompt| prompt.name.clone());
            if let Some(name) = highlighted {
                if let Some(pos) = view.picked.iter().position(|picked| *picked == name) {
                    view.picked.remove(pos);
                } else {
                    view.picked.push(name);
                }
            }
        }
        KeyCode::Enter => {
            if view.picked.is_empty() {
                return (
                    model_with(
                        data,
                        Some("Nothing selected to build.".to_string()),
                        View::Build(view),
                    ),
                    AppCommand::None,
                );
            }
            let names = view.picked;
            return (
                model_with(data, notice, View::Browse(view.from)),
                AppCommand::CopyComposed { names },
            );
        }
        _ => {}
    }

    (model_with(data, notice, View::Build(view)), AppCommand::None)
}
