mod theme;

use crate::app::{
    AppModel, BrowseMode, BrowseView, BuildView, CreateField, CreateView, DeleteConfirmView,
    SearchView, TagFilterView, View,
};
use crate::domain::{Prompt, TEMPLATES};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::macros::format_description;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(Block::default().style(Style::default().bg(theme::BG)), area);

    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area, model);

    match &model.view {
        View::Browse(view) => render_browse(frame, body_area, model, view, None, None),
        View::Search(view) => render_search(frame, body_area, model, view),
        View::TagFilter(view) => {
            render_browse(frame, body_area, model, &view.from, None, None);
            render_tag_filter_overlay(frame, body_area, view);
        }
        View::Create(view) => {
            render_browse(frame, body_area, model, &view.from, None, None);
            render_create_overlay(frame, body_area, view);
        }
        View::DeleteConfirm(view) => {
            render_browse(frame, body_area, model, &view.from, None, None);
            render_delete_confirm_overlay(frame, body_area, view);
        }
        View::Build(view) => render_build(frame, body_area, model, view),
    }

    render_status(frame, status_area, model);
    render_footer(frame, footer_area, model);
}

fn render_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let mode_label = match &model.view {
        View::Browse(view) => view.mode.label(),
        View::Search(view) => view.from.mode.label(),
        View::TagFilter(_) => "Tag Filter",
        View::Create(_) => "Create",
        View::DeleteConfirm(_) => "Delete",
        View::Build(_) => "Build",
    };

    let count = model.data.snapshot.len();
    let left = format!(" promptbox — {mode_label} ");
    let right = format!(
        "{count} prompt{s} · {dir} ",
        s = if count == 1 { "" } else { "s" },
        dir = model.data.prompts_dir.display()
    );

    let used = UnicodeWidthStr::width(left.as_str()) + UnicodeWidthStr::width(right.as_str());
    let pad = (area.width as usize).saturating_sub(used);

    let line = Line::from(vec![
        Span::styled(
            left,
            Style::default()
                .fg(theme::ACCENT)
                .bg(theme::BAR_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ".repeat(pad), Style::default().bg(theme::BAR_BG)),
        Span::styled(right, Style::default().fg(theme::DIM).bg(theme::BAR_BG)),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme::BAR_BG)),
        area,
    );
}

fn render_browse(
    frame: &mut Frame,
    area: Rect,
    model: &AppModel,
    view: &BrowseView,
    build: Option<&BuildView>,
    selected_override: Option<usize>,
) {
    let wide = area.width >= 90;
    let (list_area, preview_area) = if wide {
        let [list_area, preview_area] =
            Layout::horizontal([Constraint::Percentage(42), Constraint::Percentage(58)])
                .areas(area);
        (list_area, Some(preview_area))
    } else {
        (area, None)
    };

    let selected = selected_override.unwrap_or(view.selected);
    let snapshot = &model.data.snapshot;

    let items: Vec<ListItem> = view
        .filtered
        .iter()
        .map(|index| {
            let prompt = &snapshot.prompts()[*index];
            list_item_for_prompt(prompt, list_area.width, build)
        })
        .collect();

    let mut title = String::from(" Prompts ");
    if !view.query.is_empty() {
        title = format!(" Prompts · /{} ", view.query);
    }
    if !view.tag_filter.is_empty() {
        let tags: Vec<&str> = view.tag_filter.iter().map(String::as_str).collect();
        title.push_str(&format!("· #{} ", tags.join(" #")));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .title(Span::styled(title, Style::default().fg(theme::MUTED)));

    if view.filtered.is_empty() {
        let message = if model.data.load_error.is_some() {
            "Library unavailable."
        } else if model.data.snapshot.is_empty() {
            "No prompts yet. Press Tab, then 'n' to create one."
        } else {
            "No prompts match the current filter."
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(theme::DIM))
                .block(block),
            list_area,
        );
    } else {
        let mut state = ListState::default();
        state.select(Some(selected.min(view.filtered.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(theme::FG)
                    .bg(theme::ACCENT_BG)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("› ");
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    if let Some(preview_area) = preview_area {
        let highlighted = view
            .filtered
            .get(selected)
            .and_then(|index| snapshot.prompts().get(*index));
        render_preview(frame, preview_area, highlighted, build, snapshot);
    }
}

fn list_item_for_prompt<'a>(
    prompt: &'a Prompt,
    width: u16,
    build: Option<&BuildView>,
) -> ListItem<'a> {
    let mut spans = Vec::new();

    if let Some(build) = build {
        let marker = match build.picked.iter().position(|name| *name == prompt.name) {
            Some(position) => format!("[{}] ", position + 1),
            None => "[ ] ".to_string(),
        };
        spans.push(Span::styled(marker, Style::default().fg(theme::ACCENT)));
    }

    spans.push(Span::styled(
        prompt.name.clone(),
        Style::default().fg(theme::FG),
    ));

    if !prompt.tags.is_empty() {
        let tags: Vec<&str> = prompt.tags.iter().map(String::as_str).collect();
        spans.push(Span::styled(
            format!("  #{}", tags.join(" #")),
            Style::default().fg(theme::DIM),
        ));
    }

    // Right-align the modified timestamp when there is room.
    if width >= 60 {
        if let Some(stamp) = prompt.modified_at.and_then(format_timestamp) {
            let line_width: usize = spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum();
            let avail = (width as usize).saturating_sub(4);
            let stamp_width = UnicodeWidthStr::width(stamp.as_str());
            if line_width + stamp_width + 2 <= avail {
                spans.push(Span::styled(
                    " ".repeat(avail - line_width - stamp_width),
                    Style::default(),
                ));
                spans.push(Span::styled(stamp, Style::default().fg(theme::DIM)));
            }
        }
    }

    ListItem::new(Line::from(spans))
}

fn render_preview(
    frame: &mut Frame,
    area: Rect,
    highlighted: Option<&Prompt>,
    build: Option<&BuildView>,
    snapshot: &crate::domain::Snapshot,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .title(Span::styled(" Preview ", Style::default().fg(theme::MUTED)));

    if let Some(build) = build {
        if !build.picked.is_empty() {
            let composed = crate::domain::compose(snapshot, &build.picked);
            frame.render_widget(
                Paragraph::new(composed)
                    .style(Style::default().fg(theme::MUTED))
                    .wrap(Wrap { trim: false })
                    .block(block.title(Span::styled(
                        format!(" Build preview ({} picked) ", build.picked.len()),
                        Style::default().fg(theme::ACCENT),
                    ))),
                area,
            );
            return;
        }
    }

    match highlighted {
        Some(prompt) => {
            let mut lines = vec![Line::from(Span::styled(
                prompt.name.clone(),
                Style::default().fg(theme::FG).add_modifier(Modifier::BOLD),
            ))];
            if let Some(origin) = &prompt.template_origin {
                lines.push(Line::from(Span::styled(
                    format!("from template: {origin}"),
                    Style::default().fg(theme::DIM),
                )));
            }
            lines.push(Line::default());
            for text_line in prompt.content.lines() {
                lines.push(Line::from(Span::styled(
                    text_line.to_string(),
                    Style::default().fg(theme::MUTED),
                )));
            }
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
                area,
            );
        }
        None => frame.render_widget(
            Paragraph::new("Nothing selected.")
                .style(Style::default().fg(theme::DIM))
                .block(block),
            area,
        ),
    }
}

fn render_search(frame: &mut Frame, area: Rect, model: &AppModel, view: &SearchView) {
    let [list_area, input_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(area);

    render_browse(frame, list_area, model, &view.from, None, None);

    let input = Paragraph::new(Line::from(vec![
        Span::styled("/", Style::default().fg(theme::ACCENT)),
        Span::styled(view.editor.text.clone(), Style::default().fg(theme::FG)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT))
            .title(Span::styled(
                " Search (Enter apply · Esc cancel) ",
                Style::default().fg(theme::MUTED),
            )),
    );
    frame.render_widget(input, input_area);

    let cursor_col = u16::try_from(view.editor.cursor_col).unwrap_or(u16::MAX);
    let cursor_x = (input_area.x + 2).saturating_add(cursor_col);
    frame.set_cursor_position(Position::new(
        cursor_x.min(input_area.x + input_area.width.saturating_sub(2)),
        input_area.y + 1,
    ));
}

fn render_build(frame: &mut Frame, area: Rect, model: &AppModel, view: &BuildView) {
    render_browse(
        frame,
        area,
        model,
        &view.from,
        Some(view),
        Some(view.selected),
    );
}

fn render_tag_filter_overlay(frame: &mut Frame, area: Rect, view: &TagFilterView) {
    let height = (view.all_tags.len() as u16 + 2).clamp(3, area.height.saturating_sub(2));
    let popup = centered_rect(area, 40, height);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACCENT))
        .style(Style::default().bg(theme::SURFACE))
        .title(Span::styled(
            " Tags (Space toggle · c clear · Enter apply) ",
            Style::default().fg(theme::MUTED),
        ));

    if view.all_tags.is_empty() {
        frame.render_widget(
            Paragraph::new("No tags in the library.")
                .style(Style::default().fg(theme::DIM))
                .block(block),
            popup,
        );
        return;
    }

    let items: Vec<ListItem> = view
        .all_tags
        .iter()
        .map(|tag| {
            let mark = if view.chosen.contains(tag) { "[x]" } else { "[ ]" };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{mark} "), Style::default().fg(theme::ACCENT)),
                Span::styled(tag.clone(), Style::default().fg(theme::FG)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(view.highlighted.min(view.all_tags.len() - 1)));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme::ACCENT_BG));
    frame.render_stateful_widget(list, popup, &mut state);
}

fn render_create_overlay(frame: &mut Frame, area: Rect, view: &CreateView) {
    let popup = centered_rect(area, 52, 8);
    frame.render_widget(Clear, popup);

    let field_style = |active: bool| {
        if active {
            Style::default().fg(theme::FG).bg(theme::ACCENT_BG)
        } else {
            Style::default().fg(theme::MUTED)
        }
    };

    let template_row: Vec<Span> = TEMPLATES
        .iter()
        .enumerate()
        .flat_map(|(index, template)| {
            let marker = if index == view.template_index % TEMPLATES.len() {
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::DIM)
            };
            vec![
                Span::styled(template.label(), marker),
                Span::raw("  "),
            ]
        })
        .collect();

    let lines = vec![
        Line::default(),
        Line::from(vec![
            Span::styled(" Name     ", Style::default().fg(theme::DIM)),
            Span::styled(
                format!("{} ", view.name.text),
                field_style(view.field == CreateField::Name),
            ),
        ]),
        Line::default(),
        Line::from(
            std::iter::once(Span::styled(
                " Template ",
                field_style(view.field == CreateField::Template),
            ))
            .chain(template_row)
            .collect::<Vec<Span>>(),
        ),
        Line::default(),
        Line::from(Span::styled(
            " Enter opens your editor · Tab switches field · Esc cancels ",
            Style::default().fg(theme::DIM),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT))
                .style(Style::default().bg(theme::SURFACE))
                .title(Span::styled(
                    " New prompt ",
                    Style::default().fg(theme::ACCENT),
                )),
        ),
        popup,
    );
}

fn render_delete_confirm_overlay(frame: &mut Frame, area: Rect, view: &DeleteConfirmView) {
    let popup = centered_rect(area, 46, 5);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from(Span::styled(
            format!("Delete '{}'?", view.name),
            Style::default().fg(theme::FG),
        )),
        Line::default(),
        Line::from(Span::styled(
            "y confirms · any other key cancels",
            Style::default().fg(theme::DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ERROR))
                .style(Style::default().bg(theme::SURFACE))
                .title(Span::styled(" Confirm ", Style::default().fg(theme::ERROR))),
        ),
        popup,
    );
}

fn render_status(frame: &mut Frame, area: Rect, model: &AppModel) {
    if let Some(error) = &model.data.load_error {
        frame.render_widget(
            Paragraph::new(format!(" {error} — Ctrl+R to retry "))
                .style(Style::default().fg(theme::ERROR).bg(theme::BAR_BG)),
            area,
        );
        return;
    }
    if let Some(notice) = &model.notice {
        frame.render_widget(
            Paragraph::new(format!(" {notice} "))
                .style(Style::default().fg(theme::SUCCESS).bg(theme::BAR_BG)),
            area,
        );
        return;
    }
    if model.data.skipped > 0 {
        frame.render_widget(
            Paragraph::new(format!(" skipped {} unreadable prompt file(s) ", model.data.skipped))
                .style(Style::default().fg(theme::DIM).bg(theme::BAR_BG)),
            area,
        );
    }
}

fn render_footer(frame: &mut Frame, area: Rect, model: &AppModel) {
    let hints = match &model.view {
        View::Browse(view) => match view.mode {
            BrowseMode::Quick => {
                "Enter copy+exit · / search · t tags · Tab manage · j/k move · q quit"
            }
            BrowseMode::Manage => {
                "n new · e edit · d delete · b build · Ctrl+Y copy · / search · Space tags · Tab back"
            }
        },
        View::Search(_) => "type to filter · Enter apply · Esc cancel",
        View::TagFilter(_) => "Space toggle · c clear · j/k move · Enter/Esc apply",
        View::Create(_) => "Tab field · ←/→ template · Enter create · Esc cancel",
        View::DeleteConfirm(_) => "y delete · any other key cancel",
        View::Build(_) => "Space pick · j/k move · Enter copy · Esc cancel",
    };
    frame.render_widget(
        Paragraph::new(format!(" {hints}"))
            .style(Style::default().fg(theme::DIM).bg(theme::BAR_BG)),
        area,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn format_timestamp(timestamp: SystemTime) -> Option<String> {
    let datetime = OffsetDateTime::from(timestamp);
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    datetime.format(&format).ok()
}
