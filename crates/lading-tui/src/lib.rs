// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use lading_app::{
    AppCommand, AppEvent, AppMode, AppState, BaseTables, OverheadCategory, Row, TabKind,
    display_value,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const KEY_HINT: &str = "tab: switch · [/]: category · /: filter · f: field · r: retry · q: quit";

/// The view's collaborators: the concurrent initial load of the base
/// tables, and on-demand overhead resolution. Implemented by the CLI over
/// the data API (and by test doubles here).
pub trait AppRuntime {
    fn load_base_tables(&mut self) -> Result<BaseTables>;
    fn resolve_category(&mut self, category: OverheadCategory) -> Result<Vec<Row>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    loading: bool,
    pending_resolution: Option<OverheadCategory>,
    selected_row: usize,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    view_data.loading = true;
    let mut result = terminal
        .draw(|frame| render(frame, state, &view_data))
        .map(|_| ())
        .context("draw frame");

    if result.is_ok() {
        match runtime.load_base_tables() {
            Ok(tables) => {
                state.install_base_tables(tables);
            }
            Err(error) => {
                state.error = Some(format!("{error:#}"));
            }
        }
        view_data.loading = false;

        // A configured start tab of overheads has no category yet; picking
        // the first one kicks off its resolution.
        if state.active_tab == TabKind::Overheads
            && state.active_category.is_none()
            && state.error.is_none()
        {
            let events = state.dispatch(AppCommand::SelectCategory(OverheadCategory::ALL[0]));
            absorb_events(&mut view_data, &events);
        }
    }

    while result.is_ok() {
        process_internal_events(state, &view_data, &internal_rx);

        if let Some(category) = view_data.pending_resolution.take() {
            view_data.loading = true;
            if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
                result = Err(error).context("draw frame");
                break;
            }
            perform_resolution(state, runtime, &mut view_data, category);
            view_data.loading = false;
            continue;
        }

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn perform_resolution<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    category: OverheadCategory,
) {
    match runtime.resolve_category(category) {
        Ok(rows) => {
            let events = state.complete_resolution(category, rows);
            absorb_events(view_data, &events);
        }
        Err(error) => {
            state.fail_resolution(category, format!("{error:#}"));
        }
    }
}

fn process_internal_events(state: &mut AppState, view_data: &ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    let commands: Vec<AppCommand> = match state.mode {
        AppMode::Filter => match key.code {
            KeyCode::Esc | KeyCode::Enter => vec![AppCommand::ExitToNav],
            KeyCode::Backspace => vec![AppCommand::PopFilterChar],
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                vec![AppCommand::ClearFilterTerm]
            }
            KeyCode::Char(ch) => vec![AppCommand::PushFilterChar(ch)],
            _ => Vec::new(),
        },
        AppMode::Nav => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => vec![AppCommand::NextTab],
            KeyCode::BackTab => vec![AppCommand::PrevTab],
            KeyCode::Char(digit @ '1'..='4') => {
                let index = digit as usize - '1' as usize;
                vec![AppCommand::SelectTab(TabKind::ALL[index])]
            }
            KeyCode::Char(']') => vec![AppCommand::NextCategory],
            KeyCode::Char('[') => vec![AppCommand::PrevCategory],
            KeyCode::Char('f') => vec![AppCommand::CycleFilterField(1)],
            KeyCode::Char('F') => vec![AppCommand::CycleFilterField(-1)],
            KeyCode::Char('/') => vec![AppCommand::EnterFilterMode],
            KeyCode::Char('x') => vec![AppCommand::ClearFilterTerm],
            KeyCode::Char('r') => match (state.active_tab, state.active_category) {
                (TabKind::Overheads, Some(category)) => {
                    vec![AppCommand::SelectCategory(category)]
                }
                _ => Vec::new(),
            },
            KeyCode::Down | KeyCode::Char('j') => {
                move_selection(state, view_data, 1);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                move_selection(state, view_data, -1);
                Vec::new()
            }
            _ => Vec::new(),
        },
    };

    for command in commands {
        let events = state.dispatch(command);
        absorb_events(view_data, &events);
        for event in &events {
            if let AppEvent::CategoryChanged(category) = event {
                let label = category.label();
                emit_status(state, view_data, internal_tx, format!("category: {label}"));
            }
        }
    }

    false
}

/// Folds dispatch results into view bookkeeping: resolutions to perform
/// and cursor resets whenever the visible data set changed.
fn absorb_events(view_data: &mut ViewData, events: &[AppEvent]) {
    for event in events {
        match event {
            AppEvent::ResolutionRequested(category) => {
                view_data.pending_resolution = Some(*category);
            }
            AppEvent::TabChanged(_)
            | AppEvent::CategoryChanged(_)
            | AppEvent::FilterFieldChanged(_)
            | AppEvent::FilterTermChanged(_) => {
                view_data.selected_row = 0;
            }
            _ => {}
        }
    }
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let visible = state.visible_rows().len();
    if visible == 0 {
        view_data.selected_row = 0;
        return;
    }
    let current = view_data.selected_row.min(visible - 1) as isize;
    view_data.selected_row = (current + delta).clamp(0, visible as isize - 1) as usize;
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab.label().to_owned())
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("lading").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    let search = Paragraph::new(search_bar_text(state))
        .block(Block::default().title("search").borders(Borders::ALL));
    frame.render_widget(search, layout[1]);

    let body_area = if state.active_tab == TabKind::Overheads {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(layout[2]);
        let categories = Paragraph::new(category_bar_text(state))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(categories, split[0]);
        split[1]
    } else {
        layout[2]
    };

    if view_data.loading {
        let loading = Paragraph::new("loading...")
            .block(Block::default().borders(Borders::ALL).title("lading"));
        frame.render_widget(loading, body_area);
    } else if let Some(message) = &state.error {
        let error = Paragraph::new(error_text(message))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("error"));
        frame.render_widget(error, body_area);
    } else {
        render_table(frame, body_area, state, view_data);
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let columns = state.active_schema();
    if columns.is_empty() {
        let empty = Paragraph::new("no rows").block(
            Block::default()
                .borders(Borders::ALL)
                .title(table_title(state)),
        );
        frame.render_widget(empty, area);
        return;
    }

    let visible = state.visible_rows();
    let selected_row = view_data
        .selected_row
        .min(visible.len().saturating_sub(1));
    let widths = vec![Constraint::Min(8); columns.len()];

    let header_cells = columns.iter().map(|column| {
        Cell::from(column.clone()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = TableRow::new(header_cells);

    let rows = visible.iter().enumerate().map(|(row_index, row)| {
        let cells = columns
            .iter()
            .map(|column| {
                let text = row
                    .get(column)
                    .map(display_value)
                    .unwrap_or_else(|| "-".to_owned());
                let mut style = Style::default();
                if row_index == selected_row {
                    style = style.bg(Color::DarkGray);
                }
                Cell::from(text).style(style)
            })
            .collect::<Vec<_>>();
        TableRow::new(cells)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn search_bar_text(state: &AppState) -> String {
    let field = state.filter_field.as_deref().unwrap_or("-");
    let cursor = if state.mode == AppMode::Filter {
        "▏"
    } else {
        ""
    };
    format!("field: {field}   contains: {}{cursor}", state.filter_term)
}

fn category_bar_text(state: &AppState) -> String {
    OverheadCategory::ALL
        .iter()
        .map(|category| {
            if Some(*category) == state.active_category {
                format!("[{}]", category.label())
            } else {
                category.label().to_owned()
            }
        })
        .collect::<Vec<String>>()
        .join("  ")
}

fn table_title(state: &AppState) -> String {
    let total = state.active_rows().map(<[Row]>::len).unwrap_or(0);
    let visible = state.visible_rows().len();

    let mut title = match (state.active_tab, state.active_category) {
        (TabKind::Overheads, Some(category)) => format!("overheads / {}", category.label()),
        (tab, _) => tab.label().to_owned(),
    };
    title.push_str(&format!(" ({visible}/{total})"));

    if state.active_tab == TabKind::Overheads
        && let Some(category) = state.active_category
        && let Some(entry) = state.cache().get(category)
    {
        let stamp = entry
            .resolved_at
            .format(&time::macros::format_description!("[hour]:[minute] UTC"))
            .unwrap_or_else(|_| entry.resolved_at.to_string());
        title.push_str(&format!(" · resolved {stamp}"));
    }

    title
}

fn error_text(message: &str) -> String {
    format!("{message}\n\npress r (or reselect the tab) to retry")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.loading {
        return "loading...".to_owned();
    }
    state
        .status_line
        .clone()
        .unwrap_or_else(|| KEY_HINT.to_owned())
}
