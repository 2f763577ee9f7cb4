// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::cache::CategoryCache;
use crate::filter::filter_rows;
use crate::model::{BaseTables, OverheadCategory, Row, TabKind, default_filter_field, schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Filter,
}

/// The single controller for the active view: tab, category, filter, and
/// the category cache all live here, and every transition goes through
/// `dispatch`. Side effects (resolutions to perform) come back as events
/// for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub active_category: Option<OverheadCategory>,
    pub filter_field: Option<String>,
    pub filter_term: String,
    pub error: Option<String>,
    pub status_line: Option<String>,
    base: BaseTables,
    cache: CategoryCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Vendors,
            active_category: None,
            filter_field: None,
            filter_term: String::new(),
            error: None,
            status_line: None,
            base: BaseTables::default(),
            cache: CategoryCache::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    SelectTab(TabKind),
    NextCategory,
    PrevCategory,
    SelectCategory(OverheadCategory),
    EnterFilterMode,
    ExitToNav,
    SetFilterField(String),
    CycleFilterField(isize),
    PushFilterChar(char),
    PopFilterChar,
    ClearFilterTerm,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TabChanged(TabKind),
    CategoryChanged(OverheadCategory),
    ResolutionRequested(OverheadCategory),
    FilterFieldChanged(Option<String>),
    FilterTermChanged(String),
    ModeChanged(AppMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::SelectTab(tab) => self.select_tab(tab),
            AppCommand::NextCategory => self.rotate_category(1),
            AppCommand::PrevCategory => self.rotate_category(-1),
            AppCommand::SelectCategory(category) => self.select_category(category),
            AppCommand::EnterFilterMode => {
                self.mode = AppMode::Filter;
                vec![
                    AppEvent::ModeChanged(self.mode),
                    self.set_status("filter edit"),
                ]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::SetFilterField(field) => {
                if self.filter_field.as_deref() == Some(field.as_str()) {
                    return Vec::new();
                }
                self.filter_field = Some(field.clone());
                vec![AppEvent::FilterFieldChanged(Some(field))]
            }
            AppCommand::CycleFilterField(delta) => self.cycle_filter_field(delta),
            AppCommand::PushFilterChar(ch) => {
                self.filter_term.push(ch);
                vec![AppEvent::FilterTermChanged(self.filter_term.clone())]
            }
            AppCommand::PopFilterChar => {
                if self.filter_term.pop().is_some() {
                    vec![AppEvent::FilterTermChanged(self.filter_term.clone())]
                } else {
                    Vec::new()
                }
            }
            AppCommand::ClearFilterTerm => {
                if self.filter_term.is_empty() {
                    return Vec::new();
                }
                self.filter_term.clear();
                vec![AppEvent::FilterTermChanged(String::new())]
            }
            AppCommand::SetStatus(message) => {
                vec![self.set_status(&message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Rows behind the active view, once loaded: a base table, or the
    /// cached resolution of the active overhead category.
    pub fn active_rows(&self) -> Option<&[Row]> {
        match self.active_tab {
            TabKind::Overheads => self
                .active_category
                .and_then(|category| self.cache.rows(category)),
            tab => self.base.rows_for(tab),
        }
    }

    /// Column headers for the active view.
    pub fn active_schema(&self) -> Vec<String> {
        schema(self.active_rows().unwrap_or(&[]))
    }

    /// The active row set with the current field filter applied.
    pub fn visible_rows(&self) -> Vec<&Row> {
        let rows = self.active_rows().unwrap_or(&[]);
        match &self.filter_field {
            Some(field) => filter_rows(rows, field, &self.filter_term),
            None => rows.iter().collect(),
        }
    }

    pub fn cache(&self) -> &CategoryCache {
        &self.cache
    }

    /// Installs the concurrently fetched base tables after the initial
    /// load settles and seeds the filter field from the startup tab.
    pub fn install_base_tables(&mut self, tables: BaseTables) -> Vec<AppEvent> {
        self.base = tables;
        self.error = None;
        vec![self.reset_filter_field()]
    }

    /// Publishes a successful resolution. The cache is only ever written
    /// here, after the whole join succeeded.
    pub fn complete_resolution(
        &mut self,
        category: OverheadCategory,
        rows: Vec<Row>,
    ) -> Vec<AppEvent> {
        self.cache.put(category, rows);
        if self.active_tab == TabKind::Overheads && self.active_category == Some(category) {
            self.error = None;
            vec![self.reset_filter_field()]
        } else {
            Vec::new()
        }
    }

    /// Records a failed resolution. Nothing is cached, so re-selecting the
    /// category re-runs the join from scratch.
    pub fn fail_resolution(&mut self, category: OverheadCategory, message: impl Into<String>) {
        if self.active_tab == TabKind::Overheads && self.active_category == Some(category) {
            self.error = Some(message.into());
        }
    }

    fn select_tab(&mut self, tab: TabKind) -> Vec<AppEvent> {
        if tab == self.active_tab {
            // Re-selecting the overheads tab is the retry path for a
            // failed (hence uncached) resolution.
            if tab == TabKind::Overheads
                && let Some(category) = self.active_category
                && !self.cache.has(category)
            {
                self.error = None;
                return vec![AppEvent::ResolutionRequested(category)];
            }
            return Vec::new();
        }

        self.active_tab = tab;
        self.error = None;
        let mut events = vec![AppEvent::TabChanged(tab)];

        if tab == TabKind::Overheads {
            let category = match self.active_category {
                Some(category) => category,
                None => {
                    let first = OverheadCategory::ALL[0];
                    self.active_category = Some(first);
                    events.push(AppEvent::CategoryChanged(first));
                    first
                }
            };
            if self.cache.has(category) {
                events.push(self.reset_filter_field());
            } else {
                events.push(AppEvent::ResolutionRequested(category));
            }
        } else {
            events.push(self.reset_filter_field());
        }

        events
    }

    fn select_category(&mut self, category: OverheadCategory) -> Vec<AppEvent> {
        if self.active_tab != TabKind::Overheads {
            return Vec::new();
        }
        if self.active_category == Some(category) && self.cache.has(category) {
            return Vec::new();
        }

        let changed = self.active_category != Some(category);
        self.active_category = Some(category);
        self.error = None;

        let mut events = Vec::new();
        if changed {
            events.push(AppEvent::CategoryChanged(category));
        }
        if self.cache.has(category) {
            events.push(self.reset_filter_field());
        } else {
            events.push(AppEvent::ResolutionRequested(category));
        }
        events
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.select_tab(tabs[next])
    }

    fn rotate_category(&mut self, delta: isize) -> Vec<AppEvent> {
        if self.active_tab != TabKind::Overheads {
            return Vec::new();
        }
        let categories = OverheadCategory::ALL;
        let current = self
            .active_category
            .and_then(|active| categories.iter().position(|category| *category == active))
            .unwrap_or(0) as isize;
        let len = categories.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.select_category(categories[next])
    }

    fn cycle_filter_field(&mut self, delta: isize) -> Vec<AppEvent> {
        let fields = self.active_schema();
        if fields.is_empty() {
            return Vec::new();
        }
        let next = match self
            .filter_field
            .as_deref()
            .and_then(|field| fields.iter().position(|name| name == field))
        {
            Some(index) => (index as isize + delta).rem_euclid(fields.len() as isize) as usize,
            None => 0,
        };
        if self.filter_field.as_deref() == Some(fields[next].as_str()) {
            return Vec::new();
        }
        self.filter_field = Some(fields[next].clone());
        vec![AppEvent::FilterFieldChanged(self.filter_field.clone())]
    }

    fn reset_filter_field(&mut self) -> AppEvent {
        let field = match self.active_rows() {
            Some(rows) => default_filter_field(rows),
            None => None,
        };
        self.filter_field = field.clone();
        AppEvent::FilterFieldChanged(field)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
