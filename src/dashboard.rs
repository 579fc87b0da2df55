//! Dashboard controller.
//!
//! Composes the task store and the undo/redo log with the view state the UI
//! needs: filters, sort order, selection and overlays. Undo and redo are
//! interpreted here:
//!
//! | popped by undo | applied                    |
//! |----------------|----------------------------|
//! | create         | delete the task            |
//! | delete         | re-add the snapshot        |
//! | toggle         | update to the prior status |
//!
//! Redo applies the original effect instead. Replays go through the store's
//! non-recording paths, so they never push onto the history themselves.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;

use crate::error::{DashboardError, StoreError};
use crate::history::{SharedHistory, UndoAction};
use crate::models::{Priority, Status, Task};
use crate::task_store::{ExportFormat, TaskStore};
use crate::validation::TaskDraft;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Priority,
    DueDate,
    Status,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(SortBy::Priority),
            "due" | "duedate" | "due-date" | "due_date" => Ok(SortBy::DueDate),
            "status" => Ok(SortBy::Status),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortBy::Priority => "priority",
            SortBy::DueDate => "due-date",
            SortBy::Status => "status",
        })
    }
}

/// Stable sort of a task list.
pub fn sort_tasks(mut tasks: Vec<Task>, sort_by: SortBy) -> Vec<Task> {
    match sort_by {
        SortBy::Priority => tasks.sort_by_key(|t| t.priority.rank()),
        SortBy::DueDate => tasks.sort_by_key(|t| t.due_date),
        SortBy::Status => tasks.sort_by_key(|t| t.status.rank()),
    }
    tasks
}

/// `None` on a field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub search: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl Filters {
    pub fn matches(&self, task: &Task) -> bool {
        let q = self.search.trim().to_lowercase();
        let matches_search = q.is_empty()
            || task.title.to_lowercase().contains(&q)
            || task.description.to_lowercase().contains(&q)
            || task.tags.iter().any(|tag| tag.to_lowercase().contains(&q));

        matches_search
            && self.status.is_none_or(|s| task.status == s)
            && self.priority.is_none_or(|p| task.priority == p)
            && self.category.as_ref().is_none_or(|c| &task.category == c)
    }
}

pub fn filter_tasks(tasks: &[Task], filters: &Filters) -> Vec<Task> {
    tasks.iter().filter(|t| filters.matches(t)).cloned().collect()
}

/// Distinct non-empty categories, in first-seen order.
pub fn categories(tasks: &[Task]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for task in tasks {
        if !task.category.is_empty() && !seen.contains(&task.category) {
            seen.push(task.category.clone());
        }
    }
    seen
}

/// Checkbox selection over the visible task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
    last_index: Option<usize>,
}

impl Selection {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.last_index
    }

    /// Handles a checkbox click at `index` of `visible`.
    ///
    /// With `shift` held and a previous click on record, every row between
    /// the two clicks (inclusive) is selected or deselected together. The
    /// anchor only moves on plain clicks.
    pub fn toggle(&mut self, visible: &[Task], index: usize, checked: bool, shift: bool) {
        let Some(task) = visible.get(index) else {
            return;
        };

        match self.last_index {
            Some(anchor) if shift => {
                let start = anchor.min(index);
                let end = anchor.max(index).min(visible.len() - 1);
                let range: Vec<&str> = visible[start..=end].iter().map(|t| t.id.as_str()).collect();
                if checked {
                    for id in range {
                        self.insert(id);
                    }
                } else {
                    self.ids.retain(|id| !range.contains(&id.as_str()));
                }
            }
            _ => {
                if checked {
                    self.insert(&task.id);
                } else {
                    self.ids.retain(|id| id != &task.id);
                }
                self.last_index = Some(index);
            }
        }
    }

    pub fn select_all(&mut self, visible: &[Task], checked: bool) {
        self.ids = if checked {
            visible.iter().map(|t| t.id.clone()).collect()
        } else {
            Vec::new()
        };
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn all_selected(&self, visible: &[Task]) -> bool {
        !visible.is_empty() && visible.iter().all(|t| self.contains(&t.id))
    }

    fn insert(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
        }
    }

    pub fn escape() -> Self {
        Self {
            key: Key::Escape,
            ctrl: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ShowShortcuts,
    AddTask,
    Undo,
    Redo,
    FocusSearch,
    SelectAll,
    CloseOverlays,
}

impl Shortcut {
    pub fn from_key(press: KeyPress) -> Option<Shortcut> {
        match press.key {
            Key::Escape => Some(Shortcut::CloseOverlays),
            Key::Char(c) if press.ctrl => match c.to_ascii_lowercase() {
                'k' => Some(Shortcut::ShowShortcuts),
                'o' => Some(Shortcut::AddTask),
                'z' => Some(Shortcut::Undo),
                'y' => Some(Shortcut::Redo),
                'f' => Some(Shortcut::FocusSearch),
                'a' => Some(Shortcut::SelectAll),
                _ => None,
            },
            Key::Char(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    /// `editing` holds the id of the task being edited; `None` adds a new one.
    Form { editing: Option<String> },
    Shortcuts,
}

pub struct Dashboard {
    store: TaskStore,
    filters: Filters,
    sort_by: SortBy,
    selection: Selection,
    overlay: Overlay,
    search_focused: bool,
}

impl Dashboard {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            filters: Filters::default(),
            sort_by: SortBy::default(),
            selection: Selection::default(),
            overlay: Overlay::None,
            search_focused: false,
        }
    }

    /// Seeds the store with server-provided tasks, falling back to the local
    /// cache when there are none.
    pub fn mount(&mut self, initial: Vec<Task>) {
        if initial.is_empty() {
            self.store.hydrate_from_cache();
        } else {
            self.store.set_tasks(initial);
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    fn history(&self) -> &SharedHistory {
        self.store.history()
    }

    pub fn can_undo(&self) -> bool {
        self.history().lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history().lock().can_redo()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn set_search(&mut self, search: &str) {
        self.filters.search = search.to_string();
    }

    pub fn set_status_filter(&mut self, status: Option<Status>) {
        self.filters.status = status;
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        self.filters.priority = priority;
    }

    pub fn set_category_filter(&mut self, category: Option<String>) {
        self.filters.category = category;
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    /// Filtered and sorted tasks, as rendered. Selection indices refer to this list.
    pub fn visible_tasks(&self) -> Vec<Task> {
        sort_tasks(filter_tasks(&self.store.tasks(), &self.filters), self.sort_by)
    }

    pub fn categories(&self) -> Vec<String> {
        categories(&self.store.tasks())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_selection(&mut self, index: usize, checked: bool, shift: bool) {
        let visible = self.visible_tasks();
        self.selection.toggle(&visible, index, checked, shift);
    }

    pub fn select_all(&mut self, checked: bool) {
        let visible = self.visible_tasks();
        self.selection.select_all(&visible, checked);
    }

    pub fn all_selected(&self) -> bool {
        self.selection.all_selected(&self.visible_tasks())
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn search_focused(&self) -> bool {
        self.search_focused
    }

    pub fn open_add_form(&mut self) {
        self.overlay = Overlay::Form { editing: None };
    }

    pub fn open_edit_form(&mut self, id: &str) -> Option<TaskDraft> {
        let task = self.store.find(id)?;
        self.overlay = Overlay::Form {
            editing: Some(task.id.clone()),
        };
        Some(TaskDraft::from_task(&task))
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    /// Validates a form submission and adds it as a new task.
    pub async fn add_task(&mut self, draft: TaskDraft) -> Result<Task, DashboardError> {
        let task = draft.into_new_task(Utc::now())?;
        self.store.add_task(task.clone()).await?;
        self.close_overlay();
        Ok(task)
    }

    /// Validates an edit of `id` and replaces the stored record.
    pub async fn edit_task(&mut self, id: &str, draft: TaskDraft) -> Result<Task, DashboardError> {
        let existing = self
            .store
            .find(id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        let task = draft.apply_to(&existing, Utc::now())?;
        self.store.update_task(task.clone()).await?;
        self.close_overlay();
        Ok(task)
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<(), DashboardError> {
        self.store.delete_task(id).await?;
        self.selection.ids.retain(|s| s != id);
        Ok(())
    }

    pub async fn toggle_complete(&mut self, id: &str) -> Result<(), DashboardError> {
        Ok(self.store.toggle_complete(id).await?)
    }

    /// Deletes every selected task, each as its own undoable action.
    ///
    /// Continues past individual failures and reports the first one.
    pub async fn bulk_delete(&mut self) -> Result<usize, DashboardError> {
        let ids = self.selection.ids.clone();
        let mut first_error = None;
        let mut deleted = 0;
        for id in &ids {
            match self.store.delete_task(id).await {
                Ok(()) => deleted += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        self.finish_bulk(first_error, deleted).await
    }

    /// Moves every selected task to `status`, skipping those already there.
    pub async fn bulk_set_status(&mut self, status: Status) -> Result<usize, DashboardError> {
        let ids = self.selection.ids.clone();
        let mut first_error = None;
        let mut changed = 0;
        for id in &ids {
            let Some(task) = self.store.find(id) else {
                continue;
            };
            if task.status == status {
                continue;
            }
            match self.store.update_task(task.with_status(status, Utc::now())).await {
                Ok(()) => changed += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        self.finish_bulk(first_error, changed).await
    }

    async fn finish_bulk(
        &mut self,
        first_error: Option<StoreError>,
        count: usize,
    ) -> Result<usize, DashboardError> {
        self.selection.clear();
        let refreshed = self.store.fetch_tasks().await;
        if let Some(e) = first_error {
            return Err(e.into());
        }
        refreshed?;
        Ok(count)
    }

    /// Pops the newest action and applies its inverse.
    ///
    /// The action is off the undo stack before it is applied; if applying
    /// fails it is not put back.
    pub async fn undo(&mut self) -> Result<UndoAction, DashboardError> {
        let action = self.history().lock().undo().ok_or(DashboardError::NothingToUndo)?;
        tracing::debug!(kind = action.kind(), id = %action.task().id, "undo");
        match &action {
            UndoAction::Create { task } => self.store.delete_untracked(&task.id).await?,
            UndoAction::Delete { task } => self.store.create_untracked(task.clone()).await?,
            UndoAction::Toggle { task, prev_status } => {
                self.store
                    .update_task(task.with_status(*prev_status, Utc::now()))
                    .await?
            }
        }
        Ok(action)
    }

    /// Pops the newest undone action and applies it again.
    pub async fn redo(&mut self) -> Result<UndoAction, DashboardError> {
        let action = self.history().lock().redo().ok_or(DashboardError::NothingToRedo)?;
        tracing::debug!(kind = action.kind(), id = %action.task().id, "redo");
        match &action {
            UndoAction::Create { task } => self.store.create_untracked(task.clone()).await?,
            UndoAction::Delete { task } => self.store.delete_untracked(&task.id).await?,
            UndoAction::Toggle { task, prev_status } => {
                // The original target, not a flip of whatever is current.
                self.store
                    .update_task(task.with_status(prev_status.toggled(), Utc::now()))
                    .await?
            }
        }
        Ok(action)
    }

    pub fn export(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, DashboardError> {
        Ok(self.store.export_to_dir(format, dir)?)
    }

    /// Dispatches a key press. Returns the shortcut it triggered, if any.
    pub async fn handle_key(&mut self, press: KeyPress) -> Result<Option<Shortcut>, DashboardError> {
        let Some(shortcut) = Shortcut::from_key(press) else {
            return Ok(None);
        };
        match shortcut {
            Shortcut::ShowShortcuts => self.overlay = Overlay::Shortcuts,
            Shortcut::AddTask => self.open_add_form(),
            Shortcut::Undo => {
                self.undo().await?;
            }
            Shortcut::Redo => {
                self.redo().await?;
            }
            Shortcut::FocusSearch => self.search_focused = true,
            Shortcut::SelectAll => self.select_all(true),
            Shortcut::CloseOverlays => self.close_overlay(),
        }
        Ok(Some(shortcut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, priority: Priority, status: Status, day: u32) -> Task {
        let t = Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap();
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: "something to do".to_string(),
            priority,
            status,
            category: if day % 2 == 0 { "home" } else { "work" }.to_string(),
            tags: vec![format!("tag-{id}")],
            due_date: t,
            created_at: t,
            updated_at: t,
            assigned_to: None,
            estimated_time: None,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", Priority::Low, Status::Done, 3),
            task("b", Priority::High, Status::Todo, 5),
            task("c", Priority::Medium, Status::InProgress, 1),
            task("d", Priority::High, Status::InProgress, 2),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn sorts_by_priority_stably() {
        let sorted = sort_tasks(sample(), SortBy::Priority);
        assert_eq!(ids(&sorted), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn sorts_by_due_date_and_status() {
        assert_eq!(ids(&sort_tasks(sample(), SortBy::DueDate)), vec!["c", "d", "a", "b"]);
        assert_eq!(ids(&sort_tasks(sample(), SortBy::Status)), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn search_covers_title_description_and_tags() {
        let tasks = sample();
        let mut filters = Filters {
            search: "  TAG-C ".to_string(),
            ..Filters::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &filters)), vec!["c"]);

        filters.search = "task b".to_string();
        assert_eq!(ids(&filter_tasks(&tasks, &filters)), vec!["b"]);

        filters.search = "something".to_string();
        assert_eq!(filter_tasks(&tasks, &filters).len(), 4);
    }

    #[test]
    fn filters_combine() {
        let tasks = sample();
        let filters = Filters {
            status: Some(Status::InProgress),
            priority: Some(Priority::High),
            category: Some("home".to_string()),
            ..Filters::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &filters)), vec!["d"]);
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() {
        assert_eq!(categories(&sample()), vec!["work", "home"]);
    }

    #[test]
    fn shift_click_selects_a_range() {
        let visible = sample();
        let mut selection = Selection::default();
        selection.toggle(&visible, 0, true, false);
        selection.toggle(&visible, 2, true, true);
        assert_eq!(selection.ids(), &["a", "b", "c"]);
        assert_eq!(selection.last_index(), Some(0));

        selection.toggle(&visible, 1, false, true);
        assert_eq!(selection.ids(), &["c"]);
    }

    #[test]
    fn range_works_backwards_and_without_duplicates() {
        let visible = sample();
        let mut selection = Selection::default();
        selection.toggle(&visible, 3, true, false);
        selection.toggle(&visible, 1, true, true);
        assert_eq!(selection.ids(), &["d", "b", "c"]);
    }

    #[test]
    fn shift_without_anchor_is_a_plain_click() {
        let visible = sample();
        let mut selection = Selection::default();
        selection.toggle(&visible, 2, true, true);
        assert_eq!(selection.ids(), &["c"]);
        assert_eq!(selection.last_index(), Some(2));
    }

    #[test]
    fn out_of_range_click_is_ignored() {
        let visible = sample();
        let mut selection = Selection::default();
        selection.toggle(&visible, 9, true, false);
        assert!(selection.is_empty());
        assert_eq!(selection.last_index(), None);
    }

    #[test]
    fn select_all_and_clear() {
        let visible = sample();
        let mut selection = Selection::default();
        assert!(!selection.all_selected(&visible));
        selection.select_all(&visible, true);
        assert!(selection.all_selected(&visible));
        assert_eq!(selection.len(), 4);
        selection.select_all(&visible, false);
        assert!(selection.is_empty());
        assert!(!selection.all_selected(&[]));
    }

    #[test]
    fn keyboard_shortcuts_map_case_insensitively() {
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('Z')), Some(Shortcut::Undo));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('y')), Some(Shortcut::Redo));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('k')), Some(Shortcut::ShowShortcuts));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('o')), Some(Shortcut::AddTask));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('f')), Some(Shortcut::FocusSearch));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('a')), Some(Shortcut::SelectAll));
        assert_eq!(Shortcut::from_key(KeyPress::escape()), Some(Shortcut::CloseOverlays));
        assert_eq!(Shortcut::from_key(KeyPress::ctrl('q')), None);
        assert_eq!(
            Shortcut::from_key(KeyPress {
                key: Key::Char('z'),
                ctrl: false
            }),
            None
        );
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("dueDate".parse::<SortBy>(), Ok(SortBy::DueDate));
        assert_eq!("STATUS".parse::<SortBy>(), Ok(SortBy::Status));
    }
}
