use crate::model::{Record, RecordId};
use std::collections::BTreeSet;

/// List state for one resource panel: filter, selection, cursor, accordion
/// expansion and the detail projection.
///
/// Records are held by value and never mutated; every derived view is
/// recomputed from `records` and `filter`.
#[derive(Debug, Clone)]
pub struct CollectionView<R> {
    records: Vec<R>,
    filter: String,
    selected: BTreeSet<RecordId>,
    cursor: usize,
    expanded: Option<RecordId>,
    detail: Option<RecordId>,
}

impl<R: Record> CollectionView<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            filter: String::new(),
            selected: BTreeSet::new(),
            cursor: 0,
            expanded: None,
            detail: None,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn visible(&self) -> Vec<&R> {
        self.records
            .iter()
            .filter(|record| record.matches_filter(&self.filter))
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<RecordId> {
        self.visible().into_iter().map(Record::id).collect()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
        self.clamp_cursor();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.clamp_cursor();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.clamp_cursor();
    }

    pub fn is_selected(&self, id: RecordId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.selected.iter().copied().collect()
    }

    /// Ids not backed by a record are ignored.
    pub fn toggle_selected(&mut self, id: RecordId) {
        if !self.records.iter().any(|record| record.id() == id) {
            return;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn select_all_visible(&mut self) {
        self.selected = self.visible_ids().into_iter().collect();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Header checkbox: selects exactly the visible rows, or clears the set
    /// when every visible row is already selected.
    pub fn toggle_select_all(&mut self) {
        let visible = self.visible_ids();
        let all_selected =
            !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id));
        if all_selected {
            self.select_none();
        } else {
            self.selected = visible.into_iter().collect();
        }
    }

    pub fn all_visible_selected(&self) -> bool {
        let visible = self.visible_ids();
        !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_record(&self) -> Option<&R> {
        self.visible().get(self.cursor).copied()
    }

    pub fn cursor_id(&self) -> Option<RecordId> {
        self.cursor_record().map(Record::id)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let visible_len = self.visible().len();
        if visible_len == 0 {
            self.cursor = 0;
            return;
        }

        let max_index = visible_len.saturating_sub(1) as isize;
        let current = self.cursor.min(max_index as usize) as isize;
        self.cursor = (current + delta).clamp(0, max_index) as usize;
    }

    pub fn cursor_first(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_last(&mut self) {
        self.cursor = self.visible().len().saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible().len().saturating_sub(1));
    }

    pub fn expanded(&self) -> Option<RecordId> {
        self.expanded
    }

    /// Accordion: at most one row is expanded at a time.
    pub fn toggle_expanded(&mut self, id: RecordId) {
        self.expanded = if self.expanded == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn open_detail(&mut self, id: RecordId) -> bool {
        if !self.records.iter().any(|record| record.id() == id) {
            return false;
        }
        self.detail = Some(id);
        true
    }

    pub fn close_detail(&mut self) -> bool {
        self.detail.take().is_some()
    }

    pub fn in_detail(&self) -> bool {
        self.detail.is_some()
    }

    pub fn detail_record(&self) -> Option<&R> {
        let id = self.detail?;
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn record(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }
}
