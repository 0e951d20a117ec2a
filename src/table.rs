//! Generic record table shared by the management screens: a source
//! collection, a derived filtered view, a selection set, and bulk
//! mutation/removal. Filtering never mutates the source; the visible
//! subset is recomputed from scratch on every call.

use std::collections::HashSet;

pub trait Record {
    fn id(&self) -> i64;
}

/// One screen's filter criteria. Active criteria compose with logical
/// AND; a criterion left at its "all" sentinel matches every record.
pub trait Criteria<R: Record> {
    fn matches(&self, record: &R) -> bool;
}

#[derive(Clone, Debug, Default)]
pub struct RecordTable<R: Record> {
    records: Vec<R>,
    selection: HashSet<i64>,
    detail: Option<i64>,
}

impl<R: Record> RecordTable<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            selection: HashSet::new(),
            detail: None,
        }
    }

    /// Replaces the source collection, dropping selection and detail
    /// state from any previous load.
    pub fn load(&mut self, records: Vec<R>) {
        self.records = records;
        self.selection.clear();
        self.detail = None;
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn visible<'a, C: Criteria<R>>(&'a self, criteria: &C) -> Vec<&'a R> {
        self.records
            .iter()
            .filter(|record| criteria.matches(record))
            .collect()
    }

    pub fn visible_ids<C: Criteria<R>>(&self, criteria: &C) -> Vec<i64> {
        self.records
            .iter()
            .filter(|record| criteria.matches(record))
            .map(|record| record.id())
            .collect()
    }

    pub fn toggle_selection(&mut self, id: i64) {
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
    }

    /// Select-all over the current filtered view. When the selection
    /// already covers as many records as the view shows, this clears
    /// instead.
    pub fn select_all_visible<C: Criteria<R>>(&mut self, criteria: &C) {
        let visible = self.visible_ids(criteria);
        if self.selection.len() == visible.len() {
            self.selection.clear();
        } else {
            self.selection = visible.into_iter().collect();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &HashSet<i64> {
        &self.selection
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.selection.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selection.contains(&id)
    }

    pub fn open_detail(&mut self, id: i64) -> bool {
        if self.get(id).is_some() {
            self.detail = Some(id);
            true
        } else {
            false
        }
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail(&self) -> Option<&R> {
        self.detail.and_then(|id| self.get(id))
    }

    /// Applies a mutation to every record in the target set. Re-applying
    /// the same status mutation is a no-op by construction.
    pub fn update<F: FnMut(&mut R)>(&mut self, targets: &HashSet<i64>, mut mutate: F) {
        for record in &mut self.records {
            if targets.contains(&record.id()) {
                mutate(record);
            }
        }
    }

    pub fn update_one<F: FnMut(&mut R)>(&mut self, id: i64, mutate: F) -> bool {
        let targets: HashSet<i64> = [id].into_iter().collect();
        let found = self.get(id).is_some();
        if found {
            self.update(&targets, mutate);
        }
        found
    }

    /// Removes the target records entirely, purging them from the
    /// selection set and closing the detail view if it pointed at one
    /// of them. Returns how many records were removed.
    pub fn remove(&mut self, targets: &HashSet<i64>) -> usize {
        let before = self.records.len();
        self.records.retain(|record| !targets.contains(&record.id()));
        self.selection.retain(|id| !targets.contains(id));
        if let Some(open) = self.detail {
            if targets.contains(&open) {
                self.detail = None;
            }
        }
        before - self.records.len()
    }

    pub fn remove_one(&mut self, id: i64) -> usize {
        let targets: HashSet<i64> = [id].into_iter().collect();
        self.remove(&targets)
    }
}

/// Case-insensitive substring match over a fixed set of text fields.
pub fn text_matches(needle: &str, fields: &[&str]) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}
