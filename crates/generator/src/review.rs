use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pim_core::{BatchId, DomainError, DomainResult, RowId};

use crate::combination::CombinationRow;

/// Which rows the review table shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    #[default]
    All,
    OnlySelected,
}

/// State of the "select all" header checkbox over the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderCheckState {
    Checked,
    Indeterminate,
    Unchecked,
}

/// One page of visible rows. `number` is zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub number: usize,
    pub page_count: usize,
    pub visible_total: usize,
    pub rows: Vec<&'a CombinationRow>,
}

/// A generated batch plus per-row inclusion state.
///
/// Selection is keyed by [`RowId`], never by position, so filtering cannot
/// shift it. Every row starts selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSet {
    batch_id: BatchId,
    rows: Vec<CombinationRow>,
    selected: HashSet<RowId>,
    filter: RowFilter,
}

impl ReviewSet {
    pub fn new(rows: Vec<CombinationRow>) -> Self {
        let selected = rows.iter().map(|r| r.id).collect();
        Self {
            batch_id: BatchId::new(),
            rows,
            selected,
            filter: RowFilter::All,
        }
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn rows(&self) -> &[CombinationRow] {
        &self.rows
    }

    pub fn filter(&self) -> RowFilter {
        self.filter
    }

    fn contains(&self, id: RowId) -> bool {
        self.rows.iter().any(|r| r.id == id)
    }

    /// Flip one row and return its new state.
    pub fn toggle(&mut self, id: RowId) -> DomainResult<bool> {
        if !self.contains(id) {
            return Err(DomainError::not_found());
        }
        if self.selected.remove(&id) {
            Ok(false)
        } else {
            self.selected.insert(id);
            Ok(true)
        }
    }

    pub fn set_selected(&mut self, id: RowId, selected: bool) -> DomainResult<()> {
        if !self.contains(id) {
            return Err(DomainError::not_found());
        }
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
        Ok(())
    }

    pub fn is_selected(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    fn is_visible(&self, row: &CombinationRow) -> bool {
        match self.filter {
            RowFilter::All => true,
            RowFilter::OnlySelected => self.selected.contains(&row.id),
        }
    }

    /// Select every visible row. Hidden rows keep their state.
    pub fn select_all_visible(&mut self) {
        let visible: Vec<RowId> = self.visible_rows().map(|r| r.id).collect();
        self.selected.extend(visible);
    }

    /// Deselect every visible row. Hidden rows keep their state.
    pub fn deselect_all_visible(&mut self) {
        let visible: Vec<RowId> = self.visible_rows().map(|r| r.id).collect();
        for id in visible {
            self.selected.remove(&id);
        }
    }

    pub fn set_filter(&mut self, filter: RowFilter) {
        self.filter = filter;
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &CombinationRow> {
        self.rows.iter().filter(|r| self.is_visible(r))
    }

    pub fn selected_rows(&self) -> impl Iterator<Item = &CombinationRow> {
        self.rows.iter().filter(|r| self.selected.contains(&r.id))
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header_state(&self) -> HeaderCheckState {
        let (visible, checked) = self.visible_rows().fold((0usize, 0usize), |(v, c), row| {
            (v + 1, c + usize::from(self.selected.contains(&row.id)))
        });
        if visible == 0 || checked == 0 {
            HeaderCheckState::Unchecked
        } else if checked == visible {
            HeaderCheckState::Checked
        } else {
            HeaderCheckState::Indeterminate
        }
    }

    /// Page `number` of the visible rows. Out-of-range pages are empty.
    pub fn visible_page(&self, number: usize, page_size: usize) -> Page<'_> {
        let page_size = page_size.max(1);
        let visible: Vec<&CombinationRow> = self.visible_rows().collect();
        let visible_total = visible.len();
        let rows = visible
            .into_iter()
            .skip(number.saturating_mul(page_size))
            .take(page_size)
            .collect();
        Page {
            number,
            page_count: visible_total.div_ceil(page_size),
            visible_total,
            rows,
        }
    }
}
