//! Catalog session
//!
//! Owns one loaded snapshot and everything derived from it. Every change to
//! the filters or the sort key re-runs the pipeline:
//!
//! 1. cascade the curricular dropdowns, resetting stale selections
//! 2. filter the snapshot
//! 3. sort the matches
//! 4. reset the visible window to the first page
//!
//! Loads are two-phase so the fetch itself can run without holding the
//! session: [`Catalog::begin_load`] hands out a [`LoadTicket`], and
//! [`Catalog::finish_load`] applies a result only if no newer load has been
//! started since. A failed load leaves the previous snapshot in place.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compare::CompareList;
use crate::curriculum::Normalizer;
use crate::favorites::{Favorites, KeyValueStore};
use crate::filter::{FilterContext, FilterState, Predicate, QualityScale};
use crate::index::{build_index_with, CurricularIndex, DropdownOptions};
use crate::pagination::{calculate_pagination, visible_window, Pagination, DEFAULT_PAGE_SIZE};
use crate::record::Dynamic;
use crate::sort::{sort_by_record, SortKey};
use crate::source::DataSource;
use crate::Result;

/// Proof that a load was started, ordered by start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { records: usize },
    /// A newer load was started; the result was discarded
    Superseded,
}

/// Result counts for status display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Records in the snapshot
    pub total: usize,
    /// Records passing the filters
    pub matching: usize,
    /// Records in the visible window
    pub shown: usize,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView<'a> {
    pub records: Vec<&'a Dynamic>,
    pub options: &'a DropdownOptions,
    /// Filters after stale selections were reset
    pub filters: &'a FilterState,
    pub sort: SortKey,
    pub counts: Counts,
    pub active_filters: usize,
    pub has_more: bool,
    pub pagination: Pagination,
}

pub struct Catalog {
    records: Vec<Dynamic>,
    index: CurricularIndex,
    normalizer: Normalizer,
    filters: FilterState,
    sort: SortKey,
    options: DropdownOptions,
    /// Positions in `records` of the sorted matches
    matches: Vec<usize>,
    pages_loaded: usize,
    page_size: usize,
    quality_scale: QualityScale,
    favorites: Favorites,
    compare: CompareList,
    latest_ticket: u64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, QualityScale::default(), Favorites::default())
    }
}

impl Catalog {
    pub fn new(page_size: usize, quality_scale: QualityScale, favorites: Favorites) -> Self {
        Self {
            records: Vec::new(),
            index: CurricularIndex::default(),
            normalizer: Normalizer::default(),
            filters: FilterState::default(),
            sort: SortKey::default(),
            options: DropdownOptions::default(),
            matches: Vec::new(),
            pages_loaded: 1,
            page_size: page_size.max(1),
            quality_scale,
            favorites,
            compare: CompareList::default(),
            latest_ticket: 0,
        }
    }

    /// Session already holding a snapshot
    pub fn with_records(records: Vec<Dynamic>, page_size: usize, quality_scale: QualityScale) -> Self {
        let mut catalog = Self::new(page_size, quality_scale, Favorites::default());
        catalog.replace_records(records);
        catalog
    }

    /// Start a load; any ticket issued earlier becomes stale
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        debug!(generation = self.latest_ticket, "Load started");
        LoadTicket {
            generation: self.latest_ticket,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.latest_ticket
    }

    /// Apply the result of a load started with `ticket`
    ///
    /// Results of superseded loads are dropped, errors included. The error of
    /// a current load is returned and the snapshot is kept.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<Dynamic>>) -> Result<LoadOutcome> {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                latest = self.latest_ticket,
                "Discarding superseded load"
            );
            return Ok(LoadOutcome::Superseded);
        }
        match result {
            Ok(records) => {
                let count = records.len();
                self.replace_records(records);
                info!(generation = ticket.generation, records = count, "Catalog loaded");
                Ok(LoadOutcome::Applied { records: count })
            }
            Err(e) => {
                warn!(generation = ticket.generation, error = %e, "Catalog load failed, keeping previous data");
                Err(e)
            }
        }
    }

    /// Load from a source in one step
    ///
    /// The snapshot is always fetched unfiltered; the session's filters are
    /// applied locally so loosening them later finds every record.
    pub async fn load_from(&mut self, source: &dyn DataSource) -> Result<LoadOutcome> {
        let ticket = self.begin_load();
        let result = source.load(&FilterState::default()).await;
        self.finish_load(ticket, result)
    }

    fn replace_records(&mut self, records: Vec<Dynamic>) {
        self.records = records;
        self.index = build_index_with(&self.records, &self.normalizer);
        self.refresh();
    }

    /// Re-run cascade, filter and sort; back to the first page
    fn refresh(&mut self) {
        self.options = self.index.cascade(&mut self.filters);

        let ctx = FilterContext {
            favorites: &self.favorites,
            quality_scale: self.quality_scale,
            normalizer: self.normalizer,
        };
        let predicate = Predicate::new(&self.filters, ctx);
        let mut matches: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, d)| predicate.matches(d))
            .map(|(i, _)| i)
            .collect();
        sort_by_record(&mut matches, self.sort, |i| &self.records[*i]);

        debug!(
            matching = matches.len(),
            total = self.records.len(),
            sort = %self.sort,
            "Catalog filtered"
        );
        self.matches = matches;
        self.pages_loaded = 1;
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.refresh();
    }

    /// Change some filter dimensions in place
    pub fn update_filters(&mut self, change: impl FnOnce(&mut FilterState)) {
        change(&mut self.filters);
        self.refresh();
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.update_filters(|f| f.search = query);
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterState::default());
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.refresh();
    }

    /// Extend the visible window by one page; false when nothing was left
    pub fn load_more(&mut self) -> bool {
        if self.shown() >= self.matches.len() {
            return false;
        }
        self.pages_loaded += 1;
        true
    }

    /// Show the first `pages` pages, clamped to what exists
    pub fn show_pages(&mut self, pages: usize) {
        let available = calculate_pagination(self.matches.len(), pages, self.page_size);
        self.pages_loaded = available.page;
    }

    /// Flip a favorite, persist the list, and refresh when it affects the results
    pub fn toggle_favorite(&mut self, id: i64, store: &dyn KeyValueStore) -> Result<bool> {
        let favorite = self.favorites.toggle(id);
        if let Err(e) = self.favorites.save(store) {
            self.favorites.toggle(id);
            return Err(e);
        }
        if self.filters.favorites_only {
            self.refresh();
        }
        Ok(favorite)
    }

    fn window(&self) -> &[usize] {
        visible_window(&self.matches, self.pages_loaded, self.page_size)
    }

    fn shown(&self) -> usize {
        self.window().len()
    }

    pub fn view(&self) -> CatalogView<'_> {
        let shown = self.shown();
        CatalogView {
            records: self.window().iter().map(|i| &self.records[*i]).collect(),
            options: &self.options,
            filters: &self.filters,
            sort: self.sort,
            counts: Counts {
                total: self.records.len(),
                matching: self.matches.len(),
                shown,
            },
            active_filters: self.filters.active_count(),
            has_more: shown < self.matches.len(),
            pagination: calculate_pagination(self.matches.len(), self.pages_loaded, self.page_size),
        }
    }

    /// Sorted matches, without the window
    pub fn matching(&self) -> impl Iterator<Item = &Dynamic> {
        self.matches.iter().map(|i| &self.records[*i])
    }

    pub fn get(&self, id: i64) -> Option<&Dynamic> {
        self.records.iter().find(|d| d.id == id)
    }

    pub fn records(&self) -> &[Dynamic] {
        &self.records
    }

    pub fn index(&self) -> &CurricularIndex {
        &self.index
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn quality_scale(&self) -> QualityScale {
        self.quality_scale
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn compare(&self) -> &CompareList {
        &self.compare
    }

    pub fn compare_mut(&mut self) -> &mut CompareList {
        &mut self.compare
    }
}
