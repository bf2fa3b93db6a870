//! Pages and serialized solve requests.
//!
//! A page owns one root table and its nested tree inside a [`TableArena`].
//! Solves on one page run one at a time behind an async mutex. A request
//! that is still waiting when a newer request for the same table arrives
//! is superseded; a running solve is never interrupted. Pages share only the
//! `Arc<Catalog>`, so independent pages solve concurrently.

use crate::catalog::Catalog;
use crate::id::{PageId, TableId};
use crate::selector::Preferences;
use crate::settings::SolverSettings;
use crate::solver::{SolveContext, SolveError, SolveSummary, apply_solution, compute_table};
use crate::table::TableArena;
use slotmap::SlotMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("page not found: {0:?}")]
    PageNotFound(PageId),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("solver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A top-level container owning one root table.
#[derive(Debug, Clone)]
pub struct Page {
    pub name: String,
    pub arena: TableArena,
    pub root: TableId,
}

impl Page {
    pub fn new(name: &str) -> Self {
        let mut arena = TableArena::new();
        let root = arena.add_root_table();
        Self {
            name: name.to_string(),
            arena,
            root,
        }
    }
}

/// How a solve request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Solved(SolveSummary),
    /// A newer request for the same table replaced this one before it ran.
    Superseded,
    /// The page was removed; nothing was written.
    Discarded,
}

/// Shared, read-only solve inputs.
#[derive(Debug)]
struct Shared {
    catalog: Arc<Catalog>,
    preferences: Preferences,
    settings: SolverSettings,
}

#[derive(Debug)]
struct PageCell {
    page: Arc<AsyncMutex<Page>>,
    /// Latest request ticket per table, while a request is outstanding.
    pending: Mutex<HashMap<TableId, u64>>,
    removed: AtomicBool,
}

impl PageCell {
    fn latest(&self, table: TableId) -> Option<u64> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&table)
            .copied()
    }

    /// Drop the table's entry if `ticket` is still the newest request.
    fn release(&self, table: TableId, ticket: u64) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.get(&table) == Some(&ticket) {
            pending.remove(&table);
        }
    }
}

/// Entry point for editing and solving pages.
#[derive(Debug)]
pub struct Planner {
    shared: Arc<Shared>,
    pages: Mutex<SlotMap<PageId, Arc<PageCell>>>,
    next_ticket: AtomicU64,
}

impl Planner {
    pub fn new(catalog: Arc<Catalog>, preferences: Preferences, settings: SolverSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                catalog,
                preferences,
                settings,
            }),
            pages: Mutex::new(SlotMap::with_key()),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.shared.catalog
    }

    pub fn add_page(&self, name: &str) -> PageId {
        let cell = Arc::new(PageCell {
            page: Arc::new(AsyncMutex::new(Page::new(name))),
            pending: Mutex::new(HashMap::new()),
            removed: AtomicBool::new(false),
        });
        let mut pages = self.pages.lock().unwrap_or_else(PoisonError::into_inner);
        let id = pages.insert(cell);
        tracing::debug!(?id, name, "page added");
        id
    }

    /// Remove a page. Solves in flight on it finish without writing.
    pub fn remove_page(&self, page: PageId) -> Result<(), PlannerError> {
        let cell = self
            .pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(page)
            .ok_or(PlannerError::PageNotFound(page))?;
        cell.removed.store(true, Ordering::SeqCst);
        tracing::debug!(?page, "page removed");
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cell(&self, page: PageId) -> Result<Arc<PageCell>, PlannerError> {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page)
            .cloned()
            .ok_or(PlannerError::PageNotFound(page))
    }

    /// Exclusive access to a page, waiting for any running solve.
    pub async fn lock(&self, page: PageId) -> Result<OwnedMutexGuard<Page>, PlannerError> {
        let cell = self.cell(page)?;
        Ok(cell.page.clone().lock_owned().await)
    }

    /// Run `f` with mutable access to a page.
    pub async fn edit<R>(
        &self,
        page: PageId,
        f: impl FnOnce(&mut Page) -> R,
    ) -> Result<R, PlannerError> {
        let mut guard = self.lock(page).await?;
        Ok(f(&mut guard))
    }

    /// Solve `table` of `page` and write the results back.
    pub async fn solve(&self, page: PageId, table: TableId) -> Result<SolveStatus, PlannerError> {
        let cell = self.cell(page)?;
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        cell.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table, ticket);

        let status = self.run(&cell, page, table, ticket).await;
        cell.release(table, ticket);
        status
    }

    async fn run(
        &self,
        cell: &PageCell,
        page: PageId,
        table: TableId,
        ticket: u64,
    ) -> Result<SolveStatus, PlannerError> {
        let mut guard = cell.page.clone().lock_owned().await;
        if cell.removed.load(Ordering::SeqCst) {
            return Ok(SolveStatus::Discarded);
        }
        if cell.latest(table) != Some(ticket) {
            tracing::debug!(?page, ?table, ticket, "solve superseded");
            return Ok(SolveStatus::Superseded);
        }

        let snapshot = guard.arena.clone();
        let shared = self.shared.clone();
        let solution = tokio::task::spawn_blocking(move || {
            let ctx = SolveContext {
                catalog: &shared.catalog,
                preferences: &shared.preferences,
                settings: &shared.settings,
            };
            compute_table(&snapshot, table, &ctx)
        })
        .await??;

        if cell.removed.load(Ordering::SeqCst) {
            tracing::debug!(?page, ?table, "page removed during solve, discarding");
            return Ok(SolveStatus::Discarded);
        }
        let summary = apply_solution(&mut guard.arena, solution);
        tracing::info!(
            ?page,
            ?table,
            tables = summary.tables_solved,
            infeasible = summary.infeasible_tables,
            "solve applied"
        );
        Ok(SolveStatus::Solved(summary))
    }

    /// Solve a page's root table.
    pub async fn solve_page(&self, page: PageId) -> Result<SolveStatus, PlannerError> {
        let root = self.lock(page).await?.root;
        self.solve(page, root).await
    }
}
