//! Cursor-driven page loading with one load-state record per scope.
//!
//! Fetching is split-phase so any number of scopes can have requests in
//! flight at once while a single scope stays serialized: `begin_fetch` hands
//! out a ticket and marks the scope loading, the transport call happens
//! outside the view, and `apply_fetch`/`fail_fetch` settle the ticket.
//! Tickets from a detached view or a reset scope are recognized as stale and
//! discarded without touching the tree.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::page::{ChildPage, ScopeId};
use crate::thread::ThreadView;

/// Externally observable load state of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading { seq: u64 },
    Exhausted,
}

#[derive(Debug)]
struct ScopeState {
    phase: Phase,
    cursor: Option<String>,
}

impl ScopeState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cursor: None,
        }
    }
}

/// Arena of per-scope load-state records. Records are created on first
/// fetch and dropped when their scope collapses or the view detaches.
#[derive(Debug)]
pub(crate) struct ScopeArena {
    scopes: HashMap<ScopeId, ScopeState>,
    next_seq: u64,
    epoch: u64,
}

/// Handle for one issued page request. Settling it through the view is the
/// only way its response may reach the tree.
#[derive(Debug)]
pub struct FetchTicket {
    pub scope: ScopeId,
    pub seq: u64,
    pub cursor: Option<String>,
    pub(crate) epoch: u64,
}

/// What happened to a settled fetch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged; `added` nodes were new to the tree.
    Merged { added: usize },
    /// The ticket was stale (view detached or scope reset); nothing was written.
    Discarded,
}

impl ScopeArena {
    pub(crate) fn new() -> Self {
        Self {
            scopes: HashMap::new(),
            next_seq: 0,
            epoch: 0,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn begin(&mut self, scope: &ScopeId) -> Result<Option<FetchTicket>> {
        let epoch = self.epoch;
        let seq = self.next_seq + 1;
        let state = self
            .scopes
            .entry(scope.clone())
            .or_insert_with(ScopeState::new);
        match state.phase {
            Phase::Loading { .. } => Err(AppError::Conflict(format!(
                "A fetch is already in flight for scope {}",
                scope
            ))),
            Phase::Exhausted => Ok(None),
            Phase::Idle => {
                self.next_seq = seq;
                state.phase = Phase::Loading { seq };
                Ok(Some(FetchTicket {
                    scope: scope.clone(),
                    seq,
                    cursor: state.cursor.clone(),
                    epoch,
                }))
            }
        }
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        matches!(
            self.scopes.get(&ticket.scope).map(|s| &s.phase),
            Some(Phase::Loading { seq }) if *seq == ticket.seq
        )
    }

    /// Settles a successful fetch. Returns false for stale tickets.
    pub(crate) fn complete(&mut self, ticket: &FetchTicket, next_cursor: Option<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let Some(state) = self.scopes.get_mut(&ticket.scope) else {
            return false;
        };
        match next_cursor {
            Some(cursor) => {
                state.cursor = Some(cursor);
                state.phase = Phase::Idle;
            }
            None => state.phase = Phase::Exhausted,
        }
        true
    }

    /// Settles a failed fetch: the scope returns to idle with its cursor
    /// unchanged, so the caller may retry the same page.
    pub(crate) fn fail(&mut self, ticket: &FetchTicket) {
        if self.is_current(ticket) {
            if let Some(state) = self.scopes.get_mut(&ticket.scope) {
                state.phase = Phase::Idle;
            }
        }
    }

    pub(crate) fn reset(&mut self, scope: &ScopeId) {
        self.scopes.remove(scope);
    }

    /// Marks every outstanding ticket stale and drops all load state.
    pub(crate) fn invalidate(&mut self) {
        self.epoch += 1;
        self.scopes.clear();
    }

    pub(crate) fn phase(&self, scope: &ScopeId) -> LoadPhase {
        match self.scopes.get(scope).map(|s| &s.phase) {
            None | Some(Phase::Idle) => LoadPhase::Idle,
            Some(Phase::Loading { .. }) => LoadPhase::Loading,
            Some(Phase::Exhausted) => LoadPhase::Exhausted,
        }
    }
}

impl ThreadView {
    /// Issues a page request for a scope. Returns `None` when the scope is
    /// already exhausted; rejects a duplicate request while one is in flight.
    pub fn begin_fetch(&mut self, scope: &ScopeId) -> Result<Option<FetchTicket>> {
        if let ScopeId::Node(id) = scope {
            if self.tree.node(id).is_none() {
                return Err(AppError::not_found("Comment"));
            }
        }
        self.arena.begin(scope)
    }

    /// Merges a fetched page, unless the ticket went stale in the meantime.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, page: ChildPage) -> FetchOutcome {
        let next_cursor = page.next_cursor.clone();
        if !self.arena.complete(&ticket, next_cursor) {
            debug!("Discarding stale page response for scope {}", ticket.scope);
            return FetchOutcome::Discarded;
        }
        let added = self.tree.merge_page(&ticket.scope, ticket.seq, page);
        FetchOutcome::Merged { added }
    }

    /// Settles a failed fetch. The tree keeps its last-known-good state.
    pub fn fail_fetch(&mut self, ticket: FetchTicket) {
        self.arena.fail(&ticket);
    }

    /// Convenience driver: one full fetch cycle against a transport.
    /// Returns the number of newly loaded nodes (0 when exhausted).
    pub async fn fetch_more<S>(&mut self, api: &S, scope: &ScopeId) -> Result<usize>
    where
        S: crate::thread::CommentApi + ?Sized,
    {
        let Some(ticket) = self.begin_fetch(scope)? else {
            return Ok(0);
        };
        let story_id = self.tree.story_id().to_string();
        let viewer = self.viewer.clone();
        let result = api
            .fetch_children(
                &story_id,
                scope,
                viewer.as_deref(),
                ticket.cursor.as_deref(),
                self.page_size,
            )
            .await;
        match result {
            Ok(page) => match self.apply_fetch(ticket, page) {
                FetchOutcome::Merged { added } => Ok(added),
                FetchOutcome::Discarded => Ok(0),
            },
            Err(e) => {
                self.fail_fetch(ticket);
                Err(e)
            }
        }
    }

    /// Unloads a scope's loaded replies and resets its pagination, leaving
    /// the scope's own node in place. Distinct from fetching: collapsing and
    /// loading more are different operations with different cursor semantics.
    pub fn collapse_scope(&mut self, scope: &ScopeId) {
        let evicted = self.tree.evict_scope(scope);
        self.arena.reset(scope);
        for id in evicted {
            self.arena.reset(&ScopeId::Node(id.clone()));
            self.forget_pending(&id);
        }
    }

    /// Collapses a scope and reloads its first page. Used after a confirmed
    /// reply submission so server-assigned ordering is never guessed at.
    pub async fn refresh_scope<S>(&mut self, api: &S, scope: &ScopeId) -> Result<usize>
    where
        S: crate::thread::CommentApi + ?Sized,
    {
        self.collapse_scope(scope);
        self.fetch_more(api, scope).await
    }

    pub fn scope_phase(&self, scope: &ScopeId) -> LoadPhase {
        self.arena.phase(scope)
    }

    /// Tears the view down: every in-flight fetch and mutation becomes
    /// stale and will be discarded on arrival.
    pub fn detach(&mut self) {
        self.arena.invalidate();
        self.clear_pending();
    }
}
