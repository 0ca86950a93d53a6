//! Client-side model of one story's discussion tree.
//!
//! A `ThreadView` owns the canonical in-memory tree for one open story,
//! pages children in scope by scope through the loader, applies optimistic
//! mutations through the reconciler, and exposes a read-only walk to
//! presentation collaborators. The view is single-task state: methods take
//! `&mut self` and every transport call happens between the split-phase
//! `begin_*`/`apply_*` pairs, so scopes stay independent without locks.

pub mod depth;
pub mod loader;
pub mod reconcile;
pub mod tree;
pub mod walk;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::comment::{CommentNode, ReactionKind, ReactionSummary};
use crate::models::page::{validate_page_size, ChildPage, ScopeId};

pub use loader::{FetchOutcome, FetchTicket, LoadPhase};
pub use reconcile::{DeleteTicket, LikeTicket, Reconciliation};
pub use tree::ThreadTree;
pub use walk::{Capabilities, ChildEntry, NodeContext, ThreadVisitor, VisitFlow};

use loader::ScopeArena;

/// Transport seam between the view and whatever serves the discussion —
/// the in-process `CommentService` here, an HTTP client elsewhere.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// One page of a scope's children. `cursor = None` means the first page.
    async fn fetch_children(
        &self,
        story_id: &str,
        scope: &ScopeId,
        viewer: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<ChildPage>;

    async fn create_reply(
        &self,
        story_id: &str,
        parent_id: Option<&str>,
        author: &str,
        content: &str,
    ) -> Result<CommentNode>;

    async fn toggle_reaction(
        &self,
        node_id: &str,
        viewer: &str,
        kind: Option<ReactionKind>,
    ) -> Result<ReactionSummary>;

    async fn delete_node(&self, node_id: &str, viewer: &str) -> Result<DateTime<Utc>>;
}

pub struct ThreadView {
    pub(crate) viewer: Option<String>,
    pub(crate) page_size: usize,
    pub(crate) tree: ThreadTree,
    pub(crate) arena: ScopeArena,
    pub(crate) pending_likes: HashMap<String, u64>,
    pub(crate) pending_deletes: HashMap<String, u64>,
    pub(crate) next_mutation_seq: u64,
}

impl ThreadView {
    /// Opens a view over one story. `viewer` is the identity the platform
    /// resolved for this session, or `None` for an anonymous reader.
    pub fn new(
        story_id: impl Into<String>,
        viewer: Option<String>,
        page_size: usize,
    ) -> Result<Self> {
        validate_page_size(page_size)?;
        Ok(Self {
            viewer,
            page_size,
            tree: ThreadTree::new(story_id),
            arena: ScopeArena::new(),
            pending_likes: HashMap::new(),
            pending_deletes: HashMap::new(),
            next_mutation_seq: 0,
        })
    }

    pub fn story_id(&self) -> &str {
        self.tree.story_id()
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}
