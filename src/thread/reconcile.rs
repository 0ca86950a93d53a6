//! Optimistic mutations with explicit apply/rollback reconciliation.
//!
//! Every mutation is a command: `begin_*` applies the local guess and returns
//! a ticket holding the prior state and a mutation sequence number,
//! `apply_*_outcome` settles it against the authoritative server result. A
//! response whose ticket was superseded (a newer mutation, a collapsed scope,
//! a detached view) is discarded instead of being applied out of order.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::comment::{CommentNode, ReactionKind, ReactionSummary};
use crate::models::page::ScopeId;
use crate::thread::{depth, CommentApi, ThreadView};

/// Command handle for an optimistic like toggle.
#[derive(Debug)]
pub struct LikeTicket {
    pub node_id: String,
    seq: u64,
    epoch: u64,
    prior: ReactionSummary,
}

/// Command handle for an optimistic soft delete.
#[derive(Debug)]
pub struct DeleteTicket {
    pub node_id: String,
    seq: u64,
    epoch: u64,
    prior_content: String,
    prior_updated_at: DateTime<Utc>,
}

/// How a settled mutation response was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The server result overwrote the optimistic guess (even when equal).
    Confirmed,
    /// The ticket was superseded or the view detached; response ignored.
    Discarded,
    /// A mutation for this node was already pending; the request coalesced.
    Coalesced,
}

impl ThreadView {
    /// Flips the viewer's like state locally and hands back the rollback
    /// ticket. A second toggle while one is pending coalesces to `None`.
    pub fn begin_like_toggle(&mut self, node_id: &str) -> Result<Option<LikeTicket>> {
        if self.viewer.is_none() {
            return Err(AppError::unauthorized("Sign in to react to comments"));
        }
        let epoch = self.arena.epoch();
        let node = self
            .tree
            .node(node_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if node.is_tombstone() {
            return Err(AppError::not_found("Comment"));
        }
        if self.pending_likes.contains_key(node_id) {
            return Ok(None);
        }
        let prior = ReactionSummary {
            like_count: node.like_count,
            liked_by_viewer: node.liked_by_viewer,
        };
        let seq = self.next_mutation_seq();
        let node = self
            .tree
            .node_mut(node_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        node.liked_by_viewer = !node.liked_by_viewer;
        node.like_count += if node.liked_by_viewer { 1 } else { -1 };
        self.pending_likes.insert(node_id.to_string(), seq);
        Ok(Some(LikeTicket {
            node_id: node_id.to_string(),
            seq,
            epoch,
            prior,
        }))
    }

    /// Settles a like toggle. The server summary is authoritative and
    /// overwrites the local guess; failure rolls back and surfaces the error.
    pub fn apply_like_outcome(
        &mut self,
        ticket: LikeTicket,
        outcome: Result<ReactionSummary>,
    ) -> Result<Reconciliation> {
        if ticket.epoch != self.arena.epoch()
            || self.pending_likes.get(&ticket.node_id) != Some(&ticket.seq)
        {
            return Ok(Reconciliation::Discarded);
        }
        self.pending_likes.remove(&ticket.node_id);
        let Some(node) = self.tree.node_mut(&ticket.node_id) else {
            return Ok(Reconciliation::Discarded);
        };
        match outcome {
            Ok(summary) => {
                node.like_count = summary.like_count;
                node.liked_by_viewer = summary.liked_by_viewer;
                Ok(Reconciliation::Confirmed)
            }
            Err(e) => {
                node.like_count = ticket.prior.like_count;
                node.liked_by_viewer = ticket.prior.liked_by_viewer;
                Err(e)
            }
        }
    }

    /// Convenience driver for a full like-toggle round trip.
    pub async fn toggle_like<S>(
        &mut self,
        api: &S,
        node_id: &str,
        kind: Option<ReactionKind>,
    ) -> Result<Reconciliation>
    where
        S: CommentApi + ?Sized,
    {
        let viewer = self
            .viewer
            .clone()
            .ok_or_else(|| AppError::unauthorized("Sign in to react to comments"))?;
        let Some(ticket) = self.begin_like_toggle(node_id)? else {
            return Ok(Reconciliation::Coalesced);
        };
        let outcome = api.toggle_reaction(node_id, &viewer, kind).await;
        self.apply_like_outcome(ticket, outcome)
    }

    /// Tombstones a node locally: content cleared, `updated_at` stamped.
    /// Loaded descendants stay visible under the tombstone.
    pub fn begin_delete(&mut self, node_id: &str) -> Result<Option<DeleteTicket>> {
        let viewer = self
            .viewer
            .clone()
            .ok_or_else(|| AppError::unauthorized("Sign in to delete comments"))?;
        let epoch = self.arena.epoch();
        let node = self
            .tree
            .node(node_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if node.is_tombstone() {
            return Err(AppError::not_found("Comment"));
        }
        if node.author_id != viewer {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }
        if self.pending_deletes.contains_key(node_id) {
            return Ok(None);
        }
        let prior_content = node.content.clone();
        let prior_updated_at = node.updated_at;
        let seq = self.next_mutation_seq();
        let node = self
            .tree
            .node_mut(node_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        node.content = String::new();
        node.updated_at = Utc::now();
        self.pending_deletes.insert(node_id.to_string(), seq);
        Ok(Some(DeleteTicket {
            node_id: node_id.to_string(),
            seq,
            epoch,
            prior_content,
            prior_updated_at,
        }))
    }

    /// Settles a delete: confirmation adopts the server timestamp, failure
    /// restores the node.
    pub fn apply_delete_outcome(
        &mut self,
        ticket: DeleteTicket,
        outcome: Result<DateTime<Utc>>,
    ) -> Result<Reconciliation> {
        if ticket.epoch != self.arena.epoch()
            || self.pending_deletes.get(&ticket.node_id) != Some(&ticket.seq)
        {
            return Ok(Reconciliation::Discarded);
        }
        self.pending_deletes.remove(&ticket.node_id);
        let Some(node) = self.tree.node_mut(&ticket.node_id) else {
            return Ok(Reconciliation::Discarded);
        };
        match outcome {
            Ok(updated_at) => {
                node.updated_at = updated_at;
                Ok(Reconciliation::Confirmed)
            }
            Err(e) => {
                node.content = ticket.prior_content;
                node.updated_at = ticket.prior_updated_at;
                Err(e)
            }
        }
    }

    /// Convenience driver for a full delete round trip.
    pub async fn delete_node<S>(&mut self, api: &S, node_id: &str) -> Result<Reconciliation>
    where
        S: CommentApi + ?Sized,
    {
        let viewer = self
            .viewer
            .clone()
            .ok_or_else(|| AppError::unauthorized("Sign in to delete comments"))?;
        let Some(ticket) = self.begin_delete(node_id)? else {
            return Ok(Reconciliation::Coalesced);
        };
        let outcome = api.delete_node(node_id, &viewer).await;
        self.apply_delete_outcome(ticket, outcome)
    }

    /// Submits a reply. Depth is validated before any dispatch; there is no
    /// optimistic insert — the server assigns id and ordering, so the scope
    /// is reloaded once the submission is confirmed.
    pub async fn submit_reply<S>(
        &mut self,
        api: &S,
        scope: &ScopeId,
        content: &str,
    ) -> Result<CommentNode>
    where
        S: CommentApi + ?Sized,
    {
        let viewer = self
            .viewer
            .clone()
            .ok_or_else(|| AppError::unauthorized("Sign in to reply"))?;
        let parent_id = match scope {
            ScopeId::Root => None,
            ScopeId::Node(id) => {
                let parent = self
                    .tree
                    .node(id)
                    .ok_or_else(|| AppError::not_found("Comment"))?;
                if parent.is_tombstone() {
                    return Err(AppError::not_found("Comment"));
                }
                if !depth::can_attach(parent.depth) {
                    return Err(AppError::DepthExceeded {
                        max_depth: depth::MAX_DEPTH,
                    });
                }
                Some(id.clone())
            }
        };
        let story_id = self.tree.story_id().to_string();
        let created = api
            .create_reply(&story_id, parent_id.as_deref(), &viewer, content)
            .await?;
        self.refresh_scope(api, scope).await?;
        Ok(created)
    }

    pub(crate) fn next_mutation_seq(&mut self) -> u64 {
        self.next_mutation_seq += 1;
        self.next_mutation_seq
    }

    pub(crate) fn forget_pending(&mut self, node_id: &str) {
        self.pending_likes.remove(node_id);
        self.pending_deletes.remove(node_id);
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending_likes.clear();
        self.pending_deletes.clear();
    }
}
