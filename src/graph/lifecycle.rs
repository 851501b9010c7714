//! Request resolution: `Requested → Accepted | Rejected`.
//!
//! Both transitions are terminal. Resolution decides from the current
//! store row, not the caller's snapshot, and always persists — including
//! the rejection path.

use crate::error::{ProfNetError, Result};
use crate::graph::store::GraphStore;
use crate::types::{ConnectionEdge, EdgeStatus};

// ---------------------------------------------------------------------------
// Decision / outcome
// ---------------------------------------------------------------------------

/// The target's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn status(&self) -> EdgeStatus {
        match self {
            Self::Accept => EdgeStatus::Accepted,
            Self::Reject => EdgeStatus::Rejected,
        }
    }
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The edge moved to its terminal status.
    Updated,
    /// The edge was already terminal; nothing changed. Not a silent
    /// success — callers can tell a repeat apart from a fresh resolution.
    AlreadyResolved,
}

// ---------------------------------------------------------------------------
// RequestLifecycle
// ---------------------------------------------------------------------------

/// Resolves pending connection requests and lists them for their target.
pub struct RequestLifecycle<'a> {
    store: &'a GraphStore,
}

impl<'a> RequestLifecycle<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Pending requests addressed to `user_id`, oldest first.
    pub fn pending_requests_for(&self, user_id: &str) -> Result<Vec<ConnectionEdge>> {
        self.store.pending_requests_for(user_id)
    }

    /// Apply `decision` to `edge` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// `Forbidden` when `actor` is not the edge's designated target;
    /// `NotFound` when the edge row no longer exists.
    pub fn resolve(
        &self,
        edge: &ConnectionEdge,
        actor: &str,
        decision: Decision,
    ) -> Result<ResolveOutcome> {
        if actor != edge.target_id {
            return Err(ProfNetError::Forbidden(format!(
                "only '{}' may resolve this request",
                edge.target_id
            )));
        }

        // Re-read: the caller's edge may be stale.
        let current = self
            .store
            .get_edge(edge.id)?
            .ok_or_else(|| ProfNetError::NotFound(format!("connection edge {}", edge.id)))?;
        if current.status != EdgeStatus::Requested {
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        let resolved_at = chrono::Utc::now().timestamp();
        if !self
            .store
            .resolve_edge(edge.id, decision.status(), resolved_at)?
        {
            // Lost a race between the read above and the update.
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        tracing::info!(
            edge_id = edge.id,
            requester = %current.requester_id,
            target = %current.target_id,
            decision = ?decision,
            "connection request resolved"
        );
        Ok(ResolveOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
