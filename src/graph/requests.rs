//! Connection request orchestration.
//!
//! A request attempt validates the pair, applies the new-user bootstrap
//! rule, guards against duplicate active edges, runs the degree check, and
//! only then inserts a Requested edge. The duplicate check and the insert
//! run inside one transaction so two racing requests between the same pair
//! cannot both pass the check; the active-pair unique index backstops the
//! invariant across connections.

use crate::error::{ProfNetError, Result};
use crate::graph::reachability::{Reachability, ReachabilityEngine};
use crate::graph::store::GraphStore;
use crate::types::EdgeStatus;

/// How many requests a user with no accepted connections may send in one
/// bootstrap session.
pub const BOOTSTRAP_QUOTA: u32 = 5;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of a request attempt by an established user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A Requested edge was inserted.
    Inserted,
    /// An active edge between the pair already exists; nothing changed.
    AlreadyPending,
    /// No path to the target within the degree bound; nothing changed.
    /// Callers present this as "no relation path within range", not a
    /// generic failure.
    OutOfRange,
    /// The source has no accepted connections yet; no edge was inserted.
    /// Open a [`BootstrapSession`] instead.
    BootstrapStarted,
}

/// Outcome of a single pick inside a bootstrap session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A Requested edge was inserted; `remaining` picks are left.
    Requested { remaining: u32 },
    /// An active edge to that target already exists; the pick did not
    /// consume quota.
    AlreadyPending,
    /// The session quota is spent.
    QuotaExhausted,
}

// ---------------------------------------------------------------------------
// RequestService
// ---------------------------------------------------------------------------

/// Orchestrates connection request attempts against a store.
pub struct RequestService<'a> {
    store: &'a GraphStore,
}

impl<'a> RequestService<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Attempt a connection request from `source` to `target`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when source == target; `NotFound` when either user
    /// is not registered.
    pub fn request_connection(&self, source: &str, target: &str) -> Result<RequestOutcome> {
        if source == target {
            return Err(ProfNetError::InvalidRequest(
                "cannot request a connection to yourself".into(),
            ));
        }
        if !self.store.user_exists(source)? {
            return Err(ProfNetError::NotFound(format!("user '{source}'")));
        }
        if !self.store.user_exists(target)? {
            return Err(ProfNetError::NotFound(format!("user '{target}'")));
        }

        if !self.store.has_accepted_connection(source)? {
            tracing::debug!(source, "no accepted connections yet, bootstrap applies");
            return Ok(RequestOutcome::BootstrapStarted);
        }

        // Duplicate check, degree check, and insert must all see the same
        // graph state.
        let tx = self.store.begin()?;

        if self.store.active_edge_between(source, target)?.is_some() {
            return Ok(RequestOutcome::AlreadyPending);
        }

        match ReachabilityEngine::new(self.store).find_degree(source, target)? {
            Reachability::Degree(degree) => {
                self.store
                    .insert_edge(source, target, EdgeStatus::Requested)?;
                tx.commit()?;
                tracing::info!(source, target, degree, "connection request inserted");
                Ok(RequestOutcome::Inserted)
            }
            Reachability::OutOfRange => {
                tracing::debug!(source, target, "target beyond degree bound");
                Ok(RequestOutcome::OutOfRange)
            }
        }
    }

    /// Open a bootstrap session for a user with no accepted connections.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unregistered user; `InvalidRequest` when the user
    /// already has an accepted connection (the bootstrap exemption is for
    /// new users only).
    pub fn bootstrap(&self, source: &str) -> Result<BootstrapSession<'a>> {
        if !self.store.user_exists(source)? {
            return Err(ProfNetError::NotFound(format!("user '{source}'")));
        }
        if self.store.has_accepted_connection(source)? {
            return Err(ProfNetError::InvalidRequest(format!(
                "user '{source}' already has accepted connections"
            )));
        }
        Ok(BootstrapSession {
            store: self.store,
            source: source.to_string(),
            remaining: BOOTSTRAP_QUOTA,
        })
    }
}

// ---------------------------------------------------------------------------
// BootstrapSession
// ---------------------------------------------------------------------------

/// A quota-limited run of connection picks for a brand-new user.
///
/// Each pick is validated only for target existence — no degree check —
/// and inserts a Requested edge. The session ends when the caller stops
/// asking or the quota of [`BOOTSTRAP_QUOTA`] inserts is spent.
#[derive(Debug)]
pub struct BootstrapSession<'a> {
    store: &'a GraphStore,
    source: String,
    remaining: u32,
}

impl BootstrapSession<'_> {
    /// Picks left before the quota is spent.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Request a connection to `target`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a self-pick; `NotFound` for an unregistered
    /// target.
    pub fn request(&mut self, target: &str) -> Result<BootstrapOutcome> {
        if self.remaining == 0 {
            return Ok(BootstrapOutcome::QuotaExhausted);
        }
        if target == self.source {
            return Err(ProfNetError::InvalidRequest(
                "cannot request a connection to yourself".into(),
            ));
        }
        if !self.store.user_exists(target)? {
            return Err(ProfNetError::NotFound(format!("user '{target}'")));
        }

        let tx = self.store.begin()?;
        if self
            .store
            .active_edge_between(&self.source, target)?
            .is_some()
        {
            return Ok(BootstrapOutcome::AlreadyPending);
        }
        self.store
            .insert_edge(&self.source, target, EdgeStatus::Requested)?;
        tx.commit()?;

        self.remaining -= 1;
        tracing::info!(
            source = %self.source,
            target,
            remaining = self.remaining,
            "bootstrap request inserted"
        );
        Ok(BootstrapOutcome::Requested {
            remaining: self.remaining,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
