//! SQLite CRUD layer for the ProfNet directory.
//!
//! Every query is parameterized and goes through
//! [`rusqlite::Connection::prepare_cached`], so the first call compiles the
//! statement and subsequent calls reuse it from the connection's cache.
//! Edge and message rows are status-mutated, never deleted.

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::db::converters::{row_to_edge, row_to_message, row_to_user};
use crate::db::schema::initialize_database;
use crate::error::Result;
use crate::types::{ConnectionEdge, DeleteStatus, EdgeStatus, Message, NewUser, User};

// ---------------------------------------------------------------------------
// StoreStats
// ---------------------------------------------------------------------------

/// Aggregate row counts for the stored directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub users: usize,
    pub edges: usize,
    pub messages: usize,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Typed CRUD wrapper around the ProfNet SQLite database.
///
/// All operations run on one connection and are therefore serialized; the
/// eligibility checks in [`crate::graph::requests`] additionally wrap their
/// check-then-insert sequence in a transaction from [`GraphStore::begin`].
pub struct GraphStore {
    pub conn: Connection,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SQL constants
// ---------------------------------------------------------------------------

const INSERT_USER_SQL: &str = "\
INSERT INTO users (user_id, password, name, email, date_of_birth)
VALUES (?1, ?2, ?3, ?4, ?5)";

const INSERT_EDGE_SQL: &str = "\
INSERT INTO connections (requester_id, target_id, status)
VALUES (?1, ?2, ?3)";

const RESOLVE_EDGE_SQL: &str = "\
UPDATE connections SET status = ?2, resolved_at = ?3
WHERE id = ?1 AND status = 'requested'";

const ACCEPTED_PEERS_SQL: &str = "\
SELECT target_id AS peer FROM connections
WHERE requester_id = ?1 AND status = 'accepted'
UNION
SELECT requester_id FROM connections
WHERE target_id = ?1 AND status = 'accepted'";

const ACTIVE_EDGE_BETWEEN_SQL: &str = "\
SELECT * FROM connections
WHERE ((requester_id = ?1 AND target_id = ?2)
    OR (requester_id = ?2 AND target_id = ?1))
  AND status IN ('requested', 'accepted')
LIMIT 1";

const PENDING_REQUESTS_SQL: &str = "\
SELECT * FROM connections
WHERE target_id = ?1 AND status = 'requested'
ORDER BY created_at ASC, id ASC";

const INSERT_MESSAGE_SQL: &str = "\
INSERT INTO messages (sender_id, receiver_id, contents, send_time)
VALUES (?1, ?2, ?3, ?4)";

// ---------------------------------------------------------------------------
// Implementation
// ---------------------------------------------------------------------------

impl GraphStore {
    /// Open (or create) the database at `db_path`, apply the schema, and
    /// return a ready-to-use store.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = initialize_database(db_path)?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection. Useful in tests where the caller
    /// has already called `initialize_database(":memory:")`.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Start a transaction for a check-then-mutate sequence. Statements on
    /// this connection participate until commit; dropping the handle rolls
    /// back.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // -------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------

    pub fn insert_user(&self, user: &NewUser) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(INSERT_USER_SQL)?;
        stmt.execute(params![
            user.user_id,
            user.password,
            user.name,
            user.email,
            user.date_of_birth,
        ])?;
        Ok(())
    }

    pub fn user_exists(&self, user_id: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM users WHERE user_id = ?1")?;
        let count: i64 = stmt.query_row(params![user_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM users WHERE user_id = ?1")?;
        Ok(stmt.query_row(params![user_id], row_to_user).optional()?)
    }

    /// Exact-name lookup, ordered by user id for stable output.
    pub fn users_by_name(&self, name: &str) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM users WHERE name = ?1 ORDER BY user_id ASC")?;
        let rows = stmt.query_map(params![name], row_to_user)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn verify_credentials(&self, user_id: &str, password: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM users WHERE user_id = ?1 AND password = ?2")?;
        let count: i64 = stmt.query_row(params![user_id, password], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Returns false when no such user exists.
    pub fn update_password(&self, user_id: &str, new_password: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE users SET password = ?2 WHERE user_id = ?1")?;
        let changed = stmt.execute(params![user_id, new_password])?;
        Ok(changed > 0)
    }

    // -------------------------------------------------------------------
    // Connection edges
    // -------------------------------------------------------------------

    /// Insert a directed edge and return its row id. `created_at` is
    /// stamped by the schema default.
    pub fn insert_edge(&self, requester: &str, target: &str, status: EdgeStatus) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(INSERT_EDGE_SQL)?;
        stmt.execute(params![requester, target, status.as_str()])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_edge(&self, edge_id: i64) -> Result<Option<ConnectionEdge>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM connections WHERE id = ?1")?;
        Ok(stmt.query_row(params![edge_id], row_to_edge).optional()?)
    }

    /// Move a still-pending edge to a terminal status. Returns false when
    /// the edge is missing or no longer pending — the row is only touched
    /// while its status is `requested`.
    pub fn resolve_edge(&self, edge_id: i64, status: EdgeStatus, resolved_at: i64) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(RESOLVE_EDGE_SQL)?;
        let changed = stmt.execute(params![edge_id, status.as_str(), resolved_at])?;
        Ok(changed > 0)
    }

    /// Edges where `user_id` is the requester, any status.
    pub fn edges_from(&self, user_id: &str) -> Result<Vec<ConnectionEdge>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM connections WHERE requester_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Edges where `user_id` is the target, any status.
    pub fn edges_to(&self, user_id: &str) -> Result<Vec<ConnectionEdge>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM connections WHERE target_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Users connected to `user_id` by an accepted edge, in either
    /// direction. This is the neighbor set of the reachability search.
    pub fn accepted_peers(&self, user_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(ACCEPTED_PEERS_SQL)?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn has_accepted_connection(&self, user_id: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT COUNT(*) FROM connections \
             WHERE (requester_id = ?1 OR target_id = ?1) AND status = 'accepted'",
        )?;
        let count: i64 = stmt.query_row(params![user_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// The active (requested or accepted) edge between two users, in
    /// either direction. The partial unique index guarantees at most one.
    pub fn active_edge_between(&self, a: &str, b: &str) -> Result<Option<ConnectionEdge>> {
        let mut stmt = self.conn.prepare_cached(ACTIVE_EDGE_BETWEEN_SQL)?;
        Ok(stmt.query_row(params![a, b], row_to_edge).optional()?)
    }

    /// Pending requests addressed to `user_id`, oldest first. Row id breaks
    /// ties between same-second requests so callers can page
    /// deterministically.
    pub fn pending_requests_for(&self, user_id: &str) -> Result<Vec<ConnectionEdge>> {
        let mut stmt = self.conn.prepare_cached(PENDING_REQUESTS_SQL)?;
        let rows = stmt.query_map(params![user_id], row_to_edge)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    // -------------------------------------------------------------------
    // Messages
    // -------------------------------------------------------------------

    /// Insert a message (visible to both, delivery label `sent`) and
    /// return the stored row.
    pub fn insert_message(
        &self,
        sender: &str,
        receiver: &str,
        contents: &str,
        send_time: i64,
    ) -> Result<Message> {
        let mut stmt = self.conn.prepare_cached(INSERT_MESSAGE_SQL)?;
        stmt.execute(params![sender, receiver, contents, send_time])?;
        let msg_id = self.conn.last_insert_rowid();
        self.get_message(msg_id)?.ok_or_else(|| {
            crate::error::ProfNetError::NotFound(format!("message {msg_id} vanished after insert"))
        })
    }

    pub fn get_message(&self, msg_id: i64) -> Result<Option<Message>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT * FROM messages WHERE msg_id = ?1")?;
        Ok(stmt.query_row(params![msg_id], row_to_message).optional()?)
    }

    /// All messages sent by `user_id`, regardless of delete status, oldest
    /// first. Visibility filtering lives in [`crate::messaging`].
    pub fn messages_by_sender(&self, user_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM messages WHERE sender_id = ?1 ORDER BY send_time ASC, msg_id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_message)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// All messages received by `user_id`, regardless of delete status,
    /// oldest first.
    pub fn messages_by_receiver(&self, user_id: &str) -> Result<Vec<Message>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT * FROM messages WHERE receiver_id = ?1 ORDER BY send_time ASC, msg_id ASC",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_message)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_message_delete_status(&self, msg_id: i64, status: DeleteStatus) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE messages SET delete_status = ?2 WHERE msg_id = ?1")?;
        let changed = stmt.execute(params![msg_id, status.as_i64()])?;
        Ok(changed > 0)
    }

    // -------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            let mut stmt = self.conn.prepare_cached(sql)?;
            let n: i64 = stmt.query_row([], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            users: count("SELECT COUNT(*) FROM users")?,
            edges: count("SELECT COUNT(*) FROM connections")?,
            messages: count("SELECT COUNT(*) FROM messages")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Spin up an in-memory store with the schema applied.
    fn setup() -> GraphStore {
        let conn = initialize_database(":memory:").expect("schema init should succeed on :memory:");
        GraphStore::from_connection(conn)
    }

    fn make_user(user_id: &str) -> NewUser {
        NewUser {
            user_id: user_id.to_string(),
            password: "hunter2".to_string(),
            name: format!("{user_id} name"),
            email: format!("{user_id}@example.com"),
            date_of_birth: None,
        }
    }

    fn seed_users(store: &GraphStore, ids: &[&str]) {
        for id in ids {
            store.insert_user(&make_user(id)).unwrap();
        }
    }

    // -- Users ----------------------------------------------------------

    #[test]
    fn insert_and_fetch_user() {
        let store = setup();
        seed_users(&store, &["alice"]);

        assert!(store.user_exists("alice").unwrap());
        assert!(!store.user_exists("bob").unwrap());

        let user = store.get_user("alice").unwrap().unwrap();
        assert_eq!(user.user_id, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(store.get_user("bob").unwrap().is_none());
    }

    #[test]
    fn credentials_and_password_update() {
        let store = setup();
        seed_users(&store, &["alice"]);

        assert!(store.verify_credentials("alice", "hunter2").unwrap());
        assert!(!store.verify_credentials("alice", "wrong").unwrap());
        assert!(!store.verify_credentials("ghost", "hunter2").unwrap());

        assert!(store.update_password("alice", "correct horse").unwrap());
        assert!(store.verify_credentials("alice", "correct horse").unwrap());
        assert!(!store.verify_credentials("alice", "hunter2").unwrap());

        assert!(!store.update_password("ghost", "x").unwrap());
    }

    #[test]
    fn users_by_name_is_exact_and_ordered() {
        let store = setup();
        store
            .insert_user(&NewUser {
                name: "Ada".into(),
                ..make_user("z-user")
            })
            .unwrap();
        store
            .insert_user(&NewUser {
                name: "Ada".into(),
                ..make_user("a-user")
            })
            .unwrap();
        store
            .insert_user(&NewUser {
                name: "Adam".into(),
                ..make_user("m-user")
            })
            .unwrap();

        let found = store.users_by_name("Ada").unwrap();
        let ids: Vec<&str> = found.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a-user", "z-user"]);
    }

    // -- Edges ----------------------------------------------------------

    #[test]
    fn insert_edge_and_lookup() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);

        let id = store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        let edge = store.get_edge(id).unwrap().unwrap();
        assert_eq!(edge.requester_id, "alice");
        assert_eq!(edge.target_id, "bob");
        assert_eq!(edge.status, EdgeStatus::Requested);
        assert!(edge.resolved_at.is_none());
    }

    #[test]
    fn active_edge_between_sees_both_directions() {
        let store = setup();
        seed_users(&store, &["alice", "bob", "carol"]);
        store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();

        assert!(store.active_edge_between("alice", "bob").unwrap().is_some());
        assert!(store.active_edge_between("bob", "alice").unwrap().is_some());
        assert!(store.active_edge_between("alice", "carol").unwrap().is_none());
    }

    #[test]
    fn rejected_edge_is_not_active() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);
        let id = store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        store
            .resolve_edge(id, EdgeStatus::Rejected, 1700000000)
            .unwrap();

        assert!(store.active_edge_between("alice", "bob").unwrap().is_none());
    }

    #[test]
    fn resolve_edge_only_touches_pending_rows() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);
        let id = store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();

        assert!(store.resolve_edge(id, EdgeStatus::Accepted, 100).unwrap());
        let edge = store.get_edge(id).unwrap().unwrap();
        assert_eq!(edge.status, EdgeStatus::Accepted);
        assert_eq!(edge.resolved_at, Some(100));

        // Second resolution finds no pending row.
        assert!(!store.resolve_edge(id, EdgeStatus::Rejected, 200).unwrap());
        let edge = store.get_edge(id).unwrap().unwrap();
        assert_eq!(edge.status, EdgeStatus::Accepted);
        assert_eq!(edge.resolved_at, Some(100));
    }

    #[test]
    fn accepted_peers_union_both_directions() {
        let store = setup();
        seed_users(&store, &["alice", "bob", "carol", "dan"]);
        let e1 = store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        store.resolve_edge(e1, EdgeStatus::Accepted, 1).unwrap();
        let e2 = store
            .insert_edge("carol", "alice", EdgeStatus::Requested)
            .unwrap();
        store.resolve_edge(e2, EdgeStatus::Accepted, 2).unwrap();
        // Pending edge does not count.
        store
            .insert_edge("alice", "dan", EdgeStatus::Requested)
            .unwrap();

        let mut peers = store.accepted_peers("alice").unwrap();
        peers.sort();
        assert_eq!(peers, vec!["bob".to_string(), "carol".to_string()]);

        assert!(store.has_accepted_connection("alice").unwrap());
        assert!(!store.has_accepted_connection("dan").unwrap());
    }

    #[test]
    fn edges_from_and_to_split_by_direction() {
        let store = setup();
        seed_users(&store, &["alice", "bob", "carol"]);
        store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        store
            .insert_edge("carol", "alice", EdgeStatus::Requested)
            .unwrap();

        let from = store.edges_from("alice").unwrap();
        assert_eq!(from.len(), 1);
        assert_eq!(from[0].target_id, "bob");

        let to = store.edges_to("alice").unwrap();
        assert_eq!(to.len(), 1);
        assert_eq!(to[0].requester_id, "carol");
    }

    #[test]
    fn pending_requests_ordered_oldest_first() {
        let store = setup();
        seed_users(&store, &["alice", "bob", "carol", "dan"]);
        // Same created_at second for all three — row id must break the tie
        // in insertion order.
        store
            .insert_edge("bob", "alice", EdgeStatus::Requested)
            .unwrap();
        store
            .insert_edge("carol", "alice", EdgeStatus::Requested)
            .unwrap();
        store
            .insert_edge("dan", "alice", EdgeStatus::Requested)
            .unwrap();

        let pending = store.pending_requests_for("alice").unwrap();
        let requesters: Vec<&str> = pending.iter().map(|e| e.requester_id.as_str()).collect();
        assert_eq!(requesters, vec!["bob", "carol", "dan"]);
    }

    #[test]
    fn pending_requests_exclude_resolved_and_outgoing() {
        let store = setup();
        seed_users(&store, &["alice", "bob", "carol"]);
        let e1 = store
            .insert_edge("bob", "alice", EdgeStatus::Requested)
            .unwrap();
        store.resolve_edge(e1, EdgeStatus::Accepted, 1).unwrap();
        store
            .insert_edge("alice", "carol", EdgeStatus::Requested)
            .unwrap();

        assert!(store.pending_requests_for("alice").unwrap().is_empty());
        assert_eq!(store.pending_requests_for("carol").unwrap().len(), 1);
    }

    // -- Messages --------------------------------------------------------

    #[test]
    fn insert_message_returns_stored_row() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);

        let msg = store
            .insert_message("alice", "bob", "hello", 1700000000)
            .unwrap();
        assert_eq!(msg.sender_id, "alice");
        assert_eq!(msg.receiver_id, "bob");
        assert_eq!(msg.delete_status, DeleteStatus::Visible);
        assert_eq!(msg.send_time, 1700000000);

        let fetched = store.get_message(msg.msg_id).unwrap().unwrap();
        assert_eq!(fetched, msg);
    }

    #[test]
    fn messages_by_party_ordered_by_send_time() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);
        store.insert_message("alice", "bob", "second", 200).unwrap();
        store.insert_message("alice", "bob", "first", 100).unwrap();
        store.insert_message("bob", "alice", "reply", 150).unwrap();

        let sent = store.messages_by_sender("alice").unwrap();
        let contents: Vec<&str> = sent.iter().map(|m| m.contents.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);

        let received = store.messages_by_receiver("alice").unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].contents, "reply");
    }

    #[test]
    fn update_message_delete_status_persists() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);
        let msg = store.insert_message("alice", "bob", "hi", 1).unwrap();

        assert!(store
            .update_message_delete_status(msg.msg_id, DeleteStatus::ReceiverDeleted)
            .unwrap());
        let fetched = store.get_message(msg.msg_id).unwrap().unwrap();
        assert_eq!(fetched.delete_status, DeleteStatus::ReceiverDeleted);

        assert!(!store
            .update_message_delete_status(9999, DeleteStatus::BothDeleted)
            .unwrap());
    }

    // -- Stats and transactions ------------------------------------------

    #[test]
    fn stats_count_all_tables() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);
        store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        store.insert_message("alice", "bob", "hi", 1).unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(
            stats,
            StoreStats {
                users: 2,
                edges: 1,
                messages: 1
            }
        );
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);

        {
            let _tx = store.begin().unwrap();
            store
                .insert_edge("alice", "bob", EdgeStatus::Requested)
                .unwrap();
            // Dropped without commit.
        }

        assert!(store.active_edge_between("alice", "bob").unwrap().is_none());
    }

    #[test]
    fn committed_transaction_persists() {
        let store = setup();
        seed_users(&store, &["alice", "bob"]);

        let tx = store.begin().unwrap();
        store
            .insert_edge("alice", "bob", EdgeStatus::Requested)
            .unwrap();
        tx.commit().unwrap();

        assert!(store.active_edge_between("alice", "bob").unwrap().is_some());
    }
}
