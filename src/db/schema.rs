//! SQLite schema initialization for ProfNet.
//!
//! Three tables: users, connections, messages. Connection and message rows
//! are never deleted — lifecycle is expressed through status columns, so
//! the request/resolution history and soft-deleted messages stay on disk.

use rusqlite::Connection;

// ---------------------------------------------------------------------------
// DDL constants — kept as separate strings so each statement can be executed
// individually and a failure names the statement that caused it.
// ---------------------------------------------------------------------------

const CREATE_USERS: &str = "\
CREATE TABLE IF NOT EXISTS users (
  user_id TEXT PRIMARY KEY,
  password TEXT NOT NULL,
  name TEXT NOT NULL,
  email TEXT NOT NULL,
  date_of_birth TEXT,
  created_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
)";

const CREATE_CONNECTIONS: &str = "\
CREATE TABLE IF NOT EXISTS connections (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  requester_id TEXT NOT NULL,
  target_id TEXT NOT NULL,
  status TEXT NOT NULL,
  created_at INTEGER NOT NULL DEFAULT (strftime('%s','now')),
  resolved_at INTEGER,
  FOREIGN KEY (requester_id) REFERENCES users(user_id),
  FOREIGN KEY (target_id) REFERENCES users(user_id)
)";

const CREATE_MESSAGES: &str = "\
CREATE TABLE IF NOT EXISTS messages (
  msg_id INTEGER PRIMARY KEY AUTOINCREMENT,
  sender_id TEXT NOT NULL,
  receiver_id TEXT NOT NULL,
  contents TEXT NOT NULL,
  send_time INTEGER NOT NULL,
  delivery_status TEXT NOT NULL DEFAULT 'sent',
  delete_status INTEGER NOT NULL DEFAULT 0,
  FOREIGN KEY (sender_id) REFERENCES users(user_id),
  FOREIGN KEY (receiver_id) REFERENCES users(user_id)
)";

// Indexes ----------------------------------------------------------------

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",
    "CREATE INDEX IF NOT EXISTS idx_connections_requester ON connections(requester_id)",
    "CREATE INDEX IF NOT EXISTS idx_connections_target ON connections(target_id)",
    "CREATE INDEX IF NOT EXISTS idx_connections_status ON connections(status)",
    "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_receiver ON messages(receiver_id)",
];

// At most one active (requested/accepted) edge per unordered pair. The
// min/max expressions normalize edge direction, so the index catches a
// duplicate request from either side even across racing connections.
const CREATE_ACTIVE_PAIR_INDEX: &str = "\
CREATE UNIQUE INDEX IF NOT EXISTS idx_connections_active_pair
ON connections (min(requester_id, target_id), max(requester_id, target_id))
WHERE status IN ('requested', 'accepted')";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open (or create) the SQLite database at `db_path` and apply the full
/// ProfNet schema.
///
/// The returned connection has WAL mode, foreign keys, and synchronous
/// NORMAL already configured.
///
/// # Errors
///
/// Returns a `rusqlite::Error` if the database cannot be opened or any DDL
/// statement fails.
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;

    // -- Pragmas ----------------------------------------------------------
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Every edge and message endpoint references a registered user, so FK
    // enforcement stays ON.
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    // -- Core tables ------------------------------------------------------
    conn.execute_batch(CREATE_USERS)?;
    conn.execute_batch(CREATE_CONNECTIONS)?;
    conn.execute_batch(CREATE_MESSAGES)?;

    // -- Indexes ----------------------------------------------------------
    for ddl in CREATE_INDEXES {
        conn.execute_batch(ddl)?;
    }
    conn.execute_batch(CREATE_ACTIVE_PAIR_INDEX)?;

    Ok(conn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
