//! Row → domain-type converters shared by the store and its callers.
//!
//! Each converter expects the column layout produced by the `SELECT *`
//! statements in [`crate::graph::store`]; status columns that fail to parse
//! surface as `FromSqlConversionFailure` rather than panicking, so a
//! corrupted row turns into a store error the caller can handle.

use rusqlite::types::Type;
use rusqlite::Row;

use crate::types::{
    ConnectionEdge, DeleteStatus, DeliveryStatus, EdgeStatus, Message, User,
};

fn column_error(index: usize, detail: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, detail.into())
}

/// users: user_id, password, name, email, date_of_birth, created_at.
/// The password column is deliberately skipped.
pub fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        date_of_birth: row.get("date_of_birth")?,
        created_at: row.get("created_at")?,
    })
}

/// connections: id, requester_id, target_id, status, created_at, resolved_at.
pub fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<ConnectionEdge> {
    let status_raw: String = row.get("status")?;
    let status = EdgeStatus::from_str_loose(&status_raw)
        .ok_or_else(|| column_error(3, format!("unknown edge status '{status_raw}'")))?;

    Ok(ConnectionEdge {
        id: row.get("id")?,
        requester_id: row.get("requester_id")?,
        target_id: row.get("target_id")?,
        status,
        created_at: row.get("created_at")?,
        resolved_at: row.get("resolved_at")?,
    })
}

/// messages: msg_id, sender_id, receiver_id, contents, send_time,
/// delivery_status, delete_status.
pub fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let delivery_raw: String = row.get("delivery_status")?;
    let delivery_status = DeliveryStatus::from_str_loose(&delivery_raw)
        .ok_or_else(|| column_error(5, format!("unknown delivery status '{delivery_raw}'")))?;

    let delete_raw: i64 = row.get("delete_status")?;
    let delete_status = DeleteStatus::from_i64(delete_raw)
        .ok_or_else(|| column_error(6, format!("delete status {delete_raw} out of range")))?;

    Ok(Message {
        msg_id: row.get("msg_id")?,
        sender_id: row.get("sender_id")?,
        receiver_id: row.get("receiver_id")?,
        contents: row.get("contents")?,
        send_time: row.get("send_time")?,
        delivery_status,
        delete_status,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
