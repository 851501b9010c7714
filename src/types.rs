//! Core domain types for ProfNet.
//!
//! Users, connection edges, and messages as they exist in the store.
//! Status enums carry their on-disk encodings (`as_str` / `as_i64`) so the
//! db layer never hand-rolls string or integer constants.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EdgeStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a connection edge.
///
/// An edge is *active* while Requested or Accepted; a Rejected edge stays
/// in history but no longer blocks a new request between the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Requested,
    Accepted,
    Rejected,
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requested" | "request" => Some(Self::Requested),
            "accepted" | "accept" => Some(Self::Accepted),
            "rejected" | "reject" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Requested or Accepted. Terminal states are Accepted and Rejected;
    /// only a Requested edge may still be resolved.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Requested | Self::Accepted)
    }
}

impl std::fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConnectionEdge
// ---------------------------------------------------------------------------

/// A directed connection edge. The direction records who asked whom; an
/// Accepted edge is traversed in both directions by the reachability
/// search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEdge {
    pub id: i64,
    pub requester_id: String,
    pub target_id: String,
    pub status: EdgeStatus,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

impl ConnectionEdge {
    /// The other endpoint, seen from `user`. None if `user` is not on the
    /// edge at all.
    pub fn peer_of(&self, user: &str) -> Option<&str> {
        if self.requester_id == user {
            Some(&self.target_id)
        } else if self.target_id == user {
            Some(&self.requester_id)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// DeleteStatus
// ---------------------------------------------------------------------------

/// Which parties have soft-deleted a message.
///
/// Encoded as 0..=3 in the store: 0 visible to both, 1 deleted by the
/// sender, 2 deleted by the receiver, 3 deleted by both. Transitions only
/// ever hide more parties (0→1, 0→2, 1→3, 2→3) and never revert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Visible,
    SenderDeleted,
    ReceiverDeleted,
    BothDeleted,
}

/// A message party, for visibility decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageParty {
    Sender,
    Receiver,
}

impl DeleteStatus {
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Visible => 0,
            Self::SenderDeleted => 1,
            Self::ReceiverDeleted => 2,
            Self::BothDeleted => 3,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Visible),
            1 => Some(Self::SenderDeleted),
            2 => Some(Self::ReceiverDeleted),
            3 => Some(Self::BothDeleted),
            _ => None,
        }
    }

    pub fn hides(&self, party: MessageParty) -> bool {
        match party {
            MessageParty::Sender => matches!(self, Self::SenderDeleted | Self::BothDeleted),
            MessageParty::Receiver => matches!(self, Self::ReceiverDeleted | Self::BothDeleted),
        }
    }

    /// The state after `party` deletes the message. Idempotent: a party
    /// already hidden stays hidden and nothing else changes.
    pub fn with_deleted_by(self, party: MessageParty) -> Self {
        match (self, party) {
            (Self::Visible, MessageParty::Sender) => Self::SenderDeleted,
            (Self::ReceiverDeleted, MessageParty::Sender) => Self::BothDeleted,
            (Self::Visible, MessageParty::Receiver) => Self::ReceiverDeleted,
            (Self::SenderDeleted, MessageParty::Receiver) => Self::BothDeleted,
            (other, _) => other,
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryStatus
// ---------------------------------------------------------------------------

/// Delivery label on a message. New messages start as Sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A message between two users. Never physically removed; visibility is
/// governed by [`DeleteStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub msg_id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub contents: String,
    pub send_time: i64,
    pub delivery_status: DeliveryStatus,
    pub delete_status: DeleteStatus,
}

impl Message {
    /// The role `user` plays on this message, if any.
    pub fn party_of(&self, user: &str) -> Option<MessageParty> {
        if self.sender_id == user {
            Some(MessageParty::Sender)
        } else if self.receiver_id == user {
            Some(MessageParty::Receiver)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. The password column never leaves the store — this is
/// the public profile view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub created_at: i64,
}

/// Registration input for [`crate::directory::UserDirectory::register`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
