//! Message composition and the sender/receiver visibility model.
//!
//! Every message carries independent soft-delete flags for its two
//! parties. The sent view hides nothing a receiver-side delete did, and
//! vice versa; a party's own delete removes the message from their view
//! only. Rows are never removed — visibility is entirely a function of
//! [`DeleteStatus`].

use crate::error::{ProfNetError, Result};
use crate::graph::store::GraphStore;
use crate::types::{DeleteStatus, Message, MessageParty};

/// Messaging operations over a store: send, list views, soft-delete.
pub struct MessageService<'a> {
    store: &'a GraphStore,
}

impl<'a> MessageService<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Send a message, stamped with the current time, visible to both
    /// parties.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a self-send; `NotFound` when either party is
    /// not registered.
    pub fn send(&self, sender: &str, receiver: &str, contents: &str) -> Result<Message> {
        if sender == receiver {
            return Err(ProfNetError::InvalidRequest(
                "cannot send a message to yourself".into(),
            ));
        }
        if !self.store.user_exists(sender)? {
            return Err(ProfNetError::NotFound(format!("user '{sender}'")));
        }
        if !self.store.user_exists(receiver)? {
            return Err(ProfNetError::NotFound(format!("user '{receiver}'")));
        }

        let send_time = chrono::Utc::now().timestamp();
        let message = self
            .store
            .insert_message(sender, receiver, contents, send_time)?;
        tracing::info!(sender, receiver, msg_id = message.msg_id, "message sent");
        Ok(message)
    }

    /// Messages `user_id` sent and has not deleted: a receiver-side delete
    /// does not hide a message from the sender's sent view.
    pub fn sent_view(&self, user_id: &str) -> Result<Vec<Message>> {
        let messages = self.store.messages_by_sender(user_id)?;
        Ok(messages
            .into_iter()
            .filter(|m| !m.delete_status.hides(MessageParty::Sender))
            .collect())
    }

    /// Messages `user_id` received and has not deleted.
    pub fn received_view(&self, user_id: &str) -> Result<Vec<Message>> {
        let messages = self.store.messages_by_receiver(user_id)?;
        Ok(messages
            .into_iter()
            .filter(|m| !m.delete_status.hides(MessageParty::Receiver))
            .collect())
    }

    /// Soft-delete a message for `actor`, returning the new status.
    ///
    /// Transitions follow the monotone table on
    /// [`DeleteStatus::with_deleted_by`]; deleting a message already
    /// hidden for the actor is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown message; `Forbidden` when `actor` is
    /// neither the sender nor the receiver.
    pub fn delete(&self, msg_id: i64, actor: &str) -> Result<DeleteStatus> {
        let message = self
            .store
            .get_message(msg_id)?
            .ok_or_else(|| ProfNetError::NotFound(format!("message {msg_id}")))?;

        let party = message.party_of(actor).ok_or_else(|| {
            ProfNetError::Forbidden(format!("user '{actor}' is not a party to message {msg_id}"))
        })?;

        let next = message.delete_status.with_deleted_by(party);
        if next != message.delete_status {
            self.store.update_message_delete_status(msg_id, next)?;
            tracing::debug!(msg_id, actor, status = next.as_i64(), "message soft-deleted");
        }
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
