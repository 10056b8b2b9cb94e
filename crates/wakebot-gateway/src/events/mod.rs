//! Gateway events
//!
//! The dispatch event catalogue and the handler capability the client forwards events to.

mod event_types;

pub use event_types::GatewayEventType;

use crate::interactions::InteractionResponder;
use crate::protocol::{OpCode, ReadyPayload};
use serde_json::Value;
use wakebot_core::PendingInteraction;

/// A dispatch frame as forwarded to an [`EventHandler`]
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
    /// Catalogue entry, `None` for event names the client does not know
    pub kind: Option<GatewayEventType>,
    /// Event name exactly as received
    pub name: String,
    /// Sequence number of the frame
    pub sequence: Option<u64>,
    /// Event data
    pub data: Value,
}

impl DispatchEvent {
    /// Check if the event name is outside the known catalogue
    pub fn is_unknown(&self) -> bool {
        self.kind.is_none()
    }
}

/// Receives the event stream of a [`GatewayClient`](crate::GatewayClient)
///
/// Each dispatch reaches exactly one method. The specific methods default to
/// [`on_dispatch`](Self::on_dispatch), so a handler implementing only that method
/// observes every forwarded dispatch once.
pub trait EventHandler: Send {
    /// Session established (READY). Session bookkeeping has already been applied.
    fn on_ready(&mut self, ready: &ReadyPayload, event: &DispatchEvent) {
        let _ = ready;
        self.on_dispatch(event);
    }

    /// Session resumed (RESUMED)
    fn on_resumed(&mut self, event: &DispatchEvent) {
        self.on_dispatch(event);
    }

    /// A message from someone other than this application (MESSAGE_CREATE)
    fn on_message_create(&mut self, event: &DispatchEvent) {
        self.on_dispatch(event);
    }

    /// A command invocation (INTERACTION_CREATE)
    ///
    /// `interaction` is already stored as the pending interaction, so
    /// `responder.respond(..)` answers it.
    fn on_interaction(
        &mut self,
        interaction: &PendingInteraction,
        responder: &mut InteractionResponder,
        event: &DispatchEvent,
    ) {
        let _ = responder;
        tracing::debug!(
            command = %interaction.name,
            "No interaction handler, no response given"
        );
        self.on_dispatch(event);
    }

    /// Any other dispatch, including unknown event names
    fn on_dispatch(&mut self, event: &DispatchEvent) {
        let _ = event;
    }

    /// Non-dispatch frames the client does not consume itself
    fn on_opcode(&mut self, op: OpCode, data: &Value) {
        let _ = data;
        tracing::trace!(op = %op, "Unhandled op code");
    }
}
