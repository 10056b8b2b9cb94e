//! Inbound frame handling
//!
//! Classifies each frame by op code, applies the session bookkeeping a frame
//! carries, forwards events to the [`EventHandler`], and tells the client which
//! connection-level action, if any, the frame calls for.

mod error;

pub use error::{HandlerError, HandlerResult};

use crate::connection::Session;
use crate::events::{DispatchEvent, EventHandler, GatewayEventType};
use crate::interactions::InteractionResponder;
use crate::protocol::{
    GatewayMessage, InteractionPayload, MessageCreatePayload, OpCode, ReadyPayload,
};

/// Connection-level action requested by an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Nothing for the client to do
    None,
    /// Start heartbeating and authenticate
    Hello { heartbeat_interval: u64 },
    /// The server asked for an immediate heartbeat
    HeartbeatRequested,
    HeartbeatAck,
    /// Reconnect and resume
    Reconnect,
    InvalidSession { resumable: bool },
    /// READY was received and applied
    Ready,
    /// RESUMED was received
    Resumed,
}

/// Routes inbound frames
pub struct EventDispatcher;

impl EventDispatcher {
    /// Handle one inbound text frame
    ///
    /// Frames that cannot be decoded are logged and dropped; they never fail the caller.
    pub fn dispatch<H: EventHandler + ?Sized>(
        text: &str,
        session: &mut Session,
        responder: &mut InteractionResponder,
        handler: &mut H,
    ) -> Directive {
        match Self::handle(text, session, responder, handler) {
            Ok(directive) => directive,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping inbound frame");
                Directive::None
            }
        }
    }

    fn handle<H: EventHandler + ?Sized>(
        text: &str,
        session: &mut Session,
        responder: &mut InteractionResponder,
        handler: &mut H,
    ) -> HandlerResult<Directive> {
        let message = GatewayMessage::from_json(text)?;
        tracing::trace!(op = %message.op, seq = ?message.s, event = ?message.t, "Frame received");

        match message.op {
            OpCode::Dispatch => Self::handle_dispatch(message, session, responder, handler),
            OpCode::Hello => {
                let hello = message
                    .as_hello()
                    .ok_or_else(|| HandlerError::invalid_payload("Hello", "missing heartbeat_interval"))?;
                Ok(Directive::Hello {
                    heartbeat_interval: hello.heartbeat_interval,
                })
            }
            OpCode::Heartbeat => Ok(Directive::HeartbeatRequested),
            OpCode::HeartbeatAck => Ok(Directive::HeartbeatAck),
            OpCode::Reconnect => Ok(Directive::Reconnect),
            OpCode::InvalidSession => Ok(Directive::InvalidSession {
                resumable: message.as_invalid_session().unwrap_or(false),
            }),
            op => {
                handler.on_opcode(op, &message.d);
                Ok(Directive::None)
            }
        }
    }

    fn handle_dispatch<H: EventHandler + ?Sized>(
        message: GatewayMessage,
        session: &mut Session,
        responder: &mut InteractionResponder,
        handler: &mut H,
    ) -> HandlerResult<Directive> {
        if let Some(seq) = message.s {
            session.record_sequence(seq);
        }

        let name = message.t.ok_or(HandlerError::MissingEventName)?;
        let event = DispatchEvent {
            kind: GatewayEventType::from_name(&name),
            name,
            sequence: message.s,
            data: message.d,
        };

        match event.kind {
            Some(GatewayEventType::Ready) => {
                let ready: ReadyPayload = serde_json::from_value(event.data.clone())
                    .map_err(|e| HandlerError::invalid_payload("READY", e))?;

                session.begin(ready.session_id.clone(), ready.resume_gateway_url.clone());
                if let Some(application) = &ready.application {
                    session.set_application_id(application.id);
                }
                tracing::info!(
                    session_id = %ready.session_id,
                    application_id = ?session.application_id(),
                    "Session ready"
                );

                handler.on_ready(&ready, &event);
                Ok(Directive::Ready)
            }
            Some(GatewayEventType::Resumed) => {
                tracing::info!(session_id = ?session.session_id(), "Session resumed");
                handler.on_resumed(&event);
                Ok(Directive::Resumed)
            }
            Some(GatewayEventType::InteractionCreate) => {
                let payload: InteractionPayload = serde_json::from_value(event.data.clone())
                    .map_err(|e| HandlerError::invalid_payload("INTERACTION_CREATE", e))?;

                let pending = payload.into_pending(event.data.clone());
                tracing::debug!(
                    interaction_id = %pending.id,
                    command = %pending.name,
                    "Interaction received"
                );
                responder.set_pending(pending.clone());
                handler.on_interaction(&pending, responder, &event);
                Ok(Directive::None)
            }
            Some(GatewayEventType::MessageCreate) => {
                let author = serde_json::from_value::<MessageCreatePayload>(event.data.clone())
                    .ok()
                    .and_then(|m| m.author)
                    .map(|a| a.id);

                if author.is_some() && author == session.application_id() {
                    tracing::trace!("Ignoring own message");
                } else {
                    handler.on_message_create(&event);
                }
                Ok(Directive::None)
            }
            _ => {
                if event.is_unknown() {
                    tracing::debug!(event = %event.name, "Unknown dispatch event");
                }
                handler.on_dispatch(&event);
                Ok(Directive::None)
            }
        }
    }
}
