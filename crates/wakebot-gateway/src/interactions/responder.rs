//! Interaction replies
//!
//! Replies go out on a REST worker so the tick loop is never held up by the
//! callback round trip. The platform discards replies that arrive more than
//! [`REPLY_DEADLINE`] after the interaction was received.

use crate::rest::{RestGateway, RestRequest, RestResult};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use wakebot_core::{
    DomainError, InteractionReply, InteractionResponseType, MessageResponse, PendingInteraction,
};

/// Appended to a reply when few reply workers are left
pub const OVERLOAD_WARNING: &str =
    "\n\n**Warning: Too many pending replies. Please wait before sending further commands.**";

/// Time the platform allows between an interaction and its reply
pub const REPLY_DEADLINE: Duration = Duration::from_secs(3);

/// Reports how much room is left for another reply
pub trait ResourceProbe: Send {
    fn headroom(&self) -> usize;
}

/// Headroom measured as the number of reply workers that may still be started
#[derive(Debug, Clone)]
pub struct WorkerHeadroom {
    rest: RestGateway,
    max_pending: usize,
}

impl WorkerHeadroom {
    pub fn new(rest: RestGateway, max_pending: usize) -> Self {
        Self { rest, max_pending }
    }
}

impl ResourceProbe for WorkerHeadroom {
    fn headroom(&self) -> usize {
        self.max_pending.saturating_sub(self.rest.in_flight())
    }
}

/// Answers the pending interaction
///
/// Holds a single slot: a newly received interaction replaces the previous one,
/// answered or not. Replying does not clear the slot.
pub struct InteractionResponder {
    rest: RestGateway,
    pending: Option<PendingInteraction>,
    received_at: Option<Instant>,
    probe: Box<dyn ResourceProbe>,
    threshold: usize,
}

impl InteractionResponder {
    /// Default number of reply workers allowed before replies carry the overload warning
    pub const DEFAULT_MAX_PENDING: usize = 4;

    /// Create a responder with worker headroom as its probe
    pub fn new(rest: RestGateway) -> Self {
        let probe = WorkerHeadroom::new(rest.clone(), Self::DEFAULT_MAX_PENDING);
        Self::with_probe(rest, probe)
    }

    /// Create a responder with a custom probe
    pub fn with_probe(rest: RestGateway, probe: impl ResourceProbe + 'static) -> Self {
        Self {
            rest,
            pending: None,
            received_at: None,
            probe: Box::new(probe),
            threshold: 1,
        }
    }

    /// Append the overload warning whenever headroom drops below `threshold`
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Store `interaction` as the one to answer, replacing any previous one
    pub fn set_pending(&mut self, interaction: PendingInteraction) {
        if let Some(previous) = &self.pending {
            tracing::trace!(previous = %previous.id, next = %interaction.id, "Pending interaction replaced");
        }
        self.pending = Some(interaction);
        self.received_at = Some(Instant::now());
    }

    pub fn pending(&self) -> Option<&PendingInteraction> {
        self.pending.as_ref()
    }

    /// Time since the pending interaction was received
    pub fn pending_age(&self) -> Option<Duration> {
        self.received_at.map(|at| at.elapsed())
    }

    pub fn headroom(&self) -> usize {
        self.probe.headroom()
    }

    /// Reply to the pending interaction
    pub fn respond(
        &mut self,
        kind: InteractionResponseType,
        message: MessageResponse,
    ) -> Result<(), DomainError> {
        self.respond_with(kind, message, |_| {})
    }

    /// Reply to the pending interaction and hand the REST outcome to `on_complete`
    pub fn respond_with<F>(
        &mut self,
        kind: InteractionResponseType,
        mut message: MessageResponse,
        on_complete: F,
    ) -> Result<(), DomainError>
    where
        F: FnOnce(RestResult) + Send + 'static,
    {
        let target = self.target()?;

        if self.is_overloaded() {
            message.content.push_str(OVERLOAD_WARNING);
        }
        let document = serde_json::to_value(InteractionReply::new(kind, message))?;

        self.post(target, document, on_complete);
        Ok(())
    }

    /// Reply with a caller-built document (`{type, data}`)
    ///
    /// The overload warning is appended to `data.content` when it is a string.
    pub fn respond_document<F>(&mut self, mut document: Value, on_complete: F) -> Result<(), DomainError>
    where
        F: FnOnce(RestResult) + Send + 'static,
    {
        let target = self.target()?;

        if !document.is_object() {
            return Err(DomainError::MalformedPayload(
                "reply document must be an object".to_string(),
            ));
        }
        if self.is_overloaded() {
            if let Some(Value::String(content)) = document.pointer_mut("/data/content") {
                content.push_str(OVERLOAD_WARNING);
            }
        }

        self.post(target, document, on_complete);
        Ok(())
    }

    fn target(&self) -> Result<&PendingInteraction, DomainError> {
        match &self.pending {
            Some(pending) if pending.is_answerable() => Ok(pending),
            _ => {
                tracing::error!("Reply requested without a pending interaction");
                Err(DomainError::NoPendingInteraction)
            }
        }
    }

    fn is_overloaded(&self) -> bool {
        let headroom = self.probe.headroom();
        if headroom < self.threshold {
            tracing::warn!(headroom, threshold = self.threshold, "Reply workers nearly exhausted");
            return true;
        }
        false
    }

    fn post<F>(&self, target: &PendingInteraction, document: Value, on_complete: F)
    where
        F: FnOnce(RestResult) + Send + 'static,
    {
        let path = format!("/interactions/{}/{}/callback", target.id, target.token);
        let interaction_id = target.id;
        let received_at = self.received_at;

        self.rest.send_async(RestRequest::post(path, document), move |result| {
            let elapsed = received_at.map(|at| at.elapsed()).unwrap_or_default();
            match &result {
                Ok(_) => tracing::debug!(
                    interaction_id = %interaction_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Interaction reply sent"
                ),
                Err(e) => tracing::warn!(
                    interaction_id = %interaction_id,
                    error = %e,
                    "Interaction reply failed"
                ),
            }
            if elapsed > REPLY_DEADLINE {
                tracing::warn!(
                    interaction_id = %interaction_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Interaction reply exceeded the response deadline"
                );
            }
            on_complete(result);
        });
    }
}

impl fmt::Debug for InteractionResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionResponder")
            .field("pending", &self.pending.as_ref().map(|p| p.id))
            .field("threshold", &self.threshold)
            .finish()
    }
}
