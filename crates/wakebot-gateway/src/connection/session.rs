//! Session identity
//!
//! What the client must remember to resume after a disconnect.

use wakebot_core::Snowflake;

/// Connection identity owned by the [`GatewayClient`](super::GatewayClient)
///
/// `session_id` is present if and only if the session can be resumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    gateway_url: Option<String>,
    resume_url: Option<String>,
    session_id: Option<String>,
    last_sequence: Option<u64>,
    application_id: Option<Snowflake>,
    online: bool,
}

impl Session {
    /// Create an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached gateway endpoint, resolved over REST
    pub fn gateway_url(&self) -> Option<&str> {
        self.gateway_url.as_deref()
    }

    pub fn set_gateway_url(&mut self, url: impl Into<String>) {
        self.gateway_url = Some(url.into()).filter(|u| !u.is_empty());
    }

    pub fn clear_gateway_url(&mut self) {
        self.gateway_url = None;
    }

    /// Endpoint announced by READY for resuming this session
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    /// Forget the resume endpoint, keeping the session id and sequence
    pub fn clear_resume_url(&mut self) {
        self.resume_url = None;
    }

    /// Endpoint the next login should connect to
    pub fn connect_url(&self) -> Option<&str> {
        if self.is_resumable() {
            self.resume_url().or_else(|| self.gateway_url())
        } else {
            self.gateway_url()
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record a new session; an empty id leaves the session non-resumable
    pub fn begin(&mut self, session_id: impl Into<String>, resume_url: Option<String>) {
        self.session_id = Some(session_id.into()).filter(|s| !s.is_empty());
        self.resume_url = resume_url.filter(|u| !u.is_empty());
    }

    /// Forget the session so the next login identifies from scratch
    pub fn clear_identity(&mut self) {
        self.session_id = None;
        self.resume_url = None;
        self.last_sequence = None;
    }

    pub fn is_resumable(&self) -> bool {
        self.session_id.is_some()
    }

    /// Last sequence number seen on a dispatch frame
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn record_sequence(&mut self, sequence: u64) {
        self.last_sequence = Some(sequence);
    }

    /// Id of the application this bot belongs to, known after READY
    pub fn application_id(&self) -> Option<Snowflake> {
        self.application_id
    }

    pub fn set_application_id(&mut self, id: Snowflake) {
        self.application_id = Some(id).filter(|id| !id.is_zero());
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}
