//! Application command registration
//!
//! Bootstrap-only: each call is a single REST round trip on the shared channel.

use crate::rest::{RestGateway, RestRequest};
use wakebot_core::{ApplicationCommand, Snowflake};

/// Creates and deletes the application's commands
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    rest: RestGateway,
    application_id: Snowflake,
}

impl CommandRegistry {
    pub fn new(rest: RestGateway, application_id: Snowflake) -> Self {
        Self {
            rest,
            application_id,
        }
    }

    pub fn application_id(&self) -> Snowflake {
        self.application_id
    }

    /// Create or overwrite a global command, returning its id
    pub async fn register_global(&self, command: &ApplicationCommand) -> Option<Snowflake> {
        let path = format!("/applications/{}/commands", self.application_id);
        self.register(path, command).await
    }

    /// Create or overwrite a command in one guild, returning its id
    pub async fn register_guild(
        &self,
        guild_id: Snowflake,
        command: &ApplicationCommand,
    ) -> Option<Snowflake> {
        let path = format!(
            "/applications/{}/guilds/{}/commands",
            self.application_id, guild_id
        );
        self.register(path, command).await
    }

    pub async fn delete_global(&self, command_id: Snowflake) -> bool {
        let path = format!("/applications/{}/commands/{}", self.application_id, command_id);
        self.delete(path).await
    }

    pub async fn delete_guild(&self, guild_id: Snowflake, command_id: Snowflake) -> bool {
        let path = format!(
            "/applications/{}/guilds/{}/commands/{}",
            self.application_id, guild_id, command_id
        );
        self.delete(path).await
    }

    async fn register(&self, path: String, command: &ApplicationCommand) -> Option<Snowflake> {
        if let Err(e) = command.check() {
            tracing::warn!(command = %command.name, error = %e, "Command rejected before registration");
            return None;
        }
        let body = match serde_json::to_value(command) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(command = %command.name, error = %e, "Command could not be encoded");
                return None;
            }
        };

        let document = match self.rest.send(RestRequest::post(path, body)).await {
            Ok(Some(document)) => document,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(command = %command.name, error = %e, "Command registration failed");
                return None;
            }
        };

        let id = document
            .get("id")
            .and_then(|id| serde_json::from_value::<Snowflake>(id.clone()).ok());
        match id {
            Some(id) => tracing::info!(command = %command.name, command_id = %id, "Command registered"),
            None => tracing::warn!(command = %command.name, response = %document, "Command registration was not accepted"),
        }
        id
    }

    /// Deletion answers 204; any body means the platform refused
    async fn delete(&self, path: String) -> bool {
        match self.rest.send(RestRequest::delete(path)).await {
            Ok(None) => true,
            Ok(Some(document)) => {
                tracing::warn!(response = %document, "Command deletion was not accepted");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Command deletion failed");
                false
            }
        }
    }
}
