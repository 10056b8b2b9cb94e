//! wakebot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p wakebot-gateway --bin wakebot
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use wakebot_common::{
    try_init_tracing, try_init_tracing_with_config, AppConfig, AppError, AppResult, TracingConfig,
};
use wakebot_core::{
    ApplicationCommand, InteractionResponseType, MessageResponse, PendingInteraction, Snowflake,
};
use wakebot_gateway::{
    CommandRegistry, ConnectionState, DispatchEvent, EventHandler, GatewayClient, GatewayOptions,
    InteractionResponder, ReqwestTransport, RestGateway, WorkerHeadroom, WsSocket,
};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = try_init_tracing();
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, code = e.error_code(), "wakebot stopped");
        std::process::exit(1);
    }
}

/// Answers `/ping` with the process uptime
struct PingHandler {
    started: Instant,
}

impl EventHandler for PingHandler {
    fn on_interaction(
        &mut self,
        interaction: &PendingInteraction,
        responder: &mut InteractionResponder,
        _event: &DispatchEvent,
    ) {
        if interaction.name != "ping" {
            info!(command = %interaction.name, "Ignoring unknown command");
            return;
        }

        let content = format!("Uplink online. Uptime: {}ms", elapsed_ms(self.started));
        if let Err(e) = responder.respond(
            InteractionResponseType::ChannelMessageWithSource,
            MessageResponse::text(content),
        ) {
            warn!(error = %e, "Could not answer /ping");
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    info!(name = %config.app.name, env = ?config.app.env, "Starting wakebot...");
    let started = Instant::now();

    let transport = ReqwestTransport::new(Duration::from_secs(config.discord.rest_timeout_secs))
        .map_err(AppError::transport)?;
    let rest = RestGateway::new(
        transport,
        config.discord.api_base_url.clone(),
        config.discord.token.clone(),
    );
    let responder = InteractionResponder::with_probe(
        rest.clone(),
        WorkerHeadroom::new(rest.clone(), config.bot.max_pending_replies),
    );

    let options = GatewayOptions::from(&config.discord);
    let intents = options.intents;
    let mut client = GatewayClient::new(WsSocket::new(), PingHandler { started }, rest, options)
        .with_responder(responder);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.bot.tick_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_login_at: Option<u64> = None;
    let mut commands_pending = config.bot.register_commands;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                client.logout();
                break;
            }
            _ = ticker.tick() => {
                let now = elapsed_ms(started);

                let login_due = last_login_at
                    .is_none_or(|at| now.saturating_sub(at) >= config.bot.login_interval_ms);
                if client.state() == ConnectionState::Disconnected && login_due {
                    last_login_at = Some(now);
                    client.login(intents).await;
                }

                client.tick(now).await;

                if commands_pending && client.state() == ConnectionState::Connected {
                    if let Some(application_id) = client.application_id() {
                        register_commands(client.rest(), application_id, config.bot.command_guild_id).await;
                        commands_pending = false;
                    }
                }
            }
        }
    }

    info!("wakebot stopped");
    Ok(())
}

async fn register_commands(rest: &RestGateway, application_id: Snowflake, guild_id: Option<Snowflake>) {
    let registry = CommandRegistry::new(rest.clone(), application_id);
    let ping = ApplicationCommand::chat_input("ping", "Ping the bot for a response.")
        .with_default_member_permissions(ApplicationCommand::USE_APPLICATION_COMMANDS);

    let registered = match guild_id {
        Some(guild_id) => registry.register_guild(guild_id, &ping).await,
        None => registry.register_global(&ping).await,
    };
    if registered.is_none() {
        warn!(guild_id = ?guild_id, "/ping command was not registered");
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
