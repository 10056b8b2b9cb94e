//! Gateway event types
//!
//! Event names carried in the `t` field of dispatch frames.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! gateway_event_types {
    ($($(#[$doc:meta])* $variant:ident => $name:literal,)+) => {
        /// Dispatch event types known to the client
        ///
        /// These are the event names sent in the `t` field of dispatch frames.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum GatewayEventType {
            $(
                $(#[$doc])*
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl GatewayEventType {
            /// Every known event type, in catalogue order
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Get the string representation of the event type
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Parse an event type from its wire name
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

gateway_event_types! {
    // Connection
    /// Sent after a successful Identify
    Ready => "READY",
    /// Sent after a successful Resume
    Resumed => "RESUMED",
    ApplicationCommandPermissionsUpdate => "APPLICATION_COMMAND_PERMISSIONS_UPDATE",

    // Auto moderation
    AutoModerationRuleCreate => "AUTO_MODERATION_RULE_CREATE",
    AutoModerationRuleUpdate => "AUTO_MODERATION_RULE_UPDATE",
    AutoModerationRuleDelete => "AUTO_MODERATION_RULE_DELETE",
    AutoModerationActionExecution => "AUTO_MODERATION_ACTION_EXECUTION",

    // Channels and threads
    ChannelCreate => "CHANNEL_CREATE",
    ChannelUpdate => "CHANNEL_UPDATE",
    ChannelDelete => "CHANNEL_DELETE",
    ChannelPinsUpdate => "CHANNEL_PINS_UPDATE",
    ThreadCreate => "THREAD_CREATE",
    ThreadUpdate => "THREAD_UPDATE",
    ThreadDelete => "THREAD_DELETE",
    ThreadListSync => "THREAD_LIST_SYNC",
    ThreadMemberUpdate => "THREAD_MEMBER_UPDATE",
    ThreadMembersUpdate => "THREAD_MEMBERS_UPDATE",

    // Guilds
    GuildCreate => "GUILD_CREATE",
    GuildUpdate => "GUILD_UPDATE",
    GuildDelete => "GUILD_DELETE",
    GuildAuditLogEntryCreate => "GUILD_AUDIT_LOG_ENTRY_CREATE",
    GuildBanAdd => "GUILD_BAN_ADD",
    GuildBanRemove => "GUILD_BAN_REMOVE",
    GuildEmojisUpdate => "GUILD_EMOJIS_UPDATE",
    GuildStickersUpdate => "GUILD_STICKERS_UPDATE",
    GuildIntegrationsUpdate => "GUILD_INTEGRATIONS_UPDATE",
    GuildMemberAdd => "GUILD_MEMBER_ADD",
    GuildMemberRemove => "GUILD_MEMBER_REMOVE",
    GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
    GuildMembersChunk => "GUILD_MEMBERS_CHUNK",
    GuildRoleCreate => "GUILD_ROLE_CREATE",
    GuildRoleUpdate => "GUILD_ROLE_UPDATE",
    GuildRoleDelete => "GUILD_ROLE_DELETE",
    GuildScheduledEventCreate => "GUILD_SCHEDULED_EVENT_CREATE",
    GuildScheduledEventUpdate => "GUILD_SCHEDULED_EVENT_UPDATE",
    GuildScheduledEventDelete => "GUILD_SCHEDULED_EVENT_DELETE",
    GuildScheduledEventUserAdd => "GUILD_SCHEDULED_EVENT_USER_ADD",
    GuildScheduledEventUserRemove => "GUILD_SCHEDULED_EVENT_USER_REMOVE",

    // Integrations
    IntegrationCreate => "INTEGRATION_CREATE",
    IntegrationUpdate => "INTEGRATION_UPDATE",
    IntegrationDelete => "INTEGRATION_DELETE",

    // Interactions
    /// A user invoked a command; must be answered within 3 seconds
    InteractionCreate => "INTERACTION_CREATE",

    // Invites
    InviteCreate => "INVITE_CREATE",
    InviteDelete => "INVITE_DELETE",

    // Messages
    MessageCreate => "MESSAGE_CREATE",
    MessageUpdate => "MESSAGE_UPDATE",
    MessageDelete => "MESSAGE_DELETE",
    MessageDeleteBulk => "MESSAGE_DELETE_BULK",

    // Reactions
    MessageReactionAdd => "MESSAGE_REACTION_ADD",
    MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
    MessageReactionRemoveAll => "MESSAGE_REACTION_REMOVE_ALL",
    MessageReactionRemoveEmoji => "MESSAGE_REACTION_REMOVE_EMOJI",

    // Stage instances
    StageInstanceCreate => "STAGE_INSTANCE_CREATE",
    StageInstanceUpdate => "STAGE_INSTANCE_UPDATE",
    StageInstanceDelete => "STAGE_INSTANCE_DELETE",

    // Misc
    PresenceUpdate => "PRESENCE_UPDATE",
    TypingStart => "TYPING_START",
    UserUpdate => "USER_UPDATE",
    VoiceStateUpdate => "VOICE_STATE_UPDATE",
    VoiceServerUpdate => "VOICE_SERVER_UPDATE",
    WebhooksUpdate => "WEBHOOKS_UPDATE",
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GatewayEventType> for String {
    fn from(event: GatewayEventType) -> Self {
        event.as_str().to_string()
    }
}
