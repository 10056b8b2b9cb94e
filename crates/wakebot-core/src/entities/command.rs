//! Application command entities
//!
//! Declarative command metadata registered with the platform before the bot goes live.

use crate::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

/// Kind of application command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CommandType {
    /// Slash command; a text-based command that shows up when a user types /
    #[default]
    ChatInput = 1,
    /// A UI-based command that shows up when you right click or tap on a user
    User = 2,
    /// A UI-based command that shows up when you right click or tap on a message
    Message = 3,
}

/// Type of a command option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OptionType {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    /// Any integer between -2^53 and 2^53
    Integer = 4,
    Boolean = 5,
    User = 6,
    /// Includes all channel types + categories
    Channel = 7,
    Role = 8,
    /// Includes users and roles
    Mentionable = 9,
    /// Any double between -2^53 and 2^53
    Number = 10,
    Attachment = 11,
}

macro_rules! repr_u8_serde {
    ($ty:ty, $name:literal, { $($value:literal => $variant:expr),+ $(,)? }) => {
        impl $ty {
            /// Create from a raw integer value
            #[must_use]
            pub fn from_u8(value: u8) -> Option<Self> {
                match value {
                    $($value => Some($variant),)+
                    _ => None,
                }
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_u8(*self as u8)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = u8::deserialize(deserializer)?;
                Self::from_u8(value)
                    .ok_or_else(|| serde::de::Error::custom(format!(concat!("invalid ", $name, ": {}"), value)))
            }
        }
    };
}

repr_u8_serde!(CommandType, "command type", {
    1 => CommandType::ChatInput,
    2 => CommandType::User,
    3 => CommandType::Message,
});

repr_u8_serde!(OptionType, "option type", {
    1 => OptionType::SubCommand,
    2 => OptionType::SubCommandGroup,
    3 => OptionType::String,
    4 => OptionType::Integer,
    5 => OptionType::Boolean,
    6 => OptionType::User,
    7 => OptionType::Channel,
    8 => OptionType::Role,
    9 => OptionType::Mentionable,
    10 => OptionType::Number,
    11 => OptionType::Attachment,
});

/// Value of a predefined option choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

impl ChoiceValue {
    /// Whether this value may be offered by an option of the given type
    pub fn fits(&self, option_type: OptionType) -> bool {
        matches!(
            (self, option_type),
            (Self::String(_), OptionType::String)
                | (Self::Integer(_), OptionType::Integer)
                | (Self::Number(_), OptionType::Number)
        )
    }
}

/// A predefined choice of a command option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommandChoice {
    #[validate(length(min = 1, max = 32, message = "Choice name must be 1-32 characters"))]
    pub name: String,
    pub value: ChoiceValue,
}

/// A parameter of a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommandOption {
    #[validate(length(min = 1, max = 32, message = "Option name must be 1-32 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub choices: Vec<CommandChoice>,
}

/// Application command registered globally or for one guild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ApplicationCommand {
    #[validate(length(min = 1, max = 32, message = "Command name must be 1-32 characters"))]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CommandType,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[validate(nested)]
    pub options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dm_permission: bool,
    /// Permission bit set, serialized as a string
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "permission_string"
    )]
    pub default_member_permissions: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nsfw: bool,
}

impl ApplicationCommand {
    /// "Use Application Commands" permission bit
    pub const USE_APPLICATION_COMMANDS: u64 = 1 << 31;

    /// Create a slash command
    #[must_use]
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CommandType::ChatInput,
            description: description.into(),
            options: Vec::new(),
            dm_permission: true,
            default_member_permissions: None,
            nsfw: false,
        }
    }

    /// Restrict the command to members holding the given permissions
    #[must_use]
    pub fn with_default_member_permissions(mut self, permissions: u64) -> Self {
        self.default_member_permissions = Some(permissions);
        self
    }

    /// Add an option
    #[must_use]
    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Check names and choice values before the command is sent
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        for option in &self.options {
            if let Some(choice) = option.choices.iter().find(|c| !c.value.fits(option.kind)) {
                return Err(DomainError::InvalidChoice {
                    option: option.name.clone(),
                    choice: choice.name.clone(),
                });
            }
        }
        Ok(())
    }
}

mod permission_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bits) => serializer.serialize_str(&bits.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
            .transpose()
    }
}
