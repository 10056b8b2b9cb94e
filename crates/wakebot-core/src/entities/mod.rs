//! Domain entities

mod command;
mod interaction;

pub use command::{ApplicationCommand, ChoiceValue, CommandChoice, CommandOption, CommandType, OptionType};
pub use interaction::{
    InteractionReply, InteractionReplyData, InteractionResponseType, MessageResponse,
    PendingInteraction,
};
