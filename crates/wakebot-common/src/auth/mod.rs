//! Bot credential handling

mod bot_token;

pub use bot_token::BotToken;
