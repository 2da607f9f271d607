//! Scripted conversation: prompts, canned texts, and the per-turn engine.

pub mod flow;
pub mod messages;
pub mod prompts;
pub mod responder;

pub use flow::{handle_turn, ChatReply};
pub use responder::Responder;
