//! Conversation orchestration: one transcript, one model, one tool session.
//!
//! [`ChatBot::chat`] appends the user's text, asks the model for a reply and,
//! while the reply requests tools, runs every requested tool through the
//! attached session and feeds the results back as a single user turn. The
//! first assistant turn without tool use ends the loop and its text is the
//! answer.

mod errors;
mod runner;


pub use errors::ChatError;
pub use runner::ChatBot;
