//! Relocator module - moves support requests out of the chat channel into forum threads.

pub mod api;
pub mod discord;
pub mod engine;
pub mod error;
pub mod message;
pub mod span;


pub use api::{ApiError, ChatApi};
pub use discord::{DiscordClient, to_trigger_event};
pub use engine::{Outcome, Relocation, RelocatorConfig, SupportRelocator};
pub use error::RelocationError;
