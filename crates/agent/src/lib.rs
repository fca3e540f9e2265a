//! Reply agent - prompt construction and model orchestration
//!
//! This crate turns one inbound WhatsApp message into one structured reply:
//! - Builds the system and user prompts from the agent profile (`prompt`)
//! - Calls an OpenAI-compatible chat endpoint in JSON mode (`llm`)
//! - Normalizes the model output or falls back deterministically (`reply`)
//!
//! # Key Types
//!
//! - `ReplyGenerator` - the single entry point used by every transport
//! - `ModelCapability` - the injected model client, or `Unavailable`
//! - `ChatModel` - pluggable trait so tests and other providers can stand in
//!
//! # Failure Principle
//!
//! The model is optional and untrusted. Generation never returns an error;
//! every failure path resolves to the fallback reply.

pub mod llm;
pub mod prompt;
pub mod reply;

pub use llm::{ChatModel, ModelCapability, ModelError, OpenAiChatModel};
pub use reply::{fallback_reply, ReplyGenerator};
