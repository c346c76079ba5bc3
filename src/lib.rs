//! # Regionlore
//!
//! Short regional history summaries from a generative-language API.
//!
//! ## Features
//!
//! - **One call**: [`generate_history`] turns a region name into summary text via Gemini
//! - **Pluggable provider**: anything implementing [`TextGenerator`] can stand in for Gemini
//! - **Auth collaborator**: Supabase email/password sign-in with a session subscription

pub mod agent;
pub mod auth;
pub mod config;
pub mod gemini;
pub mod prompt;
pub mod provider;

pub use agent::{generate_history, AgentError, HistoryAgent};
pub use auth::{AuthService, Credentials, Session, SupabaseAuth};
pub use config::Config;
pub use provider::{GenerationError, TextGenerator};
