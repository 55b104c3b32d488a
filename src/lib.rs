//! # chatsieve
//!
//! A live chat splitter for streaming platforms, written in Rust. It joins a
//! Twitch channel anonymously and separates the chat into a primary stream
//! and a spam/noise stream with an ordered set of heuristic rules, while
//! flagging configured vocabulary words with suggested replacements.
//!
//! ## Features
//!
//! - **Ordered rule pipeline**: first enabled match wins, the rest never run
//! - **Stateful dedup**: copy-paste and per-user repeat detection over
//!   60-second sliding windows
//! - **Unicode-aware heuristics**: caps ratio, flood/laughter shapes,
//!   gibberish, foreign-alphabet detection across Latin and Cyrillic
//! - **Emote-aware**: native emote ranges, 7TV catalog lookups, and emoji
//!   tokens never count as noise
//! - **Externally configured**: YAML rule toggles and vocabulary, each rule
//!   switchable per call
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatsieve::prelude::*;
//! use chatsieve::classifier::emotes::EmoteCatalog;
//! use chatsieve::classifier::vocabulary::VocabularyTable;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TwitchConfig::from_env()?;
//!     let mut splitter = ChatSplitter::new(
//!         "viewer_name".to_string(),
//!         VocabularyTable::empty(),
//!         vec!["streamelements".to_string()],
//!         RuleToggles::all_enabled(),
//!         EmoteCatalog::new(),
//!     );
//!     splitter.add_connection(Box::new(TwitchConnection::new(config))).await;
//!     splitter.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod classifier;
pub mod config;
pub mod platforms;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::{ChatSplitter, StreamTarget};
    pub use crate::classifier::ClassificationEngine;
    pub use crate::platforms::{
        twitch::{TwitchConfig, TwitchConnection},
        PlatformConnection,
    };
    pub use crate::types::{
        ChatMessage, Highlight, MentionKind, RuleKey, RuleToggles, SpamReason, SpamVerdict, Tags,
    };
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
