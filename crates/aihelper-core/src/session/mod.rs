//! Chat session store — in-memory, bounded, per-key locked histories.
//!
//! A chat call locks its session, stages the new user message on a copy,
//! and commits the copy plus the assistant reply only once the provider
//! answered. A failed or cancelled call leaves the history untouched.

pub mod store;

pub use store::{truncate_history, ChatSessionStore, SessionLock};
