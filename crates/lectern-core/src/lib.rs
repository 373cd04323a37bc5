//! Lectern Core Library
//!
//! This crate provides the core functionality for Lectern, a local-first
//! store for learning progress: chapters completed and quiz attempts
//! recorded per authenticated user.
//!
//! # Architecture
//!
//! - A normalized, reducer-driven state container is the source of truth
//!   for the running session
//! - Durable storage is a best-effort mirror: debounced JSON writes,
//!   hydrated back on startup
//! - An external identity provider supplies the session user; the store
//!   reconciles a local record from it
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//! store.hydrate();
//! store.sync_session(Some(&session));
//!
//! // Mark a chapter done
//! store.modules().mark_chapter_completed(3);
//!
//! // Record a quiz attempt
//! let result = store.quiz_results().submit("u1", 3, &answer_key, answers);
//! ```
//!
//! # Modules
//!
//! - `store`: the state container and lifecycle (main entry point)
//! - `models`: User, Module, and QuizResult entities
//! - `state`: normalized root state and snapshots
//! - `actions` / `reducer`: the mutation vocabulary and transition function
//! - `hooks` / `selectors`: read projections and bound operations
//! - `storage`: persistence adapter and debounced write scheduling
//! - `identity`: the consumed identity-session contract
//! - `config`: application configuration

pub mod actions;
pub mod config;
pub mod hooks;
pub mod identity;
pub mod models;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod storage;
pub mod store;

pub use actions::{Action, ModulePatch, QuizResultPatch, UserPatch};
pub use config::Config;
pub use hooks::{ModulesHandle, QuizResultsHandle, UsersHandle};
pub use identity::SessionUser;
pub use models::{Module, QuizResult, QuizScore, Theme, User, UserPreferences};
pub use reducer::reduce;
pub use state::{DatabaseState, EntityMetadata, Metadata, StateSnapshot, SCHEMA_VERSION};
pub use storage::{StatePersistence, StorageError};
pub use store::{Revisions, Store};
