//! Normalized store state
//!
//! The root [`DatabaseState`] holds one id-keyed map per entity kind plus
//! per-collection metadata and a few global fields. [`StateSnapshot`] is the
//! partial form used for hydration: every field is optional and defaulted,
//! so a snapshot missing a field (or a partially corrupt persisted blob)
//! falls back to the initial value for that field instead of failing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Module, QuizResult, User};

/// Version written alongside the persisted state, checked on load
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Async-load bookkeeping for one entity collection
///
/// The backing store is synchronous today; this models the read contract a
/// remote backend would need, so swapping one in later doesn't change
/// consumers. `error` records domain-level failures set by callers, never
/// persistence faults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityMetadata {
    pub loading: bool,
    pub error: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// One metadata record per entity collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub users: EntityMetadata,
    pub quiz_results: EntityMetadata,
    pub modules: EntityMetadata,
}

/// Root state of the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseState {
    pub users: HashMap<String, User>,
    pub quiz_results: HashMap<String, QuizResult>,
    pub modules: HashMap<String, Module>,
    pub metadata: Metadata,
    /// True once hydration has run (or been skipped)
    pub initialized: bool,
    /// When the state was last written to durable storage
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_sync: DateTime<Utc>,
    /// Schema version the state was written with
    pub version: String,
}

impl DatabaseState {
    /// The canonical empty initial state
    pub fn initial() -> Self {
        Self {
            users: HashMap::new(),
            quiz_results: HashMap::new(),
            modules: HashMap::new(),
            metadata: Metadata::default(),
            initialized: false,
            last_sync: DateTime::UNIX_EPOCH,
            version: SCHEMA_VERSION.to_string(),
        }
    }
}

impl Default for DatabaseState {
    fn default() -> Self {
        Self::initial()
    }
}

/// A possibly partial persisted state
///
/// Every field is optional; hydration overlays present fields onto
/// [`DatabaseState::initial`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateSnapshot {
    pub users: Option<HashMap<String, User>>,
    pub quiz_results: Option<HashMap<String, QuizResult>>,
    pub modules: Option<HashMap<String, Module>>,
    pub metadata: Option<Metadata>,
    pub initialized: Option<bool>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_sync: Option<DateTime<Utc>>,
    pub version: Option<String>,
}

impl StateSnapshot {
    /// Overlay this snapshot onto the canonical initial state
    ///
    /// Fields the snapshot doesn't carry keep their initial values. The
    /// result is never marked initialized here; hydration forces that flag
    /// itself.
    pub fn into_state(self) -> DatabaseState {
        let mut state = DatabaseState::initial();
        if let Some(users) = self.users {
            state.users = users;
        }
        if let Some(quiz_results) = self.quiz_results {
            state.quiz_results = quiz_results;
        }
        if let Some(modules) = self.modules {
            state.modules = modules;
        }
        if let Some(metadata) = self.metadata {
            state.metadata = metadata;
        }
        if let Some(initialized) = self.initialized {
            state.initialized = initialized;
        }
        if let Some(last_sync) = self.last_sync {
            state.last_sync = last_sync;
        }
        if let Some(version) = self.version {
            state.version = version;
        }
        state
    }
}

impl From<&DatabaseState> for StateSnapshot {
    fn from(state: &DatabaseState) -> Self {
        Self {
            users: Some(state.users.clone()),
            quiz_results: Some(state.quiz_results.clone()),
            modules: Some(state.modules.clone()),
            metadata: Some(state.metadata.clone()),
            initialized: Some(state.initialized),
            last_sync: Some(state.last_sync),
            version: Some(state.version.clone()),
        }
    }
}
