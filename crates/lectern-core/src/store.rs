//! The store
//!
//! [`Store`] owns the state and is the only thing that changes it: every
//! mutation goes through [`Store::dispatch`] and the reducer. An instance is
//! constructed explicitly and injected wherever reads and dispatches happen;
//! there is no ambient singleton.
//!
//! ## Lifecycle
//!
//! ```ignore
//! let mut store = Store::open()?;   // probe storage, start the writer
//! store.hydrate();                  // load saved state, mark initialized
//! store.sync_session(session);     // reconcile the identity session
//! // ... dispatch / read through hooks ...
//! store.flush();                    // force any pending write (Drop also does)
//! ```
//!
//! ## Persistence
//!
//! After initialization, every state change schedules a debounced durable
//! write; a burst of dispatches produces one write carrying the final
//! state. Write completions stamp `last_sync`, applied cooperatively on the
//! next store interaction - the reducer stays the single writer of state.
//! If the storage probe fails at open, the store runs memory-only and all
//! of this is skipped.

use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::actions::{Action, UserPatch};
use crate::config::Config;
use crate::hooks::{ModulesHandle, QuizResultsHandle, UsersHandle};
use crate::identity::SessionUser;
use crate::models::{Module, QuizResult, User};
use crate::reducer::reduce;
use crate::selectors::{self, Cached};
use crate::state::DatabaseState;
use crate::storage::{DebouncedWriter, StatePersistence};

/// Per-branch change counters
///
/// A branch's counter moves exactly when that branch's content (entities or
/// their metadata) changes; `global` moves on every change. These are the
/// memoization keys for the cached selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revisions {
    pub users: u64,
    pub quiz_results: u64,
    pub modules: u64,
    pub global: u64,
}

#[derive(Default)]
struct SelectorCache {
    users: Cached<u64, Vec<User>>,
    modules: Cached<u64, Vec<Module>>,
    completed_modules: Cached<u64, Vec<Module>>,
    quiz_results: Cached<(u64, Option<String>, Option<u32>), Vec<QuizResult>>,
}

/// Reducer-driven state container with debounced persistence
pub struct Store {
    state: DatabaseState,
    revisions: Revisions,
    cache: SelectorCache,
    config: Config,
    persistence: Arc<StatePersistence>,
    writer: Option<DebouncedWriter>,
    write_completions: Option<mpsc::Receiver<DateTime<Utc>>>,
    storage_available: bool,
}

impl Store {
    /// Open a store with configuration from the default location
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Ok(Self::open_with_config(config))
    }

    /// Open a store with a specific configuration
    ///
    /// Probes durable storage once; when the probe fails the store runs
    /// memory-only for the session and no writer thread is started.
    pub fn open_with_config(config: Config) -> Self {
        let persistence = Arc::new(StatePersistence::new(config.clone()));
        let storage_available = persistence.is_available();

        let (writer, write_completions) = if storage_available {
            let (tx, rx) = mpsc::channel();
            let sink = persistence.clone();
            let writer = DebouncedWriter::new(config.debounce(), move |state| {
                sink.save(state);
                let _ = tx.send(Utc::now());
            });
            (Some(writer), Some(rx))
        } else {
            (None, None)
        };

        Self {
            state: DatabaseState::initial(),
            revisions: Revisions::default(),
            cache: SelectorCache::default(),
            config,
            persistence,
            writer,
            write_completions,
            storage_available,
        }
    }

    /// Load saved state and mark the store initialized
    ///
    /// Call once after opening. With storage unavailable this skips straight
    /// to marking the store initialized; otherwise a saved snapshot (if any)
    /// is hydrated first.
    pub fn hydrate(&mut self) {
        if !self.storage_available {
            warn!("durable storage unavailable; state will not persist this session");
            self.apply(Action::SetInitialized(true));
            return;
        }

        if let Some(snapshot) = self.persistence.load() {
            debug!("hydrating from saved state");
            self.apply(Action::Hydrate(snapshot));
        }
        self.apply(Action::SetInitialized(true));
    }

    /// Run an action through the reducer
    ///
    /// Returns whether the state changed. Changes after initialization
    /// schedule a debounced durable write of the new state.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.poll_persistence();
        self.apply(action)
    }

    fn apply(&mut self, action: Action) -> bool {
        let Some(next) = reduce(&self.state, &action) else {
            return false;
        };

        if next.users != self.state.users || next.metadata.users != self.state.metadata.users {
            self.revisions.users += 1;
        }
        if next.modules != self.state.modules
            || next.metadata.modules != self.state.metadata.modules
        {
            self.revisions.modules += 1;
        }
        if next.quiz_results != self.state.quiz_results
            || next.metadata.quiz_results != self.state.metadata.quiz_results
        {
            self.revisions.quiz_results += 1;
        }
        self.revisions.global += 1;

        // The last-sync stamp records a completed write; writing again for
        // it would re-arm the debounce forever.
        let skip_save = matches!(action, Action::SetLastSync(_));
        self.state = next;

        if !skip_save && self.state.initialized {
            self.schedule_save();
        }
        true
    }

    fn schedule_save(&self) {
        if let Some(writer) = &self.writer {
            writer.schedule(self.state.clone());
        }
    }

    /// Apply any write-completion stamps the worker has reported
    ///
    /// Runs automatically at each dispatch; call directly when idle to pick
    /// up a `last_sync` bump without dispatching anything else.
    pub fn poll_persistence(&mut self) {
        if let Some(timestamp) = self.drain_completions() {
            self.apply(Action::SetLastSync(timestamp));
        }
    }

    fn drain_completions(&mut self) -> Option<DateTime<Utc>> {
        let rx = self.write_completions.as_ref()?;
        let mut latest = None;
        while let Ok(timestamp) = rx.try_recv() {
            latest = Some(timestamp);
        }
        latest
    }

    /// Write any pending state now and stamp the completion
    pub fn flush(&mut self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
        self.poll_persistence();
    }

    /// Discard all state and clear durable storage
    pub fn reset(&mut self) {
        if let Some(writer) = &self.writer {
            // Drop any pending write so it can't resurrect the old state
            writer.cancel();
        }
        let _ = self.drain_completions();
        self.apply(Action::Reset);
        self.persistence.clear();
    }

    /// Reconcile the local user record with the identity session
    ///
    /// Call whenever the session value changes. No session means no action:
    /// logging out keeps local history for the next session. A session with
    /// no local record creates one; an existing record gets its identity
    /// fields overwritten from the session while preferences and other
    /// local-only fields stay untouched.
    pub fn sync_session(&mut self, session: Option<&SessionUser>) {
        let Some(session) = session else {
            return;
        };

        if self.state.users.contains_key(&session.id) {
            let patch = UserPatch {
                email: Some(session.email.clone()),
                display_name: Some(session.display_name.clone()),
                avatar_url: Some(session.avatar_url.clone()),
                preferences: None,
            };
            self.dispatch(Action::UpdateUser {
                id: session.id.clone(),
                patch,
            });
        } else {
            debug!(id = %session.id, "creating local record for new session identity");
            self.dispatch(Action::AddUser(User::from(session)));
        }
    }

    // ==================== Reads ====================

    /// The current state
    pub fn state(&self) -> &DatabaseState {
        &self.state
    }

    /// Current per-branch revision counters
    pub fn revisions(&self) -> Revisions {
        self.revisions
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether durable storage passed the availability probe at open
    pub fn storage_available(&self) -> bool {
        self.storage_available
    }

    /// Whether hydration has run
    pub fn initialized(&self) -> bool {
        self.state.initialized
    }

    // ==================== Hooks ====================

    /// User operations and reads
    pub fn users(&mut self) -> UsersHandle<'_> {
        UsersHandle::new(self)
    }

    /// Module operations and reads
    pub fn modules(&mut self) -> ModulesHandle<'_> {
        ModulesHandle::new(self)
    }

    /// Quiz result operations and reads
    pub fn quiz_results(&mut self) -> QuizResultsHandle<'_> {
        QuizResultsHandle::new(self)
    }

    // ==================== Cached projections ====================

    pub(crate) fn cached_users(&mut self) -> Vec<User> {
        let state = &self.state;
        self.cache.users.get_or_compute(self.revisions.users, || {
            selectors::all_users(state).into_iter().cloned().collect()
        })
    }

    pub(crate) fn cached_modules(&mut self) -> Vec<Module> {
        let state = &self.state;
        self.cache
            .modules
            .get_or_compute(self.revisions.modules, || {
                selectors::all_modules(state).into_iter().cloned().collect()
            })
    }

    pub(crate) fn cached_completed_modules(&mut self) -> Vec<Module> {
        let state = &self.state;
        self.cache
            .completed_modules
            .get_or_compute(self.revisions.modules, || {
                selectors::completed_modules(state)
                    .into_iter()
                    .cloned()
                    .collect()
            })
    }

    pub(crate) fn cached_quiz_results(
        &mut self,
        user_id: Option<&str>,
        chapter: Option<u32>,
    ) -> Vec<QuizResult> {
        let state = &self.state;
        let key = (
            self.revisions.quiz_results,
            user_id.map(str::to_string),
            chapter,
        );
        self.cache.quiz_results.get_or_compute(key, || {
            selectors::all_quiz_results(state)
                .into_iter()
                .filter(|result| user_id.map_or(true, |id| result.user_id == id))
                .filter(|result| chapter.map_or(true, |ch| result.chapter == ch))
                .cloned()
                .collect()
        })
    }
}
