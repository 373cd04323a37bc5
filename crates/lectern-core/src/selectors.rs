//! Read projections over the store state
//!
//! Pure functions: borrow the state, never dispatch. List selectors return
//! deterministically ordered vectors because the backing maps are unordered.
//! [`Cached`] is the memoization building block the hook layer uses so that
//! unrelated state changes never force recomputation.

use crate::models::{Module, QuizResult, User};
use crate::state::DatabaseState;

/// All users, oldest first
pub fn all_users(state: &DatabaseState) -> Vec<&User> {
    let mut users: Vec<&User> = state.users.values().collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    users
}

pub fn user_by_id<'a>(state: &'a DatabaseState, user_id: &str) -> Option<&'a User> {
    state.users.get(user_id)
}

/// All quiz results, oldest submission first
pub fn all_quiz_results(state: &DatabaseState) -> Vec<&QuizResult> {
    let mut results: Vec<&QuizResult> = state.quiz_results.values().collect();
    results.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    results
}

pub fn quiz_result_by_id<'a>(state: &'a DatabaseState, result_id: &str) -> Option<&'a QuizResult> {
    state.quiz_results.get(result_id)
}

pub fn quiz_results_by_user<'a>(state: &'a DatabaseState, user_id: &str) -> Vec<&'a QuizResult> {
    all_quiz_results(state)
        .into_iter()
        .filter(|result| result.user_id == user_id)
        .collect()
}

pub fn quiz_results_by_chapter(state: &DatabaseState, chapter: u32) -> Vec<&QuizResult> {
    all_quiz_results(state)
        .into_iter()
        .filter(|result| result.chapter == chapter)
        .collect()
}

pub fn quiz_results_by_user_and_chapter<'a>(
    state: &'a DatabaseState,
    user_id: &str,
    chapter: u32,
) -> Vec<&'a QuizResult> {
    all_quiz_results(state)
        .into_iter()
        .filter(|result| result.user_id == user_id && result.chapter == chapter)
        .collect()
}

/// All modules, by chapter number
pub fn all_modules(state: &DatabaseState) -> Vec<&Module> {
    let mut modules: Vec<&Module> = state.modules.values().collect();
    modules.sort_by(|a, b| a.chapter.cmp(&b.chapter).then_with(|| a.id.cmp(&b.id)));
    modules
}

pub fn module_by_id<'a>(state: &'a DatabaseState, module_id: &str) -> Option<&'a Module> {
    state.modules.get(module_id)
}

/// First module matching a chapter number
///
/// At most one exists by convention; with duplicates the lowest id wins so
/// the answer is stable.
pub fn module_by_chapter(state: &DatabaseState, chapter: u32) -> Option<&Module> {
    all_modules(state)
        .into_iter()
        .find(|module| module.chapter == chapter)
}

/// Modules whose chapter has been completed, by chapter number
pub fn completed_modules(state: &DatabaseState) -> Vec<&Module> {
    all_modules(state)
        .into_iter()
        .filter(|module| module.completed)
        .collect()
}

/// Single-slot memo cache
///
/// Holds one computed value together with the key it was computed for;
/// recomputes only when the key changes. Keys are revision counters plus
/// any filter parameters, so a hit costs one comparison and a clone.
#[derive(Debug, Default)]
pub struct Cached<K, V> {
    entry: Option<(K, V)>,
}

impl<K: PartialEq, V: Clone> Cached<K, V> {
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some((cached_key, value)) = &self.entry {
            if *cached_key == key {
                return value.clone();
            }
        }
        let value = compute();
        self.entry = Some((key, value.clone()));
        value
    }

    /// Whether the cache currently holds a value for this key
    pub fn is_fresh(&self, key: &K) -> bool {
        matches!(&self.entry, Some((cached_key, _)) if cached_key == key)
    }
}
