//! State transitions
//!
//! [`reduce`] is a pure function from a state and an action to the next
//! state. The input is never mutated; `Some(next)` comes back exactly when
//! the action changed something, and `None` is the no-op case (update or
//! delete of a missing id, setting a flag to its current value). Callers
//! keep the old state untouched on `None`, which is what makes change-driven
//! persistence and memoization cheap.
//!
//! The action vocabulary is a closed enum, so there is no "unknown action"
//! arm; the type system discharges that case.

use chrono::Utc;

use crate::actions::Action;
use crate::state::DatabaseState;

/// Apply an action to a state, returning the next state if anything changed
pub fn reduce(state: &DatabaseState, action: &Action) -> Option<DatabaseState> {
    match action {
        // ==================== Users ====================
        Action::AddUser(user) => {
            // Upsert: an existing record with the same id is replaced whole.
            let mut next = state.clone();
            next.users.insert(user.id.clone(), user.clone());
            next.metadata.users.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::UpdateUser { id, patch } => {
            let existing = state.users.get(id)?;
            let mut updated = existing.clone();
            patch.apply(&mut updated);
            updated.updated_at = Utc::now();

            let mut next = state.clone();
            next.users.insert(id.clone(), updated);
            Some(next)
        }

        Action::DeleteUser(id) => {
            if !state.users.contains_key(id) {
                return None;
            }
            let mut next = state.clone();
            next.users.remove(id);
            Some(next)
        }

        Action::AddUsers(users) => {
            let mut next = state.clone();
            for user in users {
                next.users.insert(user.id.clone(), user.clone());
            }
            next.metadata.users.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::DeleteUsers(ids) => {
            if !ids.iter().any(|id| state.users.contains_key(id)) {
                return None;
            }
            let mut next = state.clone();
            for id in ids {
                next.users.remove(id);
            }
            Some(next)
        }

        Action::SetUsersLoading(loading) => {
            if state.metadata.users.loading == *loading {
                return None;
            }
            let mut next = state.clone();
            next.metadata.users.loading = *loading;
            Some(next)
        }

        Action::SetUsersError(error) => {
            if state.metadata.users.error == *error {
                return None;
            }
            let mut next = state.clone();
            next.metadata.users.error = error.clone();
            Some(next)
        }

        // ==================== Quiz results ====================
        Action::AddQuizResult(result) => {
            let mut next = state.clone();
            next.quiz_results.insert(result.id.clone(), result.clone());
            next.metadata.quiz_results.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::UpdateQuizResult { id, patch } => {
            // A submission is an immutable event: no updated_at stamp, and a
            // patch that changes nothing is a no-op.
            let existing = state.quiz_results.get(id)?;
            let mut updated = existing.clone();
            patch.apply(&mut updated);
            if updated == *existing {
                return None;
            }

            let mut next = state.clone();
            next.quiz_results.insert(id.clone(), updated);
            Some(next)
        }

        Action::DeleteQuizResult(id) => {
            if !state.quiz_results.contains_key(id) {
                return None;
            }
            let mut next = state.clone();
            next.quiz_results.remove(id);
            Some(next)
        }

        Action::AddQuizResults(results) => {
            let mut next = state.clone();
            for result in results {
                next.quiz_results.insert(result.id.clone(), result.clone());
            }
            next.metadata.quiz_results.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::DeleteQuizResults(ids) => {
            if !ids.iter().any(|id| state.quiz_results.contains_key(id)) {
                return None;
            }
            let mut next = state.clone();
            for id in ids {
                next.quiz_results.remove(id);
            }
            Some(next)
        }

        Action::SetQuizResultsLoading(loading) => {
            if state.metadata.quiz_results.loading == *loading {
                return None;
            }
            let mut next = state.clone();
            next.metadata.quiz_results.loading = *loading;
            Some(next)
        }

        Action::SetQuizResultsError(error) => {
            if state.metadata.quiz_results.error == *error {
                return None;
            }
            let mut next = state.clone();
            next.metadata.quiz_results.error = error.clone();
            Some(next)
        }

        // ==================== Modules ====================
        Action::AddModule(module) => {
            let mut next = state.clone();
            next.modules.insert(module.id.clone(), module.clone());
            next.metadata.modules.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::UpdateModule { id, patch } => {
            let existing = state.modules.get(id)?;
            let mut updated = existing.clone();
            patch.apply(&mut updated);
            updated.updated_at = Utc::now();

            let mut next = state.clone();
            next.modules.insert(id.clone(), updated);
            Some(next)
        }

        Action::DeleteModule(id) => {
            if !state.modules.contains_key(id) {
                return None;
            }
            let mut next = state.clone();
            next.modules.remove(id);
            Some(next)
        }

        Action::AddModules(modules) => {
            let mut next = state.clone();
            for module in modules {
                next.modules.insert(module.id.clone(), module.clone());
            }
            next.metadata.modules.last_sync = Some(Utc::now());
            Some(next)
        }

        Action::DeleteModules(ids) => {
            if !ids.iter().any(|id| state.modules.contains_key(id)) {
                return None;
            }
            let mut next = state.clone();
            for id in ids {
                next.modules.remove(id);
            }
            Some(next)
        }

        Action::SetModulesLoading(loading) => {
            if state.metadata.modules.loading == *loading {
                return None;
            }
            let mut next = state.clone();
            next.metadata.modules.loading = *loading;
            Some(next)
        }

        Action::SetModulesError(error) => {
            if state.metadata.modules.error == *error {
                return None;
            }
            let mut next = state.clone();
            next.metadata.modules.error = error.clone();
            Some(next)
        }

        // ==================== Global ====================
        Action::Reset => {
            let initial = DatabaseState::initial();
            if *state == initial {
                return None;
            }
            Some(initial)
        }

        Action::Hydrate(snapshot) => {
            let mut next = snapshot.clone().into_state();
            next.initialized = true;
            if next == *state {
                return None;
            }
            Some(next)
        }

        Action::SetInitialized(initialized) => {
            if state.initialized == *initialized {
                return None;
            }
            let mut next = state.clone();
            next.initialized = *initialized;
            Some(next)
        }

        Action::SetLastSync(timestamp) => {
            if state.last_sync == *timestamp {
                return None;
            }
            let mut next = state.clone();
            next.last_sync = *timestamp;
            Some(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ModulePatch, QuizResultPatch, UserPatch};
    use crate::models::{Module, QuizResult, QuizScore, Theme, User, UserPreferences};
    use crate::state::StateSnapshot;
    use std::collections::BTreeMap;

    fn state_with_user(id: &str) -> DatabaseState {
        let state = DatabaseState::initial();
        reduce(&state, &Action::AddUser(User::new(id))).unwrap()
    }

    #[test]
    fn test_add_user_upserts_and_bumps_metadata() {
        let state = DatabaseState::initial();
        let next = reduce(&state, &Action::AddUser(User::new("u1"))).unwrap();

        assert!(next.users.contains_key("u1"));
        assert!(next.metadata.users.last_sync.is_some());
        // Input untouched
        assert!(state.users.is_empty());
        assert!(state.metadata.users.last_sync.is_none());
    }

    #[test]
    fn test_add_twice_second_payload_wins_entirely() {
        let mut first = User::new("u1");
        first.email = Some("old@x.com".to_string());
        first.preferences.theme = Some(Theme::Dark);

        let mut second = User::new("u1");
        second.email = Some("new@x.com".to_string());

        let state = reduce(&DatabaseState::initial(), &Action::AddUser(first)).unwrap();
        let state = reduce(&state, &Action::AddUser(second)).unwrap();

        let user = &state.users["u1"];
        assert_eq!(user.email.as_deref(), Some("new@x.com"));
        // Full overwrite, not a merge: the old preferences are gone.
        assert!(user.preferences.theme.is_none());
        assert_eq!(state.users.len(), 1);
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let state = DatabaseState::initial();
        let action = Action::UpdateUser {
            id: "ghost".to_string(),
            patch: UserPatch::default(),
        };
        assert!(reduce(&state, &action).is_none());
    }

    #[test]
    fn test_update_merges_and_stamps_updated_at() {
        let state = state_with_user("u1");
        let before = state.users["u1"].clone();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let patch = UserPatch {
            email: Some(Some("a@x.com".to_string())),
            ..Default::default()
        };
        let next = reduce(
            &state,
            &Action::UpdateUser {
                id: "u1".to_string(),
                patch,
            },
        )
        .unwrap();

        let user = &next.users["u1"];
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
        assert_eq!(user.created_at, before.created_at);
        assert!(user.updated_at > before.updated_at);
    }

    #[test]
    fn test_update_preserves_other_fields() {
        let mut user = User::new("u1");
        user.email = Some("a@x.com".to_string());
        let state = reduce(&DatabaseState::initial(), &Action::AddUser(user)).unwrap();

        let patch = UserPatch {
            preferences: Some(UserPreferences {
                theme: Some(Theme::Dark),
                ..Default::default()
            }),
            ..Default::default()
        };
        let next = reduce(
            &state,
            &Action::UpdateUser {
                id: "u1".to_string(),
                patch,
            },
        )
        .unwrap();

        let updated = &next.users["u1"];
        assert_eq!(updated.email.as_deref(), Some("a@x.com"));
        assert_eq!(updated.preferences.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_quiz_result_update_does_not_stamp_time() {
        let result = QuizResult::new("u1", 1, QuizScore::from_counts(1, 2), BTreeMap::new());
        let id = result.id.clone();
        let created_at = result.created_at;
        let submitted_at = result.submitted_at;

        let state = reduce(&DatabaseState::initial(), &Action::AddQuizResult(result)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let patch = QuizResultPatch {
            score: Some(QuizScore::from_counts(2, 2)),
            ..Default::default()
        };
        let next = reduce(
            &state,
            &Action::UpdateQuizResult {
                id: id.clone(),
                patch,
            },
        )
        .unwrap();

        let updated = &next.quiz_results[&id];
        assert!(updated.score.is_perfect);
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.submitted_at, submitted_at);
    }

    #[test]
    fn test_quiz_result_empty_patch_is_noop() {
        let result = QuizResult::new("u1", 1, QuizScore::zero(), BTreeMap::new());
        let id = result.id.clone();
        let state = reduce(&DatabaseState::initial(), &Action::AddQuizResult(result)).unwrap();

        let action = Action::UpdateQuizResult {
            id,
            patch: QuizResultPatch::default(),
        };
        assert!(reduce(&state, &action).is_none());
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let state = DatabaseState::initial();
        assert!(reduce(&state, &Action::DeleteUser("ghost".to_string())).is_none());
        assert!(reduce(&state, &Action::DeleteModule("ghost".to_string())).is_none());
        assert!(reduce(&state, &Action::DeleteQuizResult("ghost".to_string())).is_none());
    }

    #[test]
    fn test_delete_removes_record() {
        let state = state_with_user("u1");
        let next = reduce(&state, &Action::DeleteUser("u1".to_string())).unwrap();
        assert!(next.users.is_empty());
        assert!(state.users.contains_key("u1"));
    }

    #[test]
    fn test_batch_add_later_entries_win() {
        let mut a = Module::new(1);
        a.mark_completed();
        let b = Module::new(1);

        let next = reduce(&DatabaseState::initial(), &Action::AddModules(vec![a, b])).unwrap();
        assert_eq!(next.modules.len(), 1);
        assert!(!next.modules["module-1"].completed);
        assert!(next.metadata.modules.last_sync.is_some());
    }

    #[test]
    fn test_batch_delete_ignores_missing_ids() {
        let state = state_with_user("u1");
        let next = reduce(
            &state,
            &Action::DeleteUsers(vec!["u1".to_string(), "ghost".to_string()]),
        )
        .unwrap();
        assert!(next.users.is_empty());
    }

    #[test]
    fn test_batch_delete_of_only_missing_ids_is_noop() {
        let state = state_with_user("u1");
        let action = Action::DeleteUsers(vec!["ghost".to_string()]);
        assert!(reduce(&state, &action).is_none());
    }

    #[test]
    fn test_set_loading_touches_only_one_metadata_branch() {
        let state = state_with_user("u1");
        let next = reduce(&state, &Action::SetModulesLoading(true)).unwrap();

        assert!(next.metadata.modules.loading);
        assert_eq!(next.metadata.users, state.metadata.users);
        assert_eq!(next.metadata.quiz_results, state.metadata.quiz_results);
        assert_eq!(next.users, state.users);
    }

    #[test]
    fn test_set_loading_same_value_is_noop() {
        let state = DatabaseState::initial();
        assert!(reduce(&state, &Action::SetUsersLoading(false)).is_none());
    }

    #[test]
    fn test_set_error_and_clear() {
        let state = DatabaseState::initial();
        let next = reduce(
            &state,
            &Action::SetQuizResultsError(Some("sync failed".to_string())),
        )
        .unwrap();
        assert_eq!(
            next.metadata.quiz_results.error.as_deref(),
            Some("sync failed")
        );

        let cleared = reduce(&next, &Action::SetQuizResultsError(None)).unwrap();
        assert!(cleared.metadata.quiz_results.error.is_none());
    }

    #[test]
    fn test_reset_returns_initial_state() {
        let state = state_with_user("u1");
        let next = reduce(&state, &Action::Reset).unwrap();
        assert_eq!(next, DatabaseState::initial());
    }

    #[test]
    fn test_reset_on_initial_state_is_noop() {
        let state = DatabaseState::initial();
        assert!(reduce(&state, &Action::Reset).is_none());
    }

    #[test]
    fn test_hydrate_empty_snapshot_yields_initialized_initial_state() {
        let state = DatabaseState::initial();
        let next = reduce(&state, &Action::Hydrate(StateSnapshot::default())).unwrap();

        let mut expected = DatabaseState::initial();
        expected.initialized = true;
        assert_eq!(next, expected);
    }

    #[test]
    fn test_hydrate_overlays_snapshot_and_forces_initialized() {
        let saved = state_with_user("u1");
        let mut snapshot = StateSnapshot::from(&saved);
        // Even a snapshot claiming "not initialized" comes up initialized.
        snapshot.initialized = Some(false);

        let next = reduce(&DatabaseState::initial(), &Action::Hydrate(snapshot)).unwrap();
        assert!(next.initialized);
        assert!(next.users.contains_key("u1"));
    }

    #[test]
    fn test_set_initialized_and_last_sync() {
        let state = DatabaseState::initial();
        let next = reduce(&state, &Action::SetInitialized(true)).unwrap();
        assert!(next.initialized);
        assert!(reduce(&next, &Action::SetInitialized(true)).is_none());

        let now = Utc::now();
        let stamped = reduce(&next, &Action::SetLastSync(now)).unwrap();
        assert_eq!(stamped.last_sync, now);
        assert!(reduce(&stamped, &Action::SetLastSync(now)).is_none());
    }

    #[test]
    fn test_unrelated_branches_survive_every_entity_action() {
        let state = state_with_user("u1");
        let module_action = Action::AddModule(Module::new(1));
        let next = reduce(&state, &module_action).unwrap();

        assert_eq!(next.users, state.users);
        assert_eq!(next.quiz_results, state.quiz_results);
        assert_eq!(next.metadata.users, state.metadata.users);
        assert_eq!(next.initialized, state.initialized);
    }
}
