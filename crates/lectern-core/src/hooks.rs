//! View-layer handles
//!
//! One handle per entity kind, borrowed from the store for the duration of
//! an interaction: current (optionally filtered) lists, loading/error
//! metadata, bound CRUD and batch operations, and the domain helpers the
//! application actually drives - marking chapters complete and recording
//! quiz submissions. Lists come from the store's cached projections, so
//! repeated reads between changes don't recompute.

use std::collections::BTreeMap;

use crate::actions::{Action, ModulePatch, QuizResultPatch, UserPatch};
use crate::models::{Module, QuizResult, QuizScore, User, UserPreferences};
use crate::selectors;
use crate::store::Store;

/// User reads and operations
pub struct UsersHandle<'a> {
    store: &'a mut Store,
}

impl<'a> UsersHandle<'a> {
    pub(crate) fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// All users, oldest first
    pub fn list(&mut self) -> Vec<User> {
        self.store.cached_users()
    }

    pub fn by_id(&self, user_id: &str) -> Option<&User> {
        selectors::user_by_id(self.store.state(), user_id)
    }

    pub fn loading(&self) -> bool {
        self.store.state().metadata.users.loading
    }

    pub fn error(&self) -> Option<String> {
        self.store.state().metadata.users.error.clone()
    }

    pub fn add(&mut self, user: User) -> bool {
        self.store.dispatch(Action::AddUser(user))
    }

    pub fn update(&mut self, user_id: &str, patch: UserPatch) -> bool {
        self.store.dispatch(Action::UpdateUser {
            id: user_id.to_string(),
            patch,
        })
    }

    pub fn delete(&mut self, user_id: &str) -> bool {
        self.store.dispatch(Action::DeleteUser(user_id.to_string()))
    }

    pub fn add_many(&mut self, users: Vec<User>) -> bool {
        self.store.dispatch(Action::AddUsers(users))
    }

    pub fn delete_many(&mut self, user_ids: Vec<String>) -> bool {
        self.store.dispatch(Action::DeleteUsers(user_ids))
    }

    pub fn set_loading(&mut self, loading: bool) -> bool {
        self.store.dispatch(Action::SetUsersLoading(loading))
    }

    pub fn set_error(&mut self, error: Option<String>) -> bool {
        self.store.dispatch(Action::SetUsersError(error))
    }

    /// Merge preferences over the user's current ones
    ///
    /// Keys the incoming value doesn't set are preserved. Returns false if
    /// the user doesn't exist.
    pub fn update_preferences(&mut self, user_id: &str, preferences: UserPreferences) -> bool {
        let Some(existing) = self.store.state().users.get(user_id) else {
            return false;
        };
        let mut merged = existing.preferences.clone();
        merged.merge(preferences);

        self.update(
            user_id,
            UserPatch {
                preferences: Some(merged),
                ..Default::default()
            },
        )
    }
}

/// Module (chapter completion) reads and operations
pub struct ModulesHandle<'a> {
    store: &'a mut Store,
}

impl<'a> ModulesHandle<'a> {
    pub(crate) fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// All modules, by chapter number
    pub fn list(&mut self) -> Vec<Module> {
        self.store.cached_modules()
    }

    /// Modules whose chapter is completed, by chapter number
    pub fn completed(&mut self) -> Vec<Module> {
        self.store.cached_completed_modules()
    }

    pub fn by_id(&self, module_id: &str) -> Option<&Module> {
        selectors::module_by_id(self.store.state(), module_id)
    }

    pub fn by_chapter(&self, chapter: u32) -> Option<&Module> {
        selectors::module_by_chapter(self.store.state(), chapter)
    }

    pub fn is_chapter_completed(&self, chapter: u32) -> bool {
        self.by_chapter(chapter)
            .map(|module| module.completed)
            .unwrap_or(false)
    }

    /// Chapter numbers with completed modules, ascending
    pub fn completed_chapter_numbers(&mut self) -> Vec<u32> {
        self.completed()
            .into_iter()
            .map(|module| module.chapter)
            .collect()
    }

    pub fn loading(&self) -> bool {
        self.store.state().metadata.modules.loading
    }

    pub fn error(&self) -> Option<String> {
        self.store.state().metadata.modules.error.clone()
    }

    pub fn add(&mut self, module: Module) -> bool {
        self.store.dispatch(Action::AddModule(module))
    }

    pub fn update(&mut self, module_id: &str, patch: ModulePatch) -> bool {
        self.store.dispatch(Action::UpdateModule {
            id: module_id.to_string(),
            patch,
        })
    }

    pub fn delete(&mut self, module_id: &str) -> bool {
        self.store.dispatch(Action::DeleteModule(module_id.to_string()))
    }

    pub fn add_many(&mut self, modules: Vec<Module>) -> bool {
        self.store.dispatch(Action::AddModules(modules))
    }

    pub fn delete_many(&mut self, module_ids: Vec<String>) -> bool {
        self.store.dispatch(Action::DeleteModules(module_ids))
    }

    pub fn set_loading(&mut self, loading: bool) -> bool {
        self.store.dispatch(Action::SetModulesLoading(loading))
    }

    pub fn set_error(&mut self, error: Option<String>) -> bool {
        self.store.dispatch(Action::SetModulesError(error))
    }

    /// Mark a chapter completed, creating its module record on first use
    ///
    /// The generic update path never creates; this domain helper does, so
    /// completing a chapter works before any record exists. Calling it
    /// again refreshes the same record - never a duplicate.
    pub fn mark_chapter_completed(&mut self, chapter: u32) {
        let module_id = Module::id_for_chapter(chapter);
        if self.store.state().modules.contains_key(&module_id) {
            self.update(&module_id, ModulePatch::completed_now());
        } else {
            let mut module = Module::new(chapter);
            module.mark_completed();
            self.add(module);
        }
    }

    /// Mark a chapter not completed
    ///
    /// Update-only: a chapter that was never completed has no record and
    /// nothing happens.
    pub fn mark_chapter_incomplete(&mut self, chapter: u32) {
        let module_id = Module::id_for_chapter(chapter);
        if self.store.state().modules.contains_key(&module_id) {
            self.update(&module_id, ModulePatch::incomplete_now());
        }
    }
}

/// Quiz result reads and operations
pub struct QuizResultsHandle<'a> {
    store: &'a mut Store,
}

impl<'a> QuizResultsHandle<'a> {
    pub(crate) fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// All results, oldest submission first
    pub fn list(&mut self) -> Vec<QuizResult> {
        self.store.cached_quiz_results(None, None)
    }

    /// Results filtered by user and/or chapter
    pub fn filtered(&mut self, user_id: Option<&str>, chapter: Option<u32>) -> Vec<QuizResult> {
        self.store.cached_quiz_results(user_id, chapter)
    }

    pub fn for_user(&mut self, user_id: &str) -> Vec<QuizResult> {
        self.filtered(Some(user_id), None)
    }

    pub fn for_chapter(&mut self, chapter: u32) -> Vec<QuizResult> {
        self.filtered(None, Some(chapter))
    }

    pub fn for_user_and_chapter(&mut self, user_id: &str, chapter: u32) -> Vec<QuizResult> {
        self.filtered(Some(user_id), Some(chapter))
    }

    pub fn by_id(&self, result_id: &str) -> Option<&QuizResult> {
        selectors::quiz_result_by_id(self.store.state(), result_id)
    }

    pub fn loading(&self) -> bool {
        self.store.state().metadata.quiz_results.loading
    }

    pub fn error(&self) -> Option<String> {
        self.store.state().metadata.quiz_results.error.clone()
    }

    pub fn add(&mut self, result: QuizResult) -> bool {
        self.store.dispatch(Action::AddQuizResult(result))
    }

    pub fn update(&mut self, result_id: &str, patch: QuizResultPatch) -> bool {
        self.store.dispatch(Action::UpdateQuizResult {
            id: result_id.to_string(),
            patch,
        })
    }

    pub fn delete(&mut self, result_id: &str) -> bool {
        self.store
            .dispatch(Action::DeleteQuizResult(result_id.to_string()))
    }

    pub fn add_many(&mut self, results: Vec<QuizResult>) -> bool {
        self.store.dispatch(Action::AddQuizResults(results))
    }

    pub fn delete_many(&mut self, result_ids: Vec<String>) -> bool {
        self.store.dispatch(Action::DeleteQuizResults(result_ids))
    }

    pub fn set_loading(&mut self, loading: bool) -> bool {
        self.store.dispatch(Action::SetQuizResultsLoading(loading))
    }

    pub fn set_error(&mut self, error: Option<String>) -> bool {
        self.store.dispatch(Action::SetQuizResultsError(error))
    }

    /// Grade a submission against an answer key and append it
    pub fn submit(
        &mut self,
        user_id: &str,
        chapter: u32,
        answer_key: &[u32],
        answers: BTreeMap<u32, u32>,
    ) -> QuizResult {
        let score = QuizScore::grade(answer_key, &answers);
        self.record(user_id, chapter, score, answers)
    }

    /// Append an already graded submission
    pub fn record(
        &mut self,
        user_id: &str,
        chapter: u32,
        score: QuizScore,
        answers: BTreeMap<u32, u32>,
    ) -> QuizResult {
        let result = QuizResult::new(user_id, chapter, score, answers);
        self.add(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Theme;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> Store {
        let mut store = Store::open_with_config(Config {
            data_dir: temp_dir.path().to_path_buf(),
            debounce_ms: 300,
        });
        store.hydrate();
        store
    }

    #[test]
    fn test_mark_chapter_completed_creates_exactly_one_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().mark_chapter_completed(3);

        let mut modules = store.modules();
        assert_eq!(modules.list().len(), 1);
        let module = modules.by_chapter(3).unwrap();
        assert!(module.completed);
        assert_eq!(module.chapter, 3);
        assert!(module.completed_at.is_some());
        assert!(module.last_accessed_at.is_some());
    }

    #[test]
    fn test_mark_chapter_completed_twice_updates_same_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().mark_chapter_completed(3);
        let created_at = store.modules().by_chapter(3).unwrap().created_at;

        store.modules().mark_chapter_completed(3);

        let mut modules = store.modules();
        assert_eq!(modules.list().len(), 1);
        let module = modules.by_chapter(3).unwrap();
        assert!(module.completed);
        assert_eq!(module.created_at, created_at);
    }

    #[test]
    fn test_mark_chapter_incomplete_clears_completion() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().mark_chapter_completed(2);
        store.modules().mark_chapter_incomplete(2);

        let modules = store.modules();
        let module = modules.by_chapter(2).unwrap();
        assert!(!module.completed);
        assert!(module.completed_at.is_none());
        assert!(module.last_accessed_at.is_some());
    }

    #[test]
    fn test_mark_chapter_incomplete_without_record_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().mark_chapter_incomplete(7);
        assert!(store.modules().list().is_empty());
    }

    #[test]
    fn test_is_chapter_completed_and_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().mark_chapter_completed(4);
        store.modules().mark_chapter_completed(1);

        let mut modules = store.modules();
        assert!(modules.is_chapter_completed(1));
        assert!(!modules.is_chapter_completed(2));
        assert_eq!(modules.completed_chapter_numbers(), vec![1, 4]);
    }

    #[test]
    fn test_submit_grades_and_appends() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        let key = vec![1, 0, 2];
        let mut answers = BTreeMap::new();
        answers.insert(0, 1);
        answers.insert(1, 0);
        answers.insert(2, 2);

        let result = store.quiz_results().submit("u1", 2, &key, answers);
        assert!(result.score.is_perfect);
        assert_eq!(result.score.percentage, 100);

        let stored = store.quiz_results().for_user_and_chapter("u1", 2);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, result.id);
    }

    #[test]
    fn test_retries_append_many_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        for correct in [1, 2, 3] {
            store.quiz_results().record(
                "u1",
                1,
                QuizScore::from_counts(correct, 3),
                BTreeMap::new(),
            );
        }

        assert_eq!(store.quiz_results().for_user_and_chapter("u1", 1).len(), 3);
        assert_eq!(store.quiz_results().for_chapter(1).len(), 3);
    }

    #[test]
    fn test_filtered_results_by_user() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store
            .quiz_results()
            .record("u1", 1, QuizScore::from_counts(1, 2), BTreeMap::new());
        store
            .quiz_results()
            .record("u2", 1, QuizScore::from_counts(2, 2), BTreeMap::new());

        let mut results = store.quiz_results();
        assert_eq!(results.list().len(), 2);
        assert_eq!(results.for_user("u1").len(), 1);
        assert_eq!(results.for_user("u2").len(), 1);
        assert!(results.for_user("ghost").is_empty());
    }

    #[test]
    fn test_update_preferences_preserves_other_fields() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        let mut user = User::new("u1");
        user.email = Some("a@x.com".to_string());
        store.users().add(user);

        let changed = store.users().update_preferences(
            "u1",
            UserPreferences {
                theme: Some(Theme::Dark),
                ..Default::default()
            },
        );
        assert!(changed);

        let users = store.users();
        let user = users.by_id("u1").unwrap();
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
        assert_eq!(user.preferences.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_update_preferences_merges_incrementally() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.users().add(User::new("u1"));
        store.users().update_preferences(
            "u1",
            UserPreferences {
                theme: Some(Theme::Light),
                ..Default::default()
            },
        );
        store.users().update_preferences(
            "u1",
            UserPreferences {
                notifications: Some(true),
                ..Default::default()
            },
        );

        let users = store.users();
        let prefs = &users.by_id("u1").unwrap().preferences;
        assert_eq!(prefs.theme, Some(Theme::Light));
        assert_eq!(prefs.notifications, Some(true));
    }

    #[test]
    fn test_update_preferences_for_missing_user() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        assert!(!store.users().update_preferences("ghost", UserPreferences::default()));
    }

    #[test]
    fn test_metadata_surface() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store.modules().set_loading(true);
        store.modules().set_error(Some("import failed".to_string()));

        let modules = store.modules();
        assert!(modules.loading());
        assert_eq!(modules.error().as_deref(), Some("import failed"));

        // Other collections untouched
        assert!(!store.users().loading());
        assert!(store.quiz_results().error().is_none());
    }

    #[test]
    fn test_batch_operations() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);

        store
            .modules()
            .add_many(vec![Module::new(1), Module::new(2), Module::new(3)]);
        assert_eq!(store.modules().list().len(), 3);

        store
            .modules()
            .delete_many(vec!["module-1".to_string(), "module-3".to_string()]);
        let mut modules = store.modules();
        let remaining = modules.list();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].chapter, 2);
    }
}
