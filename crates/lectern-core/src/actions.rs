//! Action vocabulary
//!
//! Every mutation of the store is a plain [`Action`] value fed through the
//! reducer. Partial updates travel as per-entity patch structs: a field of
//! `Option<T>` is applied only when present, and clearable entity fields use
//! `Option<Option<T>>`, where `Some(None)` clears the target. Building an
//! action never touches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Module, QuizResult, QuizScore, User, UserPreferences};
use crate::state::StateSnapshot;

/// Partial update for a [`User`]
///
/// Identity fields are clearable because the identity provider may stop
/// supplying them. The `updated_at` stamp is the reducer's job, not the
/// patch's.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPatch {
    pub email: Option<Option<String>>,
    pub display_name: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub preferences: Option<UserPreferences>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(display_name) = &self.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            user.avatar_url = avatar_url.clone();
        }
        if let Some(preferences) = &self.preferences {
            user.preferences = preferences.clone();
        }
    }
}

/// Partial update for a [`Module`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModulePatch {
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub last_accessed_at: Option<Option<DateTime<Utc>>>,
}

impl ModulePatch {
    /// Patch that marks a chapter completed as of now
    pub fn completed_now() -> Self {
        let now = Utc::now();
        Self {
            completed: Some(true),
            completed_at: Some(Some(now)),
            last_accessed_at: Some(Some(now)),
        }
    }

    /// Patch that clears completion, keeping the access stamp fresh
    pub fn incomplete_now() -> Self {
        Self {
            completed: Some(false),
            completed_at: Some(None),
            last_accessed_at: Some(Some(Utc::now())),
        }
    }

    pub fn apply(&self, module: &mut Module) {
        if let Some(completed) = self.completed {
            module.completed = completed;
        }
        if let Some(completed_at) = self.completed_at {
            module.completed_at = completed_at;
        }
        if let Some(last_accessed_at) = self.last_accessed_at {
            module.last_accessed_at = last_accessed_at;
        }
    }
}

/// Partial update for a [`QuizResult`]
///
/// Present for vocabulary symmetry; nothing in the application updates a
/// submission after the fact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuizResultPatch {
    pub score: Option<QuizScore>,
    pub answers: Option<std::collections::BTreeMap<u32, u32>>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl QuizResultPatch {
    pub fn apply(&self, result: &mut QuizResult) {
        if let Some(score) = self.score {
            result.score = score;
        }
        if let Some(answers) = &self.answers {
            result.answers = answers.clone();
        }
        if let Some(submitted_at) = self.submitted_at {
            result.submitted_at = submitted_at;
        }
    }
}

/// Everything the store can be asked to do
///
/// The vocabulary is symmetric per entity kind (add / update / delete /
/// batch add / batch delete / loading / error) plus a handful of global
/// lifecycle actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Action {
    // Users
    AddUser(User),
    UpdateUser { id: String, patch: UserPatch },
    DeleteUser(String),
    AddUsers(Vec<User>),
    DeleteUsers(Vec<String>),
    SetUsersLoading(bool),
    SetUsersError(Option<String>),

    // Quiz results
    AddQuizResult(QuizResult),
    UpdateQuizResult { id: String, patch: QuizResultPatch },
    DeleteQuizResult(String),
    AddQuizResults(Vec<QuizResult>),
    DeleteQuizResults(Vec<String>),
    SetQuizResultsLoading(bool),
    SetQuizResultsError(Option<String>),

    // Modules
    AddModule(Module),
    UpdateModule { id: String, patch: ModulePatch },
    DeleteModule(String),
    AddModules(Vec<Module>),
    DeleteModules(Vec<String>),
    SetModulesLoading(bool),
    SetModulesError(Option<String>),

    // Global
    Reset,
    Hydrate(StateSnapshot),
    SetInitialized(bool),
    SetLastSync(#[serde(with = "chrono::serde::ts_milliseconds")] DateTime<Utc>),
}
