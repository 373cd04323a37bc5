//! Data models for Lectern
//!
//! Defines the core entities: User, Module (one per chapter), and QuizResult
//! (one per submission). All timestamps serialize as epoch milliseconds so
//! the persisted state blob stays numeric on the wire.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Color theme preference
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" => Ok(Theme::Auto),
            other => Err(format!("unknown theme '{}' (expected light, dark, or auto)", other)),
        }
    }
}

/// User preferences stored locally
///
/// Well-known keys are typed; anything else lands in `extra` so newer
/// preference keys survive a round-trip through an older build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    /// Forward-compatible escape hatch for keys this build doesn't know
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl UserPreferences {
    /// Overlay `other` on top of self, leaving fields `other` doesn't set untouched
    pub fn merge(&mut self, other: UserPreferences) {
        if let Some(theme) = other.theme {
            self.theme = Some(theme);
        }
        if let Some(notifications) = other.notifications {
            self.notifications = Some(notifications);
        }
        self.extra.extend(other.extra);
    }

    pub fn is_empty(&self) -> bool {
        self.theme.is_none() && self.notifications.is_none() && self.extra.is_empty()
    }
}

/// A locally tracked user profile
///
/// One record per authenticated identity. Identity fields (email, display
/// name, avatar) mirror the external provider; preferences are local-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Stable id from the identity provider
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given provider id
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            avatar_url: None,
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the email
    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
        self.updated_at = Utc::now();
    }

    /// Update the display name
    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
        self.updated_at = Utc::now();
    }

    /// Replace the preferences wholesale
    pub fn set_preferences(&mut self, preferences: UserPreferences) {
        self.preferences = preferences;
        self.updated_at = Utc::now();
    }
}

/// Completion status for one chapter
///
/// At most one record logically exists per chapter; lookups match on the
/// chapter number. Records are created lazily the first time a chapter is
/// marked completed and are never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub id: String,
    pub chapter: u32,
    pub completed: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Module {
    /// The conventional id for a chapter's module record
    pub fn id_for_chapter(chapter: u32) -> String {
        format!("module-{}", chapter)
    }

    /// Create a new, not-yet-completed module for a chapter
    pub fn new(chapter: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Self::id_for_chapter(chapter),
            chapter,
            completed: false,
            completed_at: None,
            last_accessed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark this chapter completed, stamping completion and access times
    pub fn mark_completed(&mut self) {
        let now = Utc::now();
        self.completed = true;
        self.completed_at = Some(now);
        self.last_accessed_at = Some(now);
        self.updated_at = now;
    }

    /// Mark this chapter not completed, clearing the completion time
    pub fn mark_incomplete(&mut self) {
        let now = Utc::now();
        self.completed = false;
        self.completed_at = None;
        self.last_accessed_at = Some(now);
        self.updated_at = now;
    }
}

/// Score summary for one quiz submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
    /// Rounded to the nearest whole percent
    pub percentage: u32,
    pub is_perfect: bool,
}

impl QuizScore {
    /// The score of an empty quiz: nothing right, nothing asked, not perfect
    pub fn zero() -> Self {
        Self {
            correct: 0,
            total: 0,
            percentage: 0,
            is_perfect: false,
        }
    }

    /// Grade selected answers against an answer key
    ///
    /// `answer_key[i]` is the correct option index for question `i`;
    /// `answers` maps question index to the selected option index.
    /// Unanswered questions count as wrong.
    pub fn grade(answer_key: &[u32], answers: &BTreeMap<u32, u32>) -> Self {
        if answer_key.is_empty() {
            return Self::zero();
        }

        let correct = answer_key
            .iter()
            .enumerate()
            .filter(|(idx, key)| answers.get(&(*idx as u32)) == Some(key))
            .count() as u32;

        Self::from_counts(correct, answer_key.len() as u32)
    }

    /// Build a score from raw correct/total counts
    pub fn from_counts(correct: u32, total: u32) -> Self {
        if total == 0 {
            return Self::zero();
        }
        let correct = correct.min(total);
        let percentage = ((correct as f64 / total as f64) * 100.0).round() as u32;
        Self {
            correct,
            total,
            percentage,
            is_perfect: correct == total,
        }
    }
}

/// One quiz submission
///
/// Append-only in normal use: retries create new records, and nothing ever
/// stamps an update time on an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizResult {
    pub id: String,
    /// The user who submitted
    pub user_id: String,
    pub chapter: u32,
    pub score: QuizScore,
    /// Question index -> selected option index
    #[serde(default)]
    pub answers: BTreeMap<u32, u32>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl QuizResult {
    /// Create a new submission record with a fresh id
    pub fn new(
        user_id: impl Into<String>,
        chapter: u32,
        score: QuizScore,
        answers: BTreeMap<u32, u32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            chapter,
            score,
            answers,
            submitted_at: now,
            created_at: now,
        }
    }
}
