//! Identity session handling
//!
//! The CLI stands in for the external identity provider: the "session" is a
//! small JSON file in the data directory holding the identity fields the
//! store consumes. Logging in writes it and reconciles the store; logging
//! out only removes it - local history is kept for the next session.

use std::fs;

use anyhow::{Context, Result};
use tracing::warn;

use lectern_core::{Config, SessionUser, Store};

use crate::output::Output;

/// Load the current session, if any
///
/// An unreadable or unparsable session file is treated as logged out.
pub fn load(config: &Config) -> Option<SessionUser> {
    let path = config.session_path();
    if !path.exists() {
        return None;
    }

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(?path, %err, "failed to read session file; treating as logged out");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!(?path, %err, "session file is unparsable; treating as logged out");
            None
        }
    }
}

/// Log in: persist the session and reconcile the local user record
pub fn login(
    store: &mut Store,
    config: &Config,
    id: String,
    email: Option<String>,
    name: Option<String>,
    avatar: Option<String>,
    output: &Output,
) -> Result<()> {
    let session = SessionUser {
        id,
        email,
        display_name: name,
        avatar_url: avatar,
    };

    let path = config.session_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }
    let json = serde_json::to_vec_pretty(&session).context("Failed to serialize session")?;
    fs::write(&path, json).with_context(|| format!("Failed to write session to {:?}", path))?;

    store.sync_session(Some(&session));

    if !output.is_quiet() {
        println!(
            "Logged in as {} ({})",
            session.display_name.as_deref().unwrap_or(&session.id),
            session.id
        );
    }
    Ok(())
}

/// Log out: remove the session file, keep all local data
pub fn logout(config: &Config, output: &Output) -> Result<()> {
    let path = config.session_path();
    if path.exists() {
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove session file {:?}", path))?;
    }

    if !output.is_quiet() {
        println!("Logged out. Local progress is kept for your next session.");
    }
    Ok(())
}

/// The session, or an error telling the user to log in
pub fn require(session: Option<&SessionUser>) -> Result<&SessionUser> {
    session.ok_or_else(|| {
        anyhow::anyhow!("Not logged in. Run `lectern login --id <id>` first.")
    })
}
