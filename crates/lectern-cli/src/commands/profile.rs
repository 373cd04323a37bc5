//! Profile command handlers

use anyhow::Result;

use lectern_core::{SessionUser, Store, Theme, UserPreferences};

use crate::commands::session;
use crate::output::{format_timestamp, Output, OutputFormat};

/// Show the current user's local profile
pub fn show(store: &Store, session: Option<&SessionUser>, output: &Output) -> Result<()> {
    let user = session::require(session)?;
    let Some(local) = store.state().users.get(&user.id) else {
        anyhow::bail!("No local record for this session yet; run any command and retry.");
    };

    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(local)?);
        }
        OutputFormat::Quiet => {
            println!("{}", local.id);
        }
        OutputFormat::Human => {
            println!("ID:            {}", local.id);
            if let Some(ref name) = local.display_name {
                println!("Name:          {}", name);
            }
            if let Some(ref email) = local.email {
                println!("Email:         {}", email);
            }
            if let Some(ref avatar) = local.avatar_url {
                println!("Avatar:        {}", avatar);
            }
            if let Some(theme) = local.preferences.theme {
                println!("Theme:         {}", theme);
            }
            if let Some(notifications) = local.preferences.notifications {
                println!(
                    "Notifications: {}",
                    if notifications { "on" } else { "off" }
                );
            }
            println!("Created:       {}", format_timestamp(local.created_at));
            println!("Updated:       {}", format_timestamp(local.updated_at));
        }
    }

    Ok(())
}

/// Set the theme preference
pub fn set_theme(
    store: &mut Store,
    session: Option<&SessionUser>,
    theme: &str,
    output: &Output,
) -> Result<()> {
    let user = session::require(session)?;
    let theme: Theme = theme.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    store.users().update_preferences(
        &user.id,
        UserPreferences {
            theme: Some(theme),
            ..Default::default()
        },
    );

    if !output.is_quiet() {
        println!("Theme set to {}.", theme);
    }
    Ok(())
}

/// Set the notifications preference
pub fn set_notifications(
    store: &mut Store,
    session: Option<&SessionUser>,
    enabled: &str,
    output: &Output,
) -> Result<()> {
    let user = session::require(session)?;
    let enabled = match enabled {
        "on" | "true" => true,
        "off" | "false" => false,
        other => anyhow::bail!("Expected 'on' or 'off', got '{}'.", other),
    };

    store.users().update_preferences(
        &user.id,
        UserPreferences {
            notifications: Some(enabled),
            ..Default::default()
        },
    );

    if !output.is_quiet() {
        println!("Notifications {}.", if enabled { "on" } else { "off" });
    }
    Ok(())
}
