//! Status command handler

use anyhow::Result;
use chrono::DateTime;

use lectern_core::{SessionUser, Store};

use crate::output::{format_timestamp, Output, OutputFormat};

/// Show status information
pub fn show(store: &Store, session: Option<&SessionUser>, output: &Output) -> Result<()> {
    let state = store.state();
    let config = store.config();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "session": session.map(|s| s.id.clone()),
                    "initialized": state.initialized,
                    "version": state.version,
                    "last_sync": state.last_sync.timestamp_millis(),
                    "storage": {
                        "available": store.storage_available(),
                        "data_dir": config.data_dir,
                    },
                    "counts": {
                        "users": state.users.len(),
                        "modules": state.modules.len(),
                        "quiz_results": state.quiz_results.len(),
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!(
                "{}",
                session.map(|s| s.id.as_str()).unwrap_or("logged-out")
            );
        }
        OutputFormat::Human => {
            println!("Lectern Status");
            println!("==============");
            println!();
            println!("Session:");
            match session {
                Some(session) => println!("  Logged in as: {}", session.id),
                None => println!("  Logged out"),
            }
            println!();
            println!("Storage:");
            println!("  Location:  {}", config.data_dir.display());
            println!(
                "  Available: {}",
                if store.storage_available() {
                    "yes"
                } else {
                    "no (memory-only session)"
                }
            );
            println!(
                "  Last sync: {}",
                if state.last_sync == DateTime::UNIX_EPOCH {
                    "never".to_string()
                } else {
                    format_timestamp(state.last_sync)
                }
            );
            println!("  Version:   {}", state.version);
            println!();
            println!("Contents:");
            println!("  Users:        {}", state.users.len());
            println!("  Modules:      {}", state.modules.len());
            println!("  Quiz results: {}", state.quiz_results.len());
        }
    }

    Ok(())
}
