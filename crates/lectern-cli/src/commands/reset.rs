//! Reset command handler

use std::io::{self, Write};

use anyhow::Result;

use lectern_core::{Config, Store};

use crate::output::Output;

/// Discard all local state after confirmation
pub fn run(store: &mut Store, config: &Config, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        print!("This deletes all local progress and quiz history. Continue? [y/N] ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            if !output.is_quiet() {
                println!("Aborted.");
            }
            return Ok(());
        }
    }

    store.reset();

    // The session file is CLI-owned; a full reset removes it too
    let session_path = config.session_path();
    if session_path.exists() {
        let _ = std::fs::remove_file(&session_path);
    }

    if !output.is_quiet() {
        println!("All local state cleared.");
    }
    Ok(())
}
