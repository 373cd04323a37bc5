//! Config command handlers

use anyhow::Result;

use lectern_core::Config;

use crate::output::{Output, OutputFormat};

/// Show configuration or its file path
pub fn run(command: Option<&crate::ConfigCommands>, config: &Config, output: &Output) -> Result<()> {
    match command.unwrap_or(&crate::ConfigCommands::Show) {
        crate::ConfigCommands::Show => show(config, output),
        crate::ConfigCommands::Path => {
            println!("{}", Config::config_file_path().display());
            Ok(())
        }
    }
}

fn show(config: &Config, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "debounce_ms": config.debounce_ms,
                    "config_file": Config::config_file_path(),
                })
            );
        }
        _ => {
            println!("data_dir    = {}", config.data_dir.display());
            println!("debounce_ms = {}", config.debounce_ms);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }
    Ok(())
}
