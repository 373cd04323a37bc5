//! Lectern CLI
//!
//! Command-line interface for Lectern - learning progress and quiz results.
//! The CLI is the view collaborator: it drives the store through its hooks
//! and stands in for the external identity provider with a local session
//! file.

use anyhow::Result;
use clap::{Parser, Subcommand};

use lectern_core::{Config, Store};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Lectern - local-first learning progress tracking")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as an identity (stand-in for the external provider)
    Login {
        /// Stable unique id for the identity
        #[arg(long)]
        id: String,
        /// Email address
        #[arg(long)]
        email: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Log out (local history is kept)
    Logout,
    /// Show chapter progress
    Progress {
        /// Total number of chapters to display
        #[arg(long, default_value_t = 5)]
        chapters: u32,
    },
    /// Mark a chapter completed
    Complete {
        /// Chapter number
        chapter: u32,
    },
    /// Mark a chapter not completed
    Uncomplete {
        /// Chapter number
        chapter: u32,
    },
    /// Manage quiz attempts
    Quiz {
        #[command(subcommand)]
        command: QuizCommands,
    },
    /// Show or edit the local profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (identity, storage, counts)
    Status,
    /// Discard all local state
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum QuizCommands {
    /// Record a graded attempt for a chapter
    Record {
        /// Chapter number
        chapter: u32,
        /// Number of questions answered correctly
        #[arg(long)]
        correct: u32,
        /// Total number of questions
        #[arg(long)]
        total: u32,
    },
    /// List attempts for the current user
    #[command(alias = "ls")]
    List {
        /// Filter by chapter
        #[arg(short, long)]
        chapter: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current profile
    Show,
    /// Set the color theme
    Theme {
        /// light, dark, or auto
        theme: String,
    },
    /// Turn notifications on or off
    Notifications {
        /// on or off
        enabled: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show the config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config = Config::load()?;

    // Config inspection doesn't need a store
    if let Commands::Config { command } = &cli.command {
        return commands::config::run(command.as_ref(), &config, &output);
    }

    let mut store = Store::open_with_config(config.clone());
    store.hydrate();

    // Reconcile whatever identity the session file reports
    let session = commands::session::load(&config);
    store.sync_session(session.as_ref());

    let result = match cli.command {
        Commands::Login {
            id,
            email,
            name,
            avatar,
        } => commands::session::login(&mut store, &config, id, email, name, avatar, &output),
        Commands::Logout => commands::session::logout(&config, &output),
        Commands::Progress { chapters } => {
            commands::progress::show(&mut store, session.as_ref(), chapters, &output)
        }
        Commands::Complete { chapter } => {
            commands::progress::complete(&mut store, chapter, &output)
        }
        Commands::Uncomplete { chapter } => {
            commands::progress::uncomplete(&mut store, chapter, &output)
        }
        Commands::Quiz { command } => match command {
            QuizCommands::Record {
                chapter,
                correct,
                total,
            } => commands::quiz::record(
                &mut store,
                session.as_ref(),
                chapter,
                correct,
                total,
                &output,
            ),
            QuizCommands::List { chapter } => {
                commands::quiz::list(&mut store, session.as_ref(), chapter, &output)
            }
        },
        Commands::Profile { command } => match command.unwrap_or(ProfileCommands::Show) {
            ProfileCommands::Show => commands::profile::show(&store, session.as_ref(), &output),
            ProfileCommands::Theme { theme } => {
                commands::profile::set_theme(&mut store, session.as_ref(), &theme, &output)
            }
            ProfileCommands::Notifications { enabled } => {
                commands::profile::set_notifications(&mut store, session.as_ref(), &enabled, &output)
            }
        },
        Commands::Config { .. } => unreachable!("handled above"),
        Commands::Status => commands::status::show(&store, session.as_ref(), &output),
        Commands::Reset { yes } => commands::reset::run(&mut store, &config, yes, &output),
    };

    // One write for everything the command changed
    store.flush();
    result
}
