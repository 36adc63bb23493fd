//! Bidii CLI - the school portal from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in the configured session file)
//! bidii login -e mwalimu@bidii.ac.ke -p 's3cret'
//!
//! # Show the dashboard for the signed-in role
//! bidii dashboard
//!
//! # List classes whose fields contain "form"
//! bidii list classes --filter form
//!
//! # Create and update records from JSON drafts
//! bidii create subjects --data '{"name": "Chemistry"}'
//! bidii update teachers 4 --data '{"phone": "0712345678"}' --picture me.png
//!
//! # Delete without the confirmation prompt
//! bidii delete streams 7 --yes
//!
//! # Schedule a meeting
//! bidii meeting "Staff briefing" --duration 30 --date 2026-11-02 --time 09:00
//! ```
//!
//! # Environment Variables
//!
//! See `bidii_portal::config`. Log verbosity follows `RUST_LOG`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use bidii_core::Resource;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "bidii")]
#[command(author, version, about = "Bidii School portal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BIDII_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user and their menu
    Whoami,
    /// Show totals and announcement feeds for the signed-in role
    Dashboard,
    /// List records of a resource
    List {
        /// Resource slug (e.g. `classes`, `cat-grades`)
        resource: Resource,

        /// Only show records containing this text
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Show one record
    Show {
        resource: Resource,
        key: String,
    },
    /// Create a record from a JSON draft
    Create {
        resource: Resource,

        /// Draft fields as a JSON object
        #[arg(short, long)]
        data: String,

        /// Profile picture to upload (teachers and parents)
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    /// Update a record; fields not given keep their current value
    Update {
        resource: Resource,
        key: String,

        /// Draft fields as a JSON object
        #[arg(short, long)]
        data: String,

        /// Profile picture to upload (teachers and parents)
        #[arg(long)]
        picture: Option<PathBuf>,
    },
    /// Delete a record
    Delete {
        resource: Resource,
        key: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Schedule a conferencing meeting
    Meeting {
        topic: String,

        /// Length in minutes
        #[arg(short, long, default_value_t = 40)]
        duration: u32,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Start time (HH:MM)
        #[arg(long)]
        time: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bidii_portal=info,bidii_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let portal = commands::connect()?;
    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&portal, &email, &password).await?;
        }
        Commands::Logout => commands::session::logout(&portal)?,
        Commands::Whoami => commands::session::whoami(&portal)?,
        Commands::Dashboard => commands::dashboard::show(&portal).await?,
        Commands::List { resource, filter } => {
            commands::records::list(&portal, resource, &filter).await?;
        }
        Commands::Show { resource, key } => commands::records::show(&portal, resource, &key).await?,
        Commands::Create {
            resource,
            data,
            picture,
        } => commands::records::create(&portal, resource, &data, picture.as_deref()).await?,
        Commands::Update {
            resource,
            key,
            data,
            picture,
        } => {
            commands::records::update(&portal, resource, &key, &data, picture.as_deref()).await?;
        }
        Commands::Delete { resource, key, yes } => {
            commands::records::delete(&portal, resource, &key, yes).await?;
        }
        Commands::Meeting {
            topic,
            duration,
            date,
            time,
        } => commands::meeting::schedule(&portal, topic, duration, &date, &time).await?,
    }
    Ok(())
}
