use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contacts_core::ContactViewModel;
use shared::domain::{ContactId, SortType};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{run_command, ContactCommand, Outcome};
use config::{load_settings, normalize_database_url};
use render::{render_contact, render_json, render_table};

#[derive(Parser, Debug)]
#[command(name = "contacts", about = "Local contact list backed by SQLite")]
struct Cli {
    #[arg(long, default_value = "contacts.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    log_filter: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: String,
    },
    List {
        #[arg(long, default_value_t = SortType::FirstName)]
        sort: SortType,
        #[arg(long)]
        json: bool,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = cli.database_url {
        settings.database_url = v;
    }
    if let Some(v) = cli.log_filter {
        settings.log_filter = v;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&settings.log_filter)
                .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await?;
    info!(%database_url, "opened contact database");

    let (command, json) = match cli.command {
        Command::Add {
            first_name,
            last_name,
            phone,
        } => (
            ContactCommand::Add {
                first_name,
                last_name,
                phone,
            },
            false,
        ),
        Command::List { sort, json } => (ContactCommand::List { sort }, json),
        Command::Delete { id } => (
            ContactCommand::Delete {
                id: ContactId(id),
            },
            false,
        ),
    };

    let view_model = ContactViewModel::spawn(Arc::new(storage));
    let outcome = run_command(&view_model, command).await;
    // Fatal store errors take precedence over the command result.
    view_model.shutdown().await?;
    let (outcome, snapshot) = outcome?;

    match outcome {
        Outcome::Added(contact) => println!("added {}", render_contact(&contact)),
        Outcome::Deleted(contact) => println!("deleted {}", render_contact(&contact)),
        Outcome::NothingToDelete(id) => println!("no contact with id {id}"),
        Outcome::Listed => {}
    }
    if json {
        println!("{}", render_json(&snapshot)?);
    } else {
        print!("{}", render_table(&snapshot));
    }

    Ok(())
}
