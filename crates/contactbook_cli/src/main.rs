//! Operator CLI over the contactbook core.
//!
//! # Responsibility
//! - Open the SQLite store and optionally start file logging.
//! - Expose account/contact seeding and the deceased-date update.
//! - Print results as JSON on stdout, errors on stderr.

use clap::{Parser, Subcommand};
use contactbook_core::db::open_db;
use contactbook_core::{
    core_version, default_log_level, init_logging, AccountId, ContactId, ContactRepository,
    DeceasedInfoUpdater, NewContact, SpecialDateCategory, SqliteContactRepository,
};
use log::info;
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "contactbook", version, about = "Record contact special dates")]
struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, env = "CONTACTBOOK_DB")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CONTACTBOOK_LOG_DIR")]
    log_dir: Option<String>,

    #[arg(long, env = "CONTACTBOOK_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty account and print its id.
    AddAccount,
    /// Create a contact and print it as JSON.
    AddContact {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Record how a contact died from a JSON request payload.
    UpdateDeceased {
        /// e.g. '{"account_id":1,"contact_id":5,"is_age_based":false,
        /// "is_year_unknown":false,"deceased_date":"2020-03-14","add_reminder":true}'
        #[arg(long)]
        payload: String,
    },
    /// Print the contact's current deceased date, or `null`.
    ShowDeceased {
        #[arg(long)]
        account: AccountId,
        #[arg(long)]
        contact: ContactId,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(&cli.log_level, log_dir) {
            eprintln!("contactbook: {err}");
            return ExitCode::FAILURE;
        }
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("contactbook: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, Box<dyn Error>> {
    let mut conn = open_db(&cli.db)?;
    let repo = SqliteContactRepository::try_new(&mut conn)?;

    let output = match cli.command {
        Command::AddAccount => repo.create_account()?.to_string(),
        Command::AddContact {
            account,
            first_name,
            last_name,
        } => {
            let contact = repo.create_contact(account, &NewContact::new(first_name, last_name))?;
            serde_json::to_string_pretty(&contact)?
        }
        Command::UpdateDeceased { payload } => {
            let payload = match serde_json::from_str::<Value>(&payload)? {
                Value::Object(map) => map,
                _ => return Err("payload must be a JSON object".into()),
            };
            let mut updater = DeceasedInfoUpdater::new(repo);
            let special_date = updater.execute(&payload)?;
            serde_json::to_string_pretty(&special_date)?
        }
        Command::ShowDeceased { account, contact } => {
            let contact = repo
                .find_contact(account, contact)?
                .ok_or_else(|| format!("contact not found: {contact} in account {account}"))?;
            let special_date =
                repo.get_special_date(&contact, SpecialDateCategory::DeceasedDate)?;
            serde_json::to_string_pretty(&special_date)?
        }
    };

    Ok(output)
}
