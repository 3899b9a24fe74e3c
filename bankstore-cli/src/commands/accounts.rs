//! Accounts command - list, show, create, update and delete accounts

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Subcommand};
use colored::Colorize;
use dialoguer::Confirm;

use bankstore_core::{Account, Storage};

use super::Session;
use crate::output::{self, format_balance, parse_balance};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// List all accounts ordered by id
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single account
    #[command(group(ArgGroup::new("key").required(true).args(["id", "number"])))]
    Show {
        /// Look up by store-assigned id
        #[arg(long)]
        id: Option<i64>,
        /// Look up by public account number
        #[arg(long)]
        number: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account with a random number and zero balance
    Create {
        #[arg(long = "first")]
        first_name: String,
        #[arg(long = "last")]
        last_name: String,
        #[arg(long, env = "BANKSTORE_ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change an account's names or balance
    Update {
        /// Account id
        id: i64,
        #[arg(long = "first")]
        first_name: Option<String>,
        #[arg(long = "last")]
        last_name: Option<String>,
        /// New balance, e.g. 125.50
        #[arg(long, allow_hyphen_values = true)]
        balance: Option<String>,
    },

    /// Delete an account
    Delete {
        /// Account id
        id: i64,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub async fn run(session: &Session, command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::List { json } => list(session, json).await,
        AccountCommands::Show { id, number, json } => show(session, id, number, json).await,
        AccountCommands::Create {
            first_name,
            last_name,
            password,
            json,
        } => create(session, first_name, last_name, &password, json).await,
        AccountCommands::Update {
            id,
            first_name,
            last_name,
            balance,
        } => update(session, id, first_name, last_name, balance).await,
        AccountCommands::Delete { id, force } => delete(session, id, force).await,
    }
}

async fn list(session: &Session, json: bool) -> Result<()> {
    let store = session.open()?;
    let accounts = store.get_accounts(&session.op_context()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("{}", "No accounts".dimmed());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Number", "Name", "Balance", "Created"]);
    for account in &accounts {
        table.add_row(vec![
            account.id.map(|id| id.to_string()).unwrap_or_default(),
            account.number.to_string(),
            account.full_name(),
            format_balance(account.balance),
            account.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", table);
    println!("{}", format!("{} account(s)", accounts.len()).dimmed());
    Ok(())
}

async fn show(session: &Session, id: Option<i64>, number: Option<i64>, json: bool) -> Result<()> {
    let store = session.open()?;
    let ctx = session.op_context();

    let account = match (id, number) {
        (Some(id), _) => store.get_account_by_id(&ctx, id).await?,
        (None, Some(number)) => store.get_account_by_number(&ctx, number).await?,
        (None, None) => bail!("Pass --id or --number"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        print_account(&account);
    }
    Ok(())
}

async fn create(
    session: &Session,
    first_name: String,
    last_name: String,
    password: &str,
    json: bool,
) -> Result<()> {
    let store = session.open()?;

    let mut account = Account::new(first_name, last_name, password)?;
    let id = store
        .create_account(&session.op_context(), &account)
        .await
        .context("Failed to create account")?;
    account.id = Some(id);

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        output::success(&format!(
            "✓ Created account {} with number {}",
            id, account.number
        ));
    }
    Ok(())
}

async fn update(
    session: &Session,
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    balance: Option<String>,
) -> Result<()> {
    if first_name.is_none() && last_name.is_none() && balance.is_none() {
        bail!("Nothing to update; pass --first, --last or --balance");
    }

    let store = session.open()?;
    let mut account = store.get_account_by_id(&session.op_context(), id).await?;

    if let Some(first_name) = first_name {
        account.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = last_name {
        account.last_name = last_name.trim().to_string();
    }
    if let Some(balance) = balance {
        account.balance = parse_balance(&balance)?;
    }
    account.validate()?;

    store.update_account(&session.op_context(), &account).await?;
    output::success(&format!("✓ Account {} updated", id));
    print_account(&account);
    Ok(())
}

async fn delete(session: &Session, id: i64, force: bool) -> Result<()> {
    let store = session.open()?;

    if !force {
        println!(
            "\n{}",
            format!("This will permanently delete account {}.", id).yellow()
        );

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    store.delete_account(&session.op_context(), id).await?;
    output::success(&format!("✓ Account {} deleted", id));
    Ok(())
}

fn print_account(account: &Account) {
    let mut table = output::create_table();
    table.add_row(vec![
        "ID".to_string(),
        account.id.map(|id| id.to_string()).unwrap_or_default(),
    ]);
    table.add_row(vec!["Number".to_string(), account.number.to_string()]);
    table.add_row(vec!["First name".to_string(), account.first_name.clone()]);
    table.add_row(vec!["Last name".to_string(), account.last_name.clone()]);
    table.add_row(vec!["Balance".to_string(), format_balance(account.balance)]);
    table.add_row(vec!["Created".to_string(), account.created_at.to_rfc3339()]);
    println!("{}", table);
}
