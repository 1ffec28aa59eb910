// ABOUTME: Entry point for the lgcrm binary.
// ABOUTME: Parses CLI arguments, initializes tracing, opens the engine, and runs one store command.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use lgcrm_core::money::format_budget_range;
use lgcrm_core::{Collection, Lead, LeadStage, Patch, Property, Record, Task, Visit};
use lgcrm_store::{CrmConfig, Engine, Query, SelectOptions};

/// Local-first CRM store for leads, properties, visits, and tasks
#[derive(Parser)]
#[command(name = "lgcrm")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct FilterArgs {
    /// Keep rows whose FIELD equals VALUE (repeatable)
    #[arg(long = "eq", value_name = "FIELD=VALUE")]
    eq: Vec<String>,

    /// Drop rows whose FIELD is in a tuple literal such as ("Perdido","Cierre") (repeatable)
    #[arg(long = "not-in", value_name = "FIELD=TUPLE")]
    not_in: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Select rows from a collection
    List {
        collection: Collection,

        #[command(flatten)]
        filters: FilterArgs,

        /// Comma-separated column list
        #[arg(long, default_value = "*")]
        columns: String,

        /// Include an exact match count
        #[arg(long)]
        count: bool,

        /// Omit rows, returning only metadata
        #[arg(long)]
        head: bool,
    },

    /// Insert one record built from --set pairs
    Insert {
        collection: Collection,

        /// Field assignment; VALUE is read as JSON when it parses, else as text
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Patch every matching row
    Update {
        collection: Collection,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Delete every matching row
    Delete {
        collection: Collection,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Sign in as the demo user
    Login {
        identifier: String,

        #[arg(long, default_value = "")]
        secret: String,
    },

    /// Clear the current session
    Logout,

    /// Show the current session
    Whoami,

    /// Show leads grouped by pipeline stage
    Pipeline,

    /// Replace every collection with fresh demo data
    Reset,
}

/// Run a generic function against the record type named by a collection.
macro_rules! with_record {
    ($collection:expr, $func:ident ( $($arg:expr),* )) => {
        match $collection {
            Collection::Leads => $func::<Lead>($($arg),*).await,
            Collection::Properties => $func::<Property>($($arg),*).await,
            Collection::Visits => $func::<Visit>($($arg),*).await,
            Collection::Tasks => $func::<Task>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "lgcrm=debug,lgcrm_store=debug,lgcrm_core=debug"
    } else {
        "lgcrm=info,lgcrm_store=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CrmConfig::from_env()?;
    let mode = config.storage_mode();
    let engine = Engine::open_mode(&mode)
        .with_context(|| format!("failed to open store at {:?}", mode))?;
    tracing::debug!(
        medium = engine.medium_kind(),
        persistent = mode.is_persistent(),
        bootstrap = ?engine.bootstrap(),
        "engine ready"
    );

    let output = match cli.command {
        Command::List {
            collection,
            filters,
            columns,
            count,
            head,
        } => {
            let opts = SelectOptions {
                count: count.then_some(lgcrm_store::CountMode::Exact),
                head,
            };
            with_record!(collection, list(&engine, &filters, &columns, opts))?
        }
        Command::Insert { collection, set } => {
            let draft = parse_patch(&set)?;
            with_record!(collection, insert(&engine, draft))?
        }
        Command::Update {
            collection,
            filters,
            set,
        } => {
            let patch = parse_patch(&set)?;
            with_record!(collection, update(&engine, &filters, patch))?
        }
        Command::Delete {
            collection,
            filters,
        } => {
            let deleted = with_record!(collection, delete(&engine, &filters))?;
            json!({ "deleted": deleted })
        }
        Command::Login { identifier, secret } => {
            let session = engine.auth().sign_in(&identifier, &secret).await?;
            serde_json::to_value(session)?
        }
        Command::Logout => {
            engine.auth().sign_out().await;
            json!({ "signed_in": false })
        }
        Command::Whoami => serde_json::to_value(engine.auth().get_session().await)?,
        Command::Pipeline => {
            print!("{}", pipeline(&engine).await);
            return Ok(());
        }
        Command::Reset => {
            engine.reset().await;
            let tables = engine.snapshot().await;
            json!({
                "leads": tables.leads.len(),
                "properties": tables.properties.len(),
                "visits": tables.visits.len(),
                "tasks": tables.tasks.len(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Split `FIELD=VALUE` at the first `=`.
fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => bail!("expected FIELD=VALUE, got {:?}", pair),
    }
}

/// Read a CLI value as JSON when it parses, otherwise as a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_patch(pairs: &[String]) -> Result<Patch> {
    let mut patch = Patch::new();
    for pair in pairs {
        let (field, value) = split_pair(pair)?;
        patch.insert(field, parse_value(value));
    }
    Ok(patch)
}

fn scoped<R: Record>(engine: &Engine, filters: &FilterArgs) -> Result<Query<R>> {
    let mut query = engine.collection::<R>();
    for pair in &filters.eq {
        let (field, value) = split_pair(pair)?;
        query = query.eq(field, parse_value(value));
    }
    for pair in &filters.not_in {
        let (field, tuple) = split_pair(pair)?;
        query = query.not_in(field, tuple);
    }
    Ok(query)
}

async fn list<R: Record>(
    engine: &Engine,
    filters: &FilterArgs,
    columns: &str,
    opts: SelectOptions,
) -> Result<Value> {
    let result = scoped::<R>(engine, filters)?
        .select_columns(columns, opts)
        .await?;
    Ok(serde_json::to_value(result)?)
}

async fn insert<R: Record>(engine: &Engine, draft: Patch) -> Result<Value> {
    let created = engine.collection::<R>().insert_one(draft).await?;
    Ok(serde_json::to_value(created)?)
}

async fn update<R: Record>(engine: &Engine, filters: &FilterArgs, patch: Patch) -> Result<Value> {
    let updated = scoped::<R>(engine, filters)?.update(patch).await?;
    Ok(serde_json::to_value(updated)?)
}

async fn delete<R: Record>(engine: &Engine, filters: &FilterArgs) -> Result<usize> {
    Ok(scoped::<R>(engine, filters)?.delete().await)
}

/// Render open and closed leads per pipeline stage with their budgets.
async fn pipeline(engine: &Engine) -> String {
    let leads = engine
        .collection::<Lead>()
        .select(SelectOptions::default())
        .await
        .rows
        .unwrap_or_default();

    let mut out = String::new();
    for stage in LeadStage::PIPELINE {
        let in_stage: Vec<&Lead> = leads.iter().filter(|l| l.stage == stage).collect();
        out.push_str(&format!("{} ({})\n", stage, in_stage.len()));
        for lead in in_stage {
            out.push_str(&format!(
                "  {}  {}\n",
                lead.name,
                format_budget_range(lead.budget_min, lead.budget_max)
            ));
        }
    }
    out
}
