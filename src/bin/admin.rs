//! CLI administration tool for url-redirector.
//!
//! Runs the same services as the HTTP server directly against the database.
//!
//! # Usage
//!
//! ```bash
//! # Block every expired mapping now
//! cargo run --bin admin -- sweep
//!
//! # Create a mapping that expires in 30 days
//! cargo run --bin admin -- mapping create https://example.com/page --expire-days 30
//!
//! # Inspect or block a mapping
//! cargo run --bin admin -- mapping show x7K
//! cargo run --bin admin -- mapping block x7K
//!
//! # Allocation counter and path aliases
//! cargo run --bin admin -- counter show
//! cargo run --bin admin -- alias add about /node/1
//! cargo run --bin admin -- alias list
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server, see [`url_redirector::config`].

use url_redirector::application::services::CreateMapping;
use url_redirector::config::{self, Config};
use url_redirector::domain::entities::Mapping;
use url_redirector::domain::repositories::{
    AliasRepository, CounterRepository, PathAlias, SHORT_CODE_COUNTER,
};
use url_redirector::server::{connect_pool, pg_repositories};
use url_redirector::state::Services;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;

/// CLI tool for managing url-redirector.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Block every active mapping whose expiration has passed
    Sweep {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Manage mappings
    Mapping {
        #[command(subcommand)]
        action: MappingAction,
    },

    /// Inspect the allocation counter
    Counter {
        #[command(subcommand)]
        action: CounterAction,
    },

    /// Manage host path aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum MappingAction {
    /// Shorten a destination URL
    Create {
        /// Destination URL (http or https)
        url: String,

        /// Expire after this many days (1-3650)
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=3650))]
        expire_days: Option<i64>,

        /// Owner recorded on the mapping
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show a mapping, whatever its status
    Show { code: String },

    /// Block a mapping so it no longer redirects
    Block {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CounterAction {
    /// Show the current counter value and the next code
    Show,
}

#[derive(Subcommand)]
enum AliasAction {
    /// Register a path alias that short codes must not shadow
    Add { alias: String, target: String },

    /// List registered aliases
    List,
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;
    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Sweep { yes } => sweep(&config, &pool, yes).await?,
        Commands::Mapping { action } => handle_mapping_action(action, &config, &pool).await?,
        Commands::Counter { action } => handle_counter_action(action, &config, &pool).await?,
        Commands::Alias { action } => handle_alias_action(action, &pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn services(config: &Config, pool: &PgPool) -> Result<Services> {
    Ok(Services::new(
        pg_repositories(pool.clone()),
        config.service_settings()?,
    ))
}

/// Runs one expiration sweep as of now.
async fn sweep(config: &Config, pool: &PgPool, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Expiration sweep".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Block all expired mappings now?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let services = services(config, pool)?;
    let blocked = services
        .sweeper
        .sweep(Utc::now())
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {e}"))?;

    println!(
        "{} {}",
        "✅ Blocked mappings:".green().bold(),
        blocked.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn handle_mapping_action(
    action: MappingAction,
    config: &Config,
    pool: &PgPool,
) -> Result<()> {
    let services = services(config, pool)?;
    let service = services.mapping_service;

    match action {
        MappingAction::Create {
            url,
            expire_days,
            owner,
        } => {
            let expire_at = expire_days
                .map(|days| {
                    TimeDelta::try_days(days)
                        .and_then(|delta| Utc::now().checked_add_signed(delta))
                        .with_context(|| format!("--expire-days {days} is out of range"))
                })
                .transpose()?;
            let created = service
                .create_mapping(CreateMapping {
                    destination: url,
                    expire_at,
                    owner_id: owner,
                })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create mapping: {e}"))?;

            println!("{}", "✅ Mapping created".green().bold());
            println!();
            print_mapping(&created.mapping);
            println!("  Short URL:   {}", created.short_url.bright_yellow().bold());
            println!();
        }
        MappingAction::Show { code } => {
            let mapping = service
                .get_mapping(&code)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            print_mapping(&mapping);
            println!(
                "  Short URL:   {}",
                mapping.short_url(service.base_url()).bright_yellow()
            );
            println!();
        }
        MappingAction::Block { code, yes } => {
            let mapping = service
                .get_mapping(&code)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            if !mapping.is_active() {
                println!("{}", "⚠️  This mapping is already blocked".yellow());
                return Ok(());
            }

            print_mapping(&mapping);

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Block this mapping? This cannot be undone")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            if service
                .block_mapping(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to block mapping: {e}"))?
            {
                println!("{}", "✅ Mapping blocked".green().bold());
            } else {
                println!("{}", "⚠️  Mapping was blocked concurrently".yellow());
            }
            println!();
        }
    }

    Ok(())
}

fn print_mapping(mapping: &Mapping) {
    let status = if mapping.is_active() {
        if mapping.is_expired() {
            "ACTIVE (expired)".yellow()
        } else {
            "ACTIVE".green()
        }
    } else {
        "BLOCKED".red()
    };

    println!("  Code:        {}", mapping.code.cyan().bold());
    println!("  Destination: {}", mapping.destination.bright_white());
    println!("  Status:      {status}");
    println!("  Visits:      {}", mapping.visits.to_string().bright_green());
    println!(
        "  Created:     {}",
        mapping.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    match mapping.expire_at {
        Some(at) => println!(
            "  Expires:     {}",
            at.format("%Y-%m-%d %H:%M").to_string().bright_black()
        ),
        None => println!("  Expires:     {}", "never".bright_black()),
    }
    if let Some(owner) = &mapping.owner_id {
        println!("  Owner:       {}", owner.bright_black());
    }
}

async fn handle_counter_action(
    action: CounterAction,
    config: &Config,
    pool: &PgPool,
) -> Result<()> {
    match action {
        CounterAction::Show => {
            let repositories = pg_repositories(pool.clone());
            let settings = config.service_settings()?;
            let alphabet = &settings.allocator.alphabet;

            println!("{}", "🔢 Allocation counter".bright_blue().bold());
            println!();

            let current = repositories
                .counter
                .current_value(SHORT_CODE_COUNTER)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {e}"))?;

            let (label, current) = match current {
                Some(value) => ("Current value:", value),
                None => ("Start value:  ", settings.allocator.counter_start),
            };
            let next = u64::try_from(current)
                .ok()
                .and_then(|v| v.checked_add(1))
                .context("Counter value is out of range")?;

            println!("  {label} {}", current.to_string().bright_white().bold());
            println!("  Next code:     {}", alphabet.encode(next).cyan().bold());
            println!("  Alphabet base: {}", alphabet.base().to_string().bright_black());
            println!();
        }
    }

    Ok(())
}

async fn handle_alias_action(action: AliasAction, pool: &PgPool) -> Result<()> {
    let repositories = pg_repositories(pool.clone());

    match action {
        AliasAction::Add { alias, target } => {
            repositories
                .aliases
                .upsert(PathAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to add alias: {e}"))?;

            println!(
                "{} {} → {}",
                "✅ Alias saved:".green().bold(),
                alias.cyan(),
                target.bright_white()
            );
        }
        AliasAction::List => {
            println!("{}", "📋 Path aliases".bright_blue().bold());
            println!();

            let aliases = repositories
                .aliases
                .list()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list aliases: {e}"))?;

            if aliases.is_empty() {
                println!("{}", "  No aliases found".yellow());
                return Ok(());
            }

            for alias in &aliases {
                println!("  {:<30} {}", alias.alias.cyan(), alias.target.bright_white());
            }

            println!();
            println!("  Total: {}", aliases.len().to_string().bright_white().bold());
        }
    }

    println!();
    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  PostgreSQL: {}", version.bright_white());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expire_days(args: &[&str]) -> Result<Option<i64>, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Commands::Mapping {
                action: MappingAction::Create { expire_days, .. },
            } => Ok(expire_days),
            _ => panic!("expected mapping create"),
        }
    }

    #[test]
    fn test_expire_days_within_range() {
        let days = expire_days(&[
            "admin", "mapping", "create", "https://example.com", "--expire-days", "30",
        ])
        .unwrap();

        assert_eq!(days, Some(30));
    }

    #[test]
    fn test_expire_days_out_of_range_is_rejected() {
        for value in ["0", "-5", "3651", "100000000000"] {
            let result = expire_days(&[
                "admin",
                "mapping",
                "create",
                "https://example.com",
                "--expire-days",
                value,
            ]);

            assert!(result.is_err(), "{value}");
        }
    }
}
