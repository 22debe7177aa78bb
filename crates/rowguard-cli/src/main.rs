mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use sqlx::mysql::MySqlPoolOptions;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use rowguard_core::{Constraint, ConstraintKind, Error as CoreError, Rule, TableSchema};
use rowguard_model::{MemoryStore, ModelRegistry, NullStore};

use config::{AppConfig, CONFIG_FILE, ConfigError, load, redact_connection_string};

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "rowguard", version, about = "Rowguard schema tools")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Introspect a table and print its columns, keys, and derived rules.
    Describe(DescribeArgs),
    /// Print the resolved configuration.
    Config,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    /// Table to describe.
    #[arg(value_name = "TABLE")]
    table: String,
    /// Database connection string; overrides config and environment.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Emit the raw descriptor as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Skip the schema cache and always introspect live.
    #[arg(long, default_value_t = false)]
    no_cache: bool,
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app_config = load(&cli.config)?;
    match cli.command {
        Command::Describe(args) => describe(args, &app_config).await,
        Command::Config => {
            print_config(&cli.config, &app_config);
            Ok(())
        }
    }
}

fn resolve_connection(flag: Option<String>, config: &AppConfig) -> Result<String, CliError> {
    flag.or_else(|| std::env::var("DATABASE_URL").ok())
        .or_else(|| config.database_url.clone())
        .ok_or_else(|| {
            CliError::InvalidConfig(format!(
                "no connection string: pass --conn, set DATABASE_URL, or add database_url to {CONFIG_FILE}"
            ))
        })
}

async fn describe(args: DescribeArgs, config: &AppConfig) -> Result<(), CliError> {
    let conn = resolve_connection(args.conn, config)?;
    let pool = MySqlPoolOptions::new()
        .max_connections(2)
        .connect(&conn)
        .await?;

    let registry = if args.no_cache {
        ModelRegistry::new(pool, Arc::new(NullStore))
    } else {
        ModelRegistry::new(pool, Arc::new(MemoryStore::new()))
            .cache_ttl_minutes(config.cache_ttl_minutes)
    };

    tracing::debug!(table = %args.table, "describing table");
    let model = registry.model(&args.table).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(model.schema())?);
    } else {
        print_schema(model.schema());
    }
    Ok(())
}

fn print_schema(schema: &TableSchema) {
    println!("table: {}", schema.table);
    match &schema.primary {
        Some(primary) => println!("primary key: {}", primary.columns().join(", ")),
        None => println!("primary key: (none)"),
    }

    println!("\ncolumns:");
    for column in &schema.columns {
        let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
        let mut flags = Vec::new();
        if column.is_primary() {
            flags.push("PRI");
        }
        if column.is_unique() {
            flags.push("UNI");
        }
        if column.automatic {
            flags.push("auto");
        }
        let rules = column
            .rules
            .iter()
            .map(rule_summary)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {:<20} {:<24} {:<9} {:<10} {}",
            column.name,
            full_type(column),
            nullable,
            flags.join(","),
            rules
        );
    }

    if !schema.constraints.is_empty() {
        println!("\nconstraints:");
        for constraint in &schema.constraints {
            println!("  {}", constraint_summary(constraint));
        }
    }
}

fn full_type(column: &rowguard_core::Column) -> String {
    let mut text = column.type_name.clone();
    if let Some(constraint) = &column.constraint {
        text.push_str(&format!("({constraint})"));
    }
    if column.unsigned {
        text.push_str(" unsigned");
    }
    if column.zerofill {
        text.push_str(" zerofill");
    }
    text
}

fn rule_summary(rule: &Rule) -> String {
    match rule {
        Rule::Required => "required".to_string(),
        Rule::Max { limit } => format!("max({limit})"),
        Rule::Min { limit } => format!("min({limit})"),
        Rule::Number { digits: Some(digits) } => format!("number({digits})"),
        Rule::Number { digits: None } => "number".to_string(),
        Rule::Binary => "binary".to_string(),
        Rule::Options { allowed } => format!("options({})", allowed.join("|")),
        Rule::Email => "email".to_string(),
        Rule::Username => "username".to_string(),
        Rule::Password => "password".to_string(),
        Rule::Ip => "ip".to_string(),
        Rule::Uri => "uri".to_string(),
    }
}

fn constraint_summary(constraint: &Constraint) -> String {
    match &constraint.kind {
        ConstraintKind::Primary => format!("{} (primary key)", constraint.name),
        ConstraintKind::Unique => format!("{} (unique)", constraint.name),
        ConstraintKind::Foreign { relation } => format!(
            "{} (foreign key: {}.{} -> {}.{})",
            constraint.name, relation.from, relation.key_from, relation.to, relation.key_to
        ),
    }
}

fn print_config(path: &Path, config: &AppConfig) {
    println!("config file: {}", path.display());
    match &config.database_url {
        Some(url) => println!("database_url: {}", redact_connection_string(url)),
        None => println!("database_url: (unset)"),
    }
    println!("cache_ttl_minutes: {}", config.cache_ttl_minutes);
}
