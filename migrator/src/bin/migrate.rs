use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use migrator::{steps, Migration, MigrationRunner};
use sqlx::PgPool;

#[derive(Parser, Debug)]
#[command(about = "Zero-downtime schema migrator", long_about = None)]
struct Cli {
    /// Migration version stamped into schema_migrator_history
    #[arg(long, default_value_t = 1)]
    version: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs the canonical add-nullable -> backfill -> NOT NULL -> DEFAULT
    /// sequence for a new column.
    AddColumnWithDefault {
        #[arg(long)]
        table: String,
        #[arg(long)]
        column: String,
        /// Postgres type, e.g. "text", "integer"
        #[arg(long = "type")]
        sql_type: String,
        /// SQL literal used both for the backfill value and the DEFAULT
        /// expression, e.g. "'bronze'" or "0"
        #[arg(long)]
        default: String,
    },
    /// Builds an index without blocking writers on the indexed table.
    ConcurrentIndex {
        #[arg(long = "name")]
        index_name: String,
        #[arg(long)]
        table: String,
        #[arg(long = "column", value_name = "COLUMN")]
        columns: Vec<String>,
    },
    /// Metadata-only column rename.
    RenameColumn {
        #[arg(long)]
        table: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set for the migrator")?;
    let pool = PgPool::connect(&database_url).await?;

    let migration = match &cli.command {
        Command::AddColumnWithDefault {
            table,
            column,
            sql_type,
            default,
        } => Migration::new(cli.version, format!("add {table}.{column} with default {default}"))
            .with_steps(steps::safe_add_column_with_default(table, column, sql_type, default)),
        Command::ConcurrentIndex {
            index_name,
            table,
            columns,
        } => {
            if columns.is_empty() {
                return Err(anyhow!("provide at least one --column"));
            }
            Migration::new(cli.version, format!("concurrently build {index_name} on {table}"))
                .push(Box::new(steps::ConcurrentIndexBuild::new(index_name, table, columns.clone())))
        }
        Command::RenameColumn { table, from, to } => {
            Migration::new(cli.version, format!("rename {table}.{from} to {to}"))
                .push(Box::new(steps::RenameColumn::new(table, from, to)))
        }
    };

    let runner = MigrationRunner::new(pool);
    let report = runner.run(migration).await?;

    println!(
        "migration {} ({}) completed in {:?}",
        report.version, report.description, report.total_duration
    );
    for step in &report.steps {
        println!("  - {} [{}] {:?}", step.name, if step.succeeded { "ok" } else { "FAILED" }, step.duration);
    }

    Ok(())
}
