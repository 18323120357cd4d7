use std::{
    io::{self, Write},
    time::Duration,
};

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};

use backlot::{
    approval::{self, ConsoleDecisions, ReviewFilter},
    config::Config,
    db,
    models::TableCounts,
    pipeline::{AddOutcome, Pipeline, RunConfig, RunPhase, RunReport},
    retry::RetryPolicy,
    schema::TableSet,
    store::Store,
    tmdb::{Catalog, TmdbClient},
};

#[derive(Parser)]
#[command(name = "backlot", about = "Movie catalog ingestion with human approval", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or update the database schema
    Setup,
    /// Show table counts and latest release dates
    Status,
    /// Check catalog and store connectivity
    Test,
    /// Bulk load straight into production, newest year first
    Initial {
        /// Stop after this many writes
        #[arg(long)]
        test_limit: Option<u64>,
        /// Load even when production already has movies
        #[arg(long)]
        force: bool,
        /// Newest year to load, defaults to the current year
        #[arg(long)]
        start_year: Option<i16>,
        /// Oldest year to load, defaults to the oldest the catalog knows
        #[arg(long)]
        end_year: Option<i16>,
    },
    /// Stage releases newer than the store's watermark
    AddNew {
        /// Stop after this many writes
        #[arg(long)]
        test_limit: Option<u64>,
    },
    /// Refresh production rows changed upstream
    Update {
        /// Trailing window in days, 14 at most
        #[arg(long, default_value_t = 14)]
        days_back: i64,
        /// Stop after this many writes
        #[arg(long)]
        test_limit: Option<u64>,
    },
    /// Search the catalog, numeric queries resolve as id lookups
    Search {
        query: String,
        /// Stage this id for review instead of listing results
        #[arg(long)]
        add: Option<i32>,
    },
    /// Review pending movies one by one
    Approve {
        /// Review at most this many
        #[arg(long)]
        limit: Option<u64>,
        /// Only pending titles matching this text
        #[arg(long)]
        search: Option<String>,
        /// Review one specific id
        #[arg(long)]
        movie_id: Option<i32>,
        /// Approve everything pending without prompting
        #[arg(long)]
        quick: bool,
    },
    /// List pending movies oldest first
    ListPending {
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },
    /// Compare local ids against the catalog's daily export
    Verify {
        /// Break missing ids down by popularity tier
        #[arg(long)]
        by_popularity: bool,
    },
    /// Stage export ids missing locally, most popular first
    Backfill {
        #[arg(long, default_value_t = 1.0)]
        min_popularity: f64,
        /// Stop after this many writes
        #[arg(long)]
        test_limit: Option<u64>,
        /// Use the reduced request rate for long runs
        #[arg(long)]
        slow_mode: bool,
    },
    /// Re-walk one year in month windows, staging what is missing
    ReingestYear {
        year: i16,
        /// Stop after this many writes
        #[arg(long)]
        test_limit: Option<u64>,
        /// Use the reduced request rate for long runs
        #[arg(long)]
        slow_mode: bool,
    },
    /// Delete every row in the selected sets
    Drop {
        /// Clear only the pending set
        #[arg(long)]
        pending_only: bool,
        /// Clear only the production set
        #[arg(long)]
        production_only: bool,
        /// Skip the typed confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,backlot=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("backlot/0.1")
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Store::new(db);

    let slow_mode = matches!(
        cli.command,
        Command::Backfill { slow_mode: true, .. } | Command::ReingestYear { slow_mode: true, .. }
    );
    let catalog = TmdbClient::new(http, &config, RetryPolicy::default(), slow_mode);
    let defaults = RunConfig { max_concurrent: config.max_concurrent, ..RunConfig::default() };

    match cli.command {
        Command::Setup => {
            let applied = Migrator::get_applied_migrations(store.connection()).await?;
            println!("Schema is up to date, {} migrations applied.", applied.len());
            print_status(&store).await?;
        },
        Command::Status => print_status(&store).await?,
        Command::Test => {
            let mut healthy = true;
            match catalog.ping().await {
                Ok(title) => println!("Catalog: ok ({title})"),
                Err(err) => {
                    healthy = false;
                    println!("Catalog: FAILED ({err})");
                },
            }
            match store.table_counts(TableSet::Production).await {
                Ok(counts) => println!("Store:   ok ({} production movies)", counts.movies),
                Err(err) => {
                    healthy = false;
                    println!("Store:   FAILED ({err})");
                },
            }
            if !healthy {
                std::process::exit(1);
            }
        },
        Command::Initial { test_limit, force, start_year, end_year } => {
            let run = RunConfig { test_limit, force, start_year, end_year, ..defaults };
            let report = Pipeline::new(&catalog, &store, run).initial_load().await?;
            finish_run("Initial load", &report);
        },
        Command::AddNew { test_limit } => {
            let run = RunConfig { test_limit, ..defaults };
            let report = Pipeline::new(&catalog, &store, run).add_new().await?;
            finish_run("Add-new", &report);
        },
        Command::Update { days_back, test_limit } => {
            let run = RunConfig { days_back, test_limit, ..defaults };
            let report = Pipeline::new(&catalog, &store, run).update().await?;
            finish_run("Update", &report);
        },
        Command::Search { query, add } => {
            let pipeline = Pipeline::new(&catalog, &store, defaults);
            match add {
                Some(id) => match pipeline.add_by_id(id).await? {
                    AddOutcome::Staged(title) => {
                        println!("Staged \"{title}\" (ID {id}) for review.");
                    },
                    AddOutcome::AlreadyProduction => {
                        println!("ID {id} already exists in production.");
                    },
                    AddOutcome::AlreadyPending => println!("ID {id} is already pending review."),
                    AddOutcome::NotFound => println!("ID {id} not found in the catalog."),
                    AddOutcome::AdultContent => println!("ID {id} is adult content, not staged."),
                },
                None => {
                    let hits = pipeline.search(&query).await?;
                    if hits.is_empty() {
                        println!("No results for \"{query}\".");
                    } else {
                        println!("Results for \"{query}\":");
                        for (index, hit) in hits.iter().enumerate() {
                            println!("{}", hit.display_line(index + 1));
                        }
                    }
                },
            }
        },
        Command::Approve { limit, search, movie_id, quick } => {
            if quick {
                let pending = store.table_counts(TableSet::Pending).await?.movies;
                if pending == 0 {
                    println!("Nothing pending.");
                } else {
                    println!(
                        "WARNING: this will approve all {pending} pending movies without review."
                    );
                    if prompt("Type APPROVE ALL to continue: ")? == "APPROVE ALL" {
                        let stats = approval::approve_all(&store).await?;
                        println!("Bulk approval:");
                        println!("{stats}");
                    } else {
                        println!("Aborted.");
                    }
                }
            } else {
                let filter = ReviewFilter { limit, search, movie_id };
                let mut source = ConsoleDecisions;
                let stats = approval::review_session(&store, &mut source, &filter).await?;
                println!("Review session:");
                println!("{stats}");
            }
        },
        Command::ListPending { limit } => {
            let (total, rows) = store.pending_overview(limit).await?;
            if total == 0 {
                println!("Nothing pending.");
            } else {
                println!("Pending movies, {} of {total} shown:", rows.len());
                for (index, row) in rows.iter().enumerate() {
                    println!("{}", row.display_line(index + 1));
                }
            }
        },
        Command::Verify { by_popularity } => {
            let report = Pipeline::new(&catalog, &store, defaults).verify(by_popularity).await?;
            println!("{report}");
        },
        Command::Backfill { min_popularity, test_limit, slow_mode: _ } => {
            let run = RunConfig { min_popularity, test_limit, ..defaults };
            let report = Pipeline::new(&catalog, &store, run).backfill().await?;
            finish_run("Backfill", &report);
        },
        Command::ReingestYear { year, test_limit, slow_mode: _ } => {
            let run = RunConfig { test_limit, ..defaults };
            let report = Pipeline::new(&catalog, &store, run).reingest_year(year).await?;
            finish_run("Re-ingest", &report);
        },
        Command::Drop { pending_only, production_only, yes } => {
            if pending_only && production_only {
                anyhow::bail!("--pending-only and --production-only are mutually exclusive");
            }
            let production = !pending_only;
            let pending = !production_only;
            let scope = if production && pending {
                "production and pending"
            } else if production {
                "production"
            } else {
                "pending"
            };
            let confirmed = if yes {
                true
            } else {
                println!("This deletes every row in the {scope} tables.");
                prompt("Type DROP to continue: ")? == "DROP"
            };
            if confirmed {
                store.clear(production, pending, true).await?;
                println!("Cleared {scope}.");
            } else {
                println!("Aborted.");
            }
        },
    }

    Ok(())
}

async fn print_status(store: &Store) -> anyhow::Result<()> {
    let status = store.status().await?;
    println!("Production:");
    print_counts(&status.production);
    println!("Pending:");
    print_counts(&status.pending);
    match status.latest_production_release {
        Some(date) => println!("Latest production release: {date}"),
        None => println!("Latest production release: none"),
    }
    match status.latest_pending_release {
        Some(date) => println!("Latest pending release:    {date}"),
        None => println!("Latest pending release:    none"),
    }
    Ok(())
}

fn print_counts(counts: &TableCounts) {
    println!("  movies:  {}", counts.movies);
    println!("  people:  {}", counts.people);
    println!("  credits: {}", counts.credits);
    println!("  genres:  {}", counts.genres);
}

fn finish_run(label: &str, report: &RunReport) {
    let outcome = match report.phase {
        RunPhase::Completed => "completed",
        RunPhase::PartialFailure => "aborted",
        _ => "ended early",
    };
    println!("{label} {outcome}:");
    print!("{}", report.stats);
    if report.checkpoint.page > 0 {
        println!("  last completed: {}", report.checkpoint);
    }
    if let Some(failure) = &report.failure {
        println!("  failure: {failure}");
    }
    if report.phase == RunPhase::PartialFailure {
        std::process::exit(1);
    }
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
