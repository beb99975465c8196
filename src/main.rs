mod cli;

use reelmatch::config::{self, Config};
use reelmatch::metadata::{self, EnrichmentQueue, EnrichmentService, RunSummary, TmdbProvider};
use reelmatch::repository::SqliteRepository;
use reelmatch::scanner::parse_file_name;
use reelmatch_common::{LibraryId, RecordId};
use reelmatch_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, LibraryCommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelmatch=trace,reelmatch_db=debug,reelmatch_common=debug".to_string()
        } else {
            "reelmatch=info,reelmatch_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Library { action } => library(action, config_path),
        Commands::Scan { library } => block_on(scan_library(&library, config_path)),
        Commands::Enrich { record } => block_on(enrich_record(&record, config_path)),
        Commands::Records { library, json } => list_records(&library, json, config_path),
        Commands::Parse { file_name } => {
            parse_name(&file_name);
            Ok(())
        }
        Commands::Collection { id } => block_on(show_collection(&id, config_path)),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelmatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

/// Cancellation token that fires on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn open_repository(config: &Config) -> Result<SqliteRepository> {
    let db_path = config.database.path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path);
    let pool = init_pool(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path))?;
    Ok(SqliteRepository::new(pool))
}

fn parse_library_id(id: &str) -> Result<LibraryId> {
    id.parse()
        .with_context(|| format!("Invalid library id: {}", id))
}

fn library(action: LibraryCommand, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let repo = open_repository(&config)?;

    match action {
        LibraryCommand::Add { name, kind, paths } => {
            let roots = paths
                .iter()
                .map(|p| {
                    std::fs::canonicalize(p)
                        .map(|p| p.to_string_lossy().into_owned())
                        .with_context(|| format!("Library root does not exist: {:?}", p))
                })
                .collect::<Result<Vec<_>>>()?;

            let library = repo.create_library(&name, kind.into(), &roots)?;
            println!("Created library {} ({})", library.id, library.kind);
        }
        LibraryCommand::List => {
            let libraries = repo.list_libraries()?;
            if libraries.is_empty() {
                println!("No libraries configured.");
            }
            for library in libraries {
                println!("{}  {:<6} {}", library.id, library.kind, library.name);
                for path in &library.paths {
                    println!("    {}", path);
                }
            }
        }
        LibraryCommand::Remove { id } => {
            let id = parse_library_id(&id)?;
            repo.delete_library(id)?;
            println!("Removed library {}", id);
        }
    }

    Ok(())
}

async fn scan_library(id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let library_id = parse_library_id(id)?;
    let repo = Arc::new(open_repository(&config)?);
    let registry = metadata::build_registry(&config)?;
    let cancel = ctrl_c_token();

    let mut service = EnrichmentService::new(repo.clone(), registry.clone());
    let mut worker_handle = None;
    if config.enrichment.queue_new_records {
        let (queue, worker) = EnrichmentQueue::channel(config.enrichment.queue_capacity);
        let re_enricher = Arc::new(EnrichmentService::new(repo, registry));
        worker_handle = Some(worker.spawn(re_enricher, cancel.child_token()));
        service = service.with_enqueuer(Arc::new(queue));
    }

    let result = service.run_library(library_id, &cancel).await;

    // Dropping the service closes the queue; the worker drains what is left.
    drop(service);
    if let Some(handle) = worker_handle {
        tracing::info!("Waiting for queued re-enrichment to finish");
        let _ = handle.await;
    }

    let summary = result.with_context(|| format!("Enrichment run failed for library {}", id))?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let elapsed = summary.finished_at - summary.started_at;
    println!("Library {}", summary.library_id);
    println!("  Files:     {}", summary.total_files);
    println!("  Matched:   {}", summary.matched);
    println!("    New:      {}", summary.created);
    println!("    Existing: {}", summary.existing);
    println!("  Unmatched: {}", summary.unmatched);
    println!("  Errors:    {}", summary.errors.len());
    for error in &summary.errors {
        println!("    {}: {}", error.path.display(), error.error);
    }
    println!("  Took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
}

async fn enrich_record(id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let record_id: RecordId = id
        .parse()
        .with_context(|| format!("Invalid record id: {}", id))?;
    let repo = Arc::new(open_repository(&config)?);
    let service = EnrichmentService::new(repo, metadata::build_registry(&config)?);

    let record = service.re_enrich(record_id, &ctrl_c_token()).await?;
    println!("Updated {} ({})", record.title, record.id);
    if let Some(year) = record.year {
        println!("  Year: {}", year);
    }
    if let Some(ref overview) = record.overview {
        println!("  Overview: {}", overview);
    }
    Ok(())
}

fn list_records(id: &str, json: bool, config_path: Option<&Path>) -> Result<()> {
    use reelmatch::repository::Repository;

    let config = config::load_config_or_default(config_path)?;
    let repo = open_repository(&config)?;
    let records = repo.list_records(parse_library_id(id)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        let year = record.year.map(|y| format!(" ({})", y)).unwrap_or_default();
        let ids = record
            .external_ids
            .iter()
            .map(|e| format!("{}:{}", e.provider, e.id))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}  {}{}  [{}]", record.id, record.title, year, ids);
        if let Some(ref path) = record.file_path {
            println!("    {}", path);
        }
    }
    println!("{} records", records.len());
    Ok(())
}

fn parse_name(file_name: &str) {
    let parsed = parse_file_name(file_name);
    println!("Title: {}", parsed.title);
    match parsed.year {
        Some(year) => println!("Year: {}", year),
        None => println!("Year: none"),
    }
}

async fn show_collection(id: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let provider = TmdbProvider::new(&config.tmdb)?;
    let collection = provider.fetch_collection(id, &ctrl_c_token()).await?;

    println!("{} ({})", collection.name, collection.external_id);
    if let Some(ref overview) = collection.overview {
        println!("{}", overview);
    }
    for part in &collection.parts {
        let year = part.year.map(|y| y.to_string()).unwrap_or_else(|| "----".into());
        println!("  {}  {}  [tmdb:{}]", year, part.title, part.external_id);
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let (source, config) = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            (p.to_path_buf(), config::load_config(p)?)
        }
        None => {
            println!("No config file specified, using defaults");
            (PathBuf::from("<defaults>"), Config::default())
        }
    };

    println!("✓ Configuration is valid ({})", source.display());
    println!("  Database: {}", config.database.path.display());
    println!(
        "  TMDB: {} ({} req/s, burst {})",
        if config.tmdb.api_key.is_empty() { "no API key" } else { "configured" },
        config.tmdb.rate_limit,
        config.tmdb.burst
    );
    println!(
        "  StashDB: {} ({})",
        if config.stashdb.api_key.is_empty() { "no API key" } else { "configured" },
        config.stashdb.endpoint
    );
    println!(
        "  Queue new records: {}",
        config.enrichment.queue_new_records
    );
    Ok(())
}
