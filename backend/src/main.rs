mod audit;
mod config;
mod courts;
mod maintenance;
mod matcher;
mod recorder;
mod services;
mod store;
mod urn;

use crate::config::Config;
use crate::matcher::CaseMatcher;
use crate::store::Store;
use actix_web::{web, App, HttpServer};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use common::model::court::Court;
use env_logger::Env;
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "make-a-plea", version, about = "Make a Plea URN and audit service")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create or upgrade the database schema.
    Migrate,
    /// Register the court serving a police region, replacing any other.
    AddCourt(CourtArgs),
    /// Report which URNs in a list have a case.
    CheckUrns { file: PathBuf },
    /// Re-run recorded URN entries against the current cases.
    ReplayValidations,
    /// Check stored audit events against their payload hashes.
    VerifyAudit,
    /// Delete data older than the retention period.
    Purge,
}

#[derive(Args)]
struct CourtArgs {
    /// Two digit police region code.
    region_code: String,
    court_name: String,
    #[arg(long)]
    court_code: Option<String>,
    /// Only accept URNs for which an unsent case has been imported.
    #[arg(long)]
    validate_urn: bool,
    #[arg(long)]
    disabled: bool,
}

impl From<CourtArgs> for Court {
    fn from(args: CourtArgs) -> Self {
        Court {
            region_code: args.region_code,
            court_code: args.court_code,
            court_name: args.court_name,
            enabled: !args.disabled,
            validate_urn: args.validate_urn,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    if let Err(e) = cli.config.validate() {
        error!("invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config),
        Command::Migrate => migrate(&cli.config),
        Command::AddCourt(args) => add_court(&cli.config, args.into()),
        Command::CheckUrns { file } => check_urns(&cli.config, &file),
        Command::ReplayValidations => replay_validations(&cli.config),
        Command::VerifyAudit => verify_audit(&cli.config),
        Command::Purge => purge(&cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[actix_web::main]
async fn serve(config: Config) -> io::Result<()> {
    open_migrated(&config).map_err(io::Error::other)?;

    let host = config.host.clone();
    let port = config.port;
    info!("Server running at http://{}:{}", host, port);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(1024 * 1024))
            .app_data(config.clone())
            .service(services::urn::configure_routes())
            .service(services::cases::configure_routes())
            .service(services::audit_events::configure_routes())
    })
    .bind((host, port))?
    .run()
    .await
}

fn open_migrated(config: &Config) -> Result<Store, store::StoreError> {
    let mut store = Store::open(&config.database)?;
    let from = store.migrate()?;
    if from != store::schema::SCHEMA_VERSION {
        info!(
            "database {} migrated from schema {} to {}",
            config.database.display(),
            from,
            store::schema::SCHEMA_VERSION
        );
    }
    Ok(store)
}

fn migrate(config: &Config) -> io::Result<()> {
    let store = open_migrated(config).map_err(io::Error::other)?;
    println!("{}", describe(&store).map_err(io::Error::other)?);
    Ok(())
}

fn describe(store: &Store) -> Result<String, store::StoreError> {
    Ok(format!(
        "Schema version {}: {} courts, {} cases, {} data validations, {} audit events",
        store.schema_version()?,
        store.courts()?.len(),
        store.count_cases()?,
        store.count_data_validations()?,
        store.count_audit_events()?
    ))
}

fn add_court(config: &Config, court: Court) -> io::Result<()> {
    if court.region_code.len() != 2 || !court.region_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("region code {:?} must be two digits", court.region_code),
        ));
    }
    let store = open_migrated(config).map_err(io::Error::other)?;
    store.save_court(&court).map_err(io::Error::other)?;
    info!(
        "region {} is served by {}{}",
        court.region_code,
        court.court_name,
        if court.enabled { "" } else { " (disabled)" }
    );
    Ok(())
}

fn check_urns(config: &Config, file: &Path) -> io::Result<()> {
    let store = open_migrated(config).map_err(io::Error::other)?;
    let matcher = CaseMatcher::new(&store, config.fuzzy());
    let input = BufReader::new(File::open(file)?);
    let report = maintenance::check_urns(input, &matcher, &config.urn_rules())
        .map_err(io::Error::other)?;
    println!("{}", report);
    Ok(())
}

fn replay_validations(config: &Config) -> io::Result<()> {
    let store = open_migrated(config).map_err(io::Error::other)?;
    let matcher = CaseMatcher::new(&store, config.fuzzy());
    let report =
        recorder::replay(&store, &matcher, &config.urn_rules()).map_err(io::Error::other)?;
    println!("Replayed {}", report.replayed);
    println!("Unparseable {}", report.unparseable);
    println!("Changed {}", report.changed);
    println!("Newly matched {}", report.newly_matched);
    Ok(())
}

fn verify_audit(config: &Config) -> io::Result<()> {
    let store = open_migrated(config).map_err(io::Error::other)?;
    let check = maintenance::verify_audit_events(&store).map_err(io::Error::other)?;
    println!("Checked {}", check.checked);
    for id in &check.mismatched {
        println!("Audit event {} does not match its hash", id);
    }
    if check.mismatched.is_empty() {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "{} audit events failed verification",
            check.mismatched.len()
        )))
    }
}

fn purge(config: &Config) -> io::Result<()> {
    let mut store = open_migrated(config).map_err(io::Error::other)?;
    let counts = maintenance::purge(&mut store, config.retention(), Utc::now())
        .map_err(io::Error::other)?;
    println!(
        "Deleted {} cases, {} data validations, {} audit events",
        counts.cases, counts.data_validations, counts.audit_events
    );
    Ok(())
}
