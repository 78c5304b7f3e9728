use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use dupkit_core::config::Config;
use dupkit_core::destination::prepare_destination;
use dupkit_core::filter::{FilterToken, FilterTranslator};
use dupkit_core::resolver::resolve_point_in_time;
use dupkit_core::settings::{Settings, DISABLE_MAINTENANCE};
use dupkit_core::timestamp::SnapshotTime;
use dupkit_core::Error;
use dupkit_engine::{ConfigMarker, Engine, RestoreJob};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_STORAGE: &str = "default";

#[derive(Parser)]
#[command(name = "dupkit", version, about = "Point-in-time restore and upkeep for duplicacy repositories")]
struct Cli {
    /// Defaults to /etc/dupkit/config.toml when present.
    #[arg(long)]
    config: Option<String>,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Restore paths as they were at a point in time.
    Restore {
        /// Restore into this (empty) directory instead of in place.
        #[arg(long)]
        dest: Option<String>,
        /// Print snapshot times, oldest first, and exit.
        #[arg(long)]
        list: bool,
        #[arg(long, default_value = DEFAULT_STORAGE)]
        storage: String,
        /// YYYY-MM-DDTHH:MM; defaults to now.
        #[arg(long)]
        time: Option<String>,
        /// Paths or filter expressions; put `-` patterns after `--`.
        paths: Vec<String>,
    },
    /// Check the integrity of every configured storage.
    Check,
    /// Run the fossilizing prune unless maintenance is disabled.
    Maintain,
    /// Back up the repository, honoring the configured bandwidth limit.
    Backup {
        #[arg(long, default_value = DEFAULT_STORAGE)]
        storage: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = Config::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Command::Restore {
            dest,
            list,
            storage,
            time,
            paths,
        } => {
            if list {
                list_snapshots(&cfg, &storage)
            } else {
                restore(&cfg, &storage, time.as_deref(), dest.as_deref(), &paths)
            }
        }
        Command::Check => check(&cfg),
        Command::Maintain => maintain(&cfg),
        Command::Backup { storage } => backup(&cfg, &storage),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn list_snapshots(cfg: &Config, storage: &str) -> Result<()> {
    let index = Engine::from_config(cfg).list_snapshots(storage)?;
    for ts in index.timeline() {
        println!("{ts}");
    }
    Ok(())
}

fn restore(
    cfg: &Config,
    storage: &str,
    time: Option<&str>,
    dest: Option<&str>,
    paths: &[String],
) -> Result<()> {
    if paths.is_empty() {
        return Err(Error::invalid("at least one path or filter expression is required").into());
    }
    let desired = match time {
        Some(time) => SnapshotTime::parse(time)?,
        None => SnapshotTime::now()?,
    };
    let destination = prepare_destination(dest, &cfg.paths.repository)?;

    let translator = FilterTranslator::new(&cfg.paths.repository, &cfg.paths.guess_root);
    let patterns: Vec<String> = translator
        .translate_all(paths)
        .iter()
        .map(FilterToken::pattern)
        .collect();

    let engine = Engine::from_config(cfg);
    let index = engine.list_snapshots(storage)?;
    let snapshot = resolve_point_in_time(&index, &desired)?;
    info!(
        "restoring revision {} ({}) of storage {storage} for {desired}",
        snapshot.revision, snapshot.timestamp
    );

    let destination = destination.create()?;
    let _marker = if destination.is_in_place() {
        None
    } else {
        let prefs = engine.preferences_dir();
        let prefs = fs::canonicalize(&prefs).unwrap_or(prefs);
        Some(ConfigMarker::write(destination.path(), &prefs)?)
    };

    let log_path = destination
        .path()
        .join(format!("restore-r{}.log", snapshot.revision));
    engine
        .restore(&RestoreJob {
            workdir: destination.path(),
            storage,
            revision: snapshot.revision,
            patterns: &patterns,
            log_path: &log_path,
        })
        .with_context(|| format!("restore log kept at {}", log_path.display()))?;

    info!("restore log written to {}", log_path.display());
    Ok(())
}

fn check(cfg: &Config) -> Result<()> {
    let engine = Engine::from_config(cfg);
    let storages = engine
        .storage_names()
        .context("failed to enumerate storages")?;
    for name in storages {
        println!("========== Checking storage {name} ==========");
        if let Err(err) = engine.check(&name) {
            warn!("check of storage {name} failed: {err}");
        }
    }
    Ok(())
}

fn maintain(cfg: &Config) -> Result<()> {
    let settings = Settings::load(&cfg.paths.settings)?;
    if settings.disable_maintenance {
        info!("maintenance skipped: {DISABLE_MAINTENANCE} is set");
        return Ok(());
    }

    let engine = Engine::from_config(cfg);
    let storages = engine
        .storage_names()
        .context("failed to enumerate storages")?;
    let mut failed = Vec::new();
    for name in storages {
        if let Err(err) = engine.prune(&name) {
            warn!("prune of storage {name} failed: {err}");
            failed.push(name);
        }
    }
    if !failed.is_empty() {
        return Err(anyhow!("maintenance failed for: {}", failed.join(", ")));
    }
    Ok(())
}

fn backup(cfg: &Config, storage: &str) -> Result<()> {
    let settings = Settings::load(&cfg.paths.settings)?;
    let limit = settings.limit_rate_kbps();
    if let Some(kbps) = limit {
        info!("limiting upload to {kbps} KB/s");
    }
    Engine::from_config(cfg).backup(storage, limit)?;
    Ok(())
}
