pub mod marker;
pub mod preferences;

use dupkit_core::config::Config;
use dupkit_core::snapshot::SnapshotIndex;
use dupkit_core::{Error, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info};

pub use marker::ConfigMarker;
pub use preferences::{read_preferences, StoragePreference};

#[derive(Debug, Clone)]
pub struct Engine {
    binary: PathBuf,
    repository: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RestoreJob<'a> {
    pub workdir: &'a Path,
    pub storage: &'a str,
    pub revision: u32,
    pub patterns: &'a [String],
    pub log_path: &'a Path,
}

impl Engine {
    pub fn new(binary: impl Into<PathBuf>, repository: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            repository: repository.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.engine.binary, &cfg.paths.repository)
    }

    pub fn repository(&self) -> &Path {
        &self.repository
    }

    pub fn preferences_dir(&self) -> PathBuf {
        self.repository.join(".duplicacy")
    }

    fn command(&self, workdir: &Path, args: &[&str]) -> Command {
        debug!("running {} {args:?} in {}", self.binary.display(), workdir.display());
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).current_dir(workdir);
        cmd
    }

    pub fn storage_names(&self) -> Result<Vec<String>> {
        let prefs = read_preferences(&self.preferences_dir())?;
        Ok(prefs.into_iter().map(|pref| pref.name).collect())
    }

    pub fn list_snapshots(&self, storage: &str) -> Result<SnapshotIndex> {
        let output = self
            .command(&self.repository, &["list", "-storage", storage])
            .stdin(Stdio::null())
            .output()
            .map_err(|err| engine_failure("duplicacy list", err))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = format!("{}{}", stdout, stderr).trim().to_string();
            return Err(Error::StorageUnavailable {
                storage: storage.to_string(),
                message: if message.is_empty() {
                    output.status.to_string()
                } else {
                    message
                },
            });
        }

        let index = SnapshotIndex::from_listing(storage, &stdout);
        info!("storage {storage} lists {} snapshots", index.snapshots.len());
        Ok(index)
    }

    /// Output goes to the terminal and to `job.log_path`, which is kept on failure.
    pub fn restore(&self, job: &RestoreJob<'_>) -> Result<()> {
        let revision = job.revision.to_string();
        let mut args = vec![
            "restore",
            "-r",
            revision.as_str(),
            "-storage",
            job.storage,
            "-stats",
            "--",
        ];
        args.extend(job.patterns.iter().map(String::as_str));

        let mut log = File::create(job.log_path)
            .map_err(|err| Error::io("failed to create restore log", job.log_path, err))?;
        let mut child = self
            .command(job.workdir, &args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| engine_failure("duplicacy restore", err))?;

        let stdout = child.stdout.take().ok_or_else(|| Error::EngineFailure {
            command: "duplicacy restore".to_string(),
            message: "failed to capture engine output".to_string(),
        })?;
        let copied = tee(stdout, &mut io::stdout().lock(), &mut log);
        let status = child
            .wait()
            .map_err(|err| engine_failure("duplicacy restore", err))?;
        copied.map_err(|err| Error::io("failed to write restore log", job.log_path, err))?;

        check_status("duplicacy restore", status)
    }

    pub fn check(&self, storage: &str) -> Result<()> {
        self.run_inherited(
            "duplicacy check",
            &["check", "-storage", storage, "-fossils", "-resurrect", "-tabular"],
        )
    }

    pub fn prune(&self, storage: &str) -> Result<()> {
        self.run_inherited("duplicacy prune", &["prune", "-storage", storage, "-exhaustive"])
    }

    pub fn backup(&self, storage: &str, limit_rate_kbps: Option<u64>) -> Result<()> {
        let rate = limit_rate_kbps.map(|kbps| kbps.to_string());
        let mut args = vec!["backup", "-storage", storage, "-stats"];
        if let Some(rate) = rate.as_deref() {
            args.extend(["-limit-rate", rate]);
        }
        self.run_inherited("duplicacy backup", &args)
    }

    fn run_inherited(&self, label: &str, args: &[&str]) -> Result<()> {
        let status = self
            .command(&self.repository, args)
            .stdin(Stdio::null())
            .status()
            .map_err(|err| engine_failure(label, err))?;
        check_status(label, status)
    }
}

fn tee(source: impl io::Read, terminal: &mut impl Write, log: &mut impl Write) -> io::Result<()> {
    let mut reader = BufReader::new(source);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        terminal.write_all(&line)?;
        log.write_all(&line)?;
    }
    terminal.flush()?;
    log.flush()
}

fn engine_failure(command: &str, err: io::Error) -> Error {
    Error::EngineFailure {
        command: command.to_string(),
        message: err.to_string(),
    }
}

fn check_status(command: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(Error::EngineFailure {
        command: command.to_string(),
        message: status.to_string(),
    })
}
