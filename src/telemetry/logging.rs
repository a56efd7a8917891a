use crate::error::{LootError, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "RAIDLOOT_LOG";
pub const LOG_FILE: &str = "loot.log";

const HEADER_LINE: &str = "-------------------------------------------------------------------------------";
const HEADER_TITLE: &str = "raidloot - procedural loot engine";

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber writing to `<root>/log/loot.log`. `level`
/// is an `EnvFilter` directive; `RAIDLOOT_LOG` takes precedence when set.
/// Later calls are no-ops.
pub fn init(root: &Path, level: &str) -> Result<()> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }
    let file = open_log_file(root)?;
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| LootError::Config(format!("invalid log level '{level}': {err}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|err| LootError::Config(format!("log system init failed: {err}")))?;
    let _ = INITIALIZED.set(());
    Ok(())
}

pub fn open_log_file(root: &Path) -> Result<File> {
    let log_dir = root.join("log");
    std::fs::create_dir_all(&log_dir).map_err(|source| LootError::Io {
        path: log_dir.display().to_string(),
        source,
    })?;
    let path = log_dir.join(LOG_FILE);
    let io_error = |source| LootError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_error)?;
    if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        write_header(&mut file).map_err(io_error)?;
    }
    Ok(file)
}

fn write_header(file: &mut File) -> std::io::Result<()> {
    let started = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    writeln!(file, "{HEADER_LINE}")?;
    writeln!(file, "{HEADER_TITLE}")?;
    writeln!(file, "{LOG_FILE} - started at unix time {started}")?;
    Ok(())
}
