//! Log file setup
//!
//! The log file records error-level events only unless `RUST_LOG` asks for
//! more. Operator-facing status goes to stdout separately.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Install the global logger, appending to `log_file`
///
/// Falls back to stderr when the file cannot be opened; the returned error
/// only reports that the fallback happened.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Error)
        .parse_env(Env::default())
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    match open_log_file(log_file) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            builder.try_init().context("Logger already initialized")?;
            Ok(())
        }
        Err(err) => {
            builder.target(Target::Stderr);
            builder.try_init().context("Logger already initialized")?;
            Err(anyhow!(
                "cannot open log file {}: {}; logging to stderr",
                log_file.display(),
                err
            ))
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("process.log");

        {
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "first").unwrap();
        }
        {
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "second").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
