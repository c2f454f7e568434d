//! Init command implementation

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use anylint_core::LinterConfig;
use miette::{IntoDiagnostic, Result, miette};
use tracing::info;

const STARTER_CONFIG: &str = r#"{
  "$schema": "https://raw.githubusercontent.com/simorgh3196/anylint/main/schemas/v1/config.json",
  "linters": [
    {
      // Runs on save; reads "file:line:column: message" lines from stderr.
      "name": "example",
      "disabled": true,
      "binPath": "example-lint",
      "args": ["${file}"],
      "on": ["save"],
      "diagnostic": {
        "type": "lines",
        "output": "stderr",
        "format": "${file}:${startLine}:${startColumn}: ${severity}: ${message}",
        "severityMap": { "E": "error", "W": "warning" }
      }
    }
  ]
}
"#;

/// Writes the starter configuration to the first discovery file name.
///
/// The starter text is checked against the schema before anything touches
/// the disk. An existing file is only replaced with `force`.
pub fn run_init(force: bool) -> Result<()> {
    LinterConfig::from_jsonc(STARTER_CONFIG).into_diagnostic()?;
    let config_path = Path::new(LinterConfig::CONFIG_FILES[0]);

    let file = match create_exclusive(config_path) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && force => {
            remove_if_present(config_path)?;
            create_exclusive(config_path)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(miette!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            ));
        }
        other => other,
    };
    let mut file = file.into_diagnostic()?;
    file.write_all(STARTER_CONFIG.as_bytes()).into_diagnostic()?;

    info!("Created {}", config_path.display());
    Ok(())
}

/// Creates `path`, refusing to follow a symlink planted at it.
fn create_exclusive(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW);
    }
    options.open(path)
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e).into_diagnostic(),
        _ => Ok(()),
    }
}
