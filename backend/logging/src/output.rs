//! Output destinations
//!
//! `OutputPath` names the two symbolic destinations. Any other configured
//! value is treated as a filesystem path and opened for append.

use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::error::{Error, Result};

/// Permission bits for newly created log files.
#[cfg(unix)]
const LOG_FILE_MODE: u32 = 0o644;

/// A well-known output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPath {
    Stdout,
    Stderr,
}

impl OutputPath {
    /// Every symbolic destination, in declaration order.
    pub const ALL: [OutputPath; 2] = [OutputPath::Stdout, OutputPath::Stderr];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputPath::Stdout => "stdout",
            OutputPath::Stderr => "stderr",
        }
    }

    /// Check that `value` names a symbolic destination.
    pub fn validate(value: &str) -> Result<()> {
        Self::parse(value).map(|_| ())
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "stdout" => Ok(OutputPath::Stdout),
            "stderr" => Ok(OutputPath::Stderr),
            other => Err(Error::InvalidOutputPath(other.to_string())),
        }
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Resolve a configured output path into a writer factory.
///
/// Symbolic names bind to the process streams. Anything else is opened in
/// append mode and created when missing; the handle lives as long as the
/// returned writer.
pub fn open_output(output_path: &str) -> Result<BoxMakeWriter> {
    match OutputPath::parse(output_path) {
        Ok(OutputPath::Stdout) => Ok(BoxMakeWriter::new(std::io::stdout)),
        Ok(OutputPath::Stderr) => Ok(BoxMakeWriter::new(std::io::stderr)),
        Err(_) => {
            let path = Path::new(output_path);
            let mut options = OpenOptions::new();
            options.append(true).create(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(LOG_FILE_MODE);
            }
            let file = options.open(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "Opened log file");
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn parses_symbolic_names() {
        assert_eq!(OutputPath::parse("stdout").unwrap(), OutputPath::Stdout);
        assert_eq!("stderr".parse::<OutputPath>().unwrap(), OutputPath::Stderr);
    }

    #[test]
    fn string_form_round_trips() {
        for path in OutputPath::ALL {
            assert_eq!(OutputPath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn file_path_is_not_symbolic() {
        let err = OutputPath::parse("file.log").unwrap_err();
        assert!(matches!(err, Error::InvalidOutputPath(ref v) if v == "file.log"));
        assert!(OutputPath::validate("file.log").is_err());
        assert!(OutputPath::validate("").is_err());
        assert!(OutputPath::validate("STDOUT").is_err());
    }

    #[test]
    fn serializes_as_bare_string() {
        assert_eq!(serde_json::to_string(&OutputPath::Stderr).unwrap(), "\"stderr\"");
        let parsed: OutputPath = serde_json::from_str("\"stdout\"").unwrap();
        assert_eq!(parsed, OutputPath::Stdout);
    }

    #[test]
    fn absent_value_serializes_as_null() {
        let empty: Option<OutputPath> = None;
        assert_eq!(serde_json::to_string(&empty).unwrap(), "null");
    }

    #[test]
    fn rejects_unknown_json_value() {
        assert!(serde_json::from_str::<OutputPath>("\"file.log\"").is_err());
        assert!(serde_json::from_str::<OutputPath>("42").is_err());
    }

    #[test]
    fn opens_file_for_append() {
        let path =
            std::env::temp_dir().join(format!("sentinel-output-{}.log", uuid::Uuid::new_v4()));
        std::fs::write(&path, "existing\n").unwrap();

        let writer = open_output(path.to_str().unwrap()).unwrap();
        {
            use std::io::Write;
            let mut w = writer.make_writer();
            w.write_all(b"appended\n").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "existing\nappended\n");

        #[cfg(unix)]
        {
            let fresh =
                std::env::temp_dir().join(format!("sentinel-mode-{}.log", uuid::Uuid::new_v4()));
            open_output(fresh.to_str().unwrap()).unwrap();
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
            // umask can only clear bits
            assert_eq!(mode & !0o644 & 0o777, 0);
            let _ = std::fs::remove_file(fresh);
        }
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unopenable_path_is_io_error() {
        let path = std::env::temp_dir()
            .join(format!("sentinel-missing-{}", uuid::Uuid::new_v4()))
            .join("out.log");
        let err = open_output(path.to_str().unwrap()).unwrap_err();
        assert!(err.is_io());
        assert!(matches!(err, Error::Io { .. }));
    }
}
