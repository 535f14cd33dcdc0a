use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One line of the mirror configuration: a source and the replicas it is pushed to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MirrorSpec {
    pub source_url: String,
    pub destination_urls: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config line {line}: {message}")]
    Invalid { line: usize, message: String },
    #[error("cannot derive a local directory name from source {source_url}")]
    UnnamedSource { source_url: String },
    #[error("sources {first} and {second} both map to {}", .path.display())]
    DuplicateLocalPath {
        first: String,
        second: String,
        path: PathBuf,
    },
}

pub fn parse_config(path: &Path) -> Result<Vec<MirrorSpec>, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&data)
}

/// Parses tab-delimited config text. Fields are taken verbatim: no comments,
/// quoting, or whitespace trimming beyond the line terminator.
pub fn parse_config_str(data: &str) -> Result<Vec<MirrorSpec>, ConfigError> {
    let mut specs = Vec::new();
    for (index, line) in data.lines().enumerate() {
        let line_no = index + 1;
        let mut fields = line.split('\t');
        let source_url = fields.next().unwrap_or_default();
        if source_url.is_empty() {
            return Err(ConfigError::Invalid {
                line: line_no,
                message: "missing source url".to_string(),
            });
        }
        let destination_urls: Vec<String> = fields.map(str::to_string).collect();
        if destination_urls.is_empty() {
            return Err(ConfigError::Invalid {
                line: line_no,
                message: format!("source {source_url} has no destination urls"),
            });
        }
        if destination_urls.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid {
                line: line_no,
                message: format!("source {source_url} has an empty destination url"),
            });
        }
        specs.push(MirrorSpec {
            source_url: source_url.to_string(),
            destination_urls,
        });
    }
    Ok(specs)
}
