use fragseek::FragSeekError;
use fragseek::errors::ConfigurationError;

#[derive(Debug)]
pub enum CliError {
    Config {
        source: String,
    },
    ParseError {
        msg: String,
    },
    Io {
        source: String,
        path: Option<String>,
    },
    DataReading {
        source: String,
    },
    Search {
        source: String,
    },
}

impl CliError {
    pub fn io(source: std::io::Error, path: &std::path::Path) -> Self {
        CliError::Io {
            source: source.to_string(),
            path: Some(path.to_string_lossy().to_string()),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config { source } => write!(f, "Error interpreting the config: {}", source),
            CliError::ParseError { msg } => write!(f, "Error parsing input: {}", msg),
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error reading file {}: {}", path, source)
                } else {
                    write!(f, "Error reading file: {}", source)
                }
            }
            CliError::DataReading { source } => write!(f, "Error reading data: {}", source),
            CliError::Search { source } => write!(f, "Error during the search: {}", source),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        CliError::Config {
            source: e.to_string(),
        }
    }
}

impl From<FragSeekError> for CliError {
    fn from(e: FragSeekError) -> Self {
        match e {
            FragSeekError::Configuration(e) => e.into(),
            FragSeekError::ParseError { msg } => CliError::ParseError { msg },
            FragSeekError::Io { source, path } => CliError::Io {
                source: source.to_string(),
                path: path.map(|x| x.to_string_lossy().to_string()),
            },
            other => CliError::Search {
                source: format!("{:?}", other),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::ParseError { msg: e.to_string() }
    }
}
