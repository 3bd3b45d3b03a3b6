use std::path::PathBuf;

#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedSlicesSameLength {
        expected: usize,
        other: usize,
        context: String,
    },
    ExpectedFiniteNonNanData {
        context: String,
    },
    ExpectedSortedData {
        context: String,
    },
}

/// Problems with the user supplied configuration.
///
/// These are all detected before any parallel work starts.
#[derive(Debug)]
pub enum ConfigurationError {
    EmptyInput {
        context: &'static str,
    },
    InvalidModification {
        name: String,
        reason: String,
    },
    InvalidSearchMode {
        name: String,
        reason: String,
    },
    InvalidParameter {
        field: &'static str,
        reason: String,
    },
    UnknownProtease {
        name: String,
    },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::EmptyInput { context } => write!(f, "Empty input: {}", context),
            ConfigurationError::InvalidModification { name, reason } => {
                write!(f, "Invalid modification {:?}: {}", name, reason)
            }
            ConfigurationError::InvalidSearchMode { name, reason } => {
                write!(f, "Invalid search mode {:?}: {}", name, reason)
            }
            ConfigurationError::InvalidParameter { field, reason } => {
                write!(f, "Invalid value for {}: {}", field, reason)
            }
            ConfigurationError::UnknownProtease { name } => {
                write!(f, "Unknown protease {:?}", name)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[derive(Debug)]
pub enum CacheError {
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    Encode {
        source: rmp_serde::encode::Error,
        path: PathBuf,
    },
    Decode {
        source: rmp_serde::decode::Error,
        path: PathBuf,
    },
    VersionMismatch {
        expected: u32,
        found: u32,
        path: PathBuf,
    },
    SignatureMismatch {
        expected: String,
        found: String,
        path: PathBuf,
    },
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Io { source, path } => {
                write!(f, "IO error on cache file {}: {}", path.display(), source)
            }
            CacheError::Encode { source, path } => {
                write!(f, "Error encoding cache file {}: {}", path.display(), source)
            }
            CacheError::Decode { source, path } => {
                write!(f, "Error decoding cache file {}: {}", path.display(), source)
            }
            CacheError::VersionMismatch {
                expected,
                found,
                path,
            } => write!(
                f,
                "Cache file {} has format version {} (expected {})",
                path.display(),
                found,
                expected
            ),
            CacheError::SignatureMismatch {
                expected,
                found,
                path,
            } => write!(
                f,
                "Cache file {} was built for {:?} (expected {:?})",
                path.display(),
                found,
                expected
            ),
        }
    }
}

impl std::error::Error for CacheError {}

#[derive(Debug)]
pub enum FragSeekError {
    Configuration(ConfigurationError),
    DataProcessing(DataProcessingError),
    Cache(CacheError),
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    ParseError {
        msg: String,
    },
    /// A parallel worker could not finish its share of the work.
    WorkerFailed {
        context: String,
    },
}

impl std::fmt::Display for FragSeekError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for FragSeekError {}

pub type Result<T> = std::result::Result<T, FragSeekError>;

impl From<ConfigurationError> for FragSeekError {
    fn from(x: ConfigurationError) -> Self {
        Self::Configuration(x)
    }
}

impl From<DataProcessingError> for FragSeekError {
    fn from(x: DataProcessingError) -> Self {
        Self::DataProcessing(x)
    }
}

impl From<CacheError> for FragSeekError {
    fn from(x: CacheError) -> Self {
        Self::Cache(x)
    }
}

impl From<std::io::Error> for FragSeekError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            path: None,
        }
    }
}

impl From<csv::Error> for FragSeekError {
    fn from(val: csv::Error) -> Self {
        FragSeekError::ParseError {
            msg: val.to_string(),
        }
    }
}
