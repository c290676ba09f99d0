use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The focus allele identifier resolved to no record.
    #[error("variant `{0}` not found")]
    VariantNotFound(String),

    #[error("plugin `{0}` not found")]
    PluginNotFound(String),

    #[error("phenotype index not found at `{}`: {source}", .path.display())]
    IndexNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Persisted state already exists where a save was attempted.
    #[error("refusing to overwrite existing phenotype index at `{}`", .0.display())]
    Conflict(PathBuf),

    #[error("cannot write `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("failed to load plugin `{name}`: {source}")]
    Load {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// No included sample had a called allele at the locus.
    #[error("allele frequency of `{0}` is undefined: no called alleles among included samples")]
    UndefinedFrequency(String),

    /// Failure reported by a variant reader.
    #[error("variant reader: {0}")]
    Reader(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::VariantNotFound(_) | Self::PluginNotFound(_) | Self::IndexNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
