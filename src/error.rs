use thiserror::Error;

use crate::types::ValueType;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed header line {line:?}: {reason}")]
    MalformedHeader { line: String, reason: String },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error(
        "sample {sample}: {token:?} has {found} colon-separated fields, but FORMAT declares only {expected}"
    )]
    MalformedSampleToken {
        sample: String,
        token: String,
        found: usize,
        expected: usize,
    },
    #[error("{key}: cannot parse {raw:?} as {expected}")]
    FieldCoercion {
        key: String,
        raw: String,
        expected: ValueType,
    },
    #[error("unrecognized ALT allele {0:?}")]
    UnrecognizedAltToken(String),
    #[error("header declares {expected} samples, record has {found}")]
    SampleCountMismatch { expected: usize, found: usize },
    #[error("sample {sample}: {source}")]
    InSample {
        sample: String,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("{chrom}:{pos}: {source}")]
    AtSite {
        chrom: String,
        pos: u32,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attach site coordinates to a structural failure.
    pub(crate) fn at_site(self, chrom: &str, pos: u32) -> Self {
        DecodeError::AtSite {
            chrom: chrom.to_owned(),
            pos,
            source: Box::new(self),
        }
    }

    pub(crate) fn in_sample(self, sample: &str) -> Self {
        DecodeError::InSample {
            sample: sample.to_owned(),
            source: Box::new(self),
        }
    }

    /// The sample column the failure occurred in, if known.
    pub fn sample(&self) -> Option<&str> {
        match self {
            DecodeError::AtSite { source, .. } => source.sample(),
            DecodeError::InSample { sample, .. }
            | DecodeError::MalformedSampleToken { sample, .. } => Some(sample.as_str()),
            _ => None,
        }
    }

    /// The innermost error, skipping any site or sample context.
    pub fn kind(&self) -> &DecodeError {
        match self {
            DecodeError::AtSite { source, .. } | DecodeError::InSample { source, .. } => {
                source.kind()
            }
            e => e,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
