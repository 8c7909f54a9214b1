//! Errors raised while building or evaluating path expressions.
//!
//! A step declining an efficient strategy is *not* an error: see
//! [`crate::Evaluator::initials`] for how that is signalled.

use thiserror::Error;

pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PathError {
    /// A step was constructed with something that is not an absolute IRI.
    #[error("malformed {operator} step: `{iri}` is not a valid IRI")]
    InvalidIri {
        operator: &'static str,
        iri: String,
        #[source]
        source: oxrdf::IriParseError,
    },

    /// The graph collaborator failed; the original error is kept as the source.
    #[error("graph lookup failed in `{primitive}` of {step}")]
    Graph {
        step: String,
        primitive: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("brute-force scan of {step} over {population} nodes exceeds the scan limit of {limit}")]
    ScanLimitExceeded {
        step: String,
        population: u64,
        limit: u64,
    },

    #[error("path {step} yields an empty set")]
    EmptyPath { step: String },

    #[error("invalid evaluation config: {0}")]
    Config(#[from] serde_json::Error),
}
