// vim: tw=80
use std::{error, fmt};

use thiserror::Error;

use crate::{StateName, TypeSignature};

/// The error a result producer was programmed to raise.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// Errors reported by the engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Two overloads of one operation have identical signatures.
    #[error("ambiguous overload {method}{signature}: {reason}")]
    AmbiguousOverload {
        method: String,
        signature: TypeSignature,
        reason: String,
    },

    /// A state adoption would invalidate already-verified history.
    #[error("invalid state adoption: {0}")]
    InvalidStateAdoption(String),

    /// No expectation matched an intercepted call.
    #[error("{method}{args}: No matching expectation found in state \
            {state}{}", Candidates(.candidates))]
    UnexpectedCall {
        method: String,
        args: String,
        state: StateName,
        /// Why each programmed expectation was rejected, in queue order
        candidates: Vec<String>,
    },

    /// The matching expectation was programmed to fail.
    #[error("{method}: {source}")]
    Producer {
        method: String,
        #[source]
        source: BoxError,
    },

    /// The matching expectation has no result producer.
    #[error("{method}: Expectation #{index} has no return value.  Set one \
            with returning, return_const, return_once or raising")]
    MissingProducer {
        method: String,
        index: usize,
    },
}

impl Error {
    /// Is this the error a result producer was programmed to raise?
    pub fn is_producer_error(&self) -> bool {
        matches!(self, Error::Producer{..})
    }

    /// Borrow the error raised by a result producer
    pub fn producer_error(&self) -> Option<&(dyn error::Error + Send + Sync + 'static)> {
        match self {
            Error::Producer{source, ..} => Some(source.as_ref()),
            _ => None
        }
    }
}

struct Candidates<'a>(&'a [String]);

impl fmt::Display for Candidates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            write!(f, "\n  #{}: {}", i, c)?;
        }
        Ok(())
    }
}
