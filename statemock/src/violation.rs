// vim: tw=80
//! Reportable mismatches between expected and actual behavior.
use std::fmt;

use crate::{Error, StateName};

/// A reported mismatch between expected and actual call behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// A call that no expectation matched, recorded instead of raised.
    UnexpectedCall {
        method: String,
        args: String,
        state: StateName,
    },
    /// An expectation that was not called as often as required.
    UnsatisfiedExpectation {
        method: String,
        /// Position of the expectation within its method's queue
        index: usize,
        expected: usize,
        actual: usize,
        precondition: Option<StateName>,
    },
}

impl Violation {
    pub fn method(&self) -> &str {
        match self {
            Violation::UnexpectedCall{method, ..} => method,
            Violation::UnsatisfiedExpectation{method, ..} => method,
        }
    }

    pub fn is_unexpected_call(&self) -> bool {
        matches!(self, Violation::UnexpectedCall{..})
    }

    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Violation::UnsatisfiedExpectation{..})
    }

    /// The violation an error stands for, if it is a reportable one
    pub fn from_error(e: &Error) -> Option<Self> {
        match e {
            Error::UnexpectedCall{method, args, state, ..} => {
                Some(Violation::UnexpectedCall {
                    method: method.clone(),
                    args: args.clone(),
                    state: state.clone()
                })
            }
            _ => None
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnexpectedCall{method, args, state} => {
                write!(f, "{}{}: No matching expectation found in state {}",
                       method, args, state)
            }
            Violation::UnsatisfiedExpectation{method, index, expected,
                                              actual, precondition} =>
            {
                write!(f, "{}: Expectation #{} ", method, index)?;
                if let Some(pre) = precondition {
                    write!(f, "in state {} ", pre)?;
                }
                write!(f, "called {} time(s) which is fewer than expected {}",
                       actual, expected)
            }
        }
    }
}

/// Render a list of violations as one collective report.
///
/// Returns `None` if there is nothing to report.
pub fn report(violations: &[Violation]) -> Option<String> {
    if violations.is_empty() {
        return None;
    }
    let mut s = format!("{} violation(s):", violations.len());
    for v in violations {
        s.push_str("\n  ");
        s.push_str(&v.to_string());
    }
    Some(s)
}
