//! Resolution of raw command-line arguments into a validated invocation.

use std::{
    fs::{self, File},
    io,
    path::PathBuf,
};

use thiserror::Error;
use tracing::debug;

use crate::operation::{Operation, Parameter};

/// A numeric parameter, keeping the text it was given as.
#[derive(Clone, Debug, PartialEq)]
pub struct Number {
    text: String,
    value: f64,
}

impl Number {
    /// Parses a strict decimal number, i.e., `^[0-9]+([.][0-9]+)?$`.
    pub fn parse(s: &str) -> Option<Self> {
        if !is_numeric(s) {
            return None;
        }

        let value = s.parse().ok()?;

        Some(Self {
            text: s.into(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The form used in output names, e.g., `2.5` becomes `2_5`.
    pub fn tag(&self) -> String {
        self.text.replace('.', "_")
    }
}

fn is_numeric(s: &str) -> bool {
    fn is_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    match s.split_once('.') {
        Some((integer, fraction)) => is_digits(integer) && is_digits(fraction),
        None => is_digits(s),
    }
}

/// A validated operation with its numeric parameter and canonical input paths.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    operation: Operation,
    parameter: Option<Number>,
    files: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("missing {name} for {}", operation.name())]
    MissingParameter {
        operation: Operation,
        name: &'static str,
    },
    #[error("{} does not take a numeric parameter", operation.name())]
    UnexpectedParameter { operation: Operation },
    #[error("{} needs at least {min} image(s)", operation.name())]
    TooFewFiles { operation: Operation, min: usize },
    #[error("{arg}: no such readable file")]
    MissingInput {
        arg: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Whether this is a misuse of the operation rather than a bad input.
    pub fn is_usage(&self) -> bool {
        !matches!(self, Self::MissingInput { .. })
    }
}

impl Invocation {
    /// Builds an invocation directly, without touching the filesystem.
    pub fn new(operation: Operation, parameter: Option<Number>, files: Vec<PathBuf>) -> Self {
        Self {
            operation,
            parameter,
            files,
        }
    }

    /// Classifies and validates the arguments that follow the operation name.
    ///
    /// The first argument is the numeric parameter if and only if it looks like a decimal
    /// number; every other argument is a path. Argument counts are checked before any path is
    /// touched, and every path must canonicalize to a readable regular file.
    pub fn resolve<S>(operation: Operation, args: &[S]) -> Result<Self, ResolveError>
    where
        S: AsRef<str>,
    {
        let (parameter, paths) = match args.split_first() {
            Some((first, rest)) => match Number::parse(first.as_ref()) {
                Some(number) => (Some(number), rest),
                None => (None, args),
            },
            None => (None, args),
        };

        let parameter = match (operation.parameter(), parameter) {
            (Parameter::None, Some(_)) => {
                return Err(ResolveError::UnexpectedParameter { operation });
            }
            (Parameter::Required { name }, None) => {
                return Err(ResolveError::MissingParameter { operation, name });
            }
            (Parameter::Optional { default, .. }, None) => Number::parse(default),
            (_, parameter) => parameter,
        };

        let min = operation.min_files();

        if paths.len() < min {
            return Err(ResolveError::TooFewFiles { operation, min });
        }

        let files = paths
            .iter()
            .map(|arg| canonicalize(arg.as_ref()))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            operation,
            parameter,
            files,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn parameter(&self) -> Option<&Number> {
        self.parameter.as_ref()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn canonicalize(arg: &str) -> Result<PathBuf, ResolveError> {
    let missing_input = |source| ResolveError::MissingInput {
        arg: arg.into(),
        source,
    };

    let path = fs::canonicalize(arg).map_err(missing_input)?;

    if !path.is_file() {
        return Err(missing_input(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    File::open(&path).map_err(missing_input)?;

    debug!(arg, path = ?path, "resolved input");

    Ok(path)
}
