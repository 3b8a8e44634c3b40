//! Interactive confirmation gate run before any cluster mutation.

use std::io::{BufRead, Write};

use thiserror::Error;

use crate::request::RenameRequest;

/// Classified operator answer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Answer {
    /// `y` or `yes`.
    Yes,
    /// `n` or `no`.
    No,
    /// Anything else, normalised.
    Unrecognized(String),
}

impl Answer {
    /// Classifies a raw input line, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn classify(line: &str) -> Self {
        let normalised = line.trim().to_lowercase();
        match normalised.as_str() {
            "y" | "yes" => Self::Yes,
            "n" | "no" => Self::No,
            _ => Self::Unrecognized(normalised),
        }
    }
}

/// Errors raised by the confirmation gate.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfirmError {
    /// The operator answered no.
    #[error("confirmation was not successful, please type yes to continue")]
    Declined,
    /// The operator answered something other than yes or no.
    #[error("unrecognised answer '{answer}', please type yes or no")]
    Unrecognized {
        /// Normalised answer that was read.
        answer: String,
    },
    /// The prompt could not be written or the answer could not be read.
    #[error("failed to prompt for confirmation: {0}")]
    Io(String),
}

/// Renders the question shown to the operator.
#[must_use]
pub fn prompt_text(request: &RenameRequest) -> String {
    format!(
        "Rename PVC from '{}' in namespace '{}' to '{}' in namespace '{}'? (yes or no) ",
        request.source_name,
        request.source_namespace,
        request.target_name,
        request.target_namespace
    )
}

/// Asks the operator to confirm `request` unless confirmation is skipped.
///
/// Writes one prompt and reads one line. A malformed answer is final; the
/// operator is not asked again.
///
/// # Errors
///
/// Returns [`ConfirmError::Declined`] for `n`/`no`,
/// [`ConfirmError::Unrecognized`] for anything else that is not `y`/`yes`
/// (including end of input), and [`ConfirmError::Io`] when the streams fail.
pub fn confirm<R, W>(request: &RenameRequest, input: &mut R, output: &mut W) -> Result<(), ConfirmError>
where
    R: BufRead,
    W: Write,
{
    if request.skip_confirmation {
        return Ok(());
    }

    output
        .write_all(prompt_text(request).as_bytes())
        .and_then(|()| output.flush())
        .map_err(|err| ConfirmError::Io(err.to_string()))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|err| ConfirmError::Io(err.to_string()))?;

    match Answer::classify(&line) {
        Answer::Yes => Ok(()),
        Answer::No => Err(ConfirmError::Declined),
        Answer::Unrecognized(answer) => Err(ConfirmError::Unrecognized { answer }),
    }
}
