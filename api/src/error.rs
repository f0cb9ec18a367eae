//! Error types. Per spec §7/§9, the core never logs to a process-global
//! sink; `TurtleError` carries everything a caller-injected error sink
//! needs (a [`Status`], an optional [`Cursor`], and a message) and errors
//! are always returned through `Result`, never printed directly.

use crate::status::Status;
use crate::Cursor;

/// A recoverable or fatal error raised while reading or writing. Carries
/// the stable [`Status`] code so a caller at an FFI-shaped boundary can
/// recover the integer, plus the cursor (when available) for diagnostics.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("{status:?} at {cursor:?}: {message}")]
pub struct TurtleError {
    pub status: Status,
    pub cursor: Option<Cursor>,
    pub message: String,
}

impl TurtleError {
    pub fn new(status: Status, cursor: Option<Cursor>, message: impl Into<String>) -> Self {
        Self {
            status,
            cursor,
            message: message.into(),
        }
    }

    pub fn bad_arg(message: impl Into<String>) -> Self {
        Self::new(Status::ErrBadArg, None, message)
    }

    pub fn bad_stream(message: impl Into<String>) -> Self {
        Self::new(Status::ErrBadStream, None, message)
    }
}

/// A syntax error encountered mid-document. The reader reports this
/// through the injectable error sink and then recovers by skipping to the
/// next statement boundary (spec §4.3/§7); it is not necessarily fatal.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("syntax error at {cursor:?}: {message}")]
pub struct TurtleSyntaxError {
    pub cursor: Cursor,
    pub message: String,
}

/// Injectable error sink: the default writes to stderr; callers may supply
/// their own to avoid process-global logging (spec §9).
pub trait ErrorSink {
    fn report(&mut self, error: &TurtleSyntaxError);
}

/// Default [`ErrorSink`] used when a reader is not given one explicitly.
#[derive(Debug, Default)]
pub struct StderrErrorSink;

impl ErrorSink for StderrErrorSink {
    fn report(&mut self, error: &TurtleSyntaxError) {
        eprintln!("{error}");
    }
}
