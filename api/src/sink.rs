//! The sink abstraction (spec §4.6) and the byte-level source/sink traits
//! the reader and writer are built over (spec §4.2/§6).

use crate::status::Status;
use crate::{Node, Statement};

/// A pull source of bytes, one byte (or one page) at a time. Implemented
/// by an in-memory buffer or a thin adapter over a user `read`/`error`
/// callback pair (spec §4.2/§6); the reader only ever calls `peek` and
/// `advance`.
pub trait ByteSource {
    /// Returns the current byte without consuming it, or `None` at EOF.
    fn peek(&mut self) -> Option<u8>;

    /// Consumes the current byte, refilling the internal buffer as needed
    /// and advancing the cursor. Calling `advance` at EOF is a no-op.
    fn advance(&mut self) -> Result<(), Status>;

    fn line(&self) -> u32;
    fn col(&self) -> u32;
}

/// A push sink of bytes. Implemented by an in-memory buffer or a thin
/// adapter over a user `write` callback (spec §6).
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Status>;
}

impl<W: std::io::Write> ByteSink for W {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Status> {
        self.write_all(bytes).map_err(|_| Status::ErrBadStream)
    }
}

/// Bundle of callbacks receiving parsed events, per spec §4.6. Each method
/// returns a [`Status`]; any non-[`Status::Success`] return aborts reader
/// event emission and is surfaced to the reader's caller. Default
/// implementations accept everything, so a sink only needs to override the
/// events it cares about.
pub trait Sink {
    fn base(&mut self, _uri: &Node) -> Status {
        Status::Success
    }

    fn prefix(&mut self, _name: &str, _uri: &Node) -> Status {
        Status::Success
    }

    fn statement(&mut self, _flags: crate::status::StatementFlags, _statement: &Statement) -> Status {
        Status::Success
    }

    fn end(&mut self, _node: &Node) -> Status {
        Status::Success
    }
}

/// A sink that appends every statement it receives to a `Vec`, useful for
/// tests and for callers that want the whole document materialized.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub statements: Vec<Statement>,
    pub prefixes: Vec<(String, Node)>,
    pub base: Option<Node>,
}

impl Sink for CollectingSink {
    fn base(&mut self, uri: &Node) -> Status {
        self.base = Some(uri.clone());
        Status::Success
    }

    fn prefix(&mut self, name: &str, uri: &Node) -> Status {
        self.prefixes.push((name.to_string(), uri.clone()));
        Status::Success
    }

    fn statement(&mut self, _flags: crate::status::StatementFlags, statement: &Statement) -> Status {
        self.statements.push(statement.clone());
        Status::Success
    }
}
