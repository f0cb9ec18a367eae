//! Stable status codes and bitflags making up the external interface
//! described in spec §6.

use bitflags::bitflags;

/// Status codes returned across the sink/callback boundary. `SUCCESS` and
/// `FAILURE` are the two non-error outcomes; everything else is an error
/// class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Status {
    Success = 0,
    Failure = 1,
    ErrUnknown = 2,
    ErrBadSyntax = 3,
    ErrBadArg = 4,
    ErrBadIri = 5,
    ErrNotFound = 6,
    ErrIdClash = 7,
    ErrBadCurie = 8,
    ErrInternal = 9,
    ErrOverflow = 10,
    ErrBadText = 11,
    ErrNoData = 12,
    ErrBadStream = 13,
}

impl Status {
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

/// Syntax mode selecting which Turtle-family grammar subset a reader or
/// writer operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyntaxMode {
    Turtle = 1,
    NTriples = 2,
    NQuads = 3,
    TriG = 4,
}

impl SyntaxMode {
    /// Whether this mode admits a fourth (graph) term per statement.
    pub const fn has_graphs(self) -> bool {
        matches!(self, SyntaxMode::NQuads | SyntaxMode::TriG)
    }

    /// Whether this mode admits `@prefix`/`@base` directives and CURIEs.
    pub const fn has_directives(self) -> bool {
        matches!(self, SyntaxMode::Turtle | SyntaxMode::TriG)
    }
}

bitflags! {
    /// Continuation-context flags passed to the sink's statement callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatementFlags: u32 {
        const EMPTY_S = 1;
        const EMPTY_O = 2;
        const ANON_S = 4;
        const ANON_O = 8;
        const LIST_S = 16;
        const LIST_O = 32;
    }
}
