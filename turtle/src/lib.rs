//! Turtle-family reader and writer built on the data model and traits in
//! `rdf_api`: Turtle, TriG, NTriples and NQuads, selected at construction
//! by a [`rdf_api::SyntaxMode`].

pub mod byte_source;
pub mod env;
mod lex;
pub mod reader;
pub mod writer;

pub use byte_source::{CallbackByteSource, ReadCallback, SliceSource};
pub use env::Environment;
pub use reader::Reader;
pub use writer::Writer;
