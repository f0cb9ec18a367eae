//! The Turtle-family reader (spec §4.3): a recursive-descent parser over
//! the full Turtle/TriG grammar, with `SyntaxMode` gating the NTriples and
//! NQuads subsets to a flat one-statement-per-call form. Generalized from
//! the teacher's `ntriples.rs` buffer-accumulation style
//! (`parse_term`/`parse_literal`/`skip_whitespace` taking a byte source
//! plus a reusable `Vec<u8>` buffer) to the full grammar: directives,
//! predicate-object lists, collections, and blank-node property lists.

use std::collections::HashSet;

use rdf_api::error::ErrorSink;
use rdf_api::sink::ByteSource;
use rdf_api::status::{StatementFlags, Status, SyntaxMode};
use rdf_api::vocab::{rdf, xsd};
use rdf_api::{Cursor, Node, NodeKind, Sink, Statement, TurtleError, TurtleSyntaxError};

use crate::env::Environment;
use crate::lex;

/// A term just parsed, plus the continuation context the sink needs:
/// whether it was an inline anonymous blank node (`[...]` or a collection
/// head) and whether it desugars an RDF collection.
struct ParsedTerm {
    node: Node,
    anon: bool,
    list: bool,
}

enum MatchResult {
    Matched,
    Fallback(Vec<u8>),
}

/// Reads a byte stream in one of the four Turtle-family syntaxes into
/// [`Sink`] events. Generic only over the byte source; sinks and error
/// sinks are taken as trait objects since nothing here needs them
/// monomorphized per call site.
pub struct Reader<B> {
    source: B,
    mode: SyntaxMode,
    env: Environment,
    blank_counter: u64,
    blank_prefix: String,
    seen_blank_labels: HashSet<String>,
}

impl<B: ByteSource> Reader<B> {
    pub fn new(source: B, mode: SyntaxMode) -> Self {
        Self {
            source,
            mode,
            env: Environment::new(),
            blank_counter: 0,
            blank_prefix: String::new(),
            seen_blank_labels: HashSet::new(),
        }
    }

    pub fn with_base(mut self, base: Node) -> Self {
        self.env.set_base(base);
        self
    }

    /// Sets the prefix used to namespace auto-generated blank node labels,
    /// so labels from independently-read documents don't collide once
    /// merged.
    pub fn with_blank_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.blank_prefix = prefix.into();
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Parses and emits exactly one top-level production (a directive or a
    /// triple/graph block). Returns `Status::Failure` at end of input;
    /// reports syntax errors through `errors` and recovers to the next
    /// statement boundary before returning the error's status, except a
    /// stream error (`ErrBadStream`), which is propagated immediately
    /// without attempting recovery.
    pub fn read_chunk(&mut self, sink: &mut dyn Sink, errors: &mut dyn ErrorSink) -> Status {
        match self.parse_one(sink) {
            Ok(Some(status)) => status,
            Ok(None) => Status::Failure,
            Err(e) => {
                errors.report(&TurtleSyntaxError {
                    cursor: e.cursor.clone().unwrap_or_default(),
                    message: e.message.clone(),
                });
                if e.status == Status::ErrBadStream {
                    return e.status;
                }
                self.recover();
                e.status
            }
        }
    }

    /// Calls [`Reader::read_chunk`] until end of input, stopping early on a
    /// stream error. Recoverable syntax errors are reported and skipped.
    pub fn read_all(&mut self, sink: &mut dyn Sink, errors: &mut dyn ErrorSink) -> Status {
        loop {
            match self.read_chunk(sink, errors) {
                Status::Failure => return Status::Success,
                Status::ErrBadStream => return Status::ErrBadStream,
                _ => continue,
            }
        }
    }

    /// Convenience for callers who don't need a custom error sink.
    pub fn read_all_default(&mut self, sink: &mut dyn Sink) -> Status {
        let mut errors = rdf_api::error::StderrErrorSink;
        self.read_all(sink, &mut errors)
    }

    fn cursor(&self) -> Cursor {
        Cursor {
            file: None,
            line: self.source.line(),
            col: self.source.col(),
        }
    }

    fn fresh_blank(&mut self) -> Node {
        loop {
            let label = format!("{}b{}", self.blank_prefix, self.blank_counter);
            self.blank_counter += 1;
            if self.seen_blank_labels.insert(label.clone()) {
                return Node::new_blank(label);
            }
        }
    }

    /// Resolves an IRIREF's raw text against the current base, or accepts
    /// it unchanged if it already carries a scheme.
    fn resolve_iri(&self, raw: &str) -> Result<String, TurtleError> {
        if rdf_api::uri::UriParts::parse(raw).has_scheme() {
            return Ok(raw.to_string());
        }
        match self.env.get_base() {
            Some(base) => rdf_api::uri::resolve(raw, base.as_str())
                .ok_or_else(|| TurtleError::new(Status::ErrBadIri, Some(self.cursor()), "cannot resolve IRI: base has no scheme")),
            None => Err(TurtleError::new(Status::ErrBadIri, Some(self.cursor()), "relative IRI with no base set")),
        }
    }

    fn emit(
        &mut self,
        sink: &mut dyn Sink,
        flags: StatementFlags,
        subject: Node,
        predicate: Node,
        object: Node,
        graph: Option<Node>,
    ) -> Result<(), TurtleError> {
        let statement = Statement {
            subject,
            predicate,
            object,
            graph,
            cursor: self.cursor(),
        };
        let status = sink.statement(flags, &statement);
        if status.is_success() {
            Ok(())
        } else {
            Err(TurtleError::new(status, Some(self.cursor()), "sink rejected statement"))
        }
    }

    /// Skips to the next plausible statement boundary after a syntax
    /// error: the byte after a `.` or a newline, whichever comes first.
    fn recover(&mut self) {
        loop {
            match self.source.peek() {
                None => return,
                Some(b'.') => {
                    let _ = self.source.advance();
                    return;
                }
                Some(b'\n') => {
                    let _ = self.source.advance();
                    return;
                }
                _ => {
                    if self.source.advance().is_err() {
                        return;
                    }
                }
            }
        }
    }

    fn parse_one(&mut self, sink: &mut dyn Sink) -> Result<Option<Status>, TurtleError> {
        if self.mode == SyntaxMode::NTriples || self.mode == SyntaxMode::NQuads {
            self.parse_line_statement(sink)
        } else {
            self.parse_turtle_statement(sink)
        }
    }

    // ---- NTriples / NQuads: flat one-statement-per-call form ----

    fn parse_line_statement(&mut self, sink: &mut dyn Sink) -> Result<Option<Status>, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        if self.source.peek().is_none() {
            return Ok(None);
        }
        if self.source.peek() == Some(b'\0') {
            lex::advance(&mut self.source)?;
            return Ok(Some(Status::Failure));
        }
        let subject = self.parse_term(sink, None)?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let predicate = self.parse_term(sink, None)?;
        if !matches!(predicate.node.kind(), NodeKind::Uri | NodeKind::Curie) {
            return Err(lex::syntax_error(&self.source, "predicate must be an IRI"));
        }
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let object = self.parse_term(sink, None)?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let graph = if self.mode.has_graphs() && self.source.peek() != Some(b'.') {
            Some(self.parse_term(sink, None)?.node)
        } else {
            None
        };
        lex::skip_whitespace_and_comments(&mut self.source)?;
        lex::expect(&mut self.source, b'.')?;

        let mut flags = StatementFlags::empty();
        if subject.anon {
            flags |= StatementFlags::ANON_S;
        }
        if object.anon {
            flags |= StatementFlags::ANON_O;
        }
        if subject.node.is_empty() {
            flags |= StatementFlags::EMPTY_S;
        }
        if object.node.is_empty() {
            flags |= StatementFlags::EMPTY_O;
        }
        self.emit(sink, flags, subject.node, predicate.node, object.node, graph)?;
        Ok(Some(Status::Success))
    }

    // ---- Turtle / TriG: full grammar ----

    fn parse_turtle_statement(&mut self, sink: &mut dyn Sink) -> Result<Option<Status>, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        if self.source.peek().is_none() {
            return Ok(None);
        }
        if self.source.peek() == Some(b'\0') {
            lex::advance(&mut self.source)?;
            return Ok(Some(Status::Failure));
        }

        if self.source.peek() == Some(b'@') {
            return self.parse_at_directive(sink).map(Some);
        }
        if self.mode == SyntaxMode::TriG && self.source.peek() == Some(b'{') {
            self.parse_graph_block(sink, None)?;
            return Ok(Some(Status::Success));
        }
        if matches!(self.source.peek(), Some(b'P') | Some(b'p')) {
            return match self.try_match_keyword(b"PREFIX")? {
                MatchResult::Matched => self.finish_prefix_directive(sink, false).map(Some),
                MatchResult::Fallback(buf) => self.parse_triple_or_graph_block(sink, Some(buf)).map(Some),
            };
        }
        if matches!(self.source.peek(), Some(b'B') | Some(b'b')) {
            return match self.try_match_keyword(b"BASE")? {
                MatchResult::Matched => self.finish_base_directive(sink, false).map(Some),
                MatchResult::Fallback(buf) => self.parse_triple_or_graph_block(sink, Some(buf)).map(Some),
            };
        }
        self.parse_triple_or_graph_block(sink, None).map(Some)
    }

    fn parse_triple_or_graph_block(&mut self, sink: &mut dyn Sink, prefix_seed: Option<Vec<u8>>) -> Result<Status, TurtleError> {
        let subject = match prefix_seed {
            Some(buf) => ParsedTerm {
                node: self.finish_prefixed_term(buf)?,
                anon: false,
                list: false,
            },
            None => self.parse_term(sink, None)?,
        };
        lex::skip_whitespace_and_comments(&mut self.source)?;
        if self.mode == SyntaxMode::TriG && self.source.peek() == Some(b'{') {
            self.parse_graph_block(sink, Some(subject.node))?;
            return Ok(Status::Success);
        }
        self.parse_predicate_object_list(sink, &subject, None)?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        lex::expect(&mut self.source, b'.')?;
        Ok(Status::Success)
    }

    fn parse_graph_block(&mut self, sink: &mut dyn Sink, label: Option<Node>) -> Result<(), TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        lex::expect(&mut self.source, b'{')?;
        loop {
            lex::skip_whitespace_and_comments(&mut self.source)?;
            match self.source.peek() {
                Some(b'}') => {
                    lex::advance(&mut self.source)?;
                    return Ok(());
                }
                None => return Err(lex::syntax_error(&self.source, "unterminated graph block")),
                _ => {
                    let subject = self.parse_term(sink, label.as_ref())?;
                    self.parse_predicate_object_list(sink, &subject, label.clone())?;
                    lex::skip_whitespace_and_comments(&mut self.source)?;
                    if self.source.peek() == Some(b'.') {
                        lex::advance(&mut self.source)?;
                    }
                }
            }
        }
    }

    fn parse_predicate_object_list(&mut self, sink: &mut dyn Sink, subject: &ParsedTerm, graph: Option<Node>) -> Result<(), TurtleError> {
        loop {
            let predicate = self.parse_verb(sink)?;
            self.parse_object_list(sink, subject, &predicate, graph.clone())?;
            lex::skip_whitespace_and_comments(&mut self.source)?;
            if self.source.peek() == Some(b';') {
                lex::advance(&mut self.source)?;
                lex::skip_whitespace_and_comments(&mut self.source)?;
                while self.source.peek() == Some(b';') {
                    lex::advance(&mut self.source)?;
                    lex::skip_whitespace_and_comments(&mut self.source)?;
                }
                if matches!(self.source.peek(), Some(b'.') | Some(b'}') | None) {
                    return Ok(());
                }
                continue;
            }
            return Ok(());
        }
    }

    fn parse_object_list(&mut self, sink: &mut dyn Sink, subject: &ParsedTerm, predicate: &Node, graph: Option<Node>) -> Result<(), TurtleError> {
        loop {
            let object = self.parse_term(sink, graph.as_ref())?;
            let mut flags = StatementFlags::empty();
            if subject.anon {
                flags |= StatementFlags::ANON_S;
            }
            if subject.list {
                flags |= StatementFlags::LIST_S;
            }
            if object.anon {
                flags |= StatementFlags::ANON_O;
            }
            if object.list {
                flags |= StatementFlags::LIST_O;
            }
            if subject.node.is_empty() {
                flags |= StatementFlags::EMPTY_S;
            }
            if object.node.is_empty() {
                flags |= StatementFlags::EMPTY_O;
            }
            self.emit(sink, flags, subject.node.clone(), predicate.clone(), object.node, graph.clone())?;
            lex::skip_whitespace_and_comments(&mut self.source)?;
            if self.source.peek() == Some(b',') {
                lex::advance(&mut self.source)?;
                continue;
            }
            return Ok(());
        }
    }

    fn parse_verb(&mut self, sink: &mut dyn Sink) -> Result<Node, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        if matches!(self.source.peek(), Some(b'a')) {
            match self.try_match_keyword(b"a")? {
                MatchResult::Matched => return Ok(rdf::type_()),
                MatchResult::Fallback(buf) => return self.finish_prefixed_term(buf),
            }
        }
        let term = self.parse_term(sink, None)?;
        if !matches!(term.node.kind(), NodeKind::Uri | NodeKind::Curie) {
            return Err(lex::syntax_error(&self.source, "predicate must be an IRI"));
        }
        Ok(term.node)
    }

    /// Matches `word` case-insensitively. If the match succeeds and is
    /// followed by a non-identifier byte, the keyword was genuinely
    /// intended. Otherwise the consumed bytes are returned so the caller
    /// can resume parsing them as the start of a prefixed name — no real
    /// token in this grammar both matches one of these keywords exactly
    /// and is followed by an identifier continuation, since prefixed names
    /// always require a trailing `:`.
    fn try_match_keyword(&mut self, word: &[u8]) -> Result<MatchResult, TurtleError> {
        let mut consumed = Vec::with_capacity(word.len());
        for &expected in word {
            match self.source.peek() {
                Some(b) if b.eq_ignore_ascii_case(&expected) => {
                    consumed.push(b);
                    lex::advance(&mut self.source)?;
                }
                _ => return Ok(MatchResult::Fallback(consumed)),
            }
        }
        match self.source.peek() {
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':' | b'%') || b > 0x7F => {
                Ok(MatchResult::Fallback(consumed))
            }
            _ => Ok(MatchResult::Matched),
        }
    }

    fn finish_prefixed_term(&mut self, mut prefix_buf: Vec<u8>) -> Result<Node, TurtleError> {
        lex::parse_pn_prefix(&mut self.source, &mut prefix_buf)?;
        lex::expect(&mut self.source, b':')?;
        let mut local_buf = Vec::new();
        lex::parse_pn_local(&mut self.source, &mut local_buf)?;
        let prefix = String::from_utf8_lossy(&prefix_buf).into_owned();
        let local = String::from_utf8_lossy(&local_buf).into_owned();
        let combined = format!("{prefix}:{local}");
        self.env
            .expand(&combined)
            .ok_or_else(|| TurtleError::new(Status::ErrBadCurie, Some(self.cursor()), format!("unbound prefix '{prefix}'")))
    }

    fn parse_iri_or_curie_term(&mut self) -> Result<Node, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        match self.source.peek() {
            Some(b'<') => {
                let mut buf = Vec::new();
                lex::parse_iriref(&mut self.source, &mut buf)?;
                let raw = String::from_utf8_lossy(&buf).into_owned();
                Ok(Node::new_uri(self.resolve_iri(&raw)?))
            }
            Some(b':') => self.finish_prefixed_term(Vec::new()),
            Some(b) if b.is_ascii_alphabetic() || b > 0x7F => {
                lex::advance(&mut self.source)?;
                self.finish_prefixed_term(vec![b])
            }
            _ => Err(lex::syntax_error(&self.source, "expected datatype IRI")),
        }
    }

    fn parse_term(&mut self, sink: &mut dyn Sink, graph: Option<&Node>) -> Result<ParsedTerm, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        match self.source.peek() {
            Some(b'<') => {
                let mut buf = Vec::new();
                lex::parse_iriref(&mut self.source, &mut buf)?;
                let raw = String::from_utf8_lossy(&buf).into_owned();
                let resolved = self.resolve_iri(&raw)?;
                Ok(ParsedTerm {
                    node: Node::new_uri(resolved),
                    anon: false,
                    list: false,
                })
            }
            Some(b'_') => {
                let mut buf = Vec::new();
                lex::parse_blank_node_label(&mut self.source, &mut buf)?;
                let label = String::from_utf8_lossy(&buf).into_owned();
                self.seen_blank_labels.insert(label.clone());
                Ok(ParsedTerm {
                    node: Node::new_blank(label),
                    anon: false,
                    list: false,
                })
            }
            Some(b'[') => self.parse_blank_property_list(sink, graph),
            Some(b'(') => self.parse_collection(sink, graph),
            Some(b'"') | Some(b'\'') => self.parse_literal_term(),
            Some(b) if b.is_ascii_digit() || b == b'+' || b == b'-' => self.parse_numeric_term(),
            Some(b'.') => self.parse_numeric_term(),
            Some(b't') | Some(b'T') => match self.try_match_keyword(b"true")? {
                MatchResult::Matched => Ok(ParsedTerm {
                    node: Node::new_typed_literal("true", xsd::boolean()).expect("xsd:boolean is a URI"),
                    anon: false,
                    list: false,
                }),
                MatchResult::Fallback(buf) => Ok(ParsedTerm {
                    node: self.finish_prefixed_term(buf)?,
                    anon: false,
                    list: false,
                }),
            },
            Some(b'f') | Some(b'F') => match self.try_match_keyword(b"false")? {
                MatchResult::Matched => Ok(ParsedTerm {
                    node: Node::new_typed_literal("false", xsd::boolean()).expect("xsd:boolean is a URI"),
                    anon: false,
                    list: false,
                }),
                MatchResult::Fallback(buf) => Ok(ParsedTerm {
                    node: self.finish_prefixed_term(buf)?,
                    anon: false,
                    list: false,
                }),
            },
            Some(b':') => Ok(ParsedTerm {
                node: self.finish_prefixed_term(Vec::new())?,
                anon: false,
                list: false,
            }),
            Some(b) if b.is_ascii_alphabetic() || b > 0x7F => {
                lex::advance(&mut self.source)?;
                Ok(ParsedTerm {
                    node: self.finish_prefixed_term(vec![b])?,
                    anon: false,
                    list: false,
                })
            }
            _ => Err(lex::syntax_error(&self.source, "expected a term")),
        }
    }

    fn parse_numeric_term(&mut self) -> Result<ParsedTerm, TurtleError> {
        let mut buf = Vec::new();
        if matches!(self.source.peek(), Some(b'+') | Some(b'-')) {
            buf.push(self.source.peek().unwrap());
            lex::advance(&mut self.source)?;
        }
        let mut has_int_digits = false;
        while matches!(self.source.peek(), Some(b) if b.is_ascii_digit()) {
            buf.push(self.source.peek().unwrap());
            lex::advance(&mut self.source)?;
            has_int_digits = true;
        }
        let mut is_decimal = false;
        let mut has_frac_digits = false;
        if self.source.peek() == Some(b'.') {
            buf.push(b'.');
            lex::advance(&mut self.source)?;
            is_decimal = true;
            while matches!(self.source.peek(), Some(b) if b.is_ascii_digit()) {
                buf.push(self.source.peek().unwrap());
                lex::advance(&mut self.source)?;
                has_frac_digits = true;
            }
        }
        if !has_int_digits && !has_frac_digits {
            return Err(lex::syntax_error(&self.source, "expected a number"));
        }
        let mut is_double = false;
        if matches!(self.source.peek(), Some(b'e') | Some(b'E')) {
            is_double = true;
            buf.push(self.source.peek().unwrap());
            lex::advance(&mut self.source)?;
            if matches!(self.source.peek(), Some(b'+') | Some(b'-')) {
                buf.push(self.source.peek().unwrap());
                lex::advance(&mut self.source)?;
            }
            while matches!(self.source.peek(), Some(b) if b.is_ascii_digit()) {
                buf.push(self.source.peek().unwrap());
                lex::advance(&mut self.source)?;
            }
        }
        let text = String::from_utf8(buf).unwrap();
        let datatype = if is_double {
            xsd::double()
        } else if is_decimal {
            xsd::decimal()
        } else {
            xsd::integer()
        };
        let node = Node::new_typed_literal(text, datatype).expect("xsd datatype node is always a URI");
        Ok(ParsedTerm { node, anon: false, list: false })
    }

    fn parse_literal_term(&mut self) -> Result<ParsedTerm, TurtleError> {
        let mut buf = Vec::new();
        lex::parse_string_literal(&mut self.source, &mut buf)?;
        let body = String::from_utf8_lossy(&buf).into_owned();
        match self.source.peek() {
            Some(b'@') => {
                lex::advance(&mut self.source)?;
                let mut lang = Vec::new();
                loop {
                    match self.source.peek() {
                        Some(b) if b.is_ascii_alphanumeric() || b == b'-' => {
                            lang.push(b);
                            lex::advance(&mut self.source)?;
                        }
                        _ => break,
                    }
                }
                if lang.is_empty() {
                    return Err(lex::syntax_error(&self.source, "empty language tag"));
                }
                let lang = String::from_utf8_lossy(&lang).into_owned();
                let node = Node::new_plain_literal(body, &lang)
                    .ok_or_else(|| lex::syntax_error(&self.source, "malformed language tag"))?;
                Ok(ParsedTerm {
                    node,
                    anon: false,
                    list: false,
                })
            }
            Some(b'^') => {
                lex::advance(&mut self.source)?;
                lex::expect(&mut self.source, b'^')?;
                let datatype = self.parse_iri_or_curie_term()?;
                let node = Node::new_typed_literal(body, datatype)
                    .ok_or_else(|| lex::syntax_error(&self.source, "datatype must be an IRI"))?;
                Ok(ParsedTerm { node, anon: false, list: false })
            }
            _ => Ok(ParsedTerm {
                node: Node::new_string(body),
                anon: false,
                list: false,
            }),
        }
    }

    fn parse_blank_property_list(&mut self, sink: &mut dyn Sink, graph: Option<&Node>) -> Result<ParsedTerm, TurtleError> {
        lex::expect(&mut self.source, b'[')?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let node = self.fresh_blank();
        if self.source.peek() == Some(b']') {
            lex::advance(&mut self.source)?;
            return Ok(ParsedTerm { node, anon: true, list: false });
        }
        let subject = ParsedTerm {
            node: node.clone(),
            anon: true,
            list: false,
        };
        self.parse_predicate_object_list(sink, &subject, graph.cloned())?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        lex::expect(&mut self.source, b']')?;
        Ok(ParsedTerm { node, anon: true, list: false })
    }

    fn parse_collection(&mut self, sink: &mut dyn Sink, graph: Option<&Node>) -> Result<ParsedTerm, TurtleError> {
        lex::expect(&mut self.source, b'(')?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        if self.source.peek() == Some(b')') {
            lex::advance(&mut self.source)?;
            return Ok(ParsedTerm {
                node: rdf::nil(),
                anon: false,
                list: true,
            });
        }
        let head = self.fresh_blank();
        let mut current = head.clone();
        loop {
            lex::skip_whitespace_and_comments(&mut self.source)?;
            let item = self.parse_term(sink, graph)?;
            lex::skip_whitespace_and_comments(&mut self.source)?;
            let is_last = self.source.peek() == Some(b')');
            let next = if is_last { rdf::nil() } else { self.fresh_blank() };
            self.emit(sink, StatementFlags::empty(), current.clone(), rdf::first(), item.node, graph.cloned())?;
            self.emit(sink, StatementFlags::empty(), current, rdf::rest(), next.clone(), graph.cloned())?;
            if is_last {
                lex::advance(&mut self.source)?;
                break;
            }
            current = next;
        }
        Ok(ParsedTerm {
            node: head,
            anon: true,
            list: true,
        })
    }

    fn parse_at_directive(&mut self, sink: &mut dyn Sink) -> Result<Status, TurtleError> {
        lex::expect(&mut self.source, b'@')?;
        let mut word = Vec::new();
        loop {
            match self.source.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    word.push(b);
                    lex::advance(&mut self.source)?;
                }
                _ => break,
            }
        }
        match word.as_slice() {
            b"base" => self.finish_base_directive(sink, true),
            b"prefix" => self.finish_prefix_directive(sink, true),
            _ => Err(lex::syntax_error(&self.source, "unknown @ directive")),
        }
    }

    fn finish_base_directive(&mut self, sink: &mut dyn Sink, requires_dot: bool) -> Result<Status, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let mut buf = Vec::new();
        lex::parse_iriref(&mut self.source, &mut buf)?;
        let raw = String::from_utf8_lossy(&buf).into_owned();
        let resolved = self.resolve_iri(&raw)?;
        let node = Node::new_uri(resolved);
        if requires_dot {
            lex::skip_whitespace_and_comments(&mut self.source)?;
            lex::expect(&mut self.source, b'.')?;
        }
        self.env.set_base(node.clone());
        let status = sink.base(&node);
        if status.is_success() {
            Ok(status)
        } else {
            Err(TurtleError::new(status, Some(self.cursor()), "sink rejected base"))
        }
    }

    fn finish_prefix_directive(&mut self, sink: &mut dyn Sink, requires_dot: bool) -> Result<Status, TurtleError> {
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let mut name_buf = Vec::new();
        lex::parse_pn_prefix(&mut self.source, &mut name_buf)?;
        lex::expect(&mut self.source, b':')?;
        lex::skip_whitespace_and_comments(&mut self.source)?;
        let mut iri_buf = Vec::new();
        lex::parse_iriref(&mut self.source, &mut iri_buf)?;
        let raw = String::from_utf8_lossy(&iri_buf).into_owned();
        let resolved = self.resolve_iri(&raw)?;
        let node = Node::new_uri(resolved);
        if requires_dot {
            lex::skip_whitespace_and_comments(&mut self.source)?;
            lex::expect(&mut self.source, b'.')?;
        }
        let name = String::from_utf8_lossy(&name_buf).into_owned();
        if !self.env.set_prefix(&name, node.clone()) {
            return Err(TurtleError::new(Status::ErrBadArg, Some(self.cursor()), "prefix must bind a URI"));
        }
        let status = sink.prefix(&name, &node);
        if status.is_success() {
            Ok(status)
        } else {
            Err(TurtleError::new(status, Some(self.cursor()), "sink rejected prefix"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use rdf_api::sink::CollectingSink;

    fn read_all(text: &str, mode: SyntaxMode) -> CollectingSink {
        let source = SliceSource::new(text.as_bytes());
        let mut reader = Reader::new(source, mode);
        let mut sink = CollectingSink::default();
        let status = reader.read_all_default(&mut sink);
        assert!(status.is_success(), "unexpected status: {:?}", status);
        sink
    }

    #[test]
    fn simple_prefixed_triple() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s eg:p eg:o .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements.len(), 1);
        let s = &sink.statements[0];
        assert_eq!(s.subject.as_str(), "http://example.org/s");
        assert_eq!(s.predicate.as_str(), "http://example.org/p");
        assert_eq!(s.object.as_str(), "http://example.org/o");
        assert_eq!(sink.prefixes.len(), 1);
    }

    #[test]
    fn predicate_object_list_abbreviation() {
        let sink = read_all(
            "@prefix eg: <http://example.org/> .\neg:s eg:p1 eg:o1 ; eg:p2 eg:o2 , eg:o3 .\n",
            SyntaxMode::Turtle,
        );
        assert_eq!(sink.statements.len(), 3);
        assert!(sink.statements.iter().all(|s| s.subject.as_str() == "http://example.org/s"));
    }

    #[test]
    fn a_keyword_expands_to_rdf_type() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s a eg:Thing .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements[0].predicate.as_str(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
    }

    #[test]
    fn collection_desugars_to_first_rest_nil() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s eg:p ( eg:a eg:b ) .\n", SyntaxMode::Turtle);
        // 2 items => 2 first + 2 rest + 1 outer statement = 5
        assert_eq!(sink.statements.len(), 5);
        let outer = sink.statements.iter().find(|s| s.predicate.as_str() == "http://example.org/p").unwrap();
        assert_eq!(outer.object.kind(), NodeKind::Blank);
    }

    #[test]
    fn empty_collection_is_rdf_nil() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s eg:p () .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements.len(), 1);
        assert_eq!(sink.statements[0].object.as_str(), "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");
    }

    #[test]
    fn blank_node_property_list_as_subject() {
        let sink = read_all("@prefix eg: <http://example.org/> .\n[ eg:p eg:o ] eg:q eg:r .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements.len(), 2);
        assert_eq!(sink.statements[0].subject, sink.statements[1].subject);
    }

    #[test]
    fn sparql_style_prefix_and_base_without_dot() {
        let sink = read_all(
            "PREFIX eg: <http://example.org/>\nBASE <http://example.org/base/>\neg:s eg:p <rel> .\n",
            SyntaxMode::Turtle,
        );
        assert_eq!(sink.statements[0].object.as_str(), "http://example.org/base/rel");
    }

    #[test]
    fn numeric_and_boolean_literals_are_tagged() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s eg:p 42, 1.5, true .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements[0].object.datatype().unwrap().as_str(), "http://www.w3.org/2001/XMLSchema#integer");
        assert_eq!(sink.statements[1].object.datatype().unwrap().as_str(), "http://www.w3.org/2001/XMLSchema#decimal");
        assert_eq!(sink.statements[2].object.datatype().unwrap().as_str(), "http://www.w3.org/2001/XMLSchema#boolean");
    }

    #[test]
    fn language_tagged_literal() {
        let sink = read_all("@prefix eg: <http://example.org/> .\neg:s eg:p \"chat\"@fr .\n", SyntaxMode::Turtle);
        assert_eq!(sink.statements[0].object.language(), Some("fr"));
    }

    #[test]
    fn ntriples_rejects_nothing_extra_and_reads_flat_triples() {
        let sink = read_all(
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n",
            SyntaxMode::NTriples,
        );
        assert_eq!(sink.statements.len(), 1);
        assert!(sink.statements[0].graph.is_none());
    }

    #[test]
    fn nquads_reads_optional_graph_term() {
        let sink = read_all(
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> <http://example.org/g> .\n",
            SyntaxMode::NQuads,
        );
        assert_eq!(sink.statements[0].graph.as_ref().unwrap().as_str(), "http://example.org/g");
    }

    #[test]
    fn trig_graph_block_applies_to_every_triple_inside() {
        let sink = read_all(
            "@prefix eg: <http://example.org/> .\neg:g { eg:s1 eg:p eg:o . eg:s2 eg:p eg:o }\n",
            SyntaxMode::TriG,
        );
        assert_eq!(sink.statements.len(), 2);
        assert!(sink.statements.iter().all(|s| s.graph.as_ref().unwrap().as_str() == "http://example.org/g"));
    }

    #[test]
    fn syntax_error_recovers_to_next_statement() {
        let source = SliceSource::new(b"@prefix eg: <http://example.org/> .\nthis is not valid .\neg:s eg:p eg:o .\n");
        let mut reader = Reader::new(source, SyntaxMode::Turtle);
        let mut sink = CollectingSink::default();
        let mut errors = rdf_api::error::StderrErrorSink;
        let status = reader.read_all(&mut sink, &mut errors);
        assert!(status.is_success());
        assert_eq!(sink.statements.len(), 1);
    }

    #[test]
    fn null_byte_yields_resumable_failure_between_statements() {
        let source = SliceSource::new(
            b"@prefix eg: <http://example.org/> .\neg:s1 eg:p eg:o .\n\0eg:s2 eg:p eg:o .\n\0",
        );
        let mut reader = Reader::new(source, SyntaxMode::Turtle);
        let mut sink = CollectingSink::default();
        let mut errors = rdf_api::error::StderrErrorSink;

        assert!(reader.read_chunk(&mut sink, &mut errors).is_success()); // prefix
        assert!(reader.read_chunk(&mut sink, &mut errors).is_success()); // stmt1
        assert_eq!(reader.read_chunk(&mut sink, &mut errors), Status::Failure); // null
        assert!(reader.read_chunk(&mut sink, &mut errors).is_success()); // stmt2
        assert_eq!(reader.read_chunk(&mut sink, &mut errors), Status::Failure); // terminator null
        assert_eq!(reader.read_chunk(&mut sink, &mut errors), Status::Failure); // EOF

        assert_eq!(sink.statements.len(), 2);
    }
}
