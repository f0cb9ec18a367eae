//! The Turtle-family writer (spec §4.4): renders [`Sink`] events into bytes,
//! honoring the environment's base URI and prefix map. Generalized from the
//! teacher's `AbbrevRdfXmlFormatter` abbreviation tracking
//! (`examples/phillord-rio/xml/src/abbrev_formatter.rs`, which keeps a
//! `current_subject` and defers closing a `rdf:Description` until the
//! subject changes) to the flat subject/predicate/object separator table of
//! Turtle/TriG, and implements [`Sink`] itself so a [`crate::Reader`] can
//! pipe directly into a `Writer`.

use rdf_api::model::{NodeFlags, NodeKind};
use rdf_api::sink::ByteSink;
use rdf_api::status::{StatementFlags, Status, SyntaxMode};
use rdf_api::vocab::rdf;
use rdf_api::{Node, Sink, Statement, TurtleError};

use crate::env::Environment;

/// Writes Turtle-family output to a [`ByteSink`]. Generic over the byte
/// sink; the syntax mode is fixed at construction and gates both the
/// abbreviation state machine (Turtle/TriG) and the flat one-line-per-
/// statement form (NTriples/NQuads).
pub struct Writer<W> {
    sink: W,
    mode: SyntaxMode,
    env: Environment,
    root: Option<String>,
    chop_prefix: String,
    current_subject: Option<Node>,
    current_predicate: Option<Node>,
    current_graph: Option<Node>,
    in_graph_block: bool,
    has_open_statement: bool,
}

impl<W: ByteSink> Writer<W> {
    pub fn new(sink: W, mode: SyntaxMode) -> Self {
        Self {
            sink,
            mode,
            env: Environment::new(),
            root: None,
            chop_prefix: String::new(),
            current_subject: None,
            current_predicate: None,
            current_graph: None,
            in_graph_block: false,
            has_open_statement: false,
        }
    }

    pub fn with_base(mut self, base: Node) -> Self {
        self.env.set_base(base);
        self
    }

    /// The writer never relativizes a URI to a reference that would
    /// require ascending above `root` (spec §4.4); it falls back to the
    /// absolute form instead.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the prefix stripped from blank node labels before emission, so
    /// labels from independently-read documents don't collide once merged.
    pub fn with_chop_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.chop_prefix = prefix.into();
        self
    }

    pub fn with_prefix(mut self, name: &str, uri: Node) -> Self {
        self.env.set_prefix(name, uri);
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Closes any open statement and graph block and returns the inner
    /// sink.
    pub fn finish(mut self) -> Result<W, TurtleError> {
        self.close_graph_block()?;
        Ok(self.sink)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TurtleError> {
        self.sink
            .write_bytes(bytes)
            .map_err(|status| TurtleError::new(status, None, "sink write failed"))
    }

    fn close_statement(&mut self) -> Result<(), TurtleError> {
        if self.has_open_statement {
            self.write_bytes(b" .\n")?;
            self.has_open_statement = false;
        }
        Ok(())
    }

    fn close_graph_block(&mut self) -> Result<(), TurtleError> {
        self.close_statement()?;
        if self.in_graph_block {
            self.write_bytes(b"}\n")?;
            self.in_graph_block = false;
        }
        Ok(())
    }

    fn open_graph_block(&mut self, graph: Option<&Node>) -> Result<(), TurtleError> {
        if let (Some(g), SyntaxMode::TriG) = (graph, self.mode) {
            let text = self.render_term(g, false)?;
            self.write_bytes(format!("{text} {{\n").as_bytes())?;
            self.in_graph_block = true;
        }
        Ok(())
    }

    fn reset_directive_context(&mut self) -> Result<(), TurtleError> {
        self.close_graph_block()?;
        self.current_subject = None;
        self.current_predicate = None;
        self.current_graph = None;
        Ok(())
    }

    fn write_base_directive(&mut self, uri: &Node) -> Result<(), TurtleError> {
        self.reset_directive_context()?;
        let body = escape_iri_body(uri.as_str());
        self.write_bytes(format!("@base <{body}> .\n").as_bytes())
    }

    fn write_prefix_directive(&mut self, name: &str, uri: &Node) -> Result<(), TurtleError> {
        self.reset_directive_context()?;
        let body = escape_iri_body(uri.as_str());
        self.write_bytes(format!("@prefix {name}: <{body}> .\n").as_bytes())
    }

    fn write_statement(&mut self, flags: StatementFlags, stmt: &Statement) -> Result<(), TurtleError> {
        if !self.mode.has_directives() {
            return self.write_flat_statement(stmt);
        }

        let graph_changed = self.current_graph.as_ref() != stmt.graph.as_ref();
        if graph_changed {
            self.close_graph_block()?;
            self.current_subject = None;
            self.current_predicate = None;
            self.current_graph = stmt.graph.clone();
            self.open_graph_block(stmt.graph.as_ref())?;
        }

        let subject_changed = graph_changed || self.current_subject.as_ref() != Some(&stmt.subject);
        let predicate_changed = subject_changed || self.current_predicate.as_ref() != Some(&stmt.predicate);

        if subject_changed {
            self.close_statement()?;
            let text = self.render_term(&stmt.subject, false)?;
            self.write_bytes(text.as_bytes())?;
            self.write_bytes(b" ")?;
            self.write_predicate_and_object(flags, &stmt.predicate, &stmt.object)?;
        } else if predicate_changed {
            self.write_bytes(b" ;\n\t")?;
            self.write_predicate_and_object(flags, &stmt.predicate, &stmt.object)?;
        } else {
            self.write_bytes(b" ,\n\t\t")?;
            let object_anon = flags.contains(StatementFlags::ANON_O);
            let text = self.render_term(&stmt.object, object_anon)?;
            self.write_bytes(text.as_bytes())?;
        }

        self.current_subject = Some(stmt.subject.clone());
        self.current_predicate = Some(stmt.predicate.clone());
        self.has_open_statement = true;
        Ok(())
    }

    fn write_predicate_and_object(&mut self, flags: StatementFlags, predicate: &Node, object: &Node) -> Result<(), TurtleError> {
        let verb = if predicate.as_str() == rdf::type_().as_str() {
            "a".to_string()
        } else {
            self.render_term(predicate, false)?
        };
        self.write_bytes(verb.as_bytes())?;
        self.write_bytes(b" ")?;
        let object_anon = flags.contains(StatementFlags::ANON_O);
        let text = self.render_term(object, object_anon)?;
        self.write_bytes(text.as_bytes())
    }

    fn write_flat_statement(&mut self, stmt: &Statement) -> Result<(), TurtleError> {
        let s = self.render_term(&stmt.subject, false)?;
        let p = self.render_term(&stmt.predicate, false)?;
        let o = self.render_term(&stmt.object, false)?;
        self.write_bytes(s.as_bytes())?;
        self.write_bytes(b" ")?;
        self.write_bytes(p.as_bytes())?;
        self.write_bytes(b" ")?;
        self.write_bytes(o.as_bytes())?;
        if let Some(g) = &stmt.graph {
            let g_text = self.render_term(g, false)?;
            self.write_bytes(b" ")?;
            self.write_bytes(g_text.as_bytes())?;
        }
        self.write_bytes(b" .\n")
    }

    /// Dispatches on node kind. `anon_inline` requests the `[]` shorthand
    /// for a blank node used exactly once as an object (`ANON_O`); a
    /// `Variable` can't reach here because [`Statement::is_well_formed`] is
    /// checked before any rendering begins.
    fn render_term(&self, node: &Node, anon_inline: bool) -> Result<String, TurtleError> {
        match node.kind() {
            NodeKind::Uri | NodeKind::Curie => self.render_uri_term(node),
            NodeKind::Blank => {
                if anon_inline {
                    return Ok("[]".to_string());
                }
                let label = node.as_str();
                let stripped = label.strip_prefix(self.chop_prefix.as_str()).unwrap_or(label);
                Ok(format!("_:{stripped}"))
            }
            NodeKind::Literal => self.render_literal(node, self.mode.has_directives()),
            NodeKind::Variable => unreachable!("is_well_formed rejects Variable in every position"),
        }
    }

    fn render_uri_term(&self, node: &Node) -> Result<String, TurtleError> {
        match node.kind() {
            NodeKind::Curie => Ok(escape_curie_local(node.as_str())),
            NodeKind::Uri => {
                let uri = node.as_str();
                if self.mode.has_directives() {
                    if let Some(curie) = self.env.qualify(uri) {
                        return Ok(escape_curie_local(curie.as_str()));
                    }
                }
                let body = if self.mode.has_directives() {
                    match self.env.get_base() {
                        Some(base) => rdf_api::uri::relativize(uri, base.as_str(), self.root.as_deref()),
                        None => uri.to_string(),
                    }
                } else {
                    uri.to_string()
                };
                Ok(format!("<{}>", escape_iri_body(&body)))
            }
            _ => unreachable!("only URI/CURIE kinds reach render_uri_term"),
        }
    }

    /// `allow_long` permits the triple-quoted form for a newline-bearing
    /// body; NTriples/NQuads output is always one line per statement, so
    /// flat mode forces the short escaped form instead.
    fn render_literal(&self, node: &Node, allow_long: bool) -> Result<String, TurtleError> {
        let body = node.as_str();
        let long = allow_long && node.flags().contains(NodeFlags::HAS_NEWLINE);
        let mut out = String::new();
        if long {
            out.push_str("\"\"\"");
            for c in body.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    _ => out.push(c),
                }
            }
            out.push_str("\"\"\"");
        } else {
            out.push('"');
            for c in body.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
        if let Some(lang) = node.language() {
            out.push('@');
            out.push_str(lang);
        } else if let Some(dt) = node.datatype() {
            out.push_str("^^");
            out.push_str(&self.render_uri_term(dt)?);
        }
        Ok(out)
    }
}

impl<W: ByteSink> Sink for Writer<W> {
    fn base(&mut self, uri: &Node) -> Status {
        self.env.set_base(uri.clone());
        if !self.mode.has_directives() {
            return Status::Success;
        }
        match self.write_base_directive(uri) {
            Ok(()) => Status::Success,
            Err(e) => e.status,
        }
    }

    fn prefix(&mut self, name: &str, uri: &Node) -> Status {
        if !self.env.set_prefix(name, uri.clone()) {
            return Status::ErrBadArg;
        }
        if !self.mode.has_directives() {
            return Status::Success;
        }
        match self.write_prefix_directive(name, uri) {
            Ok(()) => Status::Success,
            Err(e) => e.status,
        }
    }

    fn statement(&mut self, flags: StatementFlags, statement: &Statement) -> Status {
        if !statement.is_well_formed() {
            return Status::ErrBadArg;
        }
        match self.write_statement(flags, statement) {
            Ok(()) => Status::Success,
            Err(e) => e.status,
        }
    }

    fn end(&mut self, node: &Node) -> Status {
        if self.current_subject.as_ref() == Some(node) {
            match self.close_statement() {
                Ok(()) => {
                    self.current_subject = None;
                    self.current_predicate = None;
                    Status::Success
                }
                Err(e) => e.status,
            }
        } else {
            Status::Success
        }
    }
}

/// Percent-encodes the ASCII punctuation and control bytes forbidden inside
/// an IRIREF (spec §4.4); everything else, including multi-byte UTF-8
/// characters, passes through unchanged.
fn escape_iri_body(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if (c as u32) < 0x20 || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | ' ') {
            out.push('%');
            out.push_str(&format!("{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Backslash-escapes any byte in a CURIE's local part that isn't a legal
/// bare `PN_LOCAL` character, the inverse of `lex::parse_pn_local`'s
/// `PN_LOCAL_ESC` handling.
fn escape_curie_local(curie: &str) -> String {
    let Some((prefix, local)) = curie.split_once(':') else {
        return curie.to_string();
    };
    let mut out = String::with_capacity(curie.len());
    out.push_str(prefix);
    out.push(':');
    for c in local.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '%' | '~') || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_source::SliceSource;
    use crate::reader::Reader;
    use rdf_api::Cursor;

    fn stmt(subject: Node, predicate: Node, object: Node, graph: Option<Node>) -> Statement {
        Statement {
            subject,
            predicate,
            object,
            graph,
            cursor: Cursor::default(),
        }
    }

    fn written(writer: Writer<Vec<u8>>) -> String {
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn simple_triple_uses_absolute_iris_with_no_prefixes_bound() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        let status = w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        assert!(status.is_success());
        assert_eq!(written(w), "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n");
    }

    #[test]
    fn predicate_object_list_abbreviation() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle).with_prefix("eg", Node::new_uri("http://example.org/"));
        let s = Node::new_curie("eg:s");
        w.statement(StatementFlags::empty(), &stmt(s.clone(), Node::new_curie("eg:p1"), Node::new_curie("eg:o1"), None));
        w.statement(StatementFlags::empty(), &stmt(s.clone(), Node::new_curie("eg:p2"), Node::new_curie("eg:o2"), None));
        w.statement(StatementFlags::empty(), &stmt(s, Node::new_curie("eg:p2"), Node::new_curie("eg:o3"), None));
        assert_eq!(written(w), "eg:s eg:p1 eg:o1 ;\n\teg:p2 eg:o2 ,\n\t\teg:o3 .\n");
    }

    #[test]
    fn rdf_type_predicate_shortens_to_a() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), rdf::type_(), Node::new_uri("http://example.org/Thing"), None),
        );
        assert_eq!(written(w), "<http://example.org/s> a <http://example.org/Thing> .\n");
    }

    #[test]
    fn uri_qualifies_to_bound_prefix() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle).with_prefix("eg", Node::new_uri("http://example.org/"));
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        assert_eq!(written(w), "eg:s eg:p eg:o .\n");
    }

    #[test]
    fn uri_relativizes_against_base_when_unqualified() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle).with_base(Node::new_uri("http://example.org/a/b/"));
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/a/b/s"), Node::new_uri("http://example.org/a/b/p"), Node::new_uri("http://example.org/a/c"), None),
        );
        assert_eq!(written(w), "<s> <p> <../c> .\n");
    }

    #[test]
    fn literal_with_newline_uses_long_form() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_string("line1\nline2"), None),
        );
        assert_eq!(written(w), "<http://example.org/s> <http://example.org/p> \"\"\"line1\nline2\"\"\" .\n");
    }

    #[test]
    fn literal_with_embedded_quote_is_escaped_in_short_form() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_string("say \"hi\""), None),
        );
        assert_eq!(written(w), "<http://example.org/s> <http://example.org/p> \"say \\\"hi\\\"\" .\n");
    }

    #[test]
    fn language_tagged_and_typed_literals_append_suffix() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle).with_prefix("xsd", Node::new_uri("http://www.w3.org/2001/XMLSchema#"));
        w.statement(
            StatementFlags::empty(),
            &stmt(
                Node::new_uri("http://example.org/s"),
                Node::new_uri("http://example.org/p"),
                Node::new_plain_literal("chat", "fr").unwrap(),
                None,
            ),
        );
        w.statement(
            StatementFlags::empty(),
            &stmt(
                Node::new_uri("http://example.org/s"),
                Node::new_uri("http://example.org/q"),
                Node::new_typed_literal("42", rdf_api::vocab::xsd::integer()).unwrap(),
                None,
            ),
        );
        let text = written(w);
        assert!(text.contains("\"chat\"@fr"));
        assert!(text.contains("\"42\"^^xsd:integer"));
    }

    #[test]
    fn blank_node_label_has_chop_prefix_stripped() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle).with_chop_prefix("doc1-");
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_blank("doc1-b0"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        assert_eq!(written(w), "_:b0 <http://example.org/p> <http://example.org/o> .\n");
    }

    #[test]
    fn anon_o_flag_inlines_empty_brackets() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        w.statement(
            StatementFlags::ANON_O,
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_blank("b0"), None),
        );
        assert_eq!(written(w), "<http://example.org/s> <http://example.org/p> [] .\n");
    }

    #[test]
    fn invalid_statement_rejected_with_bad_arg_and_writes_nothing() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        let status = w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_string("not a subject"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        assert_eq!(status, Status::ErrBadArg);
        assert_eq!(written(w), "");
    }

    #[test]
    fn ntriples_mode_writes_flat_absolute_lines_ignoring_prefixes() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::NTriples).with_prefix("eg", Node::new_uri("http://example.org/"));
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s2"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        assert_eq!(
            written(w),
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n\
             <http://example.org/s2> <http://example.org/p> <http://example.org/o> .\n"
        );
    }

    #[test]
    fn nquads_mode_appends_graph_term() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::NQuads);
        w.statement(
            StatementFlags::empty(),
            &stmt(
                Node::new_uri("http://example.org/s"),
                Node::new_uri("http://example.org/p"),
                Node::new_uri("http://example.org/o"),
                Some(Node::new_uri("http://example.org/g")),
            ),
        );
        assert_eq!(
            written(w),
            "<http://example.org/s> <http://example.org/p> <http://example.org/o> <http://example.org/g> .\n"
        );
    }

    #[test]
    fn trig_wraps_statements_in_a_graph_block() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::TriG);
        let g = Some(Node::new_uri("http://example.org/g"));
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s1"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), g.clone()),
        );
        w.statement(
            StatementFlags::empty(),
            &stmt(Node::new_uri("http://example.org/s2"), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), g),
        );
        assert_eq!(
            written(w),
            "<http://example.org/g> {\n\
             <http://example.org/s1> <http://example.org/p> <http://example.org/o> .\n\
             <http://example.org/s2> <http://example.org/p> <http://example.org/o> .\n\
             }\n"
        );
    }

    #[test]
    fn end_finalizes_the_open_statement_about_its_subject() {
        let mut w = Writer::new(Vec::new(), SyntaxMode::Turtle);
        let s = Node::new_uri("http://example.org/s");
        w.statement(
            StatementFlags::empty(),
            &stmt(s.clone(), Node::new_uri("http://example.org/p"), Node::new_uri("http://example.org/o"), None),
        );
        w.end(&s);
        let bytes = w.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n");
    }

    #[test]
    fn reader_pipes_directly_into_writer_as_a_sink() {
        let source = SliceSource::new(b"@prefix eg: <http://example.org/> .\neg:s eg:p eg:o1, eg:o2 .\n");
        let mut reader = Reader::new(source, SyntaxMode::Turtle);
        let mut writer = Writer::new(Vec::new(), SyntaxMode::Turtle);
        let status = reader.read_all_default(&mut writer);
        assert!(status.is_success());
        let out = written(writer);
        assert!(out.contains("eg:s eg:p eg:o1 ,\n\t\teg:o2"));
    }
}
