//! Shared lexical helpers used by both the line-oriented (NTriples/NQuads)
//! and full Turtle/TriG readers: whitespace/comment skipping, escape
//! decoding, and the IRIREF/string/blank-label productions. Each function
//! appends into a caller-owned `Vec<u8>` buffer rather than returning an
//! owned `String` per token, mirroring the teacher's
//! `parse_iriref`/`parse_term`-into-`buffer` style.

use rdf_api::error::TurtleError;
use rdf_api::sink::ByteSource;
use rdf_api::status::Status;

pub fn syntax_error(source: &impl ByteSource, message: impl Into<String>) -> TurtleError {
    TurtleError::new(
        Status::ErrBadSyntax,
        Some(rdf_api::Cursor {
            file: None,
            line: source.line(),
            col: source.col(),
        }),
        message,
    )
}

pub fn advance(source: &mut impl ByteSource) -> Result<(), TurtleError> {
    source.advance().map_err(|status| {
        TurtleError::new(
            status,
            Some(rdf_api::Cursor {
                file: None,
                line: source.line(),
                col: source.col(),
            }),
            "stream error",
        )
    })
}

pub fn expect(source: &mut impl ByteSource, byte: u8) -> Result<(), TurtleError> {
    let found = source.peek();
    if found != Some(byte) {
        return Err(syntax_error(source, format!("expected '{}', found {:?}", byte as char, found)));
    }
    advance(source)
}

/// Skips whitespace and `#`-to-end-of-line comments, the form used between
/// Turtle/TriG productions (spec §4.3).
pub fn skip_whitespace_and_comments(source: &mut impl ByteSource) -> Result<(), TurtleError> {
    loop {
        match source.peek() {
            Some(b' ' | b'\t' | b'\r' | b'\n') => advance(source)?,
            Some(b'#') => {
                while !matches!(source.peek(), Some(b'\n') | None) {
                    advance(source)?;
                }
            }
            _ => return Ok(()),
        }
    }
}

fn push_codepoint(buf: &mut Vec<u8>, code: u32) {
    match char::from_u32(code) {
        Some(c) => {
            let mut tmp = [0u8; 4];
            buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
        }
        None => buf.extend_from_slice("\u{FFFD}".as_bytes()),
    }
}

fn parse_hex_codepoint(source: &mut impl ByteSource, digits: usize) -> Result<u32, TurtleError> {
    let mut code = 0u32;
    for _ in 0..digits {
        let d = match source.peek() {
            Some(b) if b.is_ascii_hexdigit() => (b as char).to_digit(16).unwrap(),
            _ => return Err(syntax_error(source, "bad unicode escape")),
        };
        code = code * 16 + d;
        advance(source)?;
    }
    Ok(code)
}

/// `\uXXXX` or `\UXXXXXXXX`, the only escapes an IRIREF permits. Called
/// with the backslash not yet consumed.
fn parse_unicode_escape(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    advance(source)?; // consume backslash
    let digits = match source.peek() {
        Some(b'u') => 4,
        Some(b'U') => 8,
        other => return Err(syntax_error(source, format!("bad escape \\{other:?}"))),
    };
    advance(source)?;
    let code = parse_hex_codepoint(source, digits)?;
    push_codepoint(buf, code);
    Ok(())
}

/// Decodes the full string-literal escape set: `\t \r \n \b \f \" \' \\`
/// plus `\u`/`\U`. Called with the backslash not yet consumed.
fn parse_string_escape(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    advance(source)?; // consume backslash
    match source.peek() {
        Some(b'u') => {
            advance(source)?;
            let code = parse_hex_codepoint(source, 4)?;
            push_codepoint(buf, code);
            Ok(())
        }
        Some(b'U') => {
            advance(source)?;
            let code = parse_hex_codepoint(source, 8)?;
            push_codepoint(buf, code);
            Ok(())
        }
        Some(b't') => {
            buf.push(b'\t');
            advance(source)
        }
        Some(b'r') => {
            buf.push(b'\r');
            advance(source)
        }
        Some(b'n') => {
            buf.push(b'\n');
            advance(source)
        }
        Some(0x62) => {
            buf.push(0x08);
            advance(source)
        }
        Some(0x66) => {
            buf.push(0x0C);
            advance(source)
        }
        Some(b'"') => {
            buf.push(b'"');
            advance(source)
        }
        Some(b'\'') => {
            buf.push(b'\'');
            advance(source)
        }
        Some(b'\\') => {
            buf.push(b'\\');
            advance(source)
        }
        other => Err(syntax_error(source, format!("bad escape \\{other:?}"))),
    }
}

/// Parses `<...IRIREF...>`, unescaping `\uXXXX`/`\UXXXXXXXX` and pushing
/// UTF-8 bytes. Does not resolve against base or validate IRI structure;
/// callers do that afterward with the `uri` module.
pub fn parse_iriref(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    expect(source, b'<')?;
    loop {
        match source.peek() {
            Some(b'>') => {
                advance(source)?;
                return Ok(());
            }
            Some(b'\\') => parse_unicode_escape(source, buf)?,
            Some(b) if b < 0x20 || matches!(b, b'<' | b'"' | b'{' | b'}' | b'|' | b'^' | b'`') => {
                return Err(syntax_error(source, "invalid byte in IRIREF"));
            }
            Some(b) => {
                buf.push(b);
                advance(source)?;
            }
            None => return Err(syntax_error(source, "unterminated IRIREF")),
        }
    }
}

/// Parses a string literal body: `"..."`, `'...'`, `"""..."""` or `'''...'''`.
/// Long forms allow unescaped newlines; short forms do not.
pub fn parse_string_literal(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    let quote = match source.peek() {
        Some(q @ (b'"' | b'\'')) => q,
        _ => return Err(syntax_error(source, "expected string literal")),
    };
    advance(source)?;
    let long = if source.peek() == Some(quote) {
        advance(source)?;
        if source.peek() == Some(quote) {
            advance(source)?;
            true
        } else {
            // It was an empty short string ("" or ''), nothing left to do.
            return Ok(());
        }
    } else {
        false
    };

    loop {
        match source.peek() {
            Some(b) if b == quote => {
                if !long {
                    advance(source)?;
                    return Ok(());
                }
                advance(source)?;
                if source.peek() == Some(quote) {
                    advance(source)?;
                    if source.peek() == Some(quote) {
                        advance(source)?;
                        return Ok(());
                    }
                    buf.push(quote);
                }
                buf.push(quote);
            }
            Some(b'\\') => parse_string_escape(source, buf)?,
            Some(b'\n') if !long => return Err(syntax_error(source, "unescaped newline in short string")),
            Some(b) => {
                buf.push(b);
                advance(source)?;
            }
            None => return Err(syntax_error(source, "unterminated string literal")),
        }
    }
}

/// Parses `_:label`, pushing just the label (without the `_:` prefix).
pub fn parse_blank_node_label(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    expect(source, b'_')?;
    expect(source, b':')?;
    match source.peek() {
        Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b > 0x7F => {
            buf.push(b);
            advance(source)?;
        }
        _ => return Err(syntax_error(source, "expected blank node label")),
    }
    loop {
        match source.peek() {
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') || b > 0x7F => {
                buf.push(b);
                advance(source)?;
            }
            _ => break,
        }
    }
    while buf.last() == Some(&b'.') {
        buf.pop();
    }
    Ok(())
}

/// Parses the `local` part of a `prefix:local` prefixed name, the caller
/// having already consumed `prefix:`. Pushes the decoded local part
/// (PN_LOCAL_ESC `\`-escapes and `%XX` passed through raw).
pub fn parse_pn_local(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    loop {
        match source.peek() {
            Some(b'\\') => {
                advance(source)?;
                match source.peek() {
                    Some(b) if !b.is_ascii_alphanumeric() => {
                        buf.push(b);
                        advance(source)?;
                    }
                    _ => return Err(syntax_error(source, "bad PN_LOCAL_ESC")),
                }
            }
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'%' | b':') || b > 0x7F => {
                buf.push(b);
                advance(source)?;
            }
            _ => break,
        }
    }
    while buf.last() == Some(&b'.') {
        buf.pop();
    }
    Ok(())
}

/// Parses a bare prefix name (the part before `:` in `prefix:local` or a
/// standalone `prefix:` namespace declaration), not including the colon.
pub fn parse_pn_prefix(source: &mut impl ByteSource, buf: &mut Vec<u8>) -> Result<(), TurtleError> {
    loop {
        match source.peek() {
            Some(b) if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') || b > 0x7F => {
                buf.push(b);
                advance(source)?;
            }
            _ => break,
        }
    }
    while buf.last() == Some(&b'.') {
        buf.pop();
    }
    Ok(())
}
