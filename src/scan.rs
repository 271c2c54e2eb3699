//! Minimal JavaScript token scanner
//!
//! Metastrip never parses JavaScript in general. This scanner knows just
//! enough syntax to walk a file token by token without being fooled by
//! comments, string literals, template literals, or regex literals - which
//! is all the marker rewriter and the branch eliminator need.
//!
//! Template literals are split so interpolations produce real tokens:
//! the text chunks become `Template` tokens and `${` / `}` become puncts,
//! so a marker inside `${...}` is visible like any other code.

/// Kind of a scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// Numeric literal
    Number,
    /// String literal, quotes included
    Str,
    /// Template literal text chunk, backticks included
    Template,
    /// Regex literal, flags included
    Regex,
    /// Punctuator/operator, longest-munch
    Punct,
}

/// A token with its byte span in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    /// Is this an exact punctuator?
    pub fn is_punct(&self, src: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == p
    }

    /// Is this an exact identifier/keyword?
    pub fn is_ident(&self, src: &str, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == name
    }
}

/// Multi-byte punctuators, longest first for maximal munch.
const PUNCTS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", "&&=", "||=", "??=", ">>>", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**",
];

/// Keywords after which a `/` starts a regex literal rather than division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn regex_allowed(tokens: &[Token], src: &str) -> bool {
    match tokens.last() {
        None => true,
        Some(t) => match t.kind {
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&t.text(src)),
            TokenKind::Punct => !matches!(t.text(src), ")" | "]" | "++" | "--"),
            _ => false,
        },
    }
}

/// Scan a source string into tokens. Whitespace and comments are dropped.
///
/// Never fails: malformed input (unterminated strings, stray bytes) degrades
/// to best-effort tokens so callers can still decide to leave the file alone.
pub fn tokenize(src: &str) -> Vec<Token> {
    let b = src.as_bytes();
    let len = b.len();
    let mut tokens: Vec<Token> = Vec::new();

    // Brace depths at which an open template interpolation began.
    let mut template_stack: Vec<usize> = Vec::new();
    let mut brace_depth: usize = 0;

    let mut i = 0;
    while i < len {
        let c = b[i];

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Comments, division, or regex
        if c == b'/' {
            if i + 1 < len && b[i + 1] == b'/' {
                while i < len && b[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            if i + 1 < len && b[i + 1] == b'*' {
                i += 2;
                while i + 1 < len && !(b[i] == b'*' && b[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(len);
                continue;
            }
            if regex_allowed(&tokens, src) {
                let end = scan_regex(b, i);
                tokens.push(Token {
                    kind: TokenKind::Regex,
                    start: i,
                    end,
                });
                i = end;
                continue;
            }
            // fall through to punct handling (/ or /=)
        }

        if c == b'"' || c == b'\'' {
            let end = scan_string(b, i);
            tokens.push(Token {
                kind: TokenKind::Str,
                start: i,
                end,
            });
            i = end;
            continue;
        }

        if c == b'`' {
            i = scan_template_chunk(b, i, true, &mut tokens, &mut template_stack, brace_depth);
            continue;
        }

        if c == b'}' && template_stack.last() == Some(&brace_depth) {
            // Close of a template interpolation: emit the brace, then resume
            // template text scanning right after it.
            template_stack.pop();
            tokens.push(Token {
                kind: TokenKind::Punct,
                start: i,
                end: i + 1,
            });
            i = scan_template_chunk(b, i + 1, false, &mut tokens, &mut template_stack, brace_depth);
            continue;
        }

        if is_ident_start(c) {
            let mut j = i + 1;
            while j < len && is_ident_continue(b[j]) {
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                start: i,
                end: j,
            });
            i = j;
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && i + 1 < len && b[i + 1].is_ascii_digit()) {
            let mut j = i + 1;
            while j < len && (b[j].is_ascii_alphanumeric() || b[j] == b'.' || b[j] == b'_') {
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                start: i,
                end: j,
            });
            i = j;
            continue;
        }

        // Punctuator: maximal munch from the table, else a single byte.
        let rest = &src[i..];
        let punct_len = PUNCTS
            .iter()
            .find(|p| rest.starts_with(**p))
            .map(|p| p.len())
            .unwrap_or(1);

        if punct_len == 1 {
            if c == b'{' {
                brace_depth += 1;
            } else if c == b'}' {
                brace_depth = brace_depth.saturating_sub(1);
            }
        }

        tokens.push(Token {
            kind: TokenKind::Punct,
            start: i,
            end: i + punct_len,
        });
        i += punct_len;
        continue;
    }

    tokens
}

/// Scan a quoted string starting at `start`. Stops at the closing quote, an
/// unescaped newline (unterminated), or end of input.
fn scan_string(b: &[u8], start: usize) -> usize {
    let quote = b[start];
    let mut i = start + 1;
    while i < b.len() {
        match b[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    b.len()
}

/// Scan a regex literal starting at the `/`. Tracks character classes so a
/// `/` inside `[...]` does not terminate the literal.
fn scan_regex(b: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    let mut in_class = false;
    while i < b.len() {
        match b[i] {
            b'\\' => i += 2,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                i += 1;
                // flags
                while i < b.len() && b[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return i;
            }
            b'\n' => return i,
            _ => i += 1,
        }
    }
    b.len()
}

/// Scan one template text chunk. `chunk_start` is the first byte of the
/// chunk: the opening backtick itself (`opening`), or the byte right after
/// the `}` that closed an interpolation. Emits a `Template` token for the
/// chunk and, if the chunk ends at `${`, the `${` punct plus a stack entry.
///
/// Returns the index scanning should resume from.
fn scan_template_chunk(
    b: &[u8],
    chunk_start: usize,
    opening: bool,
    tokens: &mut Vec<Token>,
    template_stack: &mut Vec<usize>,
    brace_depth: usize,
) -> usize {
    let mut i = if opening { chunk_start + 1 } else { chunk_start };
    while i < b.len() {
        match b[i] {
            b'\\' => i += 2,
            b'`' => {
                tokens.push(Token {
                    kind: TokenKind::Template,
                    start: chunk_start,
                    end: i + 1,
                });
                return i + 1;
            }
            b'$' if i + 1 < b.len() && b[i + 1] == b'{' => {
                if i > chunk_start {
                    tokens.push(Token {
                        kind: TokenKind::Template,
                        start: chunk_start,
                        end: i,
                    });
                }
                tokens.push(Token {
                    kind: TokenKind::Punct,
                    start: i,
                    end: i + 2,
                });
                template_stack.push(brace_depth);
                return i + 2;
            }
            _ => i += 1,
        }
    }
    if b.len() > chunk_start {
        tokens.push(Token {
            kind: TokenKind::Template,
            start: chunk_start,
            end: b.len(),
        });
    }
    b.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(src: &'a str) -> Vec<&'a str> {
        tokenize(src).iter().map(|t| t.text(src)).collect()
    }

    #[test]
    fn test_tokenize_member_access() {
        assert_eq!(
            texts("import.meta.DEBUG"),
            vec!["import", ".", "meta", ".", "DEBUG"]
        );
    }

    #[test]
    fn test_comments_and_whitespace_dropped() {
        assert_eq!(
            texts("a /* x */ . // line\n b"),
            vec!["a", ".", "b"]
        );
    }

    #[test]
    fn test_marker_inside_string_is_one_token() {
        let src = r#"log("import.meta.DEBUG")"#;
        let tokens = tokenize(src);
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Str,
                TokenKind::Punct
            ]
        );
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let src = "x = 'oops\nimport.meta.DEBUG";
        let t = texts(src);
        assert!(t.contains(&"DEBUG"));
    }

    #[test]
    fn test_template_interpolation_yields_tokens() {
        let src = "`a ${flag && b} c`";
        let t = texts(src);
        assert!(t.contains(&"${"));
        assert!(t.contains(&"flag"));
        assert!(t.contains(&"&&"));
        // text chunks stay opaque
        assert!(t.contains(&"`a "));
    }

    #[test]
    fn test_nested_braces_inside_interpolation() {
        let src = "`${ {a: 1}.a }b`";
        let tokens = tokenize(src);
        // final chunk closes the template
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Template);
        assert_eq!(last.text(src), "b`");
    }

    #[test]
    fn test_regex_literal_with_quote_inside() {
        // The quote inside the class must not start a string.
        let src = "const re = /['\"]/; x.DEBUG";
        let t = texts(src);
        assert!(t.contains(&"/['\"]/"));
        assert!(t.contains(&"DEBUG"));
    }

    #[test]
    fn test_division_is_not_regex() {
        let src = "a / b / c";
        let tokens = tokenize(src);
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Regex));
    }

    #[test]
    fn test_regex_after_return() {
        let src = "return /ab/g";
        let tokens = tokenize(src);
        assert_eq!(tokens[1].kind, TokenKind::Regex);
        assert_eq!(tokens[1].text(src), "/ab/g");
    }

    #[test]
    fn test_maximal_munch_puncts() {
        assert_eq!(texts("a&&=b"), vec!["a", "&&=", "b"]);
        assert_eq!(texts("a===b"), vec!["a", "===", "b"]);
        assert_eq!(texts("a?.b"), vec!["a", "?.", "b"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(texts("0x1F + 1.5e3"), vec!["0x1F", "+", "1.5e3"]);
    }

    #[test]
    fn test_spans_cover_valid_ranges() {
        let src = "const x = `t ${a}` // done";
        for t in tokenize(src) {
            assert!(t.start < t.end, "empty token");
            assert!(t.end <= src.len());
            // spans must lie on char boundaries
            let _ = &src[t.start..t.end];
        }
    }
}
