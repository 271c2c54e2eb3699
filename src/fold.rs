//! Dead-Branch Eliminator
//!
//! After the resolver produces a literal value for `import.meta.DEBUG`, this
//! pass folds exactly the constructs the marker guards:
//!
//! - `MARKER && rhs`   - `false` drops the rhs entirely; `true` keeps only it
//! - `MARKER || rhs`   - `true` drops the rhs; `false` keeps only it
//! - `MARKER ? a : b`  - collapses to the taken branch
//! - `if (MARKER) ...` - collapses to the taken statement
//!
//! Everything the fold removes - calls, string literals, whole statements -
//! is gone from the output, never just disabled. A marker in any other
//! position is substituted with the literal and left alone: this is not a
//! general optimizer and attempts no unrelated simplification.
//!
//! The pass re-scans after each edit rather than juggling shifting spans.
//! Each edit removes at least the leftmost marker, so it terminates.

use crate::rewrite::{find_markers, MarkerSite};
use crate::scan::{tokenize, Token, TokenKind};

/// Result of folding one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    pub output: String,
    /// Marker occurrences rewritten
    pub occurrences: usize,
    /// Occurrences where a guarded construct was actually collapsed
    /// (the rest were plain literal substitutions)
    pub folded: usize,
}

/// One source edit
struct Edit {
    start: usize,
    end: usize,
    text: String,
    folded: bool,
}

/// Statement keywords that cannot continue an expression. Used to stop
/// operand scanning across an ASI boundary (newline before the keyword).
const STMT_KEYWORDS: &[&str] = &[
    "break", "class", "const", "continue", "debugger", "do", "export", "for", "function", "if",
    "import", "let", "return", "switch", "throw", "var", "while",
];

/// Keywords whose parenthesized head is statement syntax, not a call
/// (`if (x)` must not be mistaken for `f(x)`).
const PAREN_STMT_KEYWORDS: &[&str] = &["if", "while", "for", "switch", "catch", "with"];

/// Keywords that precede an expression, so a following `(` is grouping.
const EXPR_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Substitute every `import.meta.DEBUG` with `value` and eliminate the dead
/// branches it guards.
///
/// Callers are expected to have run the reassignment guard first
/// ([`find_markers`]); `apply` assumes every occurrence is a plain read.
pub fn apply(src: &str, value: bool) -> FoldOutcome {
    let mut out = src.to_string();
    let mut occurrences = 0;
    let mut folded = 0;

    loop {
        let tokens = tokenize(&out);
        let scan = find_markers(&out, &tokens);
        let Some(site) = scan.sites.first().copied() else {
            break;
        };

        occurrences += 1;
        let edit = fold_site(&out, &tokens, site, value);
        if edit.folded {
            folded += 1;
        }
        out.replace_range(edit.start..edit.end, &edit.text);
    }

    FoldOutcome {
        output: out,
        occurrences,
        folded,
    }
}

fn literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn fold_site(src: &str, tokens: &[Token], site: MarkerSite, value: bool) -> Edit {
    let (first, last) = peel_parens(src, tokens, site.first_token, site.last_token);
    let start = tokens[first].start;
    let end = tokens[last].end;

    let substitute = || Edit {
        start,
        end,
        text: literal(value).to_string(),
        folded: false,
    };

    let next = tokens.get(last + 1);

    // if (MARKER) stmt [else stmt]
    if first >= 2
        && tokens[first - 1].is_punct(src, "(")
        && tokens[first - 2].is_ident(src, "if")
        && next.is_some_and(|t| t.is_punct(src, ")"))
    {
        if let Some(edit) = fold_if(src, tokens, first - 2, last + 2, value) {
            return edit;
        }
        return substitute();
    }

    match next {
        Some(t) if t.is_punct(src, "&&") => {
            fold_short_circuit(src, tokens, first, last, value, true).unwrap_or_else(substitute)
        }
        Some(t) if t.is_punct(src, "||") => {
            fold_short_circuit(src, tokens, first, last, value, false).unwrap_or_else(substitute)
        }
        Some(t) if t.is_punct(src, "?") => {
            fold_ternary(src, tokens, first, last, value).unwrap_or_else(substitute)
        }
        _ => substitute(),
    }
}

/// Widen the site over grouping parentheses: `(import.meta.DEBUG) && x`
/// folds like the bare form. Call arguments (`f(MARKER)`) and statement
/// heads (`if (MARKER)`) are left alone.
fn peel_parens(src: &str, tokens: &[Token], mut first: usize, mut last: usize) -> (usize, usize) {
    loop {
        if first == 0 || last + 1 >= tokens.len() {
            return (first, last);
        }
        if !(tokens[first - 1].is_punct(src, "(") && tokens[last + 1].is_punct(src, ")")) {
            return (first, last);
        }
        if first >= 2 {
            let before = &tokens[first - 2];
            let keep = match before.kind {
                // `if (M)` keeps its parens for the statement handler;
                // `f(M)` is an argument, not a group. Keywords that take an
                // expression (`return (M) && x`) do group.
                TokenKind::Ident => {
                    PAREN_STMT_KEYWORDS.contains(&before.text(src))
                        || !EXPR_KEYWORDS.contains(&before.text(src))
                }
                TokenKind::Punct => matches!(before.text(src), ")" | "]"),
                _ => true,
            };
            if keep {
                return (first, last);
            }
        }
        first -= 1;
        last += 1;
    }
}

/// `MARKER && rhs` / `MARKER || rhs`. Returns `None` when the rhs is
/// missing or unscannable, in which case plain substitution applies.
fn fold_short_circuit(
    src: &str,
    tokens: &[Token],
    first: usize,
    last: usize,
    value: bool,
    is_and: bool,
) -> Option<Edit> {
    let op_idx = last + 1;
    let rhs_start = op_idx + 1;
    if rhs_start >= tokens.len() {
        return None;
    }

    // `true && rhs` -> rhs, `false || rhs` -> rhs: drop marker and operator.
    let keeps_rhs = value == is_and;
    if keeps_rhs {
        return Some(Edit {
            start: tokens[first].start,
            end: tokens[rhs_start].start,
            text: String::new(),
            folded: true,
        });
    }

    // `false && rhs` -> false, `true || rhs` -> true: drop the rhs.
    let rhs_end = operand_end(src, tokens, rhs_start, is_and);
    if rhs_end == rhs_start {
        return None;
    }
    let span_start = tokens[first].start;
    let span_end = tokens[rhs_end - 1].end;

    // A whole expression statement reduced to a bare literal is dropped.
    let at_statement_start = first == 0
        || matches!(tokens[first - 1].kind, TokenKind::Punct)
            && matches!(tokens[first - 1].text(src), ";" | "{" | "}");
    let (terminated, term_end) = match tokens.get(rhs_end) {
        Some(t) if t.is_punct(src, ";") => (true, t.end),
        Some(_) => (preceded_by_newline(src, tokens, rhs_end), span_end),
        None => (true, span_end),
    };
    if at_statement_start && terminated {
        let (s, e) = statement_removal_span(src, span_start, term_end);
        return Some(Edit {
            start: s,
            end: e,
            text: String::new(),
            folded: true,
        });
    }

    Some(Edit {
        start: span_start,
        end: span_end,
        text: literal(value).to_string(),
        folded: true,
    })
}

/// `MARKER ? a : b` -> the taken branch.
fn fold_ternary(
    src: &str,
    tokens: &[Token],
    first: usize,
    last: usize,
    value: bool,
) -> Option<Edit> {
    let question = last + 1;
    let a_start = question + 1;
    let colon = find_ternary_colon(src, tokens, a_start)?;
    let b_start = colon + 1;
    let b_end = operand_end(src, tokens, b_start, false);
    if a_start >= colon || b_start >= b_end {
        return None;
    }

    let branch = if value {
        &src[tokens[a_start].start..tokens[colon - 1].end]
    } else {
        &src[tokens[b_start].start..tokens[b_end - 1].end]
    };

    Some(Edit {
        start: tokens[first].start,
        end: tokens[b_end - 1].end,
        text: branch.trim().to_string(),
        folded: true,
    })
}

/// `if (MARKER) stmt [else stmt]` -> the taken statement, or `;` when the
/// false branch is absent.
fn fold_if(
    src: &str,
    tokens: &[Token],
    if_idx: usize,
    stmt_start: usize,
    value: bool,
) -> Option<Edit> {
    if stmt_start >= tokens.len() {
        return None;
    }
    let stmt_end = statement_end(src, tokens, stmt_start);
    if stmt_end == stmt_start {
        return None;
    }

    let (else_stmt, consumed_end) = match tokens.get(stmt_end) {
        Some(t) if t.is_ident(src, "else") => {
            let else_start = stmt_end + 1;
            let else_end = statement_end(src, tokens, else_start);
            if else_end == else_start {
                (None, stmt_end)
            } else {
                (Some((else_start, else_end)), else_end)
            }
        }
        _ => (None, stmt_end),
    };

    let text = if value {
        src[tokens[stmt_start].start..tokens[stmt_end - 1].end].to_string()
    } else {
        match else_stmt {
            Some((s, e)) => src[tokens[s].start..tokens[e - 1].end].to_string(),
            None => ";".to_string(),
        }
    };

    Some(Edit {
        start: tokens[if_idx].start,
        end: tokens[consumed_end - 1].end,
        text,
        folded: true,
    })
}

fn is_opener(src: &str, t: &Token) -> bool {
    t.kind == TokenKind::Punct && matches!(t.text(src), "(" | "[" | "{" | "${")
}

fn is_closer(src: &str, t: &Token) -> bool {
    t.kind == TokenKind::Punct && matches!(t.text(src), ")" | "]" | "}")
}

/// Does a newline separate this token from the previous one? Gate for the
/// ASI heuristic.
fn preceded_by_newline(src: &str, tokens: &[Token], idx: usize) -> bool {
    if idx == 0 {
        return true;
    }
    src[tokens[idx - 1].end..tokens[idx].start].contains('\n')
}

/// Can this token be the last token of an expression? When it can, a
/// newline before a following name or literal is an ASI boundary.
fn ends_expression(src: &str, t: &Token) -> bool {
    match t.kind {
        TokenKind::Punct => matches!(t.text(src), ")" | "]" | "}" | "++" | "--"),
        _ => true,
    }
}

/// End (exclusive token index) of the operand chain starting at `from`,
/// where the chain belongs to the right side of `&&` (`for_and`) or `||`.
///
/// Stops at the first token that binds looser than the operator: another
/// short-circuit of lower precedence, ternary punctuation, assignment,
/// commas, terminators, unmatched closers, or an ASI boundary (a statement
/// keyword on a fresh line, or a fresh-line name/literal after a token that
/// can end an expression).
fn operand_end(src: &str, tokens: &[Token], from: usize, for_and: bool) -> usize {
    let mut depth: usize = 0;
    let mut j = from;
    while j < tokens.len() {
        let t = &tokens[j];
        if is_opener(src, t) {
            depth += 1;
        } else if is_closer(src, t) {
            if depth == 0 {
                return j;
            }
            depth -= 1;
        } else if depth == 0 {
            if t.kind == TokenKind::Punct {
                let text = t.text(src);
                let assignment = text.ends_with('=')
                    && !matches!(text, "==" | "===" | "!=" | "!==" | "<=" | ">=");
                let stops = assignment
                    || matches!(text, "?" | ":" | "," | ";" | "=>" | "??")
                    || (for_and && text == "||");
                if stops {
                    return j;
                }
            } else if preceded_by_newline(src, tokens, j) {
                let keyword =
                    t.kind == TokenKind::Ident && STMT_KEYWORDS.contains(&t.text(src));
                if keyword || (j > from && ends_expression(src, &tokens[j - 1])) {
                    return j;
                }
            }
        }
        j += 1;
    }
    tokens.len()
}

/// Find the `:` closing the ternary whose true-branch starts at `from`.
fn find_ternary_colon(src: &str, tokens: &[Token], from: usize) -> Option<usize> {
    let mut depth: usize = 0;
    let mut nesting: usize = 0;
    let mut j = from;
    while j < tokens.len() {
        let t = &tokens[j];
        if is_opener(src, t) {
            depth += 1;
        } else if is_closer(src, t) {
            if depth == 0 {
                return None;
            }
            depth -= 1;
        } else if depth == 0 && t.kind == TokenKind::Punct {
            match t.text(src) {
                "?" => nesting += 1,
                ":" => {
                    if nesting == 0 {
                        return Some(j);
                    }
                    nesting -= 1;
                }
                ";" => return None,
                _ => {}
            }
        }
        j += 1;
    }
    None
}

/// End (exclusive token index) of one statement starting at `from`.
/// Handles blocks, `if`/`else` chains, loop and function/class heads; plain
/// statements run to the `;` at depth zero or an unmatched closer.
fn statement_end(src: &str, tokens: &[Token], from: usize) -> usize {
    if from >= tokens.len() {
        return from;
    }
    let t = &tokens[from];

    if t.is_punct(src, "{") {
        return matching_close(src, tokens, from);
    }

    if t.kind == TokenKind::Ident {
        match t.text(src) {
            "if" => {
                let mut j = from + 1;
                if tokens.get(j).is_some_and(|t| t.is_punct(src, "(")) {
                    j = matching_close(src, tokens, j);
                }
                j = statement_end(src, tokens, j);
                if tokens.get(j).is_some_and(|t| t.is_ident(src, "else")) {
                    j = statement_end(src, tokens, j + 1);
                }
                return j;
            }
            "for" | "while" => {
                let mut j = from + 1;
                if tokens.get(j).is_some_and(|t| t.is_punct(src, "(")) {
                    j = matching_close(src, tokens, j);
                }
                return statement_end(src, tokens, j);
            }
            "do" => {
                let mut j = statement_end(src, tokens, from + 1);
                if tokens.get(j).is_some_and(|t| t.is_ident(src, "while")) {
                    j += 1;
                    if tokens.get(j).is_some_and(|t| t.is_punct(src, "(")) {
                        j = matching_close(src, tokens, j);
                    }
                    if tokens.get(j).is_some_and(|t| t.is_punct(src, ";")) {
                        j += 1;
                    }
                }
                return j;
            }
            "switch" | "try" | "function" | "class" => {
                return head_then_blocks(src, tokens, from);
            }
            _ => {}
        }
    }

    let mut depth: usize = 0;
    let mut j = from;
    while j < tokens.len() {
        let t = &tokens[j];
        if is_opener(src, t) {
            depth += 1;
        } else if is_closer(src, t) {
            if depth == 0 {
                return j;
            }
            depth -= 1;
        } else if depth == 0 && t.is_punct(src, ";") {
            return j + 1;
        }
        j += 1;
    }
    tokens.len()
}

/// Consume a head (`function f(a, b)`, `switch (x)`, `try`) plus its block,
/// and for `try` any `catch`/`finally` blocks that follow.
fn head_then_blocks(src: &str, tokens: &[Token], from: usize) -> usize {
    let mut j = from;
    // scan to the opening brace of the body
    let mut depth: usize = 0;
    while j < tokens.len() {
        let t = &tokens[j];
        if t.is_punct(src, "{") && depth == 0 {
            j = matching_close(src, tokens, j);
            break;
        }
        if is_opener(src, t) {
            depth += 1;
        } else if is_closer(src, t) {
            if depth == 0 {
                return j;
            }
            depth -= 1;
        }
        j += 1;
    }
    // catch (...) { } / finally { }
    while let Some(t) = tokens.get(j) {
        if t.is_ident(src, "catch") || t.is_ident(src, "finally") {
            j += 1;
            if tokens.get(j).is_some_and(|t| t.is_punct(src, "(")) {
                j = matching_close(src, tokens, j);
            }
            if tokens.get(j).is_some_and(|t| t.is_punct(src, "{")) {
                j = matching_close(src, tokens, j);
            }
        } else {
            break;
        }
    }
    j
}

/// Index one past the closer matching the opener at `open_idx`.
fn matching_close(src: &str, tokens: &[Token], open_idx: usize) -> usize {
    let mut depth: usize = 1;
    let mut j = open_idx + 1;
    while j < tokens.len() {
        let t = &tokens[j];
        if is_opener(src, t) {
            depth += 1;
        } else if is_closer(src, t) {
            depth -= 1;
            if depth == 0 {
                return j + 1;
            }
        }
        j += 1;
    }
    tokens.len()
}

/// Widen a dropped statement's span over surrounding indentation and the
/// trailing newline, so eliminating a line leaves no blank residue.
fn statement_removal_span(src: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = src.as_bytes();
    let mut s = start;
    while s > 0 && (bytes[s - 1] == b' ' || bytes[s - 1] == b'\t') {
        s -= 1;
    }
    let at_line_start = s == 0 || bytes[s - 1] == b'\n';
    if !at_line_start {
        return (start, end);
    }
    let mut e = end;
    while e < bytes.len() && (bytes[e] == b' ' || bytes[e] == b'\t') {
        e += 1;
    }
    if e < bytes.len() && bytes[e] == b'\n' {
        return (s, e + 1);
    }
    if e == bytes.len() {
        return (s, e);
    }
    (start, end)
}
