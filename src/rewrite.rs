//! Marker Rewriter
//!
//! Locates `import.meta.DEBUG` member accesses in a token stream and decides
//! whether a file may be rewritten at all. Substitution requires syntactic
//! certainty: any occurrence used as an assignment target marks the whole
//! file opaque and nothing in it is substituted.
//!
//! Rewriting is purely local to each file. The marker is read-only and
//! non-shadowable, so no alias or scope analysis happens here - a literal
//! token-sequence match is the entire contract.

use crate::scan::{Token, TokenKind};

/// The source-level construct, as written
pub const MARKER: &str = "import.meta.DEBUG";

/// Assignment operators that make a marker occurrence an assignment target.
const ASSIGN_OPS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", ">>>=", "**=", "&&=",
    "||=", "??=",
];

/// One `import.meta.DEBUG` occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSite {
    /// Index of the `import` token
    pub first_token: usize,
    /// Index of the `DEBUG` token
    pub last_token: usize,
    /// Byte span over the whole member access
    pub start: usize,
    pub end: usize,
}

/// All marker occurrences in one file
#[derive(Debug, Clone, Default)]
pub struct MarkerScan {
    pub sites: Vec<MarkerSite>,
    /// True when any occurrence is written to (`=`, compound assignment,
    /// `++`/`--`, `delete`). The file is then treated as ordinary code.
    pub reassigned: bool,
}

impl MarkerScan {
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Find every marker occurrence in a tokenized file.
///
/// The pattern is the exact token sequence `import . meta . DEBUG`; comments
/// and whitespace between tokens are already gone at this level. A preceding
/// `.` or `?.` disqualifies a match (`obj.import.meta.DEBUG` is somebody
/// else's property chain, not the construct).
pub fn find_markers(src: &str, tokens: &[Token]) -> MarkerScan {
    let mut scan = MarkerScan::default();

    let mut i = 0;
    while i + 4 < tokens.len() {
        if !(tokens[i].is_ident(src, "import")
            && tokens[i + 1].is_punct(src, ".")
            && tokens[i + 2].is_ident(src, "meta")
            && tokens[i + 3].is_punct(src, ".")
            && tokens[i + 4].is_ident(src, "DEBUG"))
        {
            i += 1;
            continue;
        }

        // `x.import.meta.DEBUG` / `x?.import.meta.DEBUG` is not the marker.
        if i > 0
            && tokens[i - 1].kind == TokenKind::Punct
            && matches!(tokens[i - 1].text(src), "." | "?.")
        {
            i += 1;
            continue;
        }

        let site = MarkerSite {
            first_token: i,
            last_token: i + 4,
            start: tokens[i].start,
            end: tokens[i + 4].end,
        };

        if is_assignment_target(src, tokens, &site) {
            scan.reassigned = true;
        }
        scan.sites.push(site);

        i += 5;
    }

    scan
}

fn is_assignment_target(src: &str, tokens: &[Token], site: &MarkerSite) -> bool {
    if let Some(next) = tokens.get(site.last_token + 1) {
        if next.kind == TokenKind::Punct {
            let t = next.text(src);
            if ASSIGN_OPS.contains(&t) || t == "++" || t == "--" {
                return true;
            }
        }
    }
    if site.first_token > 0 {
        let prev = &tokens[site.first_token - 1];
        if prev.is_ident(src, "delete") || prev.is_punct(src, "++") || prev.is_punct(src, "--") {
            return true;
        }
    }
    false
}
