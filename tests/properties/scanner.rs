//! Property tests for the token scanner.

use proptest::prelude::*;

use metastrip::scan::tokenize;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Tokenizing never panics, on any input at all.
    #[test]
    fn property_tokenize_never_panics(src in "(?s).{0,512}") {
        let _ = tokenize(&src);
    }

    /// PROPERTY: Every token spans a valid, non-empty slice of the source,
    /// and tokens appear in order without overlap.
    #[test]
    fn property_token_spans_are_valid(src in "(?s).{0,512}") {
        let tokens = tokenize(&src);
        let mut prev_end = 0;
        for t in &tokens {
            prop_assert!(t.start < t.end);
            prop_assert!(t.end <= src.len());
            prop_assert!(t.start >= prev_end, "overlapping tokens");
            // must not split a UTF-8 char
            prop_assert!(src.get(t.start..t.end).is_some());
            prev_end = t.end;
        }
    }

    /// PROPERTY: Content inside line comments produces no tokens.
    #[test]
    fn property_line_comments_are_invisible(body in "[a-zA-Z0-9 .&|?]{0,64}") {
        let src = format!("a\n// {body}\nb");
        let tokens = tokenize(&src);
        prop_assert_eq!(tokens.len(), 2);
    }

    /// PROPERTY: A single-quoted string with no quotes, escapes, or newlines
    /// inside always scans as exactly one string token.
    #[test]
    fn property_simple_strings_are_one_token(body in "[a-zA-Z0-9 .&|?{}()/*]{0,64}") {
        let src = format!("x('{body}')");
        let tokens = tokenize(&src);
        // x ( 'body' )
        prop_assert_eq!(tokens.len(), 4);
        prop_assert_eq!(tokens[2].text(&src), format!("'{body}'"));
    }
}
