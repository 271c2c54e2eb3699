//! Property tests for marker folding.

use proptest::prelude::*;

use metastrip::fold;
use metastrip::transform_source;

fn ident() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-zA-Z0-9]{0,7}").unwrap()
}

fn message() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9 ,.!-]{0,24}").unwrap()
}

/// One plausible statement, guarded or plain.
fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        (ident(), message())
            .prop_map(|(f, m)| format!("import.meta.DEBUG && {f}('{m}');")),
        (ident(), message())
            .prop_map(|(f, m)| format!("if (import.meta.DEBUG) {{ {f}('{m}'); }}")),
        (ident(), message(), message())
            .prop_map(|(x, a, b)| format!("const {x} = import.meta.DEBUG ? '{a}' : '{b}';")),
        ident().prop_map(|f| format!("{f}(import.meta.DEBUG);")),
        (ident(), ident()).prop_map(|(x, f)| format!("const {x} = import.meta.DEBUG || {f}();")),
        ident().prop_map(|f| format!("{f}();")),
        ident().prop_map(|x| format!("let {x} = 1 + 2;")),
    ]
}

fn snippet() -> impl Strategy<Value = String> {
    proptest::collection::vec(statement(), 1..6).prop_map(|lines| {
        let mut s = lines.join("\n");
        s.push('\n');
        s
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 192,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Folding never panics, on any input at all.
    #[test]
    fn property_apply_never_panics(src in "(?s).{0,384}", value in any::<bool>()) {
        let _ = fold::apply(&src, value);
    }

    /// PROPERTY: No marker survives folding a structured snippet.
    #[test]
    fn property_no_marker_survives(src in snippet(), value in any::<bool>()) {
        let outcome = fold::apply(&src, value);
        prop_assert!(
            !outcome.output.contains("import.meta.DEBUG"),
            "marker left in:\n{}",
            outcome.output
        );
    }

    /// PROPERTY: Folding is idempotent - a second pass changes nothing.
    #[test]
    fn property_apply_is_idempotent(src in snippet(), value in any::<bool>()) {
        let once = fold::apply(&src, value);
        let twice = fold::apply(&once.output, value);
        prop_assert_eq!(&twice.output, &once.output);
        prop_assert_eq!(twice.occurrences, 0);
    }

    /// PROPERTY: Unguarded statements survive the fold untouched.
    #[test]
    fn property_plain_statements_survive(f in ident(), value in any::<bool>()) {
        let expected = format!("{f}ZZkeep();");
        let src = format!("import.meta.DEBUG && gone();\n{expected}\n");
        let outcome = fold::apply(&src, value);
        prop_assert!(
            outcome.output.contains(&expected),
            "missing '{}' in:\n{}",
            expected,
            outcome.output
        );
    }

    /// PROPERTY: An unresolved condition is a byte-identical passthrough.
    #[test]
    fn property_unresolved_is_identity(src in snippet()) {
        let (out, _) = transform_source(&src, None);
        prop_assert_eq!(out, src);
    }
}
