//! Property tests for matching and instantiation.

use code_match::engine::{Counter, Instantiator, Matcher, Placeholders};
use code_match::{print, Bindings, Dialect, Node, Options, Sanitizer, Session};
use proptest::prelude::*;

fn snippet(text: &str) -> Node {
    code_match::cache::get_or_parse_snippet(text, Dialect::JavaScript).unwrap()
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}".prop_map(|s| format!("v_{s}"))
}

/// Identifiers or integer literals.
fn atom() -> impl Strategy<Value = String> {
    prop_oneof![ident(), (0u32..10_000).prop_map(|n| n.to_string())]
}

fn call(callee: &str, args: &[String]) -> String {
    format!("{callee}({})", args.join(", "))
}

proptest! {
    #[test]
    fn pattern_prefix_of_arguments_matches(
        args in prop::collection::vec(atom(), 1..6),
        keep in 0usize..6,
    ) {
        let keep = keep.min(args.len());
        let placeholders = Placeholders::default();
        let matcher = Matcher::new(&placeholders);

        let candidate = snippet(&call("f", &args));
        let pattern = snippet(&call("f", &args[..keep]));
        prop_assert!(matcher.matches(&candidate, &pattern).is_some());

        let mut longer = args.clone();
        longer.push("extra".to_string());
        let too_long = snippet(&call("f", &longer));
        prop_assert!(matcher.matches(&candidate, &too_long).is_none());
    }

    #[test]
    fn single_placeholder_captures_the_exact_subtree(args in prop::collection::vec(atom(), 1..4)) {
        let placeholders = Placeholders::default();
        let source = call("g", &[call("h", &args)]);
        let candidate = snippet(&source);

        let bindings = Matcher::new(&placeholders)
            .matches(&candidate, &snippet("g($$X)"))
            .unwrap();
        prop_assert_eq!(print(&bindings["$$X"]), call("h", &args));
    }

    #[test]
    fn templates_without_placeholders_are_reproduced(
        args in prop::collection::vec(atom(), 0..5),
        bound in ident(),
    ) {
        let template = snippet(&call("target", &args));
        let mut bindings = Bindings::new();
        bindings.insert("$$UNUSED".to_string(), Node::identifier(bound));

        let placeholders = Placeholders::default();
        let mut counter = Counter::new();
        let out = Instantiator::new(&placeholders, &mut counter).instantiate(&template, &bindings);

        prop_assert_eq!(&out, &Sanitizer::positions_only().clean(&template));
        prop_assert_eq!(print(&out), call("target", &args));
        prop_assert_eq!(counter.value(), 0);
    }

    #[test]
    fn counter_values_are_consecutive(
        plan in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        // Each entry is one statement; `true` ones get numbered, `false` ones
        // are rewritten by a counter-free template in between.
        let source: String = plan
            .iter()
            .map(|numbered| if *numbered { "tick();\n" } else { "tock();\n" })
            .collect();
        let mut session = Session::new(&source, Options::default()).unwrap();

        let numbered = plan.iter().filter(|n| **n).count();
        session.replace("tock()", "tock(0)").unwrap();
        session.replace("tick()", "tick($$COUNT)").unwrap();
        session.replace("tock($$Z)", "tock($$Z, 1)").unwrap();

        let out = session.to_source();
        let values: Vec<String> = out
            .lines()
            .filter_map(|line| line.strip_prefix("tick(").and_then(|rest| rest.strip_suffix(");")))
            .map(str::to_string)
            .collect();
        let expected: Vec<String> = (0..numbered).map(|n| n.to_string()).collect();
        prop_assert_eq!(values, expected);
        prop_assert_eq!(session.counter(), numbered as u64);
    }
}
