//! Parse engine tests: step matching, ordered choice, rule delegation and failure traces.

use once_cell::sync::Lazy;
use revparse::combinators::sequence;
use revparse::{
    parse, FailedOn, GrammarError, GrammarNode, Halt, ParseResult, Pattern, Rule, SemanticFailure,
    Session, Value,
};

fn pattern(source: &str) -> Pattern {
    Pattern::new(source).unwrap()
}

static BCD: Lazy<Rule> = Lazy::new(|| {
    Rule::new("bcd", |s: &mut dyn Session| {
        s.literal("b")?;
        s.literal("c")?;
        s.literal("d")?;
        Ok(Value::record([("bcd", Value::Bool(true))]))
    })
});

static BAD: Lazy<Rule> = Lazy::new(|| {
    Rule::new("bad", |s: &mut dyn Session| {
        s.literal("b")?;
        s.literal("a")?;
        s.literal("d")?;
        Ok(Value::record([("bad", Value::Bool(true))]))
    })
});

#[cfg(test)]
mod failing_tests {
    use super::*;

    #[test]
    fn test_wrong_second_literal() {
        let result = parse("abcdef", &sequence(["abc", "wrong"]));
        assert_eq!(
            result,
            ParseResult::Failure {
                remaining: "def",
                error: revparse::ParseError {
                    iteration: 1,
                    failed_on: FailedOn::Node(GrammarNode::literal("wrong")),
                    nested: vec![],
                },
            }
        );
    }

    #[test]
    fn test_literal_must_match_at_start() {
        let result = parse("abc", &sequence(["bc"]));
        assert_eq!(result.remaining(), "abc");
        assert_eq!(result.error().map(|e| e.iteration), Some(0));
    }

    #[test]
    fn test_case_sensitive_literal() {
        let result = parse("abcDEF", &sequence(["abc", "def"]));
        assert_eq!(result.remaining(), "DEF");
        assert_eq!(result.error().map(|e| e.iteration), Some(1));
    }

    #[test]
    fn test_pattern_match_away_from_start_fails() {
        let result = parse("a\nb", &sequence([pattern(r"(?m)^b")]));
        assert!(!result.is_success());
        assert_eq!(result.remaining(), "a\nb");
    }

    #[test]
    fn test_semantic_rejection_reported_at_current_step() {
        let rule = Rule::new("reject", |s: &mut dyn Session| {
            s.literal("ab")?;
            Err(SemanticFailure::new("ab is not allowed here").into())
        });
        let result = parse("abc", &rule);
        assert_eq!(result.remaining(), "c");
        let error = result.error().unwrap();
        assert_eq!(error.iteration, 1);
        assert_eq!(
            error.failed_on,
            FailedOn::Rejected(SemanticFailure::new("ab is not allowed here"))
        );
        assert!(error.nested.is_empty());
    }

    #[test]
    fn test_swallowed_mismatch_still_fails() {
        let rule = Rule::new("swallow", |s: &mut dyn Session| {
            let _ = s.literal("x");
            s.literal("a")?;
            Ok(Value::Bool(true))
        });
        let result = parse("abc", &rule);
        assert_eq!(result.remaining(), "abc");
        assert_eq!(
            result.error().map(|e| &e.failed_on),
            Some(&FailedOn::Node(GrammarNode::literal("x")))
        );
    }

    #[test]
    fn test_unanchored_pattern_is_a_configuration_error() {
        assert!(matches!(
            Pattern::new(r"\d+"),
            Err(GrammarError::UnanchoredPattern { .. })
        ));
        assert!(matches!(
            Pattern::from_regex(regex::Regex::new("abc").unwrap()),
            Err(GrammarError::UnanchoredPattern { .. })
        ));
    }
}

#[cfg(test)]
mod sequence_tests {
    use super::*;

    #[test]
    fn test_literal_prefix_is_consumed() {
        let result = parse("abcdef", &sequence(["abc"]));
        assert_eq!(
            result,
            ParseResult::Success {
                remaining: "def",
                value: Value::Nil,
            }
        );
    }

    #[test]
    fn test_substrings_in_order() {
        assert_eq!(parse("abcdef", &sequence(["abc", "def"])).remaining(), "");
    }

    #[test]
    fn test_choice_inside_sequence() {
        let rule = sequence([
            GrammarNode::choice(["123", "abc"]),
            GrammarNode::literal("def"),
        ]);
        assert!(parse("abcdef", &rule).is_success());
    }

    #[test]
    fn test_repeated_literal_consumed_left_to_right() {
        let result = parse("abc123abc", &sequence(["abc", "123", "abc"]));
        assert!(result.is_success());
        assert_eq!(result.remaining(), "");
    }

    #[test]
    fn test_empty_literals_consume_nothing() {
        let result = parse("abcdef", &sequence(["", "abc", "", "def", ""]));
        assert!(result.is_success());
        assert_eq!(result.remaining(), "");
    }

    #[test]
    fn test_patterns_and_newlines() {
        assert!(parse("abcdef", &sequence([pattern("^abc"), pattern("^def$")])).is_success());
        let rule = sequence([GrammarNode::literal("\n"), pattern(r"^\n").into()]);
        assert_eq!(parse("\n\n", &rule).remaining(), "");
    }
}

#[cfg(test)]
mod match_value_tests {
    use super::*;

    fn found_rule(choices: [&'static str; 2]) -> Rule {
        Rule::new("found", move |s: &mut dyn Session| {
            let found = s.one_of(&[choices[0].into(), choices[1].into()])?;
            s.literal("def")?;
            Ok(Value::record([("found", found.into_value())]))
        })
    }

    #[test]
    fn test_choice_feeds_back_matching_literal() {
        for choices in [["abc", "123"], ["123", "abc"]] {
            let result = parse("abcdef", &found_rule(choices));
            assert_eq!(
                result.value().and_then(|v| v.get("found")),
                Some(&Value::from("abc"))
            );
        }
    }

    #[test]
    fn test_first_matching_alternative_wins() {
        let rule = Rule::new("greedy", |s: &mut dyn Session| {
            Ok(s.one_of(&["ab".into(), "abc".into()])?.into_value())
        });
        let result = parse("abcd", &rule);
        assert_eq!(result.value(), Some(&Value::from("ab")));
        assert_eq!(result.remaining(), "cd");
    }

    #[test]
    fn test_pattern_yields_full_match_and_groups() {
        let rule = Rule::new("groups", |s: &mut dyn Session| {
            let first = s.pattern(&pattern(r"^a(b)(c)"))?;
            let second = s.pattern(&pattern("^def"))?;
            Ok(Value::record([
                ("whole", first.value()),
                ("first", Value::from(first.group(1).unwrap_or_default())),
                ("second", Value::from(first.group(2).unwrap_or_default())),
                ("found2", second.value()),
            ]))
        });
        let value = parse("abcdef", &rule).into_result().unwrap();
        assert_eq!(
            value,
            Value::record([
                ("whole", Value::from("abc")),
                ("first", Value::from("b")),
                ("second", Value::from("c")),
                ("found2", Value::from("def")),
            ])
        );
    }

    #[test]
    fn test_named_groups() {
        let rule = Rule::new("named", |s: &mut dyn Session| {
            let found = s.pattern(&pattern(r"^(?P<key>\w+)=(?P<value>\w+)"))?;
            Ok(Value::from(format!(
                "{}:{}",
                found.name("key").unwrap_or_default(),
                found.name("value").unwrap_or_default()
            )))
        });
        assert_eq!(parse("a=1", &rule).value(), Some(&Value::from("a:1")));
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[test]
    fn test_delegating_to_rule() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            s.literal("a")?;
            let result = s.rule(&BCD)?;
            s.literal("ef")?;
            Ok(result)
        });
        let result = parse("abcdef", &rule);
        assert_eq!(result.remaining(), "");
        assert_eq!(
            result.value(),
            Some(&Value::record([("bcd", Value::Bool(true))]))
        );
    }

    #[test]
    fn test_choice_of_rules_tries_in_order() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            s.literal("a")?;
            let result = s.one_of(&[(&*BAD).into(), (&*BCD).into()])?.into_value();
            s.literal("ef")?;
            Ok(result)
        });
        let result = parse("abcdef", &rule);
        assert_eq!(
            result.value(),
            Some(&Value::record([("bcd", Value::Bool(true))]))
        );
    }

    #[test]
    fn test_failed_rules_nest_under_choice() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            s.literal("a")?;
            Ok(s.one_of(&[(&*BAD).into(), (&*BCD).into()])?.into_value())
        });
        let result = parse("abxyz", &rule);
        assert_eq!(result.remaining(), "bxyz");

        let error = result.error().unwrap();
        assert_eq!(error.iteration, 1);
        assert_eq!(error.nested.len(), 2);
        assert_eq!(
            error.nested[0].failed_on,
            FailedOn::Node(GrammarNode::literal("a"))
        );
        assert_eq!(error.nested[0].iteration, 1);
        assert_eq!(
            error.nested[1].failed_on,
            FailedOn::Node(GrammarNode::literal("c"))
        );
    }

    #[test]
    fn test_bare_rule_failure_is_nested_unchanged() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            s.literal("a")?;
            s.rule(&BCD)
        });
        let result = parse("abx", &rule);
        let inner = parse("bx", &BCD).into_result().unwrap_err();

        let error = result.error().unwrap();
        assert_eq!(error.failed_on, FailedOn::Node(GrammarNode::Rule(BCD.clone())));
        assert_eq!(error.nested, vec![inner]);
    }

    #[test]
    fn test_literal_candidates_leave_no_nested_errors() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            Ok(s.one_of(&["x".into(), "y".into()])?.into_value())
        });
        let error = parse("z", &rule).into_result().unwrap_err();
        assert!(error.nested.is_empty());
    }

    #[test]
    fn test_rejection_halt_helper() {
        let rule = Rule::new("halt", |_: &mut dyn Session| Err(Halt::reject("never")));
        let error = parse("", &rule).into_result().unwrap_err();
        assert_eq!(error.iteration, 0);
        assert!(matches!(error.failed_on, FailedOn::Rejected(ref f) if f.message() == "never"));
    }
}

#[cfg(test)]
mod report_tests {
    use super::*;

    #[test]
    fn test_trace_lists_nested_failures() {
        let rule = Rule::new("outer", |s: &mut dyn Session| {
            s.literal("a")?;
            Ok(s.one_of(&[(&*BAD).into(), (&*BCD).into()])?.into_value())
        });
        let error = parse("abxyz", &rule).into_result().unwrap_err();
        assert_eq!(
            error.trace(),
            "step 1: expected [<bad> | <bcd>]\n  step 1: expected \"a\"\n  step 1: expected \"c\""
        );
        assert_eq!(error.innermost().failed_on, FailedOn::Node(GrammarNode::literal("c")));
    }

    #[test]
    fn test_diagnostic_points_at_failure_offset() {
        let input = "abcdef";
        let failure = parse(input, &sequence(["abc", "wrong"]))
            .into_diagnostic("inline", input)
            .unwrap_err();
        assert_eq!(failure.offset(), 3);
        assert_eq!(failure.to_string(), "step 1: expected \"wrong\"");
        assert_eq!(failure.error().iteration, 1);
    }
}
