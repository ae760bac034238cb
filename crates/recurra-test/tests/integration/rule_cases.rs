use recurra_test::component::expand::{EvaluationOptions, generate};
use recurra_test::component::rule::RecurrenceRule;

include!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../recurra-rrule/tests/rule_cases_data/mod.rs"
));

/// ## Summary
/// Integration-level validation of the evaluator using the shared cases.
#[test_log::test]
fn rule_cases_integration() {
    for case in rule_cases() {
        assert_case(&case);
    }
}
