//! Property-based tests for the issue query compiler.

use errorly::query::{BASELINE_SORT, Field, PAGE_SIZE, Predicate, QueryPlan, compile, tokenize};
use errorly::util::id::Id;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..Default::default()
    })]

    /// Property: any input compiles, and the baseline sort always leads
    #[test]
    fn compile_is_total(query in "\\PC{0,200}", caller in any::<i64>()) {
        let plan = compile(&query, Id(caller));
        prop_assert_eq!(plan.sort.first(), Some(&BASELINE_SORT));
        prop_assert_eq!(plan.limit, PAGE_SIZE);
        prop_assert_eq!(plan.offset, 0);
        prop_assert!(plan.explicit_sort().iter().all(|key| key.field != Field::CreatedById));
    }

    /// Property: tokens never contain quotes or come back empty
    #[test]
    fn tokens_are_clean(query in "[a-z:'\" \\t]{0,80}") {
        for token in tokenize(&query) {
            prop_assert!(!token.is_empty());
            prop_assert!(!token.contains('"') && !token.contains('\''));
        }
    }

    /// Property: key and value casing never changes the plan
    #[test]
    fn compile_ignores_case(query in "(is:(open|active|starred)|sort:(error|occurrences)-(asc|desc)| ){0,12}") {
        let lower = compile(&query, Id(7));
        let upper = compile(&query.to_uppercase(), Id(7));
        prop_assert_eq!(lower, upper);
    }

    /// Property: `@me` filters only for an identified caller
    #[test]
    fn me_depends_on_caller(caller in 1_i64..i64::MAX) {
        prop_assert!(compile("assignee:@me", Id::NONE).predicates.is_empty());
        let plan = compile("assignee:@me", Id(caller));
        prop_assert_eq!(plan.predicates.len(), 1);
        let is_equals = matches!(plan.predicates[0], Predicate::Equals { field: Field::AssigneeId, .. });
        prop_assert!(is_equals);
    }

    /// Property: page offsets are 25 per page and never negative
    #[test]
    fn page_offsets(page in -1_000_000_i64..1_000_000) {
        let plan = QueryPlan::default().with_page(page);
        let expected = usize::try_from(page.max(0)).unwrap() * PAGE_SIZE;
        prop_assert_eq!(plan.offset, expected);
        prop_assert_eq!(plan.limit, PAGE_SIZE);
    }
}
