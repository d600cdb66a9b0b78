//! Property-based tests for seeker using proptest.

use proptest::prelude::*;
use weaviate_seeker::{
    to_generic_tree, CollectionSchema, Connective, FilterNode, MockTransport, QueryConfig,
    QuerySpec, SeekerError, Value, Where,
};

// ============================================================================
// Test helpers
// ============================================================================

const SYMBOLS: [&str; 9] = [
    "=", "==", "!=", ">", "<", ">=", "<=", "LIKE", "CONTAINS_ALL",
];

#[derive(Debug, Clone)]
struct Leaf {
    attribute: String,
    symbol: &'static str,
    value: Value,
}

fn attribute_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("not a timestamp attribute", |name| {
        name != "created_at" && name != "updated_at"
    })
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        // Quarters print exactly, so the parsed number compares equal.
        (-4_000_000i32..4_000_000).prop_map(|n| Value::from(f64::from(n) / 4.0)),
        // Whole floats past 1e16, where plain printing loses the float marker.
        (-1000i32..1000).prop_map(|n| Value::from(f64::from(n) * 1e16)),
        any::<bool>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::from),
        prop::collection::vec("[a-z ]{0,6}", 0..4).prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = Leaf> {
    (
        attribute_strategy(),
        prop::sample::select(SYMBOLS.to_vec()),
        value_strategy(),
    )
        .prop_map(|(attribute, symbol, value)| Leaf {
            attribute,
            symbol,
            value,
        })
}

fn connective_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["AND", "OR", "and", "Or"])
}

/// Builds `leaf conn leaf conn leaf ...` with every leaf bound.
fn textual_condition(leaves: &[Leaf], connectives: &[&str]) -> Where {
    let mut text = String::new();
    for (i, leaf) in leaves.iter().enumerate() {
        if i > 0 {
            text.push_str(&format!(" {} ", connectives[(i - 1) % connectives.len()]));
        }
        text.push_str(&format!("{} {} ?", leaf.attribute, leaf.symbol));
    }
    leaves
        .iter()
        .fold(Where::text(text), |cond, leaf| cond.bind(leaf.value.clone()))
}

/// Wire form of every leaf under a chain of ANDs, left to right.
fn and_leaves(node: &FilterNode, out: &mut Vec<String>) {
    match node {
        FilterNode::Logical {
            connective: Connective::And,
            left,
            right,
        } => {
            and_leaves(left, out);
            and_leaves(right, out);
        }
        other => out.push(other.to_wire()),
    }
}

fn spec(transport: &MockTransport) -> QuerySpec<&MockTransport> {
    QuerySpec::new(
        CollectionSchema::new("Article", ["title"]),
        QueryConfig::default(),
        transport,
    )
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Every placeholder becomes exactly one leaf.
    #[test]
    fn leaf_count_matches_placeholders(
        leaves in prop::collection::vec(leaf_strategy(), 1..8),
        connectives in prop::collection::vec(connective_strategy(), 1..4),
    ) {
        let node = textual_condition(&leaves, &connectives).compile().unwrap();
        prop_assert_eq!(node.leaf_count(), leaves.len());
    }

    /// Too few or too many bound values are always rejected.
    #[test]
    fn wrong_value_count_is_rejected(
        leaves in prop::collection::vec(leaf_strategy(), 1..6),
        extra in 1usize..3,
        drop_values in any::<bool>(),
    ) {
        let mut text = Vec::new();
        for leaf in &leaves {
            text.push(format!("{} {} ?", leaf.attribute, leaf.symbol));
        }
        let bound = if drop_values {
            leaves.len().saturating_sub(extra)
        } else {
            leaves.len() + extra
        };
        let mut cond = Where::text(text.join(" AND "));
        for i in 0..bound {
            cond = cond.bind(i as i64);
        }
        if bound == 0 {
            cond = cond.eq("title", "x");
        }
        prop_assert!(matches!(cond.compile(), Err(SeekerError::InvalidWhereQuery(_))));
    }

    /// The reverse parser recovers path, operator and value of every leaf.
    #[test]
    fn generic_tree_round_trips(
        leaves in prop::collection::vec(leaf_strategy(), 1..6),
        connectives in prop::collection::vec(connective_strategy(), 1..3),
    ) {
        let node = textual_condition(&leaves, &connectives).compile().unwrap();
        let parsed = to_generic_tree(&node.to_wire()).unwrap();
        prop_assert_eq!(parsed, node.to_generic());
    }

    /// One condition per call builds the same tree as one call with all of
    /// them. Any other split keeps the same AND-ed leaves in order.
    #[test]
    fn accumulation_is_associative(
        pairs in prop::collection::vec((attribute_strategy(), any::<i32>()), 2..6),
        split in 1usize..5,
    ) {
        let split = split.min(pairs.len() - 1);
        let transport = MockTransport::new();

        let mut single = spec(&transport);
        let all = pairs
            .iter()
            .fold(Where::new(), |cond, (attr, v)| cond.eq(attr.as_str(), *v));
        single.filter(all).unwrap();

        let mut repeated = spec(&transport);
        for (attr, v) in &pairs {
            repeated.filter(Where::new().eq(attr.as_str(), *v)).unwrap();
        }

        let mut halves = spec(&transport);
        let (head, tail) = pairs.split_at(split);
        for chunk in [head, tail] {
            let cond = chunk
                .iter()
                .fold(Where::new(), |cond, (attr, v)| cond.eq(attr.as_str(), *v));
            halves.filter(cond).unwrap();
        }

        prop_assert_eq!(repeated.filter_root(), single.filter_root());

        let (mut expected, mut actual) = (Vec::new(), Vec::new());
        and_leaves(single.filter_root().unwrap(), &mut expected);
        and_leaves(halves.filter_root().unwrap(), &mut actual);
        prop_assert_eq!(expected.len(), pairs.len());
        prop_assert_eq!(actual, expected);
    }

    /// Limit and offset accept exactly the canonical non-negative integers.
    #[test]
    fn paging_accepts_only_canonical_integers(raw in "[-+ 0-9a-z.]{0,6}") {
        let transport = MockTransport::new();
        let mut query = spec(&transport);
        let canonical = raw.parse::<u64>().map(|n| n.to_string() == raw).unwrap_or(false);
        prop_assert_eq!(query.limit(raw.as_str()).is_ok(), canonical);
        prop_assert_eq!(query.offset(raw.as_str()).is_ok(), canonical);
        if canonical {
            prop_assert_eq!(query.compile().unwrap().limit, raw);
        }
    }

    /// Any builder call drops loaded records.
    #[test]
    fn builder_calls_unload(limit in 0u32..1000, phrase in "[a-z]{1,8}") {
        let transport = MockTransport::new();
        let mut query = spec(&transport);

        query.records().unwrap();
        prop_assert!(query.is_loaded());
        query.limit(limit).unwrap();
        prop_assert!(!query.is_loaded());

        query.records().unwrap();
        query.near_text(&[phrase.as_str()], None).unwrap();
        prop_assert!(!query.is_loaded());
        prop_assert_eq!(transport.get_calls(), 2);
    }
}
