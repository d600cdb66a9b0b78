//! Snapshot tests for compiled query fragments.

use insta::assert_snapshot;
use serde_json::json;
use weaviate_seeker::{CollectionSchema, MockTransport, QueryConfig, QuerySpec, Where};

fn article(transport: &MockTransport) -> QuerySpec<&MockTransport> {
    QuerySpec::new(
        CollectionSchema::new("Article", ["title", "content"]),
        QueryConfig::default(),
        transport,
    )
}

#[test]
fn nested_filter_wire() {
    let node = Where::text("title LIKE ? OR views >= ? AND archived = ?")
        .bind("*dune*")
        .bind(1000)
        .bind(Option::<bool>::None)
        .compile()
        .unwrap();
    assert_snapshot!(
        node.to_wire(),
        @r#"{ operator: Or, operands: [{ path: ["title"], operator: Like, valueText: "*dune*" }, { operator: And, operands: [{ path: ["views"], operator: GreaterThanEqual, valueInt: 1000 }, { path: ["archived"], operator: IsNull, valueBoolean: true }] }] }"#
    );
}

#[test]
fn sort_wire() {
    let transport = MockTransport::new();
    let mut query = article(&transport);
    query
        .order(&["title"], &[("updated_at", "desc")])
        .unwrap()
        .order_asc("id")
        .unwrap();
    assert_snapshot!(
        query.compile().unwrap().sort.unwrap(),
        @r#"[ { path: ["title"], order: asc }, { path: ["_lastUpdateTimeUnix"], order: desc }, { path: ["_id"], order: asc } ]"#
    );
}

#[test]
fn nested_projection() {
    let transport = MockTransport::new();
    let mut query = article(&transport);
    query
        .select(
            &["title"],
            Some(json!({
                "_additional": ["id", "updated_at", {"answer": ["result", "startPosition"]}]
            })),
        )
        .unwrap();
    assert_snapshot!(
        query.compile().unwrap().fields,
        @"title _additional { id lastUpdateTimeUnix answer { result startPosition } }"
    );
}

#[test]
fn compiled_request() {
    let transport = MockTransport::new();
    let mut query = article(&transport);
    query
        .filter(Where::new().eq("tags", vec!["scifi", "classic"]))
        .unwrap()
        .bm25("spice \"melange\"", &["content"])
        .unwrap()
        .order_desc("title")
        .unwrap()
        .limit(10)
        .unwrap()
        .offset(30)
        .unwrap();
    let compiled = serde_json::to_string(&query.compile().unwrap()).unwrap();
    assert_snapshot!(
        compiled,
        @r#"{"className":"Article","limit":"10","offset":"30","fields":"title content _additional { id creationTimeUnix lastUpdateTimeUnix }","bm25":"{ query: \"spice 'melange'\", properties: [\"content\"] }","where":"{ path: [\"tags\"], operator: ContainsAny, valueText: [\"scifi\", \"classic\"] }"}"#
    );
}
