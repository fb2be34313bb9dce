// tests/evaluator_tests.rs

use djc::{EvalError, Evaluator, Location, MAX_LOOKUP_DEPTH, Token, Value, parse};
use serde_json::json;

fn eval(path: &str, doc: serde_json::Value) -> Result<Value, EvalError> {
    let token = parse(path).unwrap();
    Evaluator::new().evaluate(&token, &Value::from(doc))
}

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn people() -> serde_json::Value {
    json!({
        "name": {"first": "Ada", "last": "Lovelace"},
        "a": [{"x": 1}, {"x": 2}],
        "items": [
            {"name": "bolt", "tags": ["m4", "steel"]},
            {"name": "nut", "tags": ["m4"]}
        ]
    })
}

// ============================================================================
// Segments
// ============================================================================

#[test]
fn test_field_access() {
    assert_eq!(eval("name.first", people()).unwrap(), v(json!("Ada")));
}

#[test]
fn test_missing_is_null() {
    assert_eq!(eval("nobody.home", people()).unwrap(), Value::Null);
    assert_eq!(eval("name.first.x", people()).unwrap(), Value::Null);
}

#[test]
fn test_list_distributes() {
    assert_eq!(eval("a.x", people()).unwrap(), v(json!([1, 2])));
}

#[test]
fn test_index_then_field() {
    assert_eq!(eval("a[0].x", people()).unwrap(), v(json!(1)));
    assert_eq!(eval("a[-1].x", people()).unwrap(), v(json!(2)));
}

#[test]
fn test_index_past_end_is_null() {
    assert_eq!(eval("a[2]", people()).unwrap(), Value::Null);
    assert_eq!(eval("a[2].x", people()).unwrap(), Value::Null);
}

#[test]
fn test_range_selection() {
    assert_eq!(eval("a[0..1].x", people()).unwrap(), v(json!([1, 2])));
    assert_eq!(eval("a[0...1].x", people()).unwrap(), v(json!(1)));
    assert_eq!(eval("a[1+]", people()).unwrap(), v(json!({"x": 2})));
}

#[test]
fn test_distribution_flattens_one_level() {
    assert_eq!(
        eval("items.tags", people()).unwrap(),
        v(json!(["m4", "steel", "m4"]))
    );
}

#[test]
fn test_wildcard_maps_positionally() {
    assert_eq!(
        eval("items.*.tags", people()).unwrap(),
        v(json!([["m4", "steel"], ["m4"]]))
    );
}

#[test]
fn test_numeric_segment_indexes_list() {
    assert_eq!(eval("items.0.name", people()).unwrap(), v(json!("bolt")));
    assert_eq!(eval("items.-1.name", people()).unwrap(), v(json!("nut")));
}

#[test]
fn test_object_wildcard() {
    assert_eq!(eval("name.*", people()).unwrap(), v(json!(["Ada", "Lovelace"])));
}

#[test]
fn test_index_on_scalar() {
    assert_eq!(eval("name.first[0]", people()).unwrap(), v(json!("Ada")));
    assert_eq!(eval("name.first[1]", people()).unwrap(), Value::Null);
}

#[test]
fn test_keys_with_spaces() {
    let doc = json!({"date joined": "2020-01-01"});
    assert_eq!(eval("date joined", doc).unwrap(), v(json!("2020-01-01")));
}

// ============================================================================
// Regex keys
// ============================================================================

#[test]
fn test_regex_key_single_match() {
    assert_eq!(eval("/^f/", json!({"foo": 1, "bar": 2})).unwrap(), v(json!(1)));
}

#[test]
fn test_regex_key_multiple_matches_in_key_order() {
    assert_eq!(
        eval("/^(foo|bar)$/", json!({"foo": 1, "bar": 2, "baz": 3})).unwrap(),
        v(json!([1, 2]))
    );
}

#[test]
fn test_regex_key_no_match() {
    assert_eq!(eval("/^z/", json!({"foo": 1})).unwrap(), Value::Null);
}

#[test]
fn test_regex_key_then_field() {
    let doc = json!({"addr_home": {"city": "Oslo"}, "addr_work": {"city": "Bergen"}});
    assert_eq!(eval("/^addr/.city", doc).unwrap(), v(json!(["Oslo", "Bergen"])));
}

// ============================================================================
// Literals and combinators
// ============================================================================

#[test]
fn test_literal_ignores_document() {
    assert_eq!(eval("#fixed", json!(null)).unwrap(), v(json!("fixed")));
    assert_eq!(eval("#fixed", people()).unwrap(), v(json!("fixed")));
}

#[test]
fn test_any_first_non_null() {
    assert_eq!(eval("nickname|name.first", people()).unwrap(), v(json!("Ada")));
    assert_eq!(eval("nickname|#N/A", people()).unwrap(), v(json!("N/A")));
    assert_eq!(eval("nickname|alias", people()).unwrap(), Value::Null);
}

#[test]
fn test_any_short_circuits() {
    let token = Token::Any(vec![
        Token::segment("name"),
        Token::Inverse(Box::new(Token::segment("name"))),
    ]);
    let doc = v(people());
    assert!(Evaluator::new().evaluate(&token, &doc).is_ok());

    let token = Token::Any(vec![
        Token::segment("nickname"),
        Token::Inverse(Box::new(Token::segment("name"))),
    ]);
    assert!(matches!(
        Evaluator::new().evaluate(&token, &doc),
        Err(EvalError::Unsupported(_))
    ));
}

#[test]
fn test_all_requires_every_branch() {
    assert_eq!(
        eval("name.first&name.last", people()).unwrap(),
        v(json!(["Ada", "Lovelace"]))
    );
    assert_eq!(eval("name.first&name.middle", people()).unwrap(), Value::Null);
}

#[test]
fn test_each_keeps_nulls() {
    assert_eq!(
        eval("name.first,name.middle,#x", people()).unwrap(),
        v(json!(["Ada", null, "x"]))
    );
}

#[test]
fn test_determinism() {
    let token = parse("items.tags,a.x|#none").unwrap();
    let doc = v(people());
    let evaluator = Evaluator::new();
    assert_eq!(
        evaluator.evaluate(&token, &doc).unwrap(),
        evaluator.evaluate(&token, &doc).unwrap()
    );
}

// ============================================================================
// Lookups
// ============================================================================

#[test]
fn test_lookup_resolves_from_root() {
    let doc = json!({
        "ref": "target.name",
        "target": {"name": "T"},
        "inner": {"ref": "target.name"}
    });
    assert_eq!(eval("<ref>", doc.clone()).unwrap(), v(json!("T")));
    assert_eq!(eval("inner.<ref>", doc).unwrap(), v(json!("T")));
}

#[test]
fn test_lookup_list_of_keys() {
    let doc = json!({"refs": ["a", "b"], "a": 1, "b": [2, 3]});
    assert_eq!(eval("<refs>", doc).unwrap(), v(json!([1, 2, 3])));
}

#[test]
fn test_lookup_missing_key_is_null() {
    assert_eq!(eval("<nothing>", json!({})).unwrap(), Value::Null);
    assert_eq!(eval("<ref>", json!({"ref": "a]"})).unwrap(), Value::Null);
}

#[test]
fn test_lookup_cycle_detected() {
    let err = eval("<a>", json!({"a": "<a>"})).unwrap_err();
    assert_eq!(
        err,
        EvalError::Cycle {
            key: "<a>".to_string(),
            limit: MAX_LOOKUP_DEPTH,
        }
    );
}

#[test]
fn test_lookup_depth_configurable() {
    let doc = v(json!({"a": "<b>", "b": "<c>", "c": "d", "d": 4}));
    let token = parse("<a>").unwrap();
    assert_eq!(Evaluator::new().evaluate(&token, &doc).unwrap(), v(json!(4)));
    assert!(matches!(
        Evaluator::with_max_lookup_depth(2).evaluate(&token, &doc),
        Err(EvalError::Cycle { limit: 2, .. })
    ));
}

// ============================================================================
// Locating
// ============================================================================

#[test]
fn test_locate_distributes() {
    let token = parse("a.x").unwrap();
    let found = Evaluator::new().locate(&token, &v(people())).unwrap();
    let rendered: Vec<String> = found.iter().map(Location::to_string).collect();
    assert_eq!(rendered, vec!["$.a[0].x", "$.a[1].x"]);
}

#[test]
fn test_locate_index_and_literal() {
    let doc = v(people());
    let evaluator = Evaluator::new();
    let found = evaluator.locate(&parse("items[1]").unwrap(), &doc).unwrap();
    assert_eq!(found, vec![Location::root().field("items").index(1)]);
    assert!(evaluator.locate(&parse("#x").unwrap(), &doc).unwrap().is_empty());
}
