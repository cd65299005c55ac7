//! Binding text into typed values through schemas.

use std::collections::{BTreeMap, HashMap};

use delimit_bind::{bind_str, bind_str_with, enum_schema, record_schema, subtype_schema, Binder};
use delimit_core::{resolve_operators, tokenize, Grammar, ParseConfig, Value};
use serde_json::json;

#[derive(Debug, Default, Clone, PartialEq)]
struct Settings {
    name: String,
    number: i64,
    ratio: f64,
    enabled: bool,
}

record_schema!(Settings {
    name: String,
    number: i64,
    ratio: f64,
    enabled: bool,
});

#[derive(Debug, Default, Clone, PartialEq)]
struct Foo {
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Bar {
    count: i32,
}

record_schema!(Foo { name: String });
record_schema!(Bar { count: i32 });

#[derive(Debug, Clone, PartialEq)]
enum Animal {
    Foo(Foo),
    Bar(Bar),
}

impl Default for Animal {
    fn default() -> Self {
        Animal::Bar(Bar::default())
    }
}

subtype_schema!(Animal { Foo(Foo), Bar(Bar) });

#[derive(Debug, Default, Clone, PartialEq)]
struct Zoo {
    keeper: String,
    star: Animal,
    cages: Vec<u8>,
}

record_schema!(Zoo {
    keeper: String,
    star: Animal,
    cages: Vec<u8>,
});

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Mode {
    #[default]
    Fast,
    Careful,
}

enum_schema!(Mode { Fast, Careful });

#[derive(Debug, Default, Clone, PartialEq)]
struct Job {
    mode: Mode,
    retries: u8,
}

record_schema!(Job { mode: Mode, retries: u8 });

fn g() -> &'static Grammar {
    Grammar::standard()
}

#[test]
fn binds_record_members() {
    let bound = bind_str::<Settings>(
        g(),
        "name = \"x\" number = 5 ratio = 0.5 enabled = true",
    );
    assert!(bound.success(), "{:?}", bound.errors);
    assert_eq!(
        bound.value,
        Some(Settings {
            name: "x".into(),
            number: 5,
            ratio: 0.5,
            enabled: true,
        })
    );
}

#[test]
fn bracketed_record_with_comments_and_separators() {
    let text = "// header\n{ name: \"y\"; /* mid */ number = -3, }";
    let settings = bind_str::<Settings>(g(), text).into_result().expect("bound");
    assert_eq!(settings.name, "y");
    assert_eq!(settings.number, -3);
}

#[test]
fn wildcard_member_names() {
    let settings = bind_str::<Settings>(g(), "¤ame = \"w\" num¤ = 7")
        .into_result()
        .expect("bound");
    assert_eq!(settings.name, "w");
    assert_eq!(settings.number, 7);
}

#[test]
fn unknown_member_lists_candidates() {
    let bound = bind_str::<Settings>(g(), "number = 1\ncolour = 3");
    assert_eq!(bound.value, None);
    assert_eq!(bound.errors.len(), 1);
    assert_eq!(
        bound.errors[0].to_json_value(),
        json!({
            "row": 2,
            "col": 1,
            "message": "could not find member \"colour\" in Settings",
            "candidates": ["enabled", "name", "number", "ratio"],
        })
    );
}

#[test]
fn expressions_as_member_values() {
    let settings = bind_str::<Settings>(g(), "number = 2 * (3 + 4) enabled = 1 < 2")
        .into_result()
        .expect("bound");
    assert_eq!(settings.number, 14);
    assert!(settings.enabled);
}

#[test]
fn scope_values_reach_expressions() {
    let mut scope = BTreeMap::new();
    scope.insert("base".to_owned(), Value::Int(41));
    let bound =
        bind_str_with::<Settings>(g(), "number = base + 1", Some(&scope), ParseConfig::default());
    assert!(bound.success(), "{:?}", bound.errors);
    assert_eq!(bound.value.map(|s| s.number), Some(42));
}

#[test]
fn conversion_failure() {
    let bound = bind_str::<Settings>(g(), "number = 1.5");
    assert_eq!(bound.value, None);
    assert_eq!(
        bound.errors[0].to_string(),
        "@1,10: unable to convert (1.5) to type 'i64'"
    );
}

#[test]
fn structure_where_a_value_belongs() {
    let bound = bind_str::<Settings>(g(), "name = { x }");
    assert_eq!(bound.errors[0].to_string(), "@1,8: unexpected beginning of {}");
}

#[test]
fn tagged_subtype() {
    let animal = bind_str::<Animal>(g(), "= Foo { name = \"rex\" }")
        .into_result()
        .expect("bound");
    assert_eq!(animal, Animal::Foo(Foo { name: "rex".into() }));

    let animal = bind_str::<Animal>(g(), "{ : Bar count = 4 }")
        .into_result()
        .expect("bound");
    assert_eq!(animal, Animal::Bar(Bar { count: 4 }));
}

#[test]
fn unknown_subtype() {
    let bound = bind_str::<Animal>(g(), "= Qux { }");
    assert_eq!(bound.value, None);
    assert_eq!(bound.errors[0].to_string(), "@1,3: unknown type Qux");
    assert_eq!(bound.errors[0].candidates, vec!["Foo", "Bar"]);
}

#[test]
fn abstract_type_needs_a_tag() {
    let bound = bind_str::<Animal>(g(), "{ name = \"rex\" }");
    assert_eq!(bound.value, None);
    assert_eq!(
        bound.errors[0].message,
        "Animal needs a more specific type, eg: Foo, Bar"
    );
}

#[test]
fn nested_records_and_lists() {
    let text = "keeper = \"sam\"\nstar = Foo { name = \"rex\" }\ncages = [1, 2, 3]";
    let zoo = bind_str::<Zoo>(g(), text).into_result().expect("bound");
    assert_eq!(
        zoo,
        Zoo {
            keeper: "sam".into(),
            star: Animal::Foo(Foo { name: "rex".into() }),
            cages: vec![1, 2, 3],
        }
    );
}

#[test]
fn lists_and_arrays() {
    assert_eq!(bind_str::<Vec<i32>>(g(), "[1, 2, 3]").value, Some(vec![1, 2, 3]));
    assert_eq!(bind_str::<Vec<i32>>(g(), "4 5").value, Some(vec![4, 5]));
    assert_eq!(
        bind_str::<Vec<Vec<u8>>>(g(), "[1 2] [3]").value,
        Some(vec![vec![1, 2], vec![3]])
    );
    assert_eq!(bind_str::<[u8; 2]>(g(), "[4 5]").value, Some([4, 5]));

    let bound = bind_str::<[u8; 2]>(g(), "[4 5 6]");
    assert_eq!(bound.value, None);
    assert_eq!(bound.errors[0].message, "expected 2 elements, found 3");
}

#[test]
fn maps() {
    let map = bind_str::<BTreeMap<String, f64>>(g(), "a = 1.5, b = 2.25")
        .into_result()
        .expect("bound");
    assert_eq!(map.get("a"), Some(&1.5));
    assert_eq!(map.get("b"), Some(&2.25));

    let map = bind_str::<HashMap<u32, String>>(g(), "{ 1: \"one\" 2: \"two\" }")
        .into_result()
        .expect("bound");
    assert_eq!(map[&2], "two");
}

#[test]
fn enums_by_name() {
    let job = bind_str::<Job>(g(), "mode = Careful retries = 2")
        .into_result()
        .expect("bound");
    assert_eq!(job, Job { mode: Mode::Careful, retries: 2 });

    let bound = bind_str::<Job>(g(), "mode = Lazy");
    assert_eq!(bound.errors[0].to_string(), "@1,8: \"Lazy\" is not a variant of Mode");
    assert_eq!(bound.errors[0].candidates, vec!["Fast", "Careful"]);
}

#[test]
fn fill_keeps_unmentioned_members() {
    let mut t = tokenize(g(), "number = 9");
    assert!(resolve_operators(g(), &mut t.forest).is_empty());
    let mut settings = Settings {
        name: "keep".into(),
        number: 1,
        ..Settings::default()
    };
    let bound = Binder::new(&t.forest, g()).fill(&mut settings);
    assert!(bound.success(), "{:?}", bound.errors);
    assert_eq!(settings.name, "keep");
    assert_eq!(settings.number, 9);
}

#[test]
fn binder_depth_limit() {
    let config = ParseConfig::default().with_max_depth(2);
    let bound = bind_str_with::<Vec<Vec<Vec<u8>>>>(g(), "[[[1]]]", None, config);
    assert_eq!(bound.value, None);
    assert!(bound.errors.iter().any(|e| e.message == "nesting too deep"));
}

#[test]
fn trailing_input_is_an_error() {
    let bound = bind_str::<i32>(g(), "5 6");
    assert_eq!(bound.errors[0].to_string(), "@1,3: unexpected \"6\" after value");
}

#[test]
fn stray_closer_is_a_lexical_error() {
    let bound = bind_str::<String>(g(), "}");
    assert_eq!(
        bound.errors[0].to_string(),
        "@1,1: unexpected context-ending token"
    );
}

#[test]
fn map_keys_resolve_through_scope() {
    let mut scope = BTreeMap::new();
    scope.insert("first".to_owned(), Value::from("alpha"));
    let bound = bind_str_with::<BTreeMap<String, i32>>(
        g(),
        "first = 1, \"second\" = 2",
        Some(&scope),
        ParseConfig::default(),
    );
    assert!(bound.success(), "{:?}", bound.errors);
    let map = bound.value.expect("bound");
    assert_eq!(map.get("alpha"), Some(&1));
    assert_eq!(map.get("second"), Some(&2));
}
