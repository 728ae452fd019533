use std::cmp::Ordering;
use std::collections::HashSet;

use keyorder::{
    ColumnRegistry, Comparator, ComparatorError, EqualityComparator, NullFilterRegistry,
    UntypedComparator,
};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq)]
struct Person {
    first_name: String,
    last_name: Option<String>,
    age: u32,
}

fn person(first_name: &str, last_name: Option<&str>, age: u32) -> Person {
    Person {
        first_name: first_name.to_string(),
        last_name: last_name.map(str::to_string),
        age,
    }
}

fn setup() {
    let _ = env_logger::builder()
        // Include all events in tests
        .filter_level(log::LevelFilter::max())
        // Ensure events are captured by `cargo test`
        .is_test(true)
        // Ignore errors initializing the logger if tests race to configure it
        .try_init();
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn sorts_strings_by_length() {
    setup();

    let mut names = strings(&["Bob", "George", "Mary", "Jessica", "David"]);
    names.sort_by(Comparator::by_key(|name: &String| name.len()).as_fn());

    assert_eq!(names, strings(&["Bob", "Mary", "David", "George", "Jessica"]));
}

#[test]
fn nullable_integers_put_absent_values_first() {
    setup();

    let mut values = vec![Some(5), None, Some(2), None, Some(3), Some(1), None, Some(4)];
    values.sort_by(Comparator::<i32>::natural().to_nullable().as_fn());

    assert_eq!(
        values,
        vec![None, None, None, Some(1), Some(2), Some(3), Some(4), Some(5)]
    );

    values.sort_by(Comparator::<i32>::natural().to_nullable().nulls_last().as_fn());
    assert_eq!(
        values,
        vec![Some(1), Some(2), Some(3), Some(4), Some(5), None, None, None]
    );
}

#[test]
fn identity_prefix_is_absorbed() {
    setup();

    let comparator = Comparator::<String>::identity()
        .then_by_key(|name: &String| name.len())
        .then_by(Comparator::<String>::natural());
    let mut names = strings(&["Michael", "Bob", "George", "Ken", "Mary", "Jessica", "David"]);
    names.sort_by(comparator.as_fn());

    assert_eq!(
        names,
        strings(&["Bob", "Ken", "Mary", "David", "George", "Jessica", "Michael"])
    );
    assert!(!comparator.is_identity());
}

#[test]
fn records_without_a_key_are_placed_last() {
    setup();

    let registry = NullFilterRegistry::new();
    let comparator = Comparator::by_key(|p: &Person| p.last_name.as_ref().map(|name| name.len()))
        .nulls_last_by_in(|p: &Person| p.last_name.clone(), &registry);
    let mut people = vec![
        person("Ada", Some("Lovelace"), 36),
        person("Grace", None, 85),
        person("Alan", Some("Turing"), 41),
    ];
    people.sort_by(comparator.as_fn());

    let first_names: Vec<&str> = people.iter().map(|p| p.first_name.as_str()).collect();
    assert_eq!(first_names, vec!["Alan", "Ada", "Grace"]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn whole_value_placement_wraps_key_placement() {
    setup();

    let comparator = Comparator::by_key(|p: &Option<Person>| p.as_ref().map(|p| p.age))
        .nulls_first_by(|p: &Option<Person>| p.as_ref().and_then(|p| p.last_name.clone()))
        .nulls_last()
        .then_by_key(|p: &Option<Person>| p.as_ref().map(|p| p.first_name.clone()));

    let mut people = vec![
        Some(person("Alan", Some("Turing"), 41)),
        None,
        Some(person("Grace", None, 85)),
        Some(person("Ada", Some("Lovelace"), 36)),
    ];
    people.sort_by(comparator.as_fn());

    let first_names: Vec<Option<&str>> = people
        .iter()
        .map(|p| p.as_ref().map(|p| p.first_name.as_str()))
        .collect();
    assert_eq!(
        first_names,
        vec![Some("Grace"), Some("Ada"), Some("Alan"), None]
    );
}

#[test]
fn compound_equality_uses_every_key() {
    setup();

    let by_name = EqualityComparator::using(|p: &Person| p.last_name.clone())
        .and(&EqualityComparator::using(|p: &Person| p.first_name.clone()));

    let ada = person("Ada", Some("Lovelace"), 36);
    let older_ada = person("Ada", Some("Lovelace"), 90);
    let byron = person("Ada", Some("Byron"), 36);

    assert!(by_name.equals(&ada, &older_ada));
    assert_eq!(by_name.hash(&ada), by_name.hash(&older_ada));
    assert!(!by_name.equals(&ada, &byron));
    assert_eq!(by_name.len(), 2);

    let unique: HashSet<_> = vec![ada, older_ada, byron]
        .into_iter()
        .map(|p| by_name.keyed(p))
        .collect();
    assert_eq!(unique.len(), 2);
}

#[test]
fn untyped_comparators_check_their_operands() {
    setup();

    let untyped = Comparator::by_key(|p: &Person| p.age).untyped();
    let ada = person("Ada", Some("Lovelace"), 36);
    let alan = person("Alan", Some("Turing"), 41);

    assert_eq!(untyped.compare(&ada, &alan), Ok(Ordering::Less));
    assert!(matches!(
        untyped.compare(&ada, &41_u32),
        Err(ComparatorError::TypeMismatch { .. })
    ));

    let by_length = UntypedComparator::from_fn(|a, b| {
        match (a.downcast_ref::<String>(), b.downcast_ref::<String>()) {
            (Some(a), Some(b)) => Ok(a.len().cmp(&b.len())),
            _ => Err(ComparatorError::TypeMismatch { expected: "String" }),
        }
    });
    let mut names = strings(&["George", "Bob", "Mary"]);
    names.sort_by(by_length.typed::<String>().as_fn());
    assert_eq!(names, strings(&["Bob", "Mary", "George"]));
}

#[test]
fn order_by_strings_build_comparators() {
    setup();

    let columns = ColumnRegistry::new()
        .column("first_name", |p: &Person| p.first_name.clone())
        .and_then(|columns| columns.column("last_name", |p: &Person| p.last_name.clone()))
        .and_then(|columns| columns.column("age", |p: &Person| p.age))
        .unwrap();

    let mut people = vec![
        person("Grace", None, 85),
        person("Ada", Some("Lovelace"), 36),
        person("Alan", Some("Turing"), 41),
        person("Augusta", Some("Lovelace"), 36),
    ];
    people.sort_by(
        columns
            .parse("last_name desc nulls last, first_name")
            .unwrap()
            .as_fn(),
    );

    let first_names: Vec<&str> = people.iter().map(|p| p.first_name.as_str()).collect();
    assert_eq!(first_names, vec!["Alan", "Ada", "Augusta", "Grace"]);

    assert!(matches!(
        columns.parse("age sideways"),
        Err(ComparatorError::InvalidArgument(_))
    ));
}
