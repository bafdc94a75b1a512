//! Pattern semantics exercised through the full stream: root anchors,
//! recursive descent, captures, duck typing, and the ancestor argument.
use std::{cell::RefCell, rc::Rc};

use crate::{JsonStream, PathComponent, Value, path};

type Fired = Rc<RefCell<Vec<(Option<Value>, Vec<PathComponent>)>>>;

fn stream_with_node_listener(pattern: &str) -> (JsonStream, Fired) {
    let fired: Fired = Rc::default();
    let sink = Rc::clone(&fired);
    let mut stream = JsonStream::default();
    stream
        .on_node(pattern, move |node, path, _ancestors| {
            sink.borrow_mut().push((node.cloned(), path.to_vec()));
        })
        .unwrap();
    (stream, fired)
}

#[test]
fn root_pattern_fires_on_open_and_on_completion() {
    let opened = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&opened);

    let (mut stream, fired) = stream_with_node_listener("!");
    stream
        .on_path("!", move |node, path, _ancestors| {
            assert!(path.is_empty());
            // At path time the root is a freshly opened, empty object.
            assert_eq!(node, Some(&Value::Object(crate::Map::new())));
            *sink.borrow_mut() += 1;
        })
        .unwrap();

    stream.write(r#"{"a": {"b": 1}}"#).unwrap();
    stream.end().unwrap();

    assert_eq!(*opened.borrow(), 1);
    let fired = fired.borrow();
    assert_eq!(fired.len(), 1);
    assert_eq!(
        fired[0].0.as_ref().map(ToString::to_string).as_deref(),
        Some(r#"{"a":{"b":1}}"#)
    );
}

#[test]
fn recursive_descent_reaches_any_depth() {
    let (mut stream, fired) = stream_with_node_listener("..name");
    stream
        .write(r#"{"name": "top", "nested": {"deep": [{"name": "bottom"}]}}"#)
        .unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    let paths: Vec<_> = fired.iter().map(|(_, p)| p.clone()).collect();
    assert_eq!(
        paths,
        vec![path!["name"], path!["nested", "deep", 0, "name"]]
    );
}

#[test]
fn anchored_descent_misses_other_branches() {
    let (mut stream, fired) = stream_with_node_listener("wanted..id");
    stream
        .write(r#"{"wanted": {"inner": {"id": 1}}, "other": {"id": 2}}"#)
        .unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].1, path!["wanted", "inner", "id"]);
}

#[test]
fn capture_returns_the_ancestor_once_it_holds_the_match() {
    let (mut stream, fired) = stream_with_node_listener("$people[*].name");
    stream
        .write(r#"{"people": [{"name": "Ann"}, {"name": "Bo"}]}"#)
        .unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    // The capture selects the people array as it stood at each match: the
    // in-progress person joins it only when that person closes.
    assert_eq!(fired.len(), 2);
    assert_eq!(
        fired[0].0.as_ref().map(ToString::to_string).as_deref(),
        Some("[]")
    );
    assert_eq!(
        fired[1].0.as_ref().map(ToString::to_string).as_deref(),
        Some(r#"[{"name":"Ann"}]"#)
    );
}

#[test]
fn duck_typed_listener_fires_when_an_object_completes() {
    let (mut stream, fired) = stream_with_node_listener("{name age}");
    stream
        .write(
            r#"[{"name": "Ann", "age": 9}, {"name": "Bo"}, {"name": "Cy", "age": 2, "extra": 0}]"#,
        )
        .unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    let paths: Vec<_> = fired.iter().map(|(_, p)| p.clone()).collect();
    assert_eq!(paths, vec![path![0], path![2]]);
}

#[test]
fn numeric_names_match_indices() {
    let (mut stream, fired) = stream_with_node_listener("b.1");
    stream.write(r#"{"b": [10, 20, 30]}"#).unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    assert_eq!(
        *fired,
        vec![(Some(Value::Number(20.0)), path!["b", 1])]
    );
}

#[test]
fn ancestors_are_passed_root_first() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut stream = JsonStream::default();
    stream
        .on_node("a.b", move |_node, _path, ancestors| {
            sink.borrow_mut()
                .push(ancestors.iter().map(ToString::to_string).collect::<Vec<_>>());
        })
        .unwrap();

    stream.write(r#"{"x": 0, "a": {"b": 1}}"#).unwrap();
    stream.end().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    // Root first, then the object holding `b` as it stood at match time.
    assert_eq!(seen[0], vec![r#"{"x":0}"#.to_string(), r#"{"b":1}"#.to_string()]);
}

#[test]
fn path_listener_for_a_container_sees_it_empty() {
    let fired: Fired = Rc::default();
    let sink = Rc::clone(&fired);

    let mut stream = JsonStream::default();
    stream
        .on_path("items", move |node, path, _ancestors| {
            sink.borrow_mut().push((node.cloned(), path.to_vec()));
        })
        .unwrap();

    stream.write(r#"{"items": [1, 2, 3]}"#).unwrap();
    stream.end().unwrap();

    let fired = fired.borrow();
    assert_eq!(
        *fired,
        vec![
            // Once when the key is seen, once when the array opens.
            (None, path!["items"]),
            (Some(Value::Array(Vec::new())), path!["items"]),
        ]
    );
}
