//! Property: how the input is chunked must never change the parsed result.
use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::{JsonStream, Map, Value};

/// A generated document with an object or array root, as the parser requires.
#[derive(Clone, Debug)]
struct Doc(Value);

fn arbitrary_scalar(g: &mut Gen) -> Value {
    match u8::arbitrary(g) % 4 {
        0 => Value::Null,
        1 => Value::Boolean(bool::arbitrary(g)),
        // Integral numbers survive the f64 round-trip exactly.
        2 => Value::Number(f64::from(i32::arbitrary(g))),
        _ => Value::String(String::arbitrary(g)),
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Value {
    if depth == 0 || u8::arbitrary(g) % 3 != 0 {
        arbitrary_scalar(g)
    } else {
        arbitrary_container(g, depth - 1)
    }
}

fn arbitrary_container(g: &mut Gen, depth: usize) -> Value {
    let len = usize::arbitrary(g) % 4;
    if bool::arbitrary(g) {
        Value::Array((0..len).map(|_| arbitrary_value(g, depth)).collect())
    } else {
        let mut map = Map::new();
        for _ in 0..len {
            map.insert(String::arbitrary(g), arbitrary_value(g, depth));
        }
        Value::Object(map)
    }
}

impl Arbitrary for Doc {
    fn arbitrary(g: &mut Gen) -> Self {
        Doc(arbitrary_container(g, 3))
    }
}

#[test]
fn chunking_never_changes_the_result() {
    fn prop(doc: Doc, splits: Vec<usize>) -> bool {
        let src = doc.0.to_string();
        let chars: Vec<char> = src.chars().collect();

        let mut stream = JsonStream::default();
        let mut idx = 0;
        for s in splits {
            if idx >= chars.len() {
                break;
            }
            let size = 1 + s % (chars.len() - idx);
            let chunk: String = chars[idx..idx + size].iter().collect();
            stream.write(&chunk).unwrap();
            idx += size;
        }
        if idx < chars.len() {
            let chunk: String = chars[idx..].iter().collect();
            stream.write(&chunk).unwrap();
        }
        stream.end().unwrap();

        stream.root() == Some(&doc.0)
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(Doc, Vec<usize>) -> bool);
}

#[test]
fn single_characters_match_one_shot_parsing() {
    fn prop(doc: Doc) -> bool {
        let src = doc.0.to_string();

        let mut drip = JsonStream::default();
        for c in src.chars() {
            drip.write(&c.to_string()).unwrap();
        }
        drip.end().unwrap();

        let mut whole = JsonStream::default();
        whole.write(&src).unwrap();
        whole.end().unwrap();

        drip.root() == whole.root() && drip.root() == Some(&doc.0)
    }

    QuickCheck::new().tests(200).quickcheck(prop as fn(Doc) -> bool);
}
