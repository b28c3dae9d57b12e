//! Property tests for feed parsing: order preservation and per-entry skipping.

use postfeed::feed::{parse, parse_report, ParseError};
use postfeed::post::Post;
use proptest::prelude::*;
use serde_json::{json, Value};

fn post_strategy() -> impl Strategy<Value = Post> {
    (".{0,24}", ".{0,48}", "/[a-z0-9_/]{0,16}\\.(png|jpg)")
        .prop_map(|(title, description, image_path)| Post {
            title,
            description,
            image_path,
        })
}

fn entry(post: &Post) -> Value {
    json!({
        "titulo": post.title,
        "descripcion": post.description,
        "imagen": post.image_path,
    })
}

fn document(entries: Vec<Value>) -> Value {
    json!({ "items": entries })
}

proptest! {
    #[test]
    fn well_formed_entries_parse_in_order(posts in prop::collection::vec(post_strategy(), 0..20)) {
        let raw = document(posts.iter().map(entry).collect());
        prop_assert_eq!(parse(&raw), posts);
    }

    #[test]
    fn entry_missing_a_field_is_the_only_one_dropped(
        posts in prop::collection::vec(post_strategy(), 1..20),
        pick in any::<prop::sample::Index>(),
        field in prop::sample::select(vec!["titulo", "descripcion", "imagen"]),
    ) {
        let broken = pick.index(posts.len());
        let mut entries: Vec<Value> = posts.iter().map(entry).collect();
        if let Value::Object(map) = &mut entries[broken] {
            map.remove(field);
        }

        let report = parse_report(&document(entries));

        let mut expected = posts.clone();
        expected.remove(broken);
        prop_assert_eq!(report.posts, expected);
        prop_assert_eq!(report.errors.len(), 1);
        let is_broken_entry = matches!(
            &report.errors[0],
            ParseError::MalformedPostEntry { index, .. } if *index == broken
        );
        prop_assert!(is_broken_entry);
    }

    #[test]
    fn document_without_items_is_empty(other in prop::collection::hash_map("[a-z]{1,8}", ".{0,8}", 0..5)) {
        let mut map = serde_json::Map::new();
        for (key, value) in other {
            if key != "items" {
                map.insert(key, Value::String(value));
            }
        }
        let report = parse_report(&Value::Object(map));
        prop_assert!(report.posts.is_empty());
        prop_assert!(matches!(report.errors.as_slice(), [ParseError::MalformedFeed(_)]));
    }
}

#[test]
fn unknown_fields_on_entries_are_ignored() {
    let raw = json!({
        "items": [
            { "titulo": "A", "descripcion": "B", "imagen": "/a.png", "id": 7, "tags": ["x"] }
        ],
        "generated": "2015-03-01"
    });
    let posts = parse(&raw);
    assert_eq!(posts.len(), 1);
    assert_eq!(
        (posts[0].title.as_str(), posts[0].description.as_str(), posts[0].image_path.as_str()),
        ("A", "B", "/a.png")
    );
}
