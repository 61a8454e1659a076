//! Utilities for navigating and modifying JSON attribute trees.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::path::{AttrPath, PathSegment};

/// Get a reference to the sub-tree at the given path.
///
/// Missing members, out-of-range indices and attempts to descend into a
/// scalar all yield `None`.
pub fn get_path<'a>(tree: &'a Value, path: &AttrPath) -> Option<&'a Value> {
    let mut cursor = tree;
    for segment in path.iter() {
        cursor = match (cursor, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key)?,
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string())?,
            (Value::Array(arr), PathSegment::Index(index)) => arr.get(*index)?,
            _ => return None,
        };
    }
    Some(cursor)
}

/// Get a mutable reference to the sub-tree at the given path.
pub fn get_path_mut<'a>(tree: &'a mut Value, path: &AttrPath) -> Option<&'a mut Value> {
    let mut cursor = tree;
    for segment in path.iter() {
        cursor = match (cursor, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key)?,
            (Value::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string())?,
            (Value::Array(arr), PathSegment::Index(index)) => arr.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(cursor)
}

/// Set a value at the given path, creating intermediate containers.
///
/// Missing or null intermediates become objects (or arrays, when the next
/// segment is an index). Arrays may grow by one element at a time: writing
/// to index `len` appends. Descending into a scalar is an error.
pub fn set_path(tree: &mut Value, path: &AttrPath, value: Value) -> Result<(), Error> {
    let mut cursor = tree;
    for (position, segment) in path.iter().enumerate() {
        if cursor.is_null() {
            *cursor = match segment {
                PathSegment::Key(_) => Value::Object(Map::new()),
                PathSegment::Index(_) => Value::Array(Vec::new()),
            };
        }

        cursor = match (cursor, segment) {
            (Value::Object(map), PathSegment::Key(key)) => {
                map.entry(key.clone()).or_insert(Value::Null)
            }
            (Value::Object(map), PathSegment::Index(index)) => {
                map.entry(index.to_string()).or_insert(Value::Null)
            }
            (Value::Array(arr), PathSegment::Index(index)) => {
                if *index == arr.len() {
                    arr.push(Value::Null);
                }
                let len = arr.len();
                arr.get_mut(*index).ok_or_else(|| {
                    path.invalid(format!(
                        "array index {} out of bounds (len={}) at segment {}",
                        index, len, position
                    ))
                })?
            }
            (Value::Array(_), PathSegment::Key(key)) => {
                return Err(path.invalid(format!(
                    "expected array index at segment {}, got '{}'",
                    position, key
                )));
            }
            (_, segment) => {
                return Err(path.invalid(format!(
                    "cannot set child '{}' on primitive value",
                    segment
                )));
            }
        };
    }

    *cursor = value;
    Ok(())
}

/// Remove the value at the given path, returning it.
pub fn remove_path(tree: &mut Value, path: &AttrPath) -> Option<Value> {
    let (parent_path, last) = path.split_last()?;
    match (get_path_mut(tree, &parent_path)?, last) {
        (Value::Object(map), PathSegment::Key(key)) => map.remove(key),
        (Value::Object(map), PathSegment::Index(index)) => map.remove(&index.to_string()),
        (Value::Array(arr), PathSegment::Index(index)) if *index < arr.len() => {
            Some(arr.remove(*index))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr_path;
    use serde_json::json;

    fn test_tree() -> Value {
        json!({
            "type": "page",
            "properties": {
                "title": [["Roadmap"]]
            },
            "content": ["a", "b", "c"],
            "alive": true
        })
    }

    #[test]
    fn get_root() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, &AttrPath::root()), Some(&tree));
    }

    #[test]
    fn get_nested_child() {
        let tree = test_tree();
        assert_eq!(
            get_path(&tree, &attr_path!("properties.title.0.0")),
            Some(&json!("Roadmap"))
        );
    }

    #[test]
    fn get_array_element() {
        let tree = test_tree();
        assert_eq!(get_path(&tree, &attr_path!("content.1")), Some(&json!("b")));
    }

    #[test]
    fn get_missing_returns_none() {
        let tree = test_tree();
        assert!(get_path(&tree, &attr_path!("format.page_icon")).is_none());
        assert!(get_path(&tree, &attr_path!("content.9")).is_none());
    }

    #[test]
    fn get_through_primitive_returns_none() {
        let tree = test_tree();
        assert!(get_path(&tree, &attr_path!("type.inner")).is_none());
    }

    #[test]
    fn get_key_on_array_returns_none() {
        let tree = test_tree();
        assert!(get_path(&tree, &attr_path!("content.first")).is_none());
    }

    #[test]
    fn get_path_mut_edits_in_place() {
        let mut tree = test_tree();
        *get_path_mut(&mut tree, &attr_path!("content.0")).unwrap() = json!("z");
        assert_eq!(tree["content"][0], json!("z"));
    }

    #[test]
    fn set_root_replaces_tree() {
        let mut tree = test_tree();
        set_path(&mut tree, &AttrPath::root(), json!(1)).unwrap();
        assert_eq!(tree, json!(1));
    }

    #[test]
    fn set_overwrites_existing() {
        let mut tree = test_tree();
        set_path(&mut tree, &attr_path!("type"), json!("text")).unwrap();
        assert_eq!(tree["type"], json!("text"));
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut tree = test_tree();
        set_path(
            &mut tree,
            &attr_path!("format.page_icon.emoji"),
            json!("🚀"),
        )
        .unwrap();
        assert_eq!(tree["format"]["page_icon"]["emoji"], json!("🚀"));
    }

    #[test]
    fn set_on_null_tree() {
        let mut tree = Value::Null;
        set_path(&mut tree, &attr_path!("properties.title"), json!([["x"]])).unwrap();
        assert_eq!(tree, json!({"properties": {"title": [["x"]]}}));
    }

    #[test]
    fn set_creates_array_for_index_segment() {
        let mut tree = json!({});
        set_path(&mut tree, &attr_path!("content.0"), json!("a")).unwrap();
        assert_eq!(tree, json!({"content": ["a"]}));
    }

    #[test]
    fn set_array_append() {
        let mut tree = test_tree();
        set_path(&mut tree, &attr_path!("content.3"), json!("d")).unwrap();
        assert_eq!(tree["content"], json!(["a", "b", "c", "d"]));
    }

    #[test]
    fn set_array_out_of_bounds_error() {
        let mut tree = test_tree();
        let err = set_path(&mut tree, &attr_path!("content.7"), json!("x")).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn set_key_on_array_error() {
        let mut tree = test_tree();
        let err = set_path(&mut tree, &attr_path!("content.first"), json!("x")).unwrap_err();
        assert!(err.to_string().contains("expected array index"));
    }

    #[test]
    fn set_on_primitive_error() {
        let mut tree = test_tree();
        let err = set_path(&mut tree, &attr_path!("alive.flag"), json!(1)).unwrap_err();
        assert!(err.to_string().contains("primitive"));
        assert_eq!(tree["alive"], json!(true));
    }

    #[test]
    fn numeric_key_on_object() {
        let mut tree = json!({"options": {}});
        set_path(&mut tree, &attr_path!("options.7"), json!("seven")).unwrap();
        assert_eq!(tree["options"]["7"], json!("seven"));
        assert_eq!(get_path(&tree, &attr_path!("options.7")), Some(&json!("seven")));
    }

    #[test]
    fn remove_member_and_element() {
        let mut tree = test_tree();
        assert_eq!(remove_path(&mut tree, &attr_path!("type")), Some(json!("page")));
        assert_eq!(remove_path(&mut tree, &attr_path!("content.0")), Some(json!("a")));
        assert_eq!(tree["content"], json!(["b", "c"]));
        assert!(remove_path(&mut tree, &attr_path!("missing.deep")).is_none());
        assert!(remove_path(&mut tree, &AttrPath::root()).is_none());
    }
}
