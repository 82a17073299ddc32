use crate::node::ConfigNode;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

/// Converts a node into a generic value tree.
///
/// A key that appears once maps to a single value. Repeated keys (including a value
/// and a child node sharing a name) are gathered into an array, values first.
pub(crate) fn to_value(node: &ConfigNode) -> Value {
    let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for entry in node.values() {
        grouped
            .entry(entry.name.clone())
            .or_default()
            .push(Value::String(entry.value.clone()));
    }
    for child in node.nodes() {
        grouped
            .entry(child.name().to_string())
            .or_default()
            .push(to_value(child));
    }

    let map = grouped
        .into_iter()
        .map(|(key, mut items)| {
            let value = if items.len() == 1 {
                items.remove(0)
            } else {
                Value::Array(items)
            };
            (key, value)
        })
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node_is_empty_object() {
        assert_eq!(
            to_value(&ConfigNode::new("root")),
            Value::Object(BTreeMap::new())
        );
    }

    #[test]
    fn test_value_and_node_sharing_a_name() {
        let mut node = ConfigNode::new("root");
        node.add_new_node("item").add_value("x", "1");
        node.add_value("item", "plain");

        let Value::Object(map) = to_value(&node) else {
            panic!("Expected an object");
        };
        match &map["item"] {
            Value::Array(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0], Value::String("plain".to_string()));
                assert!(matches!(items[1], Value::Object(_)));
            }
            other => panic!("Expected an array, got {:?}", other),
        }
    }
}
