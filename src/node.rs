use std::fmt::{self, Display};

/// Checks that `value` can be written as `key = value` text and read back unchanged.
///
/// A value ends at a line break, a brace or a `//` comment, and is trimmed when read.
///
/// # Errors
/// The reason `value` would not survive a text round trip.
pub fn check_text_value(value: &str) -> Result<(), &'static str> {
    if value.contains(['\n', '\r']) {
        Err("it contains a line break")
    } else if value.contains(['{', '}']) {
        Err("it contains a brace")
    } else if value.contains("//") {
        Err("it contains a `//` comment marker")
    } else if value.trim() != value {
        Err("it has leading or trailing whitespace")
    } else {
        Ok(())
    }
}

/// A single `name = value` entry of a [`ConfigNode`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConfigValueEntry {
    pub name: String,
    pub value: String,
}

/// An ordered tree of named values and named child nodes.
///
/// Both values and child nodes keep their insertion order, and duplicate names are
/// normal: a list field is stored as several entries sharing one key.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ConfigNode {
    name: String,
    values: Vec<ConfigValueEntry>,
    nodes: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn values(&self) -> &[ConfigValueEntry] {
        &self.values
    }

    pub fn nodes(&self) -> &[ConfigNode] {
        &self.nodes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.nodes.is_empty()
    }

    // === Values ===

    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.push(ConfigValueEntry {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Replaces the first value called `name`, or adds one if there is none.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        match self.values.iter_mut().find(|v| v.name == name) {
            Some(entry) => entry.value = value.into(),
            None => self.add_value(name, value),
        }
    }

    /// The first value called `name`.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    /// Every value called `name`, in insertion order.
    pub fn get_values(&self, name: &str) -> Vec<&str> {
        self.values
            .iter()
            .filter(|v| v.name == name)
            .map(|v| v.value.as_str())
            .collect()
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }

    /// Removes every value called `name` and returns how many were removed.
    pub fn remove_values(&mut self, name: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v.name != name);
        before - self.values.len()
    }

    // === Child nodes ===

    pub fn add_node(&mut self, node: ConfigNode) -> &mut ConfigNode {
        self.nodes.push(node);
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    pub fn add_new_node(&mut self, name: impl Into<String>) -> &mut ConfigNode {
        self.add_node(ConfigNode::new(name))
    }

    /// The first child node called `name`.
    pub fn get_node(&self, name: &str) -> Option<&ConfigNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Every child node called `name`, in insertion order.
    pub fn get_nodes(&self, name: &str) -> Vec<&ConfigNode> {
        self.nodes.iter().filter(|n| n.name == name).collect()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    // === Text output ===

    /// Writes the contents of this node (not its own header) at `depth` tabs.
    fn write_body(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "\t".repeat(depth);
        for entry in &self.values {
            writeln!(f, "{indent}{} = {}", entry.name, entry.value)?;
        }
        for node in &self.nodes {
            writeln!(f, "{indent}{}", node.name)?;
            writeln!(f, "{indent}{{")?;
            node.write_body(f, depth + 1)?;
            writeln!(f, "{indent}}}")?;
        }
        Ok(())
    }
}

/// Formats the node body in the text format read by [`crate::parser::Parser`].
///
/// The root node's own name is not written; a document is the body of its root.
/// Values that fail [`check_text_value`] are written as they are and do not read back
/// unchanged.
impl Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_body(f, 0)
    }
}
