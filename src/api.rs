use crate::convert::ParseRegistry;
use crate::error::{BindError, CfgError};
use crate::factory::{AsAny, ComponentFactory, InstanceFactory};
use crate::host::{ConfigHost, SavePass};
use crate::node::ConfigNode;
use crate::parser::{Parser, ROOT_NODE_NAME};
use crate::serialization::{to_value, Value};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::path::Path;

/// The collaborators a binding operation needs: the converter registry for leaf values
/// and the factory for new node instances.
pub struct Binder {
    registry: ParseRegistry,
    factory: Box<dyn InstanceFactory>,
    save_pass: SavePass,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// A binder with the primitive converters and a [`ComponentFactory`].
    pub fn new() -> Self {
        Self::with_factory(ComponentFactory::new())
    }

    pub fn with_factory(factory: impl InstanceFactory + 'static) -> Self {
        Self {
            registry: ParseRegistry::new(),
            factory: Box::new(factory),
            save_pass: SavePass::Config,
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ParseRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &ParseRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ParseRegistry {
        &mut self.registry
    }

    pub fn factory_mut(&mut self) -> &mut dyn InstanceFactory {
        self.factory.as_mut()
    }

    /// The pass of the save in progress, so nested objects write the same selection of
    /// fields as their host.
    pub fn save_pass(&self) -> SavePass {
        self.save_pass
    }

    pub(crate) fn replace_save_pass(&mut self, pass: SavePass) -> SavePass {
        std::mem::replace(&mut self.save_pass, pass)
    }

    /// The factory as its concrete type, e.g. to read [`ComponentFactory::attachments`].
    pub fn factory_as<F: InstanceFactory + Any>(&self) -> Option<&F> {
        <dyn InstanceFactory as AsAny>::as_any(&*self.factory).downcast_ref::<F>()
    }
}

/// Parses ConfigNode text into a tree rooted at a node named `root`.
///
/// # Errors
///
/// Returns a `CfgError::Parser` carrying the source span of the problem.
pub fn parse(source: &str, file_name: &str) -> Result<ConfigNode, CfgError> {
    let mut parser = Parser::new_with_name(source, file_name.to_string());
    parser.parse_document()
}

/// Reads and parses a config file.
///
/// # Errors
///
/// Returns `CfgError::Io` if the file cannot be read, or a parser error.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<ConfigNode, CfgError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| CfgError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    parse(&source, &path.to_string_lossy())
}

/// Loads every declared field of `owner` from `node`.
///
/// # Errors
///
/// The first field error, wrapped in `BindError::Field`.
pub fn load_object<H: ConfigHost>(
    owner: &mut H,
    node: &ConfigNode,
    binder: &mut Binder,
) -> Result<(), BindError> {
    H::config_fields().load_fields(owner, node, binder)
}

/// Saves the fields of `owner` selected by `pass` into a new root node.
///
/// # Errors
///
/// The first field error, wrapped in `BindError::Field`.
pub fn save_object<H: ConfigHost>(
    owner: &H,
    binder: &mut Binder,
    pass: SavePass,
) -> Result<ConfigNode, BindError> {
    let mut node = ConfigNode::new(ROOT_NODE_NAME);
    H::config_fields().save_fields(owner, &mut node, binder, pass)?;
    Ok(node)
}

impl Serialize for ConfigNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.to_value();
        value.serialize(serializer)
    }
}

impl ConfigNode {
    /// Converts the tree into a generic, serializable `Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        to_value(self)
    }

    /// Serializes the tree into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the tree into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}
