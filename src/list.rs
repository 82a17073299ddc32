use crate::api::Binder;
use crate::convert::ParseRegistry;
use crate::error::BindError;
use crate::field::ConfigFieldInfo;
use crate::host::ConfigHost;
use crate::node::ConfigNode;
use crate::types::{ConfigList, FieldDef, Slot};
use crate::utils::short_name_of;
use log::{debug, trace};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Binding metadata for a list field (`Vec<E>` or `Option<Vec<E>>`).
///
/// Derefs to the [`ConfigFieldInfo`] of the element type, so the classification flags
/// and the constructor describe `E` rather than the list itself.
pub struct ListFieldInfo<'d, H> {
    base: ConfigFieldInfo<'d, H>,
}

impl<'d, H> Deref for ListFieldInfo<'d, H> {
    type Target = ConfigFieldInfo<'d, H>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl<H> fmt::Debug for ListFieldInfo<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListFieldInfo").field(&self.base).finish()
    }
}

impl<'d, H: ConfigHost> ListFieldInfo<'d, H> {
    /// Builds the descriptor and validates the live list on `owner`.
    ///
    /// # Errors
    /// - [`BindError::NullCollection`] if the field is not a list, or currently holds no
    ///   collection.
    /// - [`BindError::UnsupportedOperation`] if the field is a list of lists.
    /// - [`BindError::MissingConstructor`] if the element is a freely constructed node
    ///   type with no constructor.
    pub fn new(
        def: &'d FieldDef<H>,
        owner: &H,
        registry: &ParseRegistry,
    ) -> Result<Self, BindError> {
        let declared = def.type_info();
        let Some(element) = declared.element() else {
            return Err(null_collection::<H>(def.name()));
        };
        if element.is_list() {
            return Err(BindError::UnsupportedOperation {
                operation: "ListFieldInfo::new",
                type_name: declared.short_name().to_string(),
                reason: "nested lists are not supported",
            });
        }
        if !matches!((declared.ops.list)(def.get(owner)), Slot::Value(_)) {
            return Err(null_collection::<H>(def.name()));
        }

        let base = ConfigFieldInfo::with_effective_type(def, element, registry);
        if base.is_config_node_type() && !base.is_component_type() && base.constructor().is_none()
        {
            return Err(base.missing_constructor());
        }
        Ok(Self { base })
    }

    /// The current number of elements.
    ///
    /// # Errors
    /// [`BindError::NullCollection`] if the list has been replaced with `None`.
    pub fn count(&self, owner: &H) -> Result<usize, BindError> {
        Ok(self.list(owner)?.len())
    }

    /// Replaces the list with one element per node, loaded in order.
    ///
    /// An empty `nodes` leaves the current contents untouched.
    ///
    /// # Errors
    /// [`BindError::UnsupportedOperation`] for lists of non-node elements; otherwise the
    /// first creation or load error, after which the list holds the elements built so far.
    pub fn parse_nodes<N: Borrow<ConfigNode>>(
        &self,
        owner: &mut H,
        nodes: &[N],
        binder: &mut Binder,
    ) -> Result<(), BindError> {
        if !self.is_config_node_type() {
            return Err(self.unsupported("parse_nodes", "the element type is not a node type"));
        }
        if nodes.is_empty() {
            return Ok(());
        }
        let ops = self.node_ops()?;
        debug!(
            "Loading {} `{}` nodes into list `{}`",
            nodes.len(),
            self.config_name(),
            self.name()
        );

        self.list_mut(owner)?.clear();
        for (index, node) in nodes.iter().enumerate() {
            trace!("Creating element {} of list `{}`", index, self.name());
            let mut element = self.new_instance(owner, binder)?;
            match (ops.get_mut)(element.as_mut()) {
                Slot::Value(object) => object.load(node.borrow(), binder)?,
                _ => return Err(self.type_mismatch()),
            }
            self.push(owner, element)?;
        }
        Ok(())
    }

    /// Replaces the list with one converted value per string, in order.
    ///
    /// An empty `values` leaves the current contents untouched.
    ///
    /// # Errors
    /// [`BindError::UnsupportedOperation`] for lists of unregistered element types;
    /// otherwise the first conversion error, after which the list holds the values
    /// converted so far.
    pub fn parse_values<S: AsRef<str>>(
        &self,
        owner: &mut H,
        values: &[S],
        registry: &ParseRegistry,
    ) -> Result<(), BindError> {
        if !self.is_registered_parse_type() {
            return Err(self.unsupported("parse_values", "the element type has no registered converter"));
        }
        if values.is_empty() {
            return Ok(());
        }
        debug!(
            "Parsing {} `{}` values into list `{}`",
            values.len(),
            self.config_name(),
            self.name()
        );

        let element_type = self.effective_type();
        self.list_mut(owner)?.clear();
        for value in values {
            let parsed = registry.parse(element_type, value.as_ref())?;
            self.push(owner, parsed)?;
        }
        Ok(())
    }

    /// Saves every element into a fresh node named after the field's key.
    ///
    /// # Errors
    /// [`BindError::UnsupportedOperation`] for lists of non-node elements, and any error
    /// from an element's `save`.
    pub fn format_nodes(
        &self,
        owner: &H,
        binder: &mut Binder,
    ) -> Result<Vec<ConfigNode>, BindError> {
        if !self.is_config_node_type() {
            return Err(self.unsupported("format_nodes", "the element type is not a node type"));
        }
        let ops = self.node_ops()?;
        let list = self.list(owner)?;

        let mut nodes = Vec::with_capacity(list.len());
        for index in 0..list.len() {
            let element = list.get(index).ok_or_else(|| self.type_mismatch())?;
            let Slot::Value(object) = (ops.get)(element) else {
                return Err(self.type_mismatch());
            };
            let mut node = ConfigNode::new(self.config_name());
            object.save(&mut node, binder)?;
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Formats every element with its registered converter.
    ///
    /// # Errors
    /// [`BindError::UnsupportedOperation`] if the element is a node type or has no
    /// registered converter, and [`BindError::UnrepresentableValue`] for an element that
    /// would not read back from text.
    pub fn format_values(
        &self,
        owner: &H,
        registry: &ParseRegistry,
    ) -> Result<Vec<String>, BindError> {
        if self.is_config_node_type() {
            return Err(self.unsupported("format_values", "the element type is a node type"));
        }
        if !self.is_registered_parse_type() {
            return Err(self.unsupported("format_values", "the element type has no registered converter"));
        }
        let element_type = self.effective_type();
        let list = self.list(owner)?;
        (0..list.len())
            .map(|index| {
                let element = list.get(index).ok_or_else(|| self.type_mismatch())?;
                self.checked_text(registry.format(element_type, element)?)
            })
            .collect()
    }

    fn list<'h>(&self, owner: &'h H) -> Result<&'h dyn ConfigList, BindError> {
        match (self.declared_type().ops.list)(self.def().get(owner)) {
            Slot::Value(list) => Ok(list),
            _ => Err(null_collection::<H>(self.name())),
        }
    }

    fn list_mut<'h>(&self, owner: &'h mut H) -> Result<&'h mut dyn ConfigList, BindError> {
        match (self.declared_type().ops.list_mut)(self.def().get_mut(owner)) {
            Slot::Value(list) => Ok(list),
            _ => Err(null_collection::<H>(self.name())),
        }
    }

    fn push(&self, owner: &mut H, element: Box<dyn Any>) -> Result<(), BindError> {
        self.list_mut(owner)?
            .push_boxed(element)
            .map_err(|_| self.type_mismatch())
    }
}

fn null_collection<H>(field: &str) -> BindError {
    BindError::NullCollection {
        field: field.to_string(),
        owner: short_name_of::<H>().to_string(),
    }
}
