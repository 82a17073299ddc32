use crate::api::Binder;
use crate::convert::ParseRegistry;
use crate::error::BindError;
use crate::host::ConfigHost;
use crate::node::{check_text_value, ConfigNode};
use crate::types::{FieldDef, Slot, TypeInfo};
use crate::utils::short_name_of;
use log::{debug, warn};
use std::any::Any;
use std::fmt;

/// Binding metadata for one declared field of the host type `H`.
///
/// The descriptor resolves how the field is serialized (leaf value, child node, or
/// neither) from its effective type. It borrows only the field declaration: the host
/// instance is passed to each call, so one descriptor never holds a live borrow of
/// its owner between calls.
pub struct ConfigFieldInfo<'d, H> {
    def: &'d FieldDef<H>,
    effective_type: &'d TypeInfo,
    is_component_type: bool,
    is_registered_parse_type: bool,
    is_config_node_type: bool,
    is_storage_compatible: bool,
    constructor: Option<fn() -> Box<dyn Any>>,
}

impl<'d, H: ConfigHost> ConfigFieldInfo<'d, H> {
    pub fn new(def: &'d FieldDef<H>, registry: &ParseRegistry) -> Self {
        Self::with_effective_type(def, def.type_info(), registry)
    }

    /// A descriptor for `def` whose serialization follows `ty` instead of the declared
    /// type. List descriptors pass the element type, so the flags and the storage
    /// warning are computed for the element alone.
    pub(crate) fn with_effective_type(
        def: &'d FieldDef<H>,
        ty: &'d TypeInfo,
        registry: &ParseRegistry,
    ) -> Self {
        let mut info = Self {
            def,
            effective_type: ty,
            is_component_type: false,
            is_registered_parse_type: false,
            is_config_node_type: false,
            is_storage_compatible: true,
            constructor: None,
        };
        info.set_effective_type(ty, registry);
        info
    }

    /// Re-targets the descriptor at `ty` and recomputes every derived flag.
    fn set_effective_type(&mut self, ty: &'d TypeInfo, registry: &ParseRegistry) {
        self.effective_type = ty;
        self.is_component_type = ty.is_attachable();
        self.is_registered_parse_type = registry.is_registered(ty.type_id());
        // A registered converter wins over the node capability.
        self.is_config_node_type = !self.is_registered_parse_type && ty.has_node_capability();
        self.is_storage_compatible = ty.is_storage_compatible();
        if !self.is_storage_compatible {
            warn!(
                "The type {} of field `{}` on `{}` is not storage compatible and will not survive its host being copied",
                ty.short_name(),
                self.def.name(),
                short_name_of::<H>()
            );
        }
        self.find_constructor();
    }

    fn find_constructor(&mut self) {
        self.constructor = if self.is_config_node_type && !self.is_component_type {
            self.effective_type.constructor()
        } else {
            None
        };
    }

    // === Metadata ===

    pub fn name(&self) -> &'static str {
        self.def.name()
    }

    pub fn config_name(&self) -> &'d str {
        self.def.key()
    }

    pub fn is_persistent(&self) -> bool {
        self.def.options().persistent
    }

    pub fn declared_type(&self) -> &'d TypeInfo {
        self.def.type_info()
    }

    pub fn effective_type(&self) -> &'d TypeInfo {
        self.effective_type
    }

    pub fn is_component_type(&self) -> bool {
        self.is_component_type
    }

    pub fn is_registered_parse_type(&self) -> bool {
        self.is_registered_parse_type
    }

    pub fn is_config_node_type(&self) -> bool {
        self.is_config_node_type
    }

    pub fn is_storage_compatible(&self) -> bool {
        self.is_storage_compatible
    }

    pub fn constructor(&self) -> Option<fn() -> Box<dyn Any>> {
        self.constructor
    }

    pub(crate) fn def(&self) -> &'d FieldDef<H> {
        self.def
    }

    // === Live value access ===

    pub fn value<'h>(&self, owner: &'h H) -> &'h dyn Any {
        self.def.get(owner)
    }

    pub fn value_mut<'h>(&self, owner: &'h mut H) -> &'h mut dyn Any {
        self.def.get_mut(owner)
    }

    /// Replaces the field's value. An `Option<T>` field receives `Some(value)`.
    ///
    /// # Errors
    /// [`BindError::TypeMismatch`] if `value` is not of the declared type.
    pub fn set_value(&self, owner: &mut H, value: Box<dyn Any>) -> Result<(), BindError> {
        (self.declared_type().ops.assign)(self.def.get_mut(owner), value)
            .map_err(|_| self.type_mismatch())
    }

    // === Scalar parse/format ===

    /// Reads the field from `node`: a leaf value for registered types, a child node for
    /// node types. A missing key leaves the field untouched.
    ///
    /// # Errors
    /// Conversion and load errors, [`BindError::MissingConstructor`] when a new node
    /// instance is needed but cannot be built, and [`BindError::UnsupportedOperation`]
    /// when the type is neither.
    pub fn parse_from(
        &self,
        owner: &mut H,
        node: &ConfigNode,
        binder: &mut Binder,
    ) -> Result<(), BindError> {
        let key = self.config_name();
        if self.is_registered_parse_type {
            let Some(raw) = node.get_value(key) else {
                return Ok(());
            };
            debug!("Parsing `{}` = `{}` into field `{}`", key, raw, self.name());
            let value = binder.registry().parse(self.effective_type, raw)?;
            return self.set_value(owner, value);
        }

        if !self.is_config_node_type {
            return Err(self.unsupported("parse_from", "the type is neither registered nor a node type"));
        }
        let Some(child) = node.get_node(key) else {
            return Ok(());
        };
        let ops = self.node_ops()?;
        debug!("Loading node `{}` into field `{}`", key, self.name());

        match (ops.get_mut)(self.def.get_mut(owner)) {
            Slot::Value(existing) => return existing.load(child, binder),
            Slot::Mismatch => return Err(self.type_mismatch()),
            Slot::Empty => {}
        }

        let mut instance = self.new_instance(owner, binder)?;
        match (ops.get_mut)(instance.as_mut()) {
            Slot::Value(created) => created.load(child, binder)?,
            _ => return Err(self.type_mismatch()),
        }
        self.set_value(owner, instance)
    }

    /// Writes the field into `node`. An empty `Option` writes nothing.
    ///
    /// # Errors
    /// [`BindError::UnsupportedOperation`] when the type is neither registered nor a node
    /// type, [`BindError::UnrepresentableValue`] when the formatted value would not read
    /// back from text, and any error from the value's `save`.
    pub fn format_into(
        &self,
        owner: &H,
        node: &mut ConfigNode,
        binder: &mut Binder,
    ) -> Result<(), BindError> {
        let key = self.config_name();
        let value = self.def.get(owner);

        if self.is_registered_parse_type {
            match (self.effective_type.ops.inner)(value) {
                Slot::Value(inner) => {
                    let text = binder.registry().format(self.effective_type, inner)?;
                    node.add_value(key, self.checked_text(text)?);
                }
                Slot::Empty => {}
                Slot::Mismatch => return Err(self.type_mismatch()),
            }
            return Ok(());
        }

        if !self.is_config_node_type {
            return Err(self.unsupported("format_into", "the type is neither registered nor a node type"));
        }
        match (self.node_ops()?.get)(value) {
            Slot::Value(object) => {
                let mut child = ConfigNode::new(key);
                object.save(&mut child, binder)?;
                node.add_node(child);
            }
            Slot::Empty => {}
            Slot::Mismatch => return Err(self.type_mismatch()),
        }
        Ok(())
    }

    // === Helpers shared with the list descriptor ===

    /// Obtains a new instance of the effective type: through the factory for
    /// components, through the constructor otherwise.
    pub(crate) fn new_instance(
        &self,
        owner: &H,
        binder: &mut Binder,
    ) -> Result<Box<dyn Any>, BindError> {
        if self.is_component_type {
            return binder
                .factory_mut()
                .create(self.effective_type, owner.container());
        }
        self.constructor
            .map(|construct| construct())
            .ok_or_else(|| self.missing_constructor())
    }

    pub(crate) fn node_ops(&self) -> Result<crate::types::NodeOps, BindError> {
        self.effective_type
            .node_ops
            .ok_or_else(|| self.unsupported("load", "the type is not a node type"))
    }

    /// Passes `text` through if it survives a text round trip.
    pub(crate) fn checked_text(&self, text: String) -> Result<String, BindError> {
        match check_text_value(&text) {
            Ok(()) => Ok(text),
            Err(reason) => Err(BindError::UnrepresentableValue {
                field: self.name().to_string(),
                value: text,
                reason,
            }),
        }
    }

    pub(crate) fn missing_constructor(&self) -> BindError {
        BindError::MissingConstructor {
            type_name: self.effective_type.short_name().to_string(),
            field: self.name().to_string(),
            owner: short_name_of::<H>().to_string(),
        }
    }

    pub(crate) fn unsupported(&self, operation: &'static str, reason: &'static str) -> BindError {
        BindError::UnsupportedOperation {
            operation,
            type_name: self.effective_type.short_name().to_string(),
            reason,
        }
    }

    pub(crate) fn type_mismatch(&self) -> BindError {
        BindError::TypeMismatch {
            field: self.name().to_string(),
            expected: self.declared_type().type_name().to_string(),
        }
    }
}

impl<H> fmt::Debug for ConfigFieldInfo<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFieldInfo")
            .field("name", &self.def.name())
            .field("config_name", &self.def.key())
            .field("effective_type", &self.effective_type.type_name())
            .field("is_component_type", &self.is_component_type)
            .field("is_registered_parse_type", &self.is_registered_parse_type)
            .field("is_config_node_type", &self.is_config_node_type)
            .field("is_storage_compatible", &self.is_storage_compatible)
            .finish()
    }
}
