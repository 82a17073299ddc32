//! Explicit type and field metadata for bindable objects.
//!
//! Rust has no runtime reflection, so every bindable type is described once with a
//! [`TypeInfo`] built from one of its generic constructors. The constructor captures
//! the type-erased operations the binding descriptors need (assignment, list access,
//! node loading) as monomorphized fn pointers.

use crate::api::Binder;
use crate::error::BindError;
use crate::node::ConfigNode;
use crate::utils::short_type_name;
use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A type that can load its state from, and save it to, a single [`ConfigNode`].
pub trait NodeObject: Any {
    /// Populates `self` from `node`.
    ///
    /// # Errors
    /// Any error describing malformed content. It is propagated to the caller unchanged.
    fn load(&mut self, node: &ConfigNode, binder: &mut Binder) -> Result<(), BindError>;

    /// Writes `self` into `node`.
    ///
    /// # Errors
    /// Only when a bound field is declared with a shape that cannot be formatted.
    fn save(&self, node: &mut ConfigNode, binder: &mut Binder) -> Result<(), BindError>;
}

/// An ordered, homogeneous collection that can be rebuilt element by element.
pub trait ConfigList {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    fn get(&self, index: usize) -> Option<&dyn Any>;

    /// Appends `value`, handing it back if it is not of the element type.
    fn push_boxed(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
}

impl<T: Any> ConfigList for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn get(&self, index: usize) -> Option<&dyn Any> {
        <[T]>::get(self, index).map(|v| v as &dyn Any)
    }

    fn push_boxed(&mut self, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        self.push(*value.downcast::<T>()?);
        Ok(())
    }
}

/// Result of looking through a field's storage for a value of a given type.
pub(crate) enum Slot<T> {
    Value(T),
    /// The storage is an `Option` holding `None`.
    Empty,
    /// The storage is not of the expected type at all.
    Mismatch,
}

// -----------------------------------------------------------------------------
// Type-erased operations
//
// Every helper accepts the bare type and its `Option` wrapper, so a field may be
// declared as `T` or `Option<T>` (and a list as `Vec<T>` or `Option<Vec<T>>`).

fn assign_slot<T: Any>(slot: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
    let value = value.downcast::<T>()?;
    if let Some(target) = slot.downcast_mut::<T>() {
        *target = *value;
        return Ok(());
    }
    if let Some(target) = slot.downcast_mut::<Option<T>>() {
        *target = Some(*value);
        return Ok(());
    }
    Err(value)
}

fn inner_slot<T: Any>(slot: &dyn Any) -> Slot<&dyn Any> {
    if let Some(value) = slot.downcast_ref::<T>() {
        return Slot::Value(value as &dyn Any);
    }
    match slot.downcast_ref::<Option<T>>() {
        Some(Some(value)) => Slot::Value(value as &dyn Any),
        Some(None) => Slot::Empty,
        None => Slot::Mismatch,
    }
}

fn list_slot<T: Any>(slot: &dyn Any) -> Slot<&dyn ConfigList> {
    if let Some(list) = slot.downcast_ref::<Vec<T>>() {
        return Slot::Value(list as &dyn ConfigList);
    }
    match slot.downcast_ref::<Option<Vec<T>>>() {
        Some(Some(list)) => Slot::Value(list as &dyn ConfigList),
        Some(None) => Slot::Empty,
        None => Slot::Mismatch,
    }
}

fn list_slot_mut<T: Any>(slot: &mut dyn Any) -> Slot<&mut dyn ConfigList> {
    if slot.is::<Vec<T>>() {
        return match slot.downcast_mut::<Vec<T>>() {
            Some(list) => Slot::Value(list as &mut dyn ConfigList),
            None => Slot::Mismatch,
        };
    }
    match slot.downcast_mut::<Option<Vec<T>>>() {
        Some(Some(list)) => Slot::Value(list as &mut dyn ConfigList),
        Some(None) => Slot::Empty,
        None => Slot::Mismatch,
    }
}

fn no_list(_: &dyn Any) -> Slot<&dyn ConfigList> {
    Slot::Mismatch
}

fn no_list_mut(_: &mut dyn Any) -> Slot<&mut dyn ConfigList> {
    Slot::Mismatch
}

fn node_slot<T: NodeObject>(slot: &dyn Any) -> Slot<&dyn NodeObject> {
    if let Some(value) = slot.downcast_ref::<T>() {
        return Slot::Value(value as &dyn NodeObject);
    }
    match slot.downcast_ref::<Option<T>>() {
        Some(Some(value)) => Slot::Value(value as &dyn NodeObject),
        Some(None) => Slot::Empty,
        None => Slot::Mismatch,
    }
}

fn node_slot_mut<T: NodeObject>(slot: &mut dyn Any) -> Slot<&mut dyn NodeObject> {
    if slot.is::<T>() {
        return match slot.downcast_mut::<T>() {
            Some(value) => Slot::Value(value as &mut dyn NodeObject),
            None => Slot::Mismatch,
        };
    }
    match slot.downcast_mut::<Option<T>>() {
        Some(Some(value)) => Slot::Value(value as &mut dyn NodeObject),
        Some(None) => Slot::Empty,
        None => Slot::Mismatch,
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ValueOps {
    pub(crate) assign: fn(&mut dyn Any, Box<dyn Any>) -> Result<(), Box<dyn Any>>,
    pub(crate) inner: fn(&dyn Any) -> Slot<&dyn Any>,
    pub(crate) list: fn(&dyn Any) -> Slot<&dyn ConfigList>,
    pub(crate) list_mut: fn(&mut dyn Any) -> Slot<&mut dyn ConfigList>,
}

impl ValueOps {
    fn of<T: Any>() -> Self {
        Self {
            assign: assign_slot::<T>,
            inner: inner_slot::<T>,
            list: no_list,
            list_mut: no_list_mut,
        }
    }

    /// Operations on `Vec<T>`, where `T` is the element type.
    fn of_vec<T: Any>() -> Self {
        Self {
            assign: assign_slot::<Vec<T>>,
            inner: inner_slot::<Vec<T>>,
            list: list_slot::<T>,
            list_mut: list_slot_mut::<T>,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct NodeOps {
    pub(crate) get: fn(&dyn Any) -> Slot<&dyn NodeObject>,
    pub(crate) get_mut: fn(&mut dyn Any) -> Slot<&mut dyn NodeObject>,
}

impl NodeOps {
    fn of<T: NodeObject>() -> Self {
        Self {
            get: node_slot::<T>,
            get_mut: node_slot_mut::<T>,
        }
    }
}

/// Identity and operations of `Vec<T>`, prepared on the element's [`TypeInfo`].
#[derive(Clone, Copy)]
struct VecInfo {
    type_id: TypeId,
    type_name: &'static str,
    ops: ValueOps,
}

impl VecInfo {
    fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<Vec<T>>(),
            type_name: type_name::<Vec<T>>(),
            ops: ValueOps::of_vec::<T>(),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Describes how one Rust type takes part in config binding.
///
/// # Example
///
/// ```
/// use cfgnode_bind::types::TypeInfo;
///
/// let ints = TypeInfo::list(TypeInfo::value::<i32>());
/// assert!(ints.is_list());
/// assert_eq!(ints.element().unwrap().type_id(), std::any::TypeId::of::<i32>());
/// ```
#[derive(Clone)]
pub struct TypeInfo {
    type_id: TypeId,
    type_name: &'static str,
    attachable: bool,
    storage_compatible: bool,
    constructor: Option<fn() -> Box<dyn Any>>,
    pub(crate) ops: ValueOps,
    pub(crate) node_ops: Option<NodeOps>,
    vec: Option<VecInfo>,
    element: Option<Box<TypeInfo>>,
}

impl TypeInfo {
    fn base<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            attachable: false,
            storage_compatible: true,
            constructor: None,
            ops: ValueOps::of::<T>(),
            node_ops: None,
            vec: Some(VecInfo::of::<T>()),
            element: None,
        }
    }

    /// A leaf type, converted to and from strings by the
    /// [`ParseRegistry`](crate::convert::ParseRegistry).
    pub fn value<T: Any>() -> Self {
        Self::base::<T>()
    }

    /// A type that loads itself from a child node and is created with `T::default()`.
    pub fn node<T: NodeObject + Default>() -> Self {
        Self {
            constructor: Some(|| Box::new(T::default()) as Box<dyn Any>),
            node_ops: Some(NodeOps::of::<T>()),
            ..Self::base::<T>()
        }
    }

    /// A node type with no zero-argument constructor.
    ///
    /// Such a field can only be loaded in place; the engine cannot create new instances.
    pub fn node_without_default<T: NodeObject>() -> Self {
        Self {
            node_ops: Some(NodeOps::of::<T>()),
            ..Self::base::<T>()
        }
    }

    /// A node type that must be created by the
    /// [`InstanceFactory`](crate::factory::InstanceFactory) and attached to the host's
    /// container instead of being constructed freely.
    pub fn component<T: NodeObject>() -> Self {
        Self {
            attachable: true,
            node_ops: Some(NodeOps::of::<T>()),
            ..Self::base::<T>()
        }
    }

    /// `Vec<E>` where `E` is described by `element`.
    pub fn list(element: TypeInfo) -> Self {
        let (type_id, type_name, ops) = match element.vec {
            Some(vec) => (vec.type_id, vec.type_name, vec.ops),
            // Nested lists have no prepared `Vec` operations; every access mismatches.
            None => (TypeId::of::<()>(), "nested list", ValueOps::of::<()>()),
        };
        Self {
            type_id,
            type_name,
            attachable: false,
            storage_compatible: element.storage_compatible,
            constructor: None,
            ops,
            node_ops: None,
            vec: None,
            element: Some(Box::new(element)),
        }
    }

    /// Marks the type as unable to survive being stored and copied by its host.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.storage_compatible = false;
        if let Some(element) = self.element.as_deref_mut() {
            element.storage_compatible = false;
        }
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The last path segment of the type name, for messages.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    pub fn is_attachable(&self) -> bool {
        self.attachable
    }

    pub fn is_storage_compatible(&self) -> bool {
        self.storage_compatible
    }

    pub fn has_node_capability(&self) -> bool {
        self.node_ops.is_some()
    }

    pub fn is_list(&self) -> bool {
        self.element.is_some()
    }

    pub fn element(&self) -> Option<&TypeInfo> {
        self.element.as_deref()
    }

    /// The zero-argument constructor, if the type has one.
    pub fn constructor(&self) -> Option<fn() -> Box<dyn Any>> {
        self.constructor
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_name", &self.type_name)
            .field("attachable", &self.attachable)
            .field("storage_compatible", &self.storage_compatible)
            .field("node", &self.node_ops.is_some())
            .field("constructor", &self.constructor.is_some())
            .field("element", &self.element)
            .finish()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

// -----------------------------------------------------------------------------
// Fields

/// Binding options declared on a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigField {
    /// Whether the field also takes part in the persistence pass.
    pub persistent: bool,
    /// Key used in the config tree. `None` or empty means the field name.
    pub config_name: Option<String>,
}

/// The declaration of one bindable field of the host type `H`.
pub struct FieldDef<H> {
    name: &'static str,
    options: ConfigField,
    type_info: TypeInfo,
    get: fn(&H) -> &dyn Any,
    get_mut: fn(&mut H) -> &mut dyn Any,
}

impl<H> FieldDef<H> {
    pub fn new(
        name: &'static str,
        type_info: TypeInfo,
        get: fn(&H) -> &dyn Any,
        get_mut: fn(&mut H) -> &mut dyn Any,
    ) -> Self {
        Self {
            name,
            options: ConfigField::default(),
            type_info,
            get,
            get_mut,
        }
    }

    #[must_use]
    pub fn config_name(mut self, config_name: impl Into<String>) -> Self {
        self.options.config_name = Some(config_name.into());
        self
    }

    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.options.persistent = true;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ConfigField) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn options(&self) -> &ConfigField {
        &self.options
    }

    /// The key this field reads and writes, falling back to the field name.
    pub fn key(&self) -> &str {
        match self.options.config_name.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => self.name,
        }
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub(crate) fn get<'h>(&self, owner: &'h H) -> &'h dyn Any {
        (self.get)(owner)
    }

    pub(crate) fn get_mut<'h>(&self, owner: &'h mut H) -> &'h mut dyn Any {
        (self.get_mut)(owner)
    }
}

impl<H> Clone for FieldDef<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            options: self.options.clone(),
            type_info: self.type_info.clone(),
            get: self.get,
            get_mut: self.get_mut,
        }
    }
}

impl<H> fmt::Debug for FieldDef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("type_info", &self.type_info)
            .finish()
    }
}

/// Declares a [`FieldDef`] whose accessors read `$field` on `$host`.
///
/// ```
/// use cfgnode_bind::{bind_field, types::TypeInfo};
///
/// struct Engine {
///     thrust: f64,
/// }
///
/// let def = bind_field!(Engine, thrust, TypeInfo::value::<f64>()).config_name("maxThrust");
/// assert_eq!(def.key(), "maxThrust");
/// ```
#[macro_export]
macro_rules! bind_field {
    ($host:ty, $field:ident, $info:expr) => {
        $crate::types::FieldDef::<$host>::new(
            stringify!($field),
            $info,
            |host| &host.$field,
            |host| &mut host.$field,
        )
    };
}
