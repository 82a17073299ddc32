use crate::api::Binder;
use crate::error::BindError;
use crate::factory::ContainerId;
use crate::field::ConfigFieldInfo;
use crate::list::ListFieldInfo;
use crate::node::ConfigNode;
use crate::types::FieldDef;
use log::debug;

/// A type whose fields are bound to a [`ConfigNode`].
pub trait ConfigHost: Sized + 'static {
    /// The bindable fields, in the order they are loaded and saved.
    fn config_fields() -> FieldList<Self>;

    /// The container that component fields are attached to.
    fn container(&self) -> Option<ContainerId> {
        None
    }
}

/// Which fields a save writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavePass {
    /// Every field.
    #[default]
    Config,
    /// Only fields declared `persistent`.
    Persistence,
}

impl SavePass {
    fn includes<H>(self, def: &FieldDef<H>) -> bool {
        match self {
            SavePass::Config => true,
            SavePass::Persistence => def.options().persistent,
        }
    }
}

/// The ordered field declarations of a host type.
pub struct FieldList<H> {
    fields: Vec<FieldDef<H>>,
}

impl<H> Default for FieldList<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> FieldList<H> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, def: FieldDef<H>) -> Self {
        self.fields.push(def);
        self
    }

    pub fn add(&mut self, def: FieldDef<H>) -> &mut Self {
        self.fields.push(def);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDef<H>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks a field up by its Rust name.
    pub fn get(&self, name: &str) -> Option<&FieldDef<H>> {
        self.fields.iter().find(|def| def.name() == name)
    }
}

impl<'a, H> IntoIterator for &'a FieldList<H> {
    type Item = &'a FieldDef<H>;
    type IntoIter = std::slice::Iter<'a, FieldDef<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<H: ConfigHost> FieldList<H> {
    /// Loads every field of `owner` from `node`, in declaration order.
    ///
    /// # Errors
    /// The first failing field, wrapped in [`BindError::Field`].
    pub fn load_fields(
        &self,
        owner: &mut H,
        node: &ConfigNode,
        binder: &mut Binder,
    ) -> Result<(), BindError> {
        for def in &self.fields {
            load_field(def, owner, node, binder).map_err(|err| err.in_field(def.name()))?;
        }
        Ok(())
    }

    /// Writes the fields selected by `pass` into `node`, in declaration order.
    ///
    /// `pass` is visible to nested objects through [`Binder::save_pass`] while the
    /// fields are written.
    ///
    /// # Errors
    /// The first failing field, wrapped in [`BindError::Field`].
    pub fn save_fields(
        &self,
        owner: &H,
        node: &mut ConfigNode,
        binder: &mut Binder,
        pass: SavePass,
    ) -> Result<(), BindError> {
        let outer = binder.replace_save_pass(pass);
        let result = self
            .fields
            .iter()
            .filter(|def| pass.includes(def))
            .try_for_each(|def| {
                save_field(def, owner, node, binder).map_err(|err| err.in_field(def.name()))
            });
        binder.replace_save_pass(outer);
        result
    }
}

fn load_field<H: ConfigHost>(
    def: &FieldDef<H>,
    owner: &mut H,
    node: &ConfigNode,
    binder: &mut Binder,
) -> Result<(), BindError> {
    if !def.type_info().is_list() {
        return ConfigFieldInfo::new(def, binder.registry()).parse_from(owner, node, binder);
    }

    let info = ListFieldInfo::new(def, owner, binder.registry())?;
    if info.is_config_node_type() {
        let nodes = node.get_nodes(info.config_name());
        info.parse_nodes(owner, &nodes, binder)
    } else {
        let values = node.get_values(info.config_name());
        info.parse_values(owner, &values, binder.registry())
    }
}

fn save_field<H: ConfigHost>(
    def: &FieldDef<H>,
    owner: &H,
    node: &mut ConfigNode,
    binder: &mut Binder,
) -> Result<(), BindError> {
    if !def.type_info().is_list() {
        return ConfigFieldInfo::new(def, binder.registry()).format_into(owner, node, binder);
    }

    let info = ListFieldInfo::new(def, owner, binder.registry())?;
    if info.is_config_node_type() {
        for child in info.format_nodes(owner, binder)? {
            node.add_node(child);
        }
    } else {
        for value in info.format_values(owner, binder.registry())? {
            node.add_value(info.config_name(), value);
        }
    }
    debug!("Saved field `{}` as `{}`", def.name(), def.key());
    Ok(())
}

/// Loads `owner` through its declared fields.
///
/// # Errors
/// See [`FieldList::load_fields`].
pub fn load_fields<H: ConfigHost>(
    owner: &mut H,
    node: &ConfigNode,
    binder: &mut Binder,
) -> Result<(), BindError> {
    H::config_fields().load_fields(owner, node, binder)
}

/// Saves `owner` through its declared fields.
///
/// # Errors
/// See [`FieldList::save_fields`].
pub fn save_fields<H: ConfigHost>(
    owner: &H,
    node: &mut ConfigNode,
    binder: &mut Binder,
    pass: SavePass,
) -> Result<(), BindError> {
    H::config_fields().save_fields(owner, node, binder, pass)
}

/// Implements [`NodeObject`](crate::types::NodeObject) for a [`ConfigHost`] by loading
/// and saving its declared fields, so hosts can nest inside each other. A nested host
/// saves with the pass of its enclosing save.
///
/// ```
/// use cfgnode_bind::host::{ConfigHost, FieldList};
/// use cfgnode_bind::types::TypeInfo;
/// use cfgnode_bind::{bind_field, impl_node_object};
///
/// #[derive(Default)]
/// struct Engine {
///     thrust: f64,
/// }
///
/// impl ConfigHost for Engine {
///     fn config_fields() -> FieldList<Self> {
///         FieldList::new().with(bind_field!(Engine, thrust, TypeInfo::value::<f64>()))
///     }
/// }
///
/// impl_node_object!(Engine);
///
/// let engine_type = TypeInfo::node::<Engine>();
/// assert!(engine_type.has_node_capability());
/// ```
#[macro_export]
macro_rules! impl_node_object {
    ($host:ty) => {
        impl $crate::types::NodeObject for $host {
            fn load(
                &mut self,
                node: &$crate::node::ConfigNode,
                binder: &mut $crate::api::Binder,
            ) -> ::std::result::Result<(), $crate::error::BindError> {
                $crate::host::load_fields(self, node, binder)
            }

            fn save(
                &self,
                node: &mut $crate::node::ConfigNode,
                binder: &mut $crate::api::Binder,
            ) -> ::std::result::Result<(), $crate::error::BindError> {
                let pass = binder.save_pass();
                $crate::host::save_fields(self, node, binder, pass)
            }
        }
    };
}
