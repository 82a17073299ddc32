use crate::error::BindError;
use crate::types::TypeInfo;
use log::trace;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Identifies the container a host object lives in.
///
/// Container-attachable element types are created as parts of this container rather
/// than as free-standing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Lets a boxed factory be inspected as its concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates new instances of node types on behalf of the binding descriptors.
pub trait InstanceFactory: AsAny {
    /// Creates a new `ty`, attached to `parent` when the type is container-attachable.
    ///
    /// # Errors
    /// When the type is unknown to the factory, or an attachable type has no parent.
    fn create(
        &mut self,
        ty: &TypeInfo,
        parent: Option<ContainerId>,
    ) -> Result<Box<dyn Any>, BindError>;
}

/// Records that an instance of `type_name` was attached to `container`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub container: ContainerId,
    pub type_name: &'static str,
}

/// The default [`InstanceFactory`].
///
/// Free-standing types are built with the constructor on their [`TypeInfo`].
/// Attachable types must be registered with [`ComponentFactory::register_component`];
/// every instance created for them is recorded as an [`Attachment`].
#[derive(Default)]
pub struct ComponentFactory {
    components: HashMap<TypeId, fn() -> Box<dyn Any>>,
    attachments: Vec<Attachment>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component<T: Any + Default>(&mut self) -> &mut Self {
        self.components
            .insert(TypeId::of::<T>(), || Box::new(T::default()) as Box<dyn Any>);
        self
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachments_of(&self, container: ContainerId) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(move |a| a.container == container)
    }
}

impl InstanceFactory for ComponentFactory {
    fn create(
        &mut self,
        ty: &TypeInfo,
        parent: Option<ContainerId>,
    ) -> Result<Box<dyn Any>, BindError> {
        if !ty.is_attachable() {
            return ty
                .constructor()
                .map(|construct| construct())
                .ok_or_else(|| BindError::UnknownComponent {
                    type_name: ty.type_name().to_string(),
                });
        }

        let container = parent.ok_or_else(|| BindError::MissingContainer {
            type_name: ty.type_name().to_string(),
        })?;
        let construct =
            self.components
                .get(&ty.type_id())
                .ok_or_else(|| BindError::UnknownComponent {
                    type_name: ty.type_name().to_string(),
                })?;
        let instance = construct();
        trace!("Attached `{}` to container {:?}", ty.short_name(), container);
        self.attachments.push(Attachment {
            container,
            type_name: ty.type_name(),
        });
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Binder;
    use crate::node::ConfigNode;
    use crate::types::NodeObject;

    #[derive(Default)]
    struct Light {
        on: bool,
    }

    impl NodeObject for Light {
        fn load(&mut self, node: &ConfigNode, _: &mut Binder) -> Result<(), BindError> {
            self.on = node.has_value("on");
            Ok(())
        }

        fn save(&self, node: &mut ConfigNode, _: &mut Binder) -> Result<(), BindError> {
            if self.on {
                node.add_value("on", "true");
            }
            Ok(())
        }
    }

    #[test]
    fn test_component_is_attached() {
        let mut factory = ComponentFactory::new();
        factory.register_component::<Light>();
        let ty = TypeInfo::component::<Light>();

        let instance = factory.create(&ty, Some(ContainerId(7))).unwrap();
        assert!(instance.is::<Light>());
        assert_eq!(factory.attachments().len(), 1);
        assert_eq!(factory.attachments_of(ContainerId(7)).count(), 1);
        assert_eq!(factory.attachments_of(ContainerId(8)).count(), 0);
    }

    #[test]
    fn test_component_needs_parent() {
        let mut factory = ComponentFactory::new();
        factory.register_component::<Light>();
        let err = factory
            .create(&TypeInfo::component::<Light>(), None)
            .err()
            .unwrap();
        assert!(matches!(err, BindError::MissingContainer { .. }));
        assert!(factory.attachments().is_empty());
    }

    #[test]
    fn test_unregistered_component() {
        let mut factory = ComponentFactory::new();
        let err = factory
            .create(&TypeInfo::component::<Light>(), Some(ContainerId(1)))
            .err()
            .unwrap();
        assert!(matches!(err, BindError::UnknownComponent { .. }));
    }

    #[test]
    fn test_free_standing_uses_constructor() {
        let mut factory = ComponentFactory::new();
        let instance = factory
            .create(&TypeInfo::node::<Light>(), Some(ContainerId(1)))
            .unwrap();
        assert!(instance.is::<Light>());
        assert!(factory.attachments().is_empty());

        let err = factory
            .create(&TypeInfo::node_without_default::<Light>(), None)
            .err()
            .unwrap();
        assert!(matches!(err, BindError::UnknownComponent { .. }));
    }
}
