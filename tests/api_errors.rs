// API error path tests
// These test binding errors as they surface through the public API

use cfgnode_bind::factory::{ComponentFactory, ContainerId, InstanceFactory};
use cfgnode_bind::host::{ConfigHost, FieldList};
use cfgnode_bind::types::{NodeObject, TypeInfo};
use cfgnode_bind::{
    bind_field, load_object, parse, save_object, BindError, Binder, CfgError, ConfigNode,
    ListFieldInfo, SavePass,
};

struct Fixed {
    id: u32,
}

impl NodeObject for Fixed {
    fn load(&mut self, node: &ConfigNode, binder: &mut Binder) -> Result<(), BindError> {
        if let Some(id) = node.get_value("id") {
            self.id = binder.registry().parse_as(id)?;
        }
        Ok(())
    }

    fn save(&self, node: &mut ConfigNode, _: &mut Binder) -> Result<(), BindError> {
        node.add_value("id", self.id.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Light;

impl NodeObject for Light {
    fn load(&mut self, _: &ConfigNode, _: &mut Binder) -> Result<(), BindError> {
        Ok(())
    }

    fn save(&self, _: &mut ConfigNode, _: &mut Binder) -> Result<(), BindError> {
        Ok(())
    }
}

#[derive(Default)]
struct Host {
    count: u8,
    tags: Option<Vec<String>>,
    fixed: Option<Fixed>,
    light: Option<Light>,
}

impl ConfigHost for Host {
    fn config_fields() -> FieldList<Self> {
        FieldList::new()
            .with(bind_field!(Host, count, TypeInfo::value::<u8>()))
            .with(bind_field!(Host, tags, TypeInfo::list(TypeInfo::value::<String>())).config_name("tag"))
            .with(bind_field!(Host, fixed, TypeInfo::node_without_default::<Fixed>()).config_name("FIXED"))
            .with(bind_field!(Host, light, TypeInfo::component::<Light>()).config_name("LIGHT"))
    }
}

struct ListHost {
    fixed_list: Vec<Fixed>,
}

impl ConfigHost for ListHost {
    fn config_fields() -> FieldList<Self> {
        FieldList::new().with(
            bind_field!(ListHost, fixed_list, TypeInfo::list(TypeInfo::node_without_default::<Fixed>()))
                .config_name("FIXED"),
        )
    }
}

fn host_with_tags() -> Host {
    Host {
        tags: Some(Vec::new()),
        ..Host::default()
    }
}

fn load(source: &str, host: &mut Host) -> Result<(), BindError> {
    let root = parse(source, "test.cfg").unwrap();
    load_object(host, &root, &mut Binder::new())
}

#[test]
fn test_api_conversion_error_is_wrapped_with_field() {
    let mut host = host_with_tags();
    let err = load("count = 300\n", &mut host).unwrap_err();
    match &err {
        BindError::Field { field, source } => {
            assert_eq!(field, "count");
            assert!(matches!(**source, BindError::Conversion { .. }));
        }
        other => panic!("Expected a field error, got {:?}", other),
    }
    assert_eq!(host.count, 0);
}

#[test]
fn test_api_null_collection() {
    let mut host = Host::default();
    let err = load("tag = a\n", &mut host).unwrap_err();
    assert_eq!(
        err.root_cause(),
        &BindError::NullCollection {
            field: "tags".to_string(),
            owner: "Host".to_string(),
        }
    );
}

#[test]
fn test_api_missing_constructor_on_demand() {
    let mut host = host_with_tags();
    // No FIXED node, nothing to construct.
    assert!(load("count = 1\n", &mut host).is_ok());

    let err = load("FIXED { id = 3 }\n", &mut host).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BindError::MissingConstructor { type_name, .. } if type_name == "Fixed"
    ));

    host.fixed = Some(Fixed { id: 0 });
    load("FIXED { id = 3 }\n", &mut host).unwrap();
    assert_eq!(host.fixed.as_ref().map(|f| f.id), Some(3));
}

#[test]
fn test_api_missing_constructor_for_list_is_eager() {
    let fields = ListHost::config_fields();
    let host = ListHost {
        fixed_list: Vec::new(),
    };
    let err = ListFieldInfo::new(fields.get("fixed_list").unwrap(), &host, Binder::new().registry())
        .unwrap_err();
    assert!(matches!(err, BindError::MissingConstructor { .. }));
}

#[test]
fn test_api_component_without_registration() {
    let mut factory = ComponentFactory::new();
    let err = factory
        .create(&TypeInfo::component::<Light>(), Some(ContainerId(1)))
        .unwrap_err();
    assert!(matches!(err, BindError::UnknownComponent { .. }));
    assert!(factory.attachments().is_empty());
}

#[test]
fn test_api_component_without_container() {
    let mut factory = ComponentFactory::new();
    factory.register_component::<Light>();
    let mut binder = Binder::with_factory(factory);

    let root = parse("LIGHT { }\n", "test.cfg").unwrap();
    let mut host = host_with_tags();
    let err = load_object(&mut host, &root, &mut binder).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BindError::MissingContainer { .. }
    ));
}

#[test]
fn test_api_save_null_collection() {
    let host = Host::default();
    let err = save_object(&host, &mut Binder::new(), SavePass::Config).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BindError::NullCollection { .. }
    ));
}

#[test]
fn test_api_bind_error_converts_to_cfg_error() {
    let err: CfgError = BindError::custom("bad tank").into();
    assert_eq!(err.to_string(), "bad tank");
}

#[test]
fn test_api_list_descriptor_over_scalar_field() {
    let fields = Host::config_fields();
    let host = host_with_tags();
    let err = ListFieldInfo::new(fields.get("count").unwrap(), &host, Binder::new().registry())
        .unwrap_err();
    assert_eq!(
        err,
        BindError::NullCollection {
            field: "count".to_string(),
            owner: "Host".to_string(),
        }
    );
}

#[test]
fn test_api_save_rejects_value_that_cannot_be_read_back() {
    let host = Host {
        tags: Some(vec!["http://example.com/tank".to_string()]),
        ..Host::default()
    };
    let err = save_object(&host, &mut Binder::new(), SavePass::Config).unwrap_err();
    match err.root_cause() {
        BindError::UnrepresentableValue { field, value, .. } => {
            assert_eq!(field, "tags");
            assert_eq!(value, "http://example.com/tank");
        }
        other => panic!("Expected an unrepresentable value error, got {:?}", other),
    }
}
