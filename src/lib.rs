pub mod api;
pub mod convert;
pub mod error;
pub mod factory;
pub mod field;
pub mod host;
pub mod lexer;
pub mod list;
pub mod node;
pub mod parser;
pub mod types;
pub mod utils;
mod serialization;

pub use api::{load_object, parse, read_config_file, save_object, Binder};
pub use error::{BindError, CfgError, ParserError};
pub use field::ConfigFieldInfo;
pub use host::{ConfigHost, FieldList, SavePass};
pub use list::ListFieldInfo;
pub use node::{ConfigNode, ConfigValueEntry};
pub use serialization::Value;
pub use types::{ConfigField, FieldDef, NodeObject, TypeInfo};
