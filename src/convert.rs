use crate::error::BindError;
use crate::types::TypeInfo;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// A type with a bidirectional string form, usable as a config leaf value.
pub trait ConfigValue: Any + Sized {
    /// Parses a config value. The error is a human readable reason.
    fn parse_config(value: &str) -> Result<Self, String>;

    fn format_config(&self) -> String;
}

macro_rules! impl_config_value_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                fn parse_config(value: &str) -> Result<Self, String> {
                    value.trim().parse::<$ty>().map_err(|e| e.to_string())
                }

                fn format_config(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_config_value_from_str!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

impl ConfigValue for bool {
    fn parse_config(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" => Ok(true),
            "false" | "off" | "no" => Ok(false),
            other => Err(format!("`{other}` is not a boolean")),
        }
    }

    fn format_config(&self) -> String {
        self.to_string()
    }
}

impl ConfigValue for char {
    fn parse_config(value: &str) -> Result<Self, String> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err("expected exactly one character".to_string()),
        }
    }

    fn format_config(&self) -> String {
        self.to_string()
    }
}

impl ConfigValue for String {
    fn parse_config(value: &str) -> Result<Self, String> {
        Ok(value.to_string())
    }

    fn format_config(&self) -> String {
        self.clone()
    }
}

#[derive(Clone, Copy)]
struct Converter {
    type_name: &'static str,
    parse: fn(&str) -> Result<Box<dyn Any>, String>,
    format: fn(&dyn Any) -> Option<String>,
}

impl Converter {
    fn of<T: ConfigValue>() -> Self {
        Self {
            type_name: type_name::<T>(),
            parse: |value| T::parse_config(value).map(|v| Box::new(v) as Box<dyn Any>),
            format: |value| value.downcast_ref::<T>().map(T::format_config),
        }
    }
}

/// Maps types to their string converters.
///
/// A field whose type is registered here is bound as a leaf value (`key = value`)
/// rather than as a child node, even if the type could also load itself from a node.
pub struct ParseRegistry {
    converters: HashMap<TypeId, Converter>,
}

impl Default for ParseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseRegistry {
    /// A registry with no converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// A registry with converters for the primitive types.
    ///
    /// - `bool` `char` `String`
    /// - `i8 - i128` `isize`
    /// - `u8 - u128` `usize`
    /// - `f32` `f64`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<String>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry
    }

    /// Registers `T`, replacing any converter it already had.
    pub fn register<T: ConfigValue>(&mut self) -> &mut Self {
        self.converters.insert(TypeId::of::<T>(), Converter::of::<T>());
        self
    }

    #[must_use]
    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.converters.contains_key(&type_id)
    }

    pub fn type_name(&self, type_id: TypeId) -> Option<&'static str> {
        self.converters.get(&type_id).map(|c| c.type_name)
    }

    /// Parses `value` into a boxed instance of `ty`.
    ///
    /// # Errors
    /// [`BindError::UnregisteredType`] if no converter exists,
    /// [`BindError::Conversion`] if the string is malformed.
    pub fn parse(&self, ty: &TypeInfo, value: &str) -> Result<Box<dyn Any>, BindError> {
        self.parse_named(ty.type_id(), ty.type_name(), value)
    }

    /// Typed convenience over [`ParseRegistry::parse`].
    pub fn parse_as<T: Any>(&self, value: &str) -> Result<T, BindError> {
        let boxed = self.parse_named(TypeId::of::<T>(), type_name::<T>(), value)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| unregistered(type_name::<T>()))
    }

    fn parse_named(
        &self,
        type_id: TypeId,
        name: &str,
        value: &str,
    ) -> Result<Box<dyn Any>, BindError> {
        let converter = self
            .converters
            .get(&type_id)
            .ok_or_else(|| unregistered(name))?;
        (converter.parse)(value).map_err(|message| BindError::Conversion {
            type_name: converter.type_name.to_string(),
            value: value.to_string(),
            message,
        })
    }

    /// Formats `value`, a value of the registered type `ty`.
    ///
    /// # Errors
    /// [`BindError::UnregisteredType`] if `value` has no converter.
    pub fn format(&self, ty: &TypeInfo, value: &dyn Any) -> Result<String, BindError> {
        self.format_named(ty.type_name(), value)
    }

    /// Typed convenience over [`ParseRegistry::format`].
    pub fn format_as<T: Any>(&self, value: &T) -> Result<String, BindError> {
        self.format_named(type_name::<T>(), value)
    }

    fn format_named(&self, name: &str, value: &dyn Any) -> Result<String, BindError> {
        self.converters
            .get(&value.type_id())
            .and_then(|c| (c.format)(value))
            .ok_or_else(|| unregistered(name))
    }
}

fn unregistered(type_name: &str) -> BindError {
    BindError::UnregisteredType {
        type_name: type_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Mode {
        Fast,
        Slow,
    }

    impl ConfigValue for Mode {
        fn parse_config(value: &str) -> Result<Self, String> {
            match value {
                "Fast" => Ok(Mode::Fast),
                "Slow" => Ok(Mode::Slow),
                _ => Err(format!("unknown mode `{value}`")),
            }
        }

        fn format_config(&self) -> String {
            format!("{self:?}")
        }
    }

    #[test]
    fn test_primitives_registered() {
        let registry = ParseRegistry::new();
        assert!(registry.is_registered(TypeId::of::<i32>()));
        assert!(registry.is_registered(TypeId::of::<String>()));
        assert!(registry.is_registered(TypeId::of::<f64>()));
        assert!(!registry.is_registered(TypeId::of::<Vec<i32>>()));
        assert!(!ParseRegistry::empty().is_registered(TypeId::of::<i32>()));
    }

    #[test]
    fn test_parse_and_format_integers() {
        let registry = ParseRegistry::new();
        assert_eq!(registry.parse_as::<i32>(" 42 ").unwrap(), 42);
        assert_eq!(registry.format_as(&-7_i64).unwrap(), "-7");
    }

    #[test]
    fn test_float_round_trip() {
        let registry = ParseRegistry::new();
        for s in ["0.1", "1e-7", "12345.678", "-0.5"] {
            let value = registry.parse_as::<f64>(s).unwrap();
            let formatted = registry.format_as(&value).unwrap();
            assert_eq!(registry.parse_as::<f64>(&formatted).unwrap(), value);
        }
    }

    #[test]
    fn test_bool_spellings() {
        let registry = ParseRegistry::new();
        assert!(registry.parse_as::<bool>("True").unwrap());
        assert!(registry.parse_as::<bool>("on").unwrap());
        assert!(!registry.parse_as::<bool>("NO").unwrap());
        assert_eq!(registry.format_as(&true).unwrap(), "true");
    }

    #[test]
    fn test_malformed_input() {
        let registry = ParseRegistry::new();
        let err = registry.parse(&TypeInfo::value::<u8>(), "300").unwrap_err();
        match err {
            BindError::Conversion {
                type_name, value, ..
            } => {
                assert_eq!(type_name, "u8");
                assert_eq!(value, "300");
            }
            other => panic!("Unexpected error {:?}", other),
        }
        assert!(registry.parse_as::<char>("ab").is_err());
    }

    #[test]
    fn test_unregistered_names_the_type() {
        let registry = ParseRegistry::new();
        match registry.format_as(&Mode::Fast) {
            Err(BindError::UnregisteredType { type_name }) => assert!(type_name.ends_with("Mode")),
            other => panic!("Unexpected result {:?}", other),
        }
        match registry.parse(&TypeInfo::value::<Mode>(), "Fast") {
            Err(BindError::UnregisteredType { type_name }) => {
                assert!(type_name.ends_with("Mode"));
                assert!(!type_name.contains("TypeId"));
            }
            other => panic!("Unexpected result {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ParseRegistry::new();
        registry.register::<Mode>();
        assert_eq!(registry.parse_as::<Mode>("Slow").unwrap(), Mode::Slow);
        assert_eq!(registry.format_as(&Mode::Fast).unwrap(), "Fast");
        assert!(registry.parse_as::<Mode>("Medium").is_err());
    }

    #[test]
    fn test_string_is_verbatim() {
        let registry = ParseRegistry::new();
        assert_eq!(registry.parse_as::<String>(" spaced ").unwrap(), " spaced ");
    }
}
