/// Strips the module path and generic arguments from a `std::any::type_name` string,
/// so `alloc::vec::Vec<my_mod::Part>` becomes `Vec`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// The short name of `T`, used to identify host objects in error messages.
pub fn short_name_of<T: ?Sized>() -> &'static str {
    short_type_name(std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::vec::Vec<my_mod::Part>"), "Vec");
        assert_eq!(short_type_name("u8"), "u8");
        assert_eq!(short_type_name("a::b::Tank"), "Tank");
    }

    #[test]
    fn test_short_name_of() {
        assert_eq!(short_name_of::<String>(), "String");
    }
}
