//! The default functions: `:string`, `:number` and `:integer`.

mod number;
mod string;

pub use number::{
    Grouping, NumberOptions, NumberSelect, NumberValue, Numeric, SignDisplay, integer, number,
};
pub use string::{StringValue, string};

use crate::interpreter::FunctionRegistry;

/// A registry holding the default functions.
pub fn default_functions() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.insert_fn("string", string);
    registry.insert_fn("number", number);
    registry.insert_fn("integer", integer);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_defaults() {
        let registry = default_functions();
        let names: Vec<&String> = registry.names().collect();
        assert_eq!(names, ["integer", "number", "string"]);
    }
}
