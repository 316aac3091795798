//! MessageFormat 2 for Rust.
//!
//! The crate is layered bottom-up:
//!
//! - [`parser`] turns message source into a lossless concrete syntax tree
//!   with recoverable errors, or directly into the data model.
//! - [`model`] holds the data model, its validation, traversal and
//!   serialization back to syntax.
//! - [`interpreter`] resolves and formats messages against arguments.
//! - [`functions`] provides the default `:string`, `:number` and `:integer`.
//!
//! ```
//! use mf2::{BidiIsolation, MessageFormat, MessageFormatOptions, args};
//!
//! let source = ".input {$count :number}
//! .match $count
//! one {{You have {$count} message}}
//! *   {{You have {$count} messages}}";
//! let options = MessageFormatOptions::builder()
//!     .bidi_isolation(BidiIsolation::None)
//!     .build();
//! let mf = MessageFormat::with_options(&["en"], source, options).unwrap();
//! assert_eq!(mf.format(&args! { "count" => 1 }), "You have 1 message");
//! assert_eq!(mf.format(&args! { "count" => 42 }), "You have 42 messages");
//! ```

pub mod functions;
pub mod interpreter;
pub mod model;
pub mod parser;
pub mod types;

pub use interpreter::{
    BidiIsolation, FunctionContext, FunctionOptions, FunctionRegistry, FunctionResult,
    LocaleMatcher, MessageError, MessageFormat, MessageFormatOptions, MessageFunction,
    ResolutionError, ResolutionErrorKind, SelectionError, SelectionErrorKind,
};
pub use model::{DataModelError, Message, stringify_message, stringify_message_with, validate};
pub use parser::{ParseOptions, SyntaxError, parse_cst, parse_message};
pub use types::{Direction, FunctionInput, MessagePart, MessageValue, Value};

/// Creates a `HashMap<String, Value>` of message arguments.
///
/// Values are converted via `Into<Value>`, so integers, floats, strings and
/// booleans can be passed directly.
///
/// # Example
///
/// ```
/// use mf2::args;
///
/// let a = args! { "count" => 3, "name" => "Alice" };
/// assert_eq!(a.len(), 2);
/// assert_eq!(a["count"].as_number(), Some(3));
/// assert_eq!(a["name"].as_string(), Some("Alice"));
/// ```
#[macro_export]
macro_rules! args {
    {} => {
        ::std::collections::HashMap::<String, $crate::Value>::new()
    };
    { $($key:expr => $value:expr),+ $(,)? } => {
        {
            let mut map = ::std::collections::HashMap::<String, $crate::Value>::new();
            $(
                map.insert($key.to_string(), ::std::convert::Into::<$crate::Value>::into($value));
            )+
            map
        }
    };
}
