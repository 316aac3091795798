//! Message resolution and formatting.
//!
//! [`MessageFormat`] compiles a message once and formats it against
//! arguments. Expressions resolve through a [`FunctionRegistry`] to
//! [`MessageValue`](crate::types::MessageValue)s, `.match` messages pick a
//! variant, and every runtime error is reported to a callback while the
//! failing placeholder renders as a fallback.

mod context;
mod direction;
mod error;
mod evaluator;
mod message_format;
mod plural;
mod registry;
mod select;

pub use direction::locale_direction;
pub use error::{
    MessageError, ResolutionError, ResolutionErrorKind, SelectionError, SelectionErrorKind,
    compute_suggestions,
};
pub use message_format::{BidiIsolation, LocaleMatcher, MessageFormat, MessageFormatOptions};
pub use plural::plural_category;
pub use registry::{
    FunctionContext, FunctionOptions, FunctionRegistry, FunctionResult, MessageFunction,
};
