mod message_value;
mod part;
mod value;

pub use message_value::{Direction, FallbackValue, FunctionInput, MessageValue, UnknownValue};
pub use part::{MessagePart, NumberPart, NumberPartKind};
pub use value::Value;
