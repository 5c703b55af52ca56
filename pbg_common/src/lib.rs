mod helpers;
mod money;
mod secret;

pub use helpers::parse_boolean_flag;
pub use money::{Money, MoneyConversionError};
pub use secret::Secret;
