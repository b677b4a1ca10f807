mod rupees;

pub mod helpers;
pub mod op;
mod secret;

pub use rupees::{Rupees, RupeesConversionError, NPR_CURRENCY_CODE, NPR_CURRENCY_CODE_LOWER};
pub use secret::Secret;
