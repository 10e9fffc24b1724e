mod val;

pub use val::{Val, ValConversionError};
