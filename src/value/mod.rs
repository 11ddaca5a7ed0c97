mod array_value;
mod field_map;
mod json;
mod value;

pub use array_value::ArrayValue;
pub use field_map::FieldMap;
pub use value::{FieldValue, ValueKind};
