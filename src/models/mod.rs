pub mod field;
pub mod field_value;

pub use field::ClimateField;
pub use field_value::FieldValue;
