use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::value::FieldMap;

/// Failure produced by a [`DataConverter`] while encoding or decoding.
#[derive(Debug)]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "conversion failed: {}", self.message)
    }
}

impl Error for ConvertError {}

/// Converts between user models and raw field maps.
///
/// This is the adapter's only serialization boundary: reads use
/// `from_fields`, writes use `to_fields`, and the caller chooses the model
/// type. The adapter never inspects model contents.
pub trait DataConverter: Send + Sync + 'static {
    type Model;

    fn to_fields(&self, value: &Self::Model) -> Result<FieldMap, ConvertError>;

    fn from_fields(&self, fields: &FieldMap) -> Result<Self::Model, ConvertError>;
}

/// Converter that surfaces raw field maps unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughConverter;

impl DataConverter for PassthroughConverter {
    type Model = FieldMap;

    fn to_fields(&self, value: &Self::Model) -> Result<FieldMap, ConvertError> {
        Ok(value.clone())
    }

    fn from_fields(&self, fields: &FieldMap) -> Result<Self::Model, ConvertError> {
        Ok(fields.clone())
    }
}
