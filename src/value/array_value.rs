use crate::value::FieldValue;

/// An ordered sequence of field values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayValue {
    values: Vec<FieldValue>,
}

impl ArrayValue {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order() {
        let array = ArrayValue::new(vec![
            FieldValue::from_integer(2),
            FieldValue::from_integer(1),
        ]);
        assert_eq!(array.values()[0], FieldValue::from_integer(2));
    }
}
