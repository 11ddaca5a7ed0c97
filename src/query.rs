use crate::model::CollectionRef;
use crate::value::FieldValue;

/// Comparison applied by a field filter. Interpretation is entirely the
/// store implementation's concern; the adapter only forwards descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// A single field comparison within a query.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    field: String,
    operator: FilterOperator,
    value: FieldValue,
}

impl FieldFilter {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

#[derive(Clone, Debug)]
pub struct OrderBy {
    field: String,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// Describes a set of documents: a collection plus optional filter, order
/// and limit predicates. Built by the caller, forwarded opaquely to the
/// store capability.
#[derive(Clone, Debug)]
pub struct QueryDescriptor {
    collection: CollectionRef,
    filters: Vec<FieldFilter>,
    order_by: Vec<OrderBy>,
    limit: Option<u32>,
}

impl QueryDescriptor {
    pub fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn where_field(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: FieldValue,
    ) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            operator,
            value,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn result_order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn result_limit(&self) -> Option<u32> {
        self.limit
    }
}
