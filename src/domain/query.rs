use crate::domain::model::Entity;

/// Upper bound appended to a prefix to close the range query.
pub const PREFIX_RANGE_END: char = char::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub property: String,
    pub op: FilterOp,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOrder {
    pub property: String,
    pub direction: Direction,
}

/// A single-kind query; filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: String,
    pub filters: Vec<PropertyFilter>,
    pub order: Vec<PropertyOrder>,
    pub limit: Option<usize>,
    pub start_cursor: Option<String>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            start_cursor: None,
        }
    }

    pub fn filter(
        mut self,
        property: impl Into<String>,
        op: FilterOp,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.filters.push(PropertyFilter {
            property: property.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.order.push(PropertyOrder {
            property: property.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_cursor(mut self, cursor: Option<String>) -> Self {
        self.start_cursor = cursor;
        self
    }

    /// `property` in `[prefix, prefix + U+10FFFF)`, ascending.
    pub fn prefix(self, property: &str, range: &PrefixRange) -> Self {
        self.filter(property, FilterOp::GreaterThanOrEqual, range.start.clone())
            .filter(property, FilterOp::LessThan, range.end.clone())
            .order_by(property, Direction::Ascending)
    }
}

/// Half-open lexicographic range covering every string starting with a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRange {
    pub start: String,
    pub end: String,
}

impl PrefixRange {
    pub fn new(prefix: &str) -> Self {
        let mut end = String::with_capacity(prefix.len() + PREFIX_RANGE_END.len_utf8());
        end.push_str(prefix);
        end.push(PREFIX_RANGE_END);
        Self {
            start: prefix.to_string(),
            end,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        value >= self.start.as_str() && value < self.end.as_str()
    }
}

/// One batch of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub entities: Vec<Entity>,
    pub end_cursor: Option<String>,
    pub more_results: bool,
}
