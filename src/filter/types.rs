use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Like,
    ILike,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Like => "LIKE",
            FilterOp::ILike => "ILIKE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

/// A WHERE predicate tree. Top-level conditions are joined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Field(FilterWhereInfo),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn eq(column: impl Into<String>, data: impl Into<Value>) -> Self {
        Condition::Field(FilterWhereInfo { column: column.into(), operator: FilterOp::Eq, data: data.into() })
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Field(FilterWhereInfo {
            column: column.into(),
            operator: FilterOp::Like,
            data: Value::String(pattern.into()),
        })
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Field(FilterWhereInfo {
            column: column.into(),
            operator: FilterOp::ILike,
            data: Value::String(pattern.into()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
