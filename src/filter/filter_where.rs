use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render top-level conditions joined with AND. Placeholders are numbered
    /// from `starting_param_index + 1`.
    pub fn generate(conditions: &[Condition], starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(filter_where.build(condition)?);
        }
        let where_clause = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    fn build(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::Field(info) => self.build_sql_condition(info),
            Condition::Or(children) => self.build_or(children),
        }
    }

    fn build_or(&mut self, children: &[Condition]) -> Result<String, FilterError> {
        if children.is_empty() {
            return Ok("1=0".to_string());
        }
        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            parts.push(self.build(child)?);
        }
        Ok(format!("({})", parts.join(" OR ")))
    }

    fn build_sql_condition(&mut self, info: &FilterWhereInfo) -> Result<String, FilterError> {
        validate_column(&info.column)?;
        let quoted_column = format!("\"{}\"", info.column);
        match &info.data {
            Value::Null => Ok(format!("{} IS NULL", quoted_column)),
            Value::Array(_) | Value::Object(_) => Err(FilterError::InvalidOperatorData(format!(
                "{} expects a scalar value for column {}",
                info.operator.to_sql(),
                info.column
            ))),
            data => {
                let placeholder = self.param(data.clone());
                Ok(format!("{} {} {}", quoted_column, info.operator.to_sql(), placeholder))
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
    let mut chars = column.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
    }
    Ok(())
}

/// `%needle%` with LIKE metacharacters escaped (Postgres default escape `\`).
pub fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
