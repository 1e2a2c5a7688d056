//! Filter, ordering and paging options for table requests.
//!
//! These render to PostgREST query parameters (`status=eq.active`,
//! `order=created_at.desc`, `limit=20`) and can also be evaluated against
//! in-memory JSON rows.

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive pattern; `*` matches any run of characters.
    ILike,
    /// `null`, `true` or `false`.
    Is,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::ILike => "ilike",
            FilterOp::Is => "is",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// Conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, op: FilterOp, value: impl ToString) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.with(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.with(column, FilterOp::Neq, value)
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.with(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.with(column, FilterOp::Lt, value)
    }

    pub fn ilike(self, column: &str, pattern: impl ToString) -> Self {
        self.with(column, FilterOp::ILike, pattern)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.with(column, FilterOp::Is, "null")
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        self.conditions
            .iter()
            .map(|c| (c.column.clone(), format!("{}.{}", c.op.as_str(), c.value)))
            .collect()
    }

    /// Evaluate the filter against a JSON object row.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|c| {
            let field = row.get(&c.column).unwrap_or(&Value::Null);
            match c.op {
                FilterOp::Eq => scalar_text(field).as_deref() == Some(c.value.as_str()),
                FilterOp::Neq => scalar_text(field).as_deref() != Some(c.value.as_str()),
                FilterOp::Gt => compare_scalar(field, &c.value) == Some(Ordering::Greater),
                FilterOp::Gte => matches!(
                    compare_scalar(field, &c.value),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                FilterOp::Lt => compare_scalar(field, &c.value) == Some(Ordering::Less),
                FilterOp::Lte => matches!(
                    compare_scalar(field, &c.value),
                    Some(Ordering::Less | Ordering::Equal)
                ),
                FilterOp::ILike => scalar_text(field)
                    .map(|text| glob_match(&c.value.to_lowercase(), &text.to_lowercase()))
                    .unwrap_or(false),
                FilterOp::Is => match c.value.as_str() {
                    "null" => field.is_null(),
                    "true" => field.as_bool() == Some(true),
                    "false" => field.as_bool() == Some(false),
                    _ => false,
                },
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub columns: Option<String>,
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filter = self.filter.eq(column, value);
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        )];
        params.extend(self.filter.to_params());

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Apply filter, ordering and limit to in-memory rows.
    pub fn apply(&self, rows: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let mut out: Vec<Value> = rows.into_iter().filter(|r| self.filter.matches(r)).collect();

        for order in self.order.iter().rev() {
            out.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

/// Render a query string from `(key, value)` pairs, percent-encoding values.
pub fn encode_params(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn compare_scalar(field: &Value, literal: &str) -> Option<Ordering> {
    match field {
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            let rhs = literal.parse::<f64>().ok()?;
            lhs.partial_cmp(&rhs)
        }
        Value::String(s) => Some(s.as_str().cmp(literal)),
        _ => None,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        // nulls sort last ascending, like Postgres
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params() {
        let query = Query::new()
            .eq("property_id", "p-1")
            .order("created_at", false)
            .limit(20);

        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("property_id".to_string(), "eq.p-1".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_params_escapes_values() {
        let params = Query::new()
            .filter(Filter::new().ilike("name", "*ann marie*"))
            .to_params();
        assert_eq!(encode_params(&params), "select=%2A&name=ilike.%2Aann%20marie%2A");
    }

    #[test]
    fn test_filter_matches_rows() {
        let row = json!({ "status": "active", "amount": 150.0, "room_id": null, "name": "Budi Santoso" });

        assert!(Filter::new().eq("status", "active").matches(&row));
        assert!(!Filter::new().eq("status", "inactive").matches(&row));
        assert!(Filter::new().gte("amount", 100).matches(&row));
        assert!(!Filter::new().lt("amount", 100).matches(&row));
        assert!(Filter::new().is_null("room_id").matches(&row));
        assert!(Filter::new().ilike("name", "*SANTO*").matches(&row));
        assert!(!Filter::new().ilike("name", "santo*").matches(&row));
    }

    #[test]
    fn test_apply_orders_descending_with_limit() {
        let rows = vec![
            json!({ "id": 1, "created_at": "2024-01-01T00:00:00Z" }),
            json!({ "id": 2, "created_at": "2024-03-01T00:00:00Z" }),
            json!({ "id": 3, "created_at": "2024-02-01T00:00:00Z" }),
        ];

        let out = Query::new().order("created_at", false).limit(2).apply(rows);
        let ids: Vec<i64> = out.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
