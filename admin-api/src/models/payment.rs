use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use super::{Resource, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePayment {
    pub tenant_id: Uuid,
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePayment {
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Resource for Payment {
    const TABLE: &'static str = "payments";
    const LABEL: &'static str = "payments";
    const RESOURCE_TYPE: ResourceType = ResourceType::Payment;
    const ORDER_BY: &'static str = "due_date";
    const PROPERTY_SCOPED: bool = true;

    type Create = CreatePayment;
    type Update = UpdatePayment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn before_update(patch: &mut Map<String, Value>) {
        // Marking a payment paid without a timestamp records it as paid now.
        let marks_paid = patch.get("status").and_then(Value::as_str) == Some("paid");
        if marks_paid && !patch.contains_key("paid_at") {
            patch.insert("paid_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_marking_paid_stamps_paid_at() {
        let mut patch = json!({ "status": "paid" }).as_object().cloned().unwrap();
        Payment::before_update(&mut patch);
        assert!(patch.get("paid_at").and_then(Value::as_str).is_some());

        let mut patch = json!({ "status": "overdue" }).as_object().cloned().unwrap();
        Payment::before_update(&mut patch);
        assert!(!patch.contains_key("paid_at"));
    }
}
