use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySettings {
    pub property_id: Uuid,
    pub currency: String,
    pub payment_due_day: u8,
    pub late_fee: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PropertySettings {
    /// Settings a property has before anything was saved.
    pub fn defaults(property_id: Uuid) -> Self {
        Self {
            property_id,
            currency: "IDR".to_string(),
            payment_due_day: 5,
            late_fee: 0.0,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSettings {
    #[validate(length(equal = 3, message = "Currency must be an ISO 4217 code"))]
    pub currency: String,
    #[validate(range(min = 1, max = 28, message = "Due day must be between 1 and 28"))]
    pub payment_due_day: u8,
    #[validate(range(min = 0.0, message = "Late fee cannot be negative"))]
    pub late_fee: f64,
}

impl UpdateSettings {
    pub fn into_settings(self, property_id: Uuid) -> PropertySettings {
        PropertySettings {
            property_id,
            currency: self.currency.to_uppercase(),
            payment_due_day: self.payment_due_day,
            late_fee: self.late_fee,
            updated_at: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_day_bounds() {
        let input = UpdateSettings {
            currency: "idr".into(),
            payment_due_day: 31,
            late_fee: 0.0,
        };
        assert!(input.validate().is_err());

        let input = UpdateSettings {
            payment_due_day: 10,
            ..input
        };
        assert!(input.validate().is_ok());
        let settings = input.into_settings(Uuid::nil());
        assert_eq!(settings.currency, "IDR");
        assert!(settings.updated_at.is_some());
    }
}
