use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Resource, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Trial,
    Active,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub property_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubscription {
    pub property_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default)]
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Resource for Subscription {
    const TABLE: &'static str = "subscriptions";
    const LABEL: &'static str = "subscriptions";
    const RESOURCE_TYPE: ResourceType = ResourceType::Subscription;
    const PROPERTY_SCOPED: bool = false;

    type Create = CreateSubscription;
    type Update = UpdateSubscription;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub max_rooms: Option<i32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl SubscriptionPlan {
    /// Price normalised to one month.
    pub fn monthly_price(&self) -> f64 {
        match self.billing_period {
            BillingPeriod::Monthly => self.price,
            BillingPeriod::Yearly => self.price / 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubscriptionPlan {
    #[validate(length(min = 1, message = "Plan name is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    pub billing_period: BillingPeriod,
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rooms: Option<i32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSubscriptionPlan {
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<BillingPeriod>,
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rooms: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Resource for SubscriptionPlan {
    const TABLE: &'static str = "subscription_plans";
    const LABEL: &'static str = "subscription plans";
    const RESOURCE_TYPE: ResourceType = ResourceType::SubscriptionPlan;
    const ORDER_BY: &'static str = "price";
    const ORDER_ASCENDING: bool = true;
    const PROPERTY_SCOPED: bool = false;

    type Create = CreateSubscriptionPlan;
    type Update = UpdateSubscriptionPlan;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yearly_plan_is_spread_over_twelve_months() {
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Pro".into(),
            price: 1_200_000.0,
            billing_period: BillingPeriod::Yearly,
            max_rooms: Some(50),
            features: vec![],
            is_active: true,
            created_at: Utc::now(),
        };
        assert_eq!(plan.monthly_price(), 100_000.0);

        let monthly = SubscriptionPlan {
            billing_period: BillingPeriod::Monthly,
            ..plan
        };
        assert_eq!(monthly.monthly_price(), 1_200_000.0);
    }
}
