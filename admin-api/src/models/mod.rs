mod audit_log;
mod backoffice_user;
mod maintenance;
mod notification;
mod payment;
mod property;
mod room;
mod settings;
mod subscription;
mod tenant;

pub use audit_log::{AuditAction, AuditEntry, ResourceType};
pub use backoffice_user::{
    BackofficeRole, BackofficeStatus, BackofficeUser, CreateBackofficeUser, NewBackofficeUser,
    UpdateStatus, UserAction,
};
pub use maintenance::{
    CreateMaintenanceRequest, MaintenancePriority, MaintenanceRequest, MaintenanceStatus,
    UpdateMaintenanceRequest,
};
pub use notification::{CreateNotification, Notification, NotificationKind, UpdateNotification};
pub use payment::{CreatePayment, Payment, PaymentStatus, UpdatePayment};
pub use property::{CreateProperty, Property, UpdateProperty};
pub use room::{CreateRoom, Room, RoomStatus, UpdateRoom};
pub use settings::{PropertySettings, UpdateSettings};
pub use subscription::{
    BillingPeriod, CreateSubscription, CreateSubscriptionPlan, Subscription, SubscriptionPlan,
    SubscriptionStatus, UpdateSubscription, UpdateSubscriptionPlan,
};
pub use tenant::{CreateTenant, Tenant, TenantStatus, UpdateTenant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// A table-backed record managed through the generic CRUD pages.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Plural noun used in page banners, e.g. "Failed to load tenants"
    const LABEL: &'static str;
    const RESOURCE_TYPE: ResourceType;
    const ORDER_BY: &'static str = "created_at";
    const ORDER_ASCENDING: bool = false;
    /// Rows carry a `property_id` and are only visible under that property
    const PROPERTY_SCOPED: bool;

    type Create: DeserializeOwned + Serialize + Validate + Send + Sync;
    type Update: DeserializeOwned + Serialize + Validate + Send + Sync;

    fn id(&self) -> Uuid;

    /// Adjust a patch before it is sent, e.g. to stamp derived columns.
    fn before_update(_patch: &mut Map<String, Value>) {}
}
