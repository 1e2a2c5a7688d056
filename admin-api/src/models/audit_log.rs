use serde::Serialize;
use uuid::Uuid;

#[derive(Debug)]
pub struct AuditEntry {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    Login,
    Logout,
    // Session context
    SelectProperty,
    ClearProperty,
    SwitchMode,
    // Operator management
    CreateOperator,
    ActivateOperator,
    DeactivateOperator,
    DeleteOperator,
    // Records
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    UpdateSettings,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::SelectProperty => "select_property",
            AuditAction::ClearProperty => "clear_property",
            AuditAction::SwitchMode => "switch_mode",
            AuditAction::CreateOperator => "create_operator",
            AuditAction::ActivateOperator => "activate_operator",
            AuditAction::DeactivateOperator => "deactivate_operator",
            AuditAction::DeleteOperator => "delete_operator",
            AuditAction::CreateRecord => "create_record",
            AuditAction::UpdateRecord => "update_record",
            AuditAction::DeleteRecord => "delete_record",
            AuditAction::UpdateSettings => "update_settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Session,
    Operator,
    Property,
    Tenant,
    Room,
    Payment,
    MaintenanceRequest,
    Subscription,
    SubscriptionPlan,
    Notification,
    PropertySettings,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Session => "session",
            ResourceType::Operator => "operator",
            ResourceType::Property => "property",
            ResourceType::Tenant => "tenant",
            ResourceType::Room => "room",
            ResourceType::Payment => "payment",
            ResourceType::MaintenanceRequest => "maintenance_request",
            ResourceType::Subscription => "subscription",
            ResourceType::SubscriptionPlan => "subscription_plan",
            ResourceType::Notification => "notification",
            ResourceType::PropertySettings => "property_settings",
        }
    }
}
