use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{Resource, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub property_id: Uuid,
    pub number: String,
    #[serde(default)]
    pub room_type: Option<String>,
    pub monthly_rate: f64,
    #[serde(default)]
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoom {
    #[validate(length(min = 1, message = "Room number is required"))]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[validate(range(min = 0.0, message = "Monthly rate cannot be negative"))]
    pub monthly_rate: f64,
    #[serde(default)]
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRoom {
    #[validate(length(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[validate(range(min = 0.0))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
}

impl Resource for Room {
    const TABLE: &'static str = "rooms";
    const LABEL: &'static str = "rooms";
    const RESOURCE_TYPE: ResourceType = ResourceType::Room;
    const ORDER_BY: &'static str = "number";
    const ORDER_ASCENDING: bool = true;
    const PROPERTY_SCOPED: bool = true;

    type Create = CreateRoom;
    type Update = UpdateRoom;

    fn id(&self) -> Uuid {
        self.id
    }
}
