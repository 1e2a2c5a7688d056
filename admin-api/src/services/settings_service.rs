use supabase_client::{Filter, Table};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PropertySettings, UpdateSettings};
use crate::AppState;

pub struct SettingsService {
    settings: Table<PropertySettings>,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        Self {
            settings: Table::new(state.tables.clone(), "property_settings"),
        }
    }

    /// Stored settings, or the defaults when the property never saved any.
    pub async fn get(&self, property_id: Uuid) -> Result<PropertySettings> {
        let stored = self
            .settings
            .find(Filter::new().eq("property_id", property_id))
            .await?;
        Ok(stored.unwrap_or_else(|| PropertySettings::defaults(property_id)))
    }

    pub async fn save(&self, property_id: Uuid, input: UpdateSettings) -> Result<PropertySettings> {
        let settings = input.into_settings(property_id);
        Ok(self.settings.upsert(&settings, "property_id").await?)
    }
}
