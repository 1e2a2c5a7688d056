use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Property;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedProperty {
    pub id: Uuid,
    pub name: String,
}

impl From<&Property> for SelectedProperty {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            name: property.name.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PropertyContext {
    selected: Option<SelectedProperty>,
}

impl PropertyContext {
    pub fn select(&mut self, property: SelectedProperty) {
        self.selected = Some(property);
    }

    pub fn clear(&mut self) -> Option<SelectedProperty> {
        self.selected.take()
    }

    pub fn current(&self) -> Option<&SelectedProperty> {
        self.selected.as_ref()
    }
}
