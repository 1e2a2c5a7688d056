use serde_json::Value;
use std::sync::Arc;
use supabase_client::{Filter, Query, Table, TableApi};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Resource;

/// CRUD over one resource table, optionally confined to the rows whose
/// scope column holds one id.
pub struct ResourceService<R: Resource> {
    table: Table<R>,
    scope: Option<(&'static str, Uuid)>,
}

impl<R: Resource> ResourceService<R> {
    /// `property_id` scopes every read and write; `None` sees all rows.
    pub fn new(tables: Arc<dyn TableApi>, property_id: Option<Uuid>) -> Self {
        Self {
            table: Table::new(tables, R::TABLE),
            scope: property_id.map(|id| ("property_id", id)),
        }
    }

    /// Only rows owned by `owner_id`; inserts are stamped with it.
    pub fn owned_by(tables: Arc<dyn TableApi>, owner_id: Uuid) -> Self {
        Self {
            table: Table::new(tables, R::TABLE),
            scope: Some(("owner_id", owner_id)),
        }
    }

    fn scope(&self, filter: Filter) -> Filter {
        match self.scope {
            Some((column, id)) => filter.eq(column, id),
            None => filter,
        }
    }

    fn by_id(&self, id: Uuid) -> Filter {
        self.scope(Filter::new().eq("id", id))
    }

    pub async fn list(&self) -> Result<Vec<R>> {
        let query = Query::new()
            .filter(self.scope(Filter::new()))
            .order(R::ORDER_BY, R::ORDER_ASCENDING);
        Ok(self.table.list(&query).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<R> {
        self.table
            .find(self.by_id(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", R::RESOURCE_TYPE.as_str(), id)))
    }

    pub async fn create(&self, input: &R::Create) -> Result<R> {
        let mut row = serde_json::to_value(input).map_err(anyhow::Error::from)?;
        if let (Some((column, id)), Value::Object(map)) = (self.scope, &mut row) {
            map.insert(column.to_string(), Value::String(id.to_string()));
        }
        Ok(self.table.insert(&row).await?)
    }

    pub async fn update(&self, id: Uuid, patch: &R::Update) -> Result<R> {
        let Value::Object(mut patch) = serde_json::to_value(patch).map_err(anyhow::Error::from)? else {
            return Err(AppError::BadRequest("Patch must be an object".to_string()));
        };
        // Never move rows between properties or owners, or rewrite keys.
        patch.remove("id");
        patch.remove("property_id");
        if let Some((column, _)) = self.scope {
            patch.remove(column);
        }
        if patch.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        R::before_update(&mut patch);

        self.table
            .update(&self.by_id(id), &Value::Object(patch))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", R::RESOURCE_TYPE.as_str(), id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        match self.table.delete(&self.by_id(id)).await? {
            0 => Err(AppError::NotFound(format!("{} {} not found", R::RESOURCE_TYPE.as_str(), id))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProperty, CreateRoom, Property, Room, RoomStatus, UpdateRoom};
    use serde_json::json;
    use supabase_client::memory::MemoryBackend;
    use tokio_test::assert_ok;

    fn seeded() -> (MemoryBackend, Uuid, Uuid) {
        let backend = MemoryBackend::new("secret");
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        backend.seed(
            "rooms",
            vec![
                json!({ "id": Uuid::new_v4(), "property_id": mine, "number": "B2", "monthly_rate": 900000.0, "status": "available", "created_at": "2024-01-02T00:00:00Z" }),
                json!({ "id": Uuid::new_v4(), "property_id": mine, "number": "A1", "monthly_rate": 800000.0, "status": "occupied", "created_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": Uuid::new_v4(), "property_id": theirs, "number": "Z9", "monthly_rate": 1.0, "status": "available", "created_at": "2024-01-03T00:00:00Z" }),
            ],
        );
        (backend, mine, theirs)
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_ordered() {
        let (backend, mine, _) = seeded();
        let service = ResourceService::<Room>::new(Arc::new(backend), Some(mine));

        let rooms = service.list().await.unwrap();
        let numbers: Vec<_> = rooms.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["A1", "B2"]);
    }

    #[tokio::test]
    async fn test_create_stamps_selected_property() {
        let (backend, mine, _) = seeded();
        let service = ResourceService::<Room>::new(Arc::new(backend.clone()), Some(mine));

        let room = assert_ok!(
            service
                .create(&CreateRoom {
                    number: "C3".into(),
                    room_type: Some("Deluxe".into()),
                    monthly_rate: 1_500_000.0,
                    status: RoomStatus::Available,
                })
                .await
        );

        assert_eq!(room.property_id, mine);
        assert_eq!(backend.rows("rooms").len(), 4);
    }

    #[tokio::test]
    async fn test_rows_of_other_properties_are_invisible() {
        let (backend, mine, theirs) = seeded();
        let foreign = backend
            .rows("rooms")
            .into_iter()
            .find(|r| r["property_id"] == json!(theirs))
            .and_then(|r| r["id"].as_str().and_then(|s| s.parse::<Uuid>().ok()))
            .unwrap();
        let service = ResourceService::<Room>::new(Arc::new(backend.clone()), Some(mine));

        let patch = UpdateRoom {
            status: Some(RoomStatus::Maintenance),
            ..Default::default()
        };
        assert!(matches!(service.update(foreign, &patch).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(foreign).await, Err(AppError::NotFound(_))));
        assert_eq!(backend.rows("rooms").len(), 3);
    }

    #[tokio::test]
    async fn test_owner_scope_hides_and_stamps() {
        let backend = MemoryBackend::new("secret");
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let bobs = Uuid::new_v4();
        backend.seed(
            "properties",
            vec![
                json!({ "id": Uuid::new_v4(), "name": "Kost Melati", "owner_id": alice, "created_at": "2024-01-01T00:00:00Z" }),
                json!({ "id": bobs, "name": "Kost Mawar", "owner_id": bob, "created_at": "2024-01-02T00:00:00Z" }),
            ],
        );
        let service = ResourceService::<Property>::owned_by(Arc::new(backend.clone()), alice);

        let names: Vec<_> = service.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Kost Melati"]);
        assert!(matches!(service.get(bobs).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(bobs).await, Err(AppError::NotFound(_))));

        let created = assert_ok!(
            service
                .create(&CreateProperty {
                    name: "Kost Anggrek".into(),
                    address: None,
                    city: Some("Bandung".into()),
                    owner_id: Some(bob),
                })
                .await
        );
        assert_eq!(created.owner_id, Some(alice));
        assert_eq!(backend.rows("properties").len(), 3);
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let (backend, mine, _) = seeded();
        let service = ResourceService::<Room>::new(Arc::new(backend), Some(mine));
        let result = service.update(Uuid::new_v4(), &UpdateRoom::default()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
