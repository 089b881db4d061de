use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_core::repository::TripRepository;
use wayfare_core::trip::Trip;
use wayfare_core::{CoreError, CoreResult};

use crate::error::StoreError;
use crate::RedisClient;

fn newest_first(trips: &mut [Trip]) {
    trips.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[derive(Default)]
pub struct InMemoryTripRepository {
    trips: RwLock<HashMap<Uuid, Trip>>,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn create_trip(&self, trip: &Trip) -> CoreResult<()> {
        let mut trips = self.trips.write().await;
        if trips.contains_key(&trip.id) {
            return Err(CoreError::Conflict(format!("trip {} already exists", trip.id)));
        }
        trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> CoreResult<Option<Trip>> {
        Ok(self.trips.read().await.get(&id).cloned())
    }

    async fn list_trips(&self, owner_id: &str) -> CoreResult<Vec<Trip>> {
        let mut owned: Vec<Trip> = self
            .trips
            .read()
            .await
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut owned);
        Ok(owned)
    }

    async fn update_trip(&self, trip: &Trip) -> CoreResult<()> {
        match self.trips.write().await.get_mut(&trip.id) {
            Some(existing) => {
                *existing = trip.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!("trip {}", trip.id))),
        }
    }

    async fn delete_trip(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.trips.write().await.remove(&id).is_some())
    }
}

/// Trips as JSON documents under `trip:{id}`, indexed per owner in the sorted
/// set `trips:owner:{owner}` scored by last update.
pub struct RedisTripRepository {
    redis: Arc<RedisClient>,
}

impl RedisTripRepository {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    fn trip_key(id: Uuid) -> String {
        format!("trip:{}", id)
    }

    fn owner_index(owner_id: &str) -> String {
        format!("trips:owner:{}", owner_id)
    }

    async fn write(&self, trip: &Trip) -> Result<(), StoreError> {
        let doc = serde_json::to_string(trip)?;
        self.redis.set_value(&Self::trip_key(trip.id), &doc).await?;
        self.redis
            .index_add(
                &Self::owner_index(&trip.owner_id),
                &trip.id.to_string(),
                trip.updated_at.timestamp_millis(),
            )
            .await?;
        Ok(())
    }

    async fn read(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        match self.redis.get_value(&Self::trip_key(id)).await? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TripRepository for RedisTripRepository {
    async fn create_trip(&self, trip: &Trip) -> CoreResult<()> {
        let doc = serde_json::to_string(trip).map_err(StoreError::from)?;
        let created = self
            .redis
            .claim_key(&Self::trip_key(trip.id), &doc)
            .await
            .map_err(StoreError::from)?;
        if !created {
            return Err(CoreError::Conflict(format!("trip {} already exists", trip.id)));
        }
        self.redis
            .index_add(
                &Self::owner_index(&trip.owner_id),
                &trip.id.to_string(),
                trip.updated_at.timestamp_millis(),
            )
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_trip(&self, id: Uuid) -> CoreResult<Option<Trip>> {
        Ok(self.read(id).await?)
    }

    async fn list_trips(&self, owner_id: &str) -> CoreResult<Vec<Trip>> {
        let ids = self
            .redis
            .index_members(&Self::owner_index(owner_id))
            .await
            .map_err(StoreError::from)?;

        let mut trips = Vec::with_capacity(ids.len());
        for id in ids {
            let Ok(uuid) = Uuid::parse_str(&id) else {
                continue;
            };
            // Index entries can outlive their document if a delete was interrupted.
            if let Some(trip) = self.read(uuid).await? {
                trips.push(trip);
            }
        }
        newest_first(&mut trips);
        Ok(trips)
    }

    async fn update_trip(&self, trip: &Trip) -> CoreResult<()> {
        if self.read(trip.id).await?.is_none() {
            return Err(CoreError::NotFound(format!("trip {}", trip.id)));
        }
        Ok(self.write(trip).await?)
    }

    async fn delete_trip(&self, id: Uuid) -> CoreResult<bool> {
        let Some(trip) = self.read(id).await? else {
            return Ok(false);
        };
        let removed = self
            .redis
            .del_key(&Self::trip_key(id))
            .await
            .map_err(StoreError::from)?;
        self.redis
            .index_remove(&Self::owner_index(&trip.owner_id), &id.to_string())
            .await
            .map_err(StoreError::from)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::trip::TripDraft;

    fn trip(owner: &str, name: &str) -> Trip {
        let draft = TripDraft {
            name: Some(name.to_string()),
            ..Default::default()
        };
        Trip::create(owner, draft.validate().unwrap())
    }

    #[tokio::test]
    async fn test_crud_round() {
        let repo = InMemoryTripRepository::new();
        let mut t = trip("alice", "Rome");
        repo.create_trip(&t).await.unwrap();
        assert!(matches!(repo.create_trip(&t).await, Err(CoreError::Conflict(_))));

        t.name = "Rome and Naples".into();
        repo.update_trip(&t).await.unwrap();
        assert_eq!(repo.get_trip(t.id).await.unwrap().unwrap().name, "Rome and Naples");

        assert!(repo.delete_trip(t.id).await.unwrap());
        assert!(!repo.delete_trip(t.id).await.unwrap());
        assert!(matches!(repo.update_trip(&t).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_per_owner_newest_first() {
        let repo = InMemoryTripRepository::new();
        let older = trip("alice", "first");
        let mut newer = trip("alice", "second");
        newer.updated_at = older.updated_at + chrono::Duration::seconds(5);
        repo.create_trip(&older).await.unwrap();
        repo.create_trip(&newer).await.unwrap();
        repo.create_trip(&trip("bob", "other")).await.unwrap();

        let names: Vec<String> = repo
            .list_trips("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
        assert!(repo.list_trips("carol").await.unwrap().is_empty());
    }
}
