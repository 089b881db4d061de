use async_trait::async_trait;
use uuid::Uuid;

use crate::identity::{User, UserAccount};
use crate::trip::Trip;
use crate::CoreResult;

/// Repository trait for saved trips
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: &Trip) -> CoreResult<()>;

    async fn get_trip(&self, id: Uuid) -> CoreResult<Option<Trip>>;

    /// Trips owned by `owner_id`, most recently updated first.
    async fn list_trips(&self, owner_id: &str) -> CoreResult<Vec<Trip>>;

    /// Fails with `NotFound` when the trip does not exist.
    async fn update_trip(&self, trip: &Trip) -> CoreResult<()>;

    /// Returns whether a trip was removed.
    async fn delete_trip(&self, id: Uuid) -> CoreResult<bool>;
}

/// Repository trait for registered accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, account: &UserAccount) -> CoreResult<()>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<UserAccount>>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;
}
