use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_core::identity::{normalize_email, User, UserAccount};
use wayfare_core::repository::UserRepository;
use wayfare_core::{CoreError, CoreResult};

use crate::error::StoreError;
use crate::RedisClient;

#[derive(Default)]
pub struct InMemoryUserRepository {
    accounts: RwLock<HashMap<Uuid, UserAccount>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, account: &UserAccount) -> CoreResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.user.email == account.user.email) {
            return Err(CoreError::Conflict("email already registered".into()));
        }
        accounts.insert(account.user.id, account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<UserAccount>> {
        let email = normalize_email(email)?;
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.user.email == email)
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.accounts.read().await.get(&id).map(|a| a.user.clone()))
    }
}

/// Accounts under `user:{id}`; `user:email:{email}` maps an email to its id and
/// is claimed with SET NX so concurrent registrations cannot both succeed.
pub struct RedisUserRepository {
    redis: Arc<RedisClient>,
}

impl RedisUserRepository {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    fn account_key(id: Uuid) -> String {
        format!("user:{}", id)
    }

    fn email_key(email: &str) -> String {
        format!("user:email:{}", email)
    }

    async fn read(&self, id: Uuid) -> Result<Option<UserAccount>, StoreError> {
        match self.redis.get_value(&Self::account_key(id)).await? {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for RedisUserRepository {
    async fn create_user(&self, account: &UserAccount) -> CoreResult<()> {
        let email_key = Self::email_key(&account.user.email);
        let claimed = self
            .redis
            .claim_key(&email_key, &account.user.id.to_string())
            .await
            .map_err(StoreError::from)?;
        if !claimed {
            return Err(CoreError::Conflict("email already registered".into()));
        }

        let doc = serde_json::to_string(account).map_err(StoreError::from)?;
        if let Err(e) = self.redis.set_value(&Self::account_key(account.user.id), &doc).await {
            // Release the email so the user can retry.
            let _ = self.redis.del_key(&email_key).await;
            return Err(StoreError::from(e).into());
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<UserAccount>> {
        let email = normalize_email(email)?;
        let id = self
            .redis
            .get_value(&Self::email_key(&email))
            .await
            .map_err(StoreError::from)?;
        match id.and_then(|id| Uuid::parse_str(&id).ok()) {
            Some(id) => Ok(self.read(id).await?),
            None => Ok(None),
        }
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.read(id).await?.map(|a| a.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        let first = UserAccount::new("ada@example.com", None, "h1".into()).unwrap();
        let second = UserAccount::new("ADA@example.com ", None, "h2".into()).unwrap();
        repo.create_user(&first).await.unwrap();
        assert!(matches!(repo.create_user(&second).await, Err(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_email_and_id() {
        let repo = InMemoryUserRepository::new();
        let account = UserAccount::new("grace@example.com", Some("Grace".into()), "h".into()).unwrap();
        repo.create_user(&account).await.unwrap();

        let found = repo.find_by_email("Grace@Example.com").await.unwrap().unwrap();
        assert_eq!(found.user.id, account.user.id);
        assert_eq!(repo.get_user(account.user.id).await.unwrap(), Some(account.user.clone()));
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
