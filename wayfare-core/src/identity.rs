use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Traveler,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Stored account: the user plus its Argon2 PHC hash string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: String,
}

impl UserAccount {
    pub fn new(email: &str, name: Option<String>, password_hash: String) -> CoreResult<Self> {
        let email = normalize_email(email)?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(Self {
            user: User {
                id: Uuid::new_v4(),
                email,
                name,
                created_at: Utc::now(),
            },
            password_hash,
        })
    }
}

pub fn normalize_email(raw: &str) -> CoreResult<String> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(CoreError::validation("invalid email address"));
    }
    Ok(email)
}

pub fn check_password_strength(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(normalize_email("ada.example.com").is_err());
        assert!(normalize_email("ada@localhost").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(check_password_strength("short").is_err());
        assert!(check_password_strength("long enough").is_ok());
    }

    #[test]
    fn test_blank_name_dropped() {
        let account = UserAccount::new("a@b.io", Some("  ".into()), "hash".into()).unwrap();
        assert_eq!(account.user.name, None);
    }
}
