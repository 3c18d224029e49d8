//! Session tokens and the in-memory user store

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::mock_data::{MockData, MOCK_USER_ID};
use crate::models::{AppError, AppResult, Config, User};

/// JWT claims issued by this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Sign a session token for `user_id`
pub fn create_access_token(config: &Config, user_id: &str) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.access_token_expire_minutes)).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )?;
    Ok(token)
}

/// Check signature and expiry; returns the claims
pub fn decode_access_token(config: &Config, token: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    provider_token: Option<String>,
}

/// Users who completed the OAuth flow, keyed by user id.
///
/// Process-local; restarting the service logs everyone out except the test
/// account, which is always present.
#[derive(Debug)]
pub struct SessionStore {
    users: DashMap<String, StoredUser>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let users = DashMap::new();
        users.insert(
            MOCK_USER_ID.to_string(),
            StoredUser {
                user: MockData::user(),
                provider_token: None,
            },
        );
        Self { users }
    }

    pub fn upsert(&self, user: User, provider_token: Option<String>) {
        self.users.insert(
            user.id.clone(),
            StoredUser {
                user,
                provider_token,
            },
        );
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|entry| entry.user.clone())
    }

    pub fn provider_token(&self, user_id: &str) -> Option<String> {
        self.users
            .get(user_id)
            .and_then(|entry| entry.provider_token.clone())
    }

    pub fn remove(&self, user_id: &str) -> bool {
        // The test account cannot be removed
        if user_id == MOCK_USER_ID {
            return false;
        }
        self.users.remove(user_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolve a bearer token that is one of our own JWTs
    pub fn user_for_token(&self, config: &Config, token: &str) -> AppResult<User> {
        let claims = decode_access_token(config, token)?;
        self.get_user(&claims.sub)
            .ok_or_else(|| AppError::unauthorized("Unknown user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorCode, SecretKey};

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            picture: None,
        }
    }

    #[test]
    fn test_token_roundtrip_resolves_user() {
        let config = Config::default();
        let store = SessionStore::new();
        store.upsert(user("google-oauth2|42"), Some("ya29.x".into()));

        let token = create_access_token(&config, "google-oauth2|42").unwrap();
        let resolved = store.user_for_token(&config, &token).unwrap();
        assert_eq!(resolved.id, "google-oauth2|42");
        assert_eq!(store.provider_token("google-oauth2|42").as_deref(), Some("ya29.x"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = Config::default();
        let token = create_access_token(&config, MOCK_USER_ID).unwrap();

        let other = Config {
            secret_key: SecretKey::new("a-completely-different-secret"),
            ..Config::default()
        };
        let err = decode_access_token(&other, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiUnauthorized);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = Config {
            access_token_expire_minutes: -10,
            ..Config::default()
        };
        let token = create_access_token(&config, MOCK_USER_ID).unwrap();
        assert!(decode_access_token(&config, &token).is_err());
    }

    #[test]
    fn test_unknown_user() {
        let config = Config::default();
        let store = SessionStore::new();
        let token = create_access_token(&config, "google-oauth2|nobody").unwrap();
        let err = store.user_for_token(&config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApiUnauthorized);
    }

    #[test]
    fn test_store_seeded_with_test_user() {
        let store = SessionStore::new();
        assert_eq!(store.len(), 1);
        assert!(store.get_user(MOCK_USER_ID).is_some());
        assert!(!store.remove(MOCK_USER_ID));
    }
}
