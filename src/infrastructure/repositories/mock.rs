use crate::domain::auth::{NewRefreshToken, RefreshToken, RefreshTokenRepository};
use crate::domain::users::{NewUser, User, UserRepository};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory user repository for tests.
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, anyhow::Error> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(anyhow::anyhow!("duplicate email"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            full_name: new_user.full_name,
            password_hash: new_user.password_hash,
            email_verified: false,
            roles: new_user.roles,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, anyhow::Error> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }
}

/// In-memory refresh-token store. A single mutex serializes every operation,
/// so `rotate` has the same exactly-one-winner semantics as the Postgres
/// transaction.
#[derive(Clone, Default)]
pub struct MockRefreshTokenRepository {
    tokens: Arc<Mutex<Vec<RefreshToken>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: RefreshToken) -> Self {
        self.tokens.lock().unwrap().push(token);
        self
    }

    /// Make every subsequent operation fail, simulating an unreachable
    /// store.
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    pub fn token_count(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    fn check_failure(&self) -> Result<(), anyhow::Error> {
        if let Some(msg) = self.fail_with.lock().unwrap().as_ref() {
            return Err(anyhow::anyhow!(msg.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn create(&self, token: NewRefreshToken) -> Result<RefreshToken, anyhow::Error> {
        self.check_failure()?;
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.iter().any(|t| t.token_hash == token.token_hash) {
            return Err(anyhow::anyhow!("duplicate token hash"));
        }
        let created = RefreshToken {
            token_hash: token.token_hash,
            user_id: token.user_id,
            expires_at: token.expires_at,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        tokens.push(created.clone());
        Ok(created)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, anyhow::Error> {
        self.check_failure()?;
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn retire(&self, token_hash: &str) -> Result<bool, anyhow::Error> {
        self.check_failure()?;
        let mut tokens = self.tokens.lock().unwrap();
        match tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.is_active)
        {
            Some(token) => {
                token.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate(
        &self,
        presented_hash: &str,
        replacement: NewRefreshToken,
    ) -> Result<Option<RefreshToken>, anyhow::Error> {
        self.check_failure()?;
        let mut tokens = self.tokens.lock().unwrap();

        let now = OffsetDateTime::now_utc();
        let Some(presented) = tokens
            .iter_mut()
            .find(|t| t.token_hash == presented_hash && t.is_active && t.expires_at > now)
        else {
            return Ok(None);
        };
        presented.is_active = false;

        let created = RefreshToken {
            token_hash: replacement.token_hash,
            user_id: replacement.user_id,
            expires_at: replacement.expires_at,
            is_active: true,
            created_at: now,
        };
        tokens.push(created.clone());
        Ok(Some(created))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, anyhow::Error> {
        self.check_failure()?;
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.token_hash != token_hash);
        Ok(tokens.len() < before)
    }

    async fn count_purgeable(&self) -> Result<i64, anyhow::Error> {
        self.check_failure()?;
        let tokens = self.tokens.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        Ok(tokens
            .iter()
            .filter(|t| t.expires_at <= now || !t.is_active)
            .count() as i64)
    }

    async fn purge_expired_or_inactive(&self) -> Result<u64, anyhow::Error> {
        self.check_failure()?;
        let mut tokens = self.tokens.lock().unwrap();
        let now = OffsetDateTime::now_utc();
        let before = tokens.len();
        tokens.retain(|t| t.expires_at > now && t.is_active);
        Ok((before - tokens.len()) as u64)
    }
}
