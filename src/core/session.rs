use crate::domain::model::{Credentials, Order, Quota, User};
use crate::domain::ports::{AccountBackend, Storage};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_non_empty_string;

pub const TOKEN_KEY: &str = "smskenya_token";
pub const USER_KEY: &str = "smskenya_user";

pub const REGISTERED_MESSAGE: &str = "Registration successful! Please login.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    LoggedIn(User),
    /// 註冊成功後仍需登入
    Registered(String),
}

/// 登入狀態：記憶體中的 session 加上持久化的 token / user
pub struct SessionManager<S: Storage, B: AccountBackend> {
    storage: S,
    backend: B,
    session: Option<Session>,
    quota: Option<Quota>,
}

impl<S: Storage, B: AccountBackend> SessionManager<S, B> {
    pub fn new(storage: S, backend: B) -> Self {
        Self {
            storage,
            backend,
            session: None,
            quota: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn quota(&self) -> Option<Quota> {
        self.quota
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// 未取得配額時視為 0
    pub fn remaining(&self) -> i64 {
        self.quota.map(|q| q.remaining()).unwrap_or(0)
    }

    pub fn can_generate(&self) -> bool {
        self.is_authenticated() && self.remaining() > 0
    }

    /// 啟動時從儲存還原；兩個鍵都存在才算有 session
    pub async fn restore(&mut self) -> Result<bool> {
        let token = self.storage.read_file(TOKEN_KEY).await?;
        let user = self.storage.read_file(USER_KEY).await?;

        let (token, user) = match (token, user) {
            (Some(token), Some(user)) => (token, user),
            _ => {
                tracing::debug!("No saved session found");
                return Ok(false);
            }
        };

        let token = match String::from_utf8(token) {
            Ok(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => {
                tracing::warn!("Saved token is unreadable, ignoring saved session");
                return Ok(false);
            }
        };
        let user: User = match serde_json::from_slice(&user) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Saved user is unreadable ({}), ignoring saved session", e);
                return Ok(false);
            }
        };

        tracing::debug!("Restored session for {}", user.username);
        self.session = Some(Session { token, user });
        self.fetch_me().await?;
        Ok(self.session.is_some())
    }

    pub async fn login(&mut self, token: String, user: User) -> Result<()> {
        self.storage.write_file(TOKEN_KEY, token.as_bytes()).await?;
        self.storage
            .write_file(USER_KEY, &serde_json::to_vec(&user)?)
            .await?;
        tracing::info!("Logged in as {}", user.username);
        self.session = Some(Session { token, user });
        self.fetch_me().await
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.quota = None;
        self.storage.remove_file(TOKEN_KEY).await?;
        self.storage.remove_file(USER_KEY).await?;
        Ok(())
    }

    pub async fn refresh_quota(&mut self) -> Result<()> {
        if self.session.is_some() {
            self.fetch_me().await?;
        }
        Ok(())
    }

    /// 401 清除 session；其他失敗只記錄
    async fn fetch_me(&mut self) -> Result<()> {
        let Some(token) = self.token() else {
            return Ok(());
        };
        match self.backend.fetch_quota(token).await {
            Ok(quota) => {
                self.quota = Some(quota);
                Ok(())
            }
            Err(AppError::Unauthorized) => {
                tracing::warn!("Session rejected by server, logging out");
                self.logout().await
            }
            Err(e) => {
                tracing::warn!("Failed to fetch user data: {}", e);
                Ok(())
            }
        }
    }

    pub async fn submit_credentials(
        &mut self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<AuthOutcome> {
        validate_non_empty_string("username", &credentials.username)?;
        validate_non_empty_string("password", &credentials.password)?;

        match mode {
            AuthMode::Login => {
                let response = self.backend.login(credentials).await?;
                let user = response.user.clone();
                self.login(response.token, response.user).await?;
                Ok(AuthOutcome::LoggedIn(user))
            }
            AuthMode::Register => {
                self.backend.register(credentials).await?;
                tracing::info!("Registered {}", credentials.username);
                Ok(AuthOutcome::Registered(REGISTERED_MESSAGE.to_string()))
            }
        }
    }

    /// 產生號碼前確認已登入且仍有配額，完成後刷新配額
    pub async fn generate_number(&mut self, service_id: &str, country_id: &str) -> Result<Order> {
        if !self.is_authenticated() {
            return Err(AppError::NotAuthenticated);
        }
        if self.quota.is_none() {
            self.fetch_me().await?;
        }
        // 與結帳判斷同一道門檻：額度必須已知且大於 0
        let token = self.token().ok_or(AppError::NotAuthenticated)?.to_string();
        let quota = self.quota.ok_or(AppError::QuotaUnavailable)?;
        if !quota.can_generate() {
            return Err(AppError::QuotaExhausted {
                allowed: quota.allowed,
                used: quota.used,
            });
        }

        let result = self
            .backend
            .generate_number(&token, service_id, country_id)
            .await;
        if let Err(AppError::Unauthorized) = result {
            self.logout().await?;
            return Err(AppError::Unauthorized);
        }
        let order = result?;
        tracing::info!(
            "Generated {} for {}/{}",
            order.phone_number,
            service_id,
            country_id
        );
        self.refresh_quota().await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LoginResponse, OrderStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.files.lock().unwrap().get(path).cloned())
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FakeAccounts {
        quota: Arc<Mutex<std::result::Result<Quota, u16>>>,
        generated: Arc<Mutex<u32>>,
    }

    impl FakeAccounts {
        fn with_quota(allowed: i64, used: i64) -> Self {
            Self {
                quota: Arc::new(Mutex::new(Ok(Quota { allowed, used }))),
                generated: Arc::new(Mutex::new(0)),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                quota: Arc::new(Mutex::new(Err(status))),
                generated: Arc::new(Mutex::new(0)),
            }
        }
    }

    #[async_trait]
    impl AccountBackend for FakeAccounts {
        async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
            if credentials.password == "secret" {
                Ok(LoginResponse {
                    token: "tok-1".to_string(),
                    user: User {
                        id: 1,
                        username: credentials.username.clone(),
                    },
                })
            } else {
                Err(AppError::ApiError {
                    status: 401,
                    message: "Invalid credentials".to_string(),
                })
            }
        }

        async fn register(&self, _credentials: &Credentials) -> Result<()> {
            Ok(())
        }

        async fn fetch_quota(&self, _token: &str) -> Result<Quota> {
            match *self.quota.lock().unwrap() {
                Ok(quota) => Ok(quota),
                Err(401) => Err(AppError::Unauthorized),
                Err(status) => Err(AppError::ApiError {
                    status,
                    message: "boom".to_string(),
                }),
            }
        }

        async fn generate_number(
            &self,
            _token: &str,
            service_id: &str,
            country_id: &str,
        ) -> Result<Order> {
            *self.generated.lock().unwrap() += 1;
            if let Ok(quota) = self.quota.lock().unwrap().as_mut() {
                quota.used += 1;
            }
            Ok(Order {
                id: 1,
                service_id: service_id.to_string(),
                country_id: country_id.to_string(),
                phone_number: "+254700000001".to_string(),
                order_id_provider: "prov-1".to_string(),
                status: OrderStatus::Waiting,
                sms_code: None,
                timestamp: "2026-01-01 00:00:00".to_string(),
            })
        }
    }

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_persists_and_restores_after_restart() {
        let storage = MemoryStorage::default();
        let backend = FakeAccounts::with_quota(5, 2);

        let mut first = SessionManager::new(storage.clone(), backend.clone());
        first.login("tok-1".to_string(), alice()).await.unwrap();
        assert_eq!(first.remaining(), 3);

        let mut second = SessionManager::new(storage.clone(), backend);
        assert!(second.restore().await.unwrap());
        assert_eq!(second.user(), Some(&alice()));
        assert_eq!(second.token(), Some("tok-1"));
        assert_eq!(second.quota(), Some(Quota { allowed: 5, used: 2 }));
    }

    #[tokio::test]
    async fn test_logout_clears_storage() {
        let storage = MemoryStorage::default();
        let backend = FakeAccounts::with_quota(5, 0);

        let mut manager = SessionManager::new(storage.clone(), backend.clone());
        manager.login("tok-1".to_string(), alice()).await.unwrap();
        manager.logout().await.unwrap();
        assert!(!manager.is_authenticated());
        assert!(manager.quota().is_none());

        let mut restarted = SessionManager::new(storage, backend);
        assert!(!restarted.restore().await.unwrap());
    }

    #[tokio::test]
    async fn test_unauthorized_quota_fetch_logs_out() {
        let storage = MemoryStorage::default();
        let mut manager = SessionManager::new(storage.clone(), FakeAccounts::failing(401));

        manager.login("stale".to_string(), alice()).await.unwrap();

        assert!(!manager.is_authenticated());
        assert!(storage.read_file(TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_quota_failures_keep_session() {
        let mut manager =
            SessionManager::new(MemoryStorage::default(), FakeAccounts::failing(500));

        manager.login("tok-1".to_string(), alice()).await.unwrap();

        assert!(manager.is_authenticated());
        assert!(manager.quota().is_none());
        assert!(!manager.can_generate());
    }

    #[tokio::test]
    async fn test_corrupt_saved_user_is_anonymous() {
        let storage = MemoryStorage::default();
        storage.write_file(TOKEN_KEY, b"tok-1").await.unwrap();
        storage.write_file(USER_KEY, b"{not json").await.unwrap();

        let mut manager = SessionManager::new(storage, FakeAccounts::with_quota(1, 0));
        assert!(!manager.restore().await.unwrap());
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_submit_credentials() {
        let mut manager =
            SessionManager::new(MemoryStorage::default(), FakeAccounts::with_quota(2, 0));

        let bad = Credentials {
            username: "alice".to_string(),
            password: "nope".to_string(),
        };
        let err = manager
            .submit_credentials(AuthMode::Login, &bad)
            .await
            .unwrap_err();
        assert_eq!(err.user_friendly_message(), "Invalid credentials");

        let good = Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };
        let registered = manager
            .submit_credentials(AuthMode::Register, &good)
            .await
            .unwrap();
        assert_eq!(registered, AuthOutcome::Registered(REGISTERED_MESSAGE.to_string()));
        assert!(!manager.is_authenticated());

        let outcome = manager
            .submit_credentials(AuthMode::Login, &good)
            .await
            .unwrap();
        assert_eq!(outcome, AuthOutcome::LoggedIn(alice()));
        assert!(manager.can_generate());
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_before_request() {
        let mut manager =
            SessionManager::new(MemoryStorage::default(), FakeAccounts::with_quota(2, 0));
        let blank = Credentials {
            username: " ".to_string(),
            password: "secret".to_string(),
        };
        assert!(matches!(
            manager.submit_credentials(AuthMode::Login, &blank).await,
            Err(AppError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_consumes_quota_and_refreshes() {
        let backend = FakeAccounts::with_quota(1, 0);
        let mut manager = SessionManager::new(MemoryStorage::default(), backend.clone());
        manager.login("tok-1".to_string(), alice()).await.unwrap();

        let order = manager.generate_number("wa", "KE").await.unwrap();
        assert_eq!(order.service_id, "wa");
        assert_eq!(manager.remaining(), 0);
        assert!(!manager.can_generate());

        let err = manager.generate_number("wa", "KE").await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExhausted { allowed: 1, used: 1 }));
        assert!(err.needs_admin_contact());
        assert_eq!(*backend.generated.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_with_unknown_quota_is_refused() {
        let backend = FakeAccounts::failing(500);
        let mut manager = SessionManager::new(MemoryStorage::default(), backend.clone());
        manager.login("tok-1".to_string(), alice()).await.unwrap();
        assert_eq!(manager.quota(), None);
        assert!(!manager.can_generate());

        let err = manager.generate_number("wa", "KE").await.unwrap_err();
        assert!(matches!(err, AppError::QuotaUnavailable));
        assert!(manager.is_authenticated());
        assert_eq!(*backend.generated.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generate_refetches_missing_quota() {
        let backend = FakeAccounts::failing(500);
        let mut manager = SessionManager::new(MemoryStorage::default(), backend.clone());
        manager.login("tok-1".to_string(), alice()).await.unwrap();

        *backend.quota.lock().unwrap() = Ok(Quota { allowed: 2, used: 0 });
        let order = manager.generate_number("wa", "KE").await.unwrap();
        assert_eq!(order.country_id, "KE");
        assert_eq!(manager.remaining(), 1);
        assert_eq!(*backend.generated.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_generate_requires_login() {
        let mut manager =
            SessionManager::new(MemoryStorage::default(), FakeAccounts::with_quota(1, 0));
        assert!(matches!(
            manager.generate_number("wa", "KE").await,
            Err(AppError::NotAuthenticated)
        ));
    }
}
