//! In-memory stores and a ready-made `AppState` for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo::{NewUser, User, UserRepo},
    config::{AppConfig, DatabaseConfig, HashingConfig, JwtConfig, StorageConfig},
    db::StoreError,
    state::AppState,
    storage::LocalStorage,
    tasks::repo::{Task, TaskRepo, STATUS_PENDING},
};

pub const TEST_SECRET: &str = "test-secret";

/// Enforces username/email uniqueness under one lock, like the table constraints.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UsernameTaken);
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }
}

impl MemoryUserRepo {
    pub fn delete(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

/// Every call fails the way an unreachable database does.
pub struct FailingUserRepo;

#[async_trait]
impl UserRepo for FailingUserRepo {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn insert(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[derive(Default)]
pub struct MemoryTaskRepo {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskRepo {
    pub fn set_result(&self, task_id: Uuid, result_path: &str) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(t) = tasks.iter_mut().find(|t| t.id == task_id) {
            t.result_path = Some(result_path.to_string());
        }
    }
}

#[async_trait]
impl TaskRepo for MemoryTaskRepo {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, user_id: Uuid, image_path: &str) -> anyhow::Result<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            image_path: image_path.to_string(),
            status: STATUS_PENDING.to_string(),
            result_path: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn get_for_user(&self, user_id: Uuid, task_id: Uuid) -> anyhow::Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .cloned())
    }
}

/// Every insert fails, like a rejected row.
pub struct FailingTaskRepo;

#[async_trait]
impl TaskRepo for FailingTaskRepo {
    async fn list_by_user(&self, _user_id: Uuid) -> anyhow::Result<Vec<Task>> {
        Ok(Vec::new())
    }

    async fn create(&self, _user_id: Uuid, _image_path: &str) -> anyhow::Result<Task> {
        anyhow::bail!("insert task: value too long for type character varying(255)")
    }

    async fn get_for_user(&self, _user_id: Uuid, _task_id: Uuid) -> anyhow::Result<Option<Task>> {
        Ok(None)
    }
}

pub fn test_config(upload_dir: &str) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        database: DatabaseConfig {
            url: "postgres://unused".into(),
            max_connections: 1,
            timeout_secs: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.into(),
            algorithm: Algorithm::HS256,
            issuer: "pixeltasks".into(),
            audience: "pixeltasks-users".into(),
            ttl_minutes: 60,
            refresh_ttl_minutes: 1440,
        },
        hashing: HashingConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        storage: StorageConfig {
            upload_dir: upload_dir.into(),
            max_upload_bytes: 1024 * 1024,
        },
    }
}

/// Handles onto the in-memory stores behind a fake state.
pub struct FakeStores {
    pub users: Arc<MemoryUserRepo>,
    pub tasks: Arc<MemoryTaskRepo>,
}

pub fn fake_state_with(config: AppConfig) -> (AppState, FakeStores) {
    let users = Arc::new(MemoryUserRepo::default());
    let tasks = Arc::new(MemoryTaskRepo::default());
    let storage = Arc::new(LocalStorage::new(&config.storage.upload_dir));
    let state = AppState::from_parts(config, users.clone(), tasks.clone(), storage)
        .expect("fake state");
    (state, FakeStores { users, tasks })
}

pub fn fake_state() -> AppState {
    let dir = std::env::temp_dir().join(format!("pixeltasks-{}", Uuid::new_v4()));
    fake_state_with(test_config(&dir.to_string_lossy())).0
}
