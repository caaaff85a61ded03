//! In-memory stand-ins for the database, object storage and mail provider,
//! plus a harness that drives the full router without a network.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use crate::app;
use crate::auth::{generate_jwt, Claims, Role};
use crate::config::AppConfig;
use crate::database::models::{Certificate, Contact, Product, Project, User};
use crate::database::{ContactStore, DatabaseError, Document, DocumentStore, UserStore};
use crate::mail::{MailError, MailMessage, Mailer};
use crate::state::{AppState, Services};
use crate::storage::{ObjectStorage, ResourceType, StorageError, StoredObject, UploadRequest};

fn unavailable() -> DatabaseError {
    DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
}

pub struct MemoryDocumentStore<T> {
    docs: Mutex<Vec<T>>,
    fail_writes: AtomicBool,
}

impl<T> Default for MemoryDocumentStore<T> {
    fn default() -> Self {
        Self {
            docs: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<T: Document> MemoryDocumentStore<T> {
    pub fn all(&self) -> Vec<T> {
        self.docs.lock().unwrap().clone()
    }

    pub fn seed(&self, doc: T) {
        self.docs.lock().unwrap().push(doc);
    }

    /// Make every later insert/replace fail as if the pool were exhausted
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DatabaseError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Document> DocumentStore<T> for MemoryDocumentStore<T> {
    async fn list(&self, category: Option<&str>) -> Result<Vec<T>, DatabaseError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| category.map_or(true, |c| d.category() == c))
            .cloned()
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        Ok(self.docs.lock().unwrap().iter().find(|d| d.id() == id).cloned())
    }

    async fn insert(&self, doc: &T) -> Result<(), DatabaseError> {
        self.check_writable()?;
        self.docs.lock().unwrap().push(doc.clone());
        Ok(())
    }

    async fn replace(&self, doc: &T) -> Result<bool, DatabaseError> {
        self.check_writable()?;
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| d.id() == doc.id()) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let mut docs = self.docs.lock().unwrap();
        let index = docs.iter().position(|d| d.id() == id);
        Ok(index.map(|i| docs.remove(i)))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn all(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_role(&self, role: Role) -> Result<Option<User>, DatabaseError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.role == role)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.lock().unwrap();
        if user.role == Role::Admin && users.iter().any(|u| u.role == Role::Admin) {
            return Err(DatabaseError::Conflict("Admin already exists".to_string()));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("Username already exists".to_string()));
        }
        users.push(user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryContactStore {
    contacts: Mutex<Vec<Contact>>,
    fail_writes: AtomicBool,
}

impl MemoryContactStore {
    pub fn all(&self) -> Vec<Contact> {
        self.contacts.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn insert(&self, contact: &Contact) -> Result<(), DatabaseError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::Protocol(
                "contacts table unavailable".to_string(),
            )));
        }
        self.contacts.lock().unwrap().push(contact.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub folder: String,
    pub resource_type: ResourceType,
    pub content_type: String,
    pub data: Vec<u8>,
    pub public_id: String,
}

/// Object storage that keeps every request for later assertions
#[derive(Default)]
pub struct RecordingStorage {
    uploads: Mutex<Vec<RecordedUpload>>,
    destroyed: Mutex<Vec<(String, ResourceType)>>,
    failing_destroys: Mutex<HashSet<String>>,
    fail_uploads: AtomicBool,
}

impl RecordingStorage {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<(String, ResourceType)> {
        self.destroyed.lock().unwrap().clone()
    }

    pub fn fail_destroy_of(&self, public_id: &str) {
        self.failing_destroys
            .lock()
            .unwrap()
            .insert(public_id.to_string());
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Remote {
                status: 500,
                message: "upload rejected".to_string(),
            });
        }

        let public_id = format!("{}/{}", request.folder, Uuid::new_v4().simple());
        let url = format!(
            "https://storage.test/{}/{}",
            request.resource_type.as_str(),
            public_id
        );
        self.uploads.lock().unwrap().push(RecordedUpload {
            folder: request.folder,
            resource_type: request.resource_type,
            content_type: request.content_type,
            data: request.data,
            public_id: public_id.clone(),
        });
        Ok(StoredObject { url, public_id })
    }

    async fn destroy(&self, public_id: &str, resource_type: ResourceType) -> Result<(), StorageError> {
        if self.failing_destroys.lock().unwrap().contains(public_id) {
            return Err(StorageError::Remote {
                status: 500,
                message: format!("cannot destroy {}", public_id),
            });
        }
        self.destroyed
            .lock()
            .unwrap()
            .push((public_id.to_string(), resource_type));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    reject: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn reject_messages(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(MailError::Remote {
                status: 422,
                message: "invalid recipient".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Development settings without rate limiting or request tracing
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_rate_limiting = false;
    config.api.enable_request_logging = false;
    config.security.jwt_secret = "router-test-secret".to_string();
    config.mail.receiver = Some("owner@jsp.test".to_string());
    config
}

/// The full router over in-memory collaborators
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub products: Arc<MemoryDocumentStore<Product>>,
    pub projects: Arc<MemoryDocumentStore<Project>>,
    pub certificates: Arc<MemoryDocumentStore<Certificate>>,
    pub contacts: Arc<MemoryContactStore>,
    pub storage: Arc<RecordingStorage>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let products = Arc::new(MemoryDocumentStore::<Product>::default());
        let projects = Arc::new(MemoryDocumentStore::<Project>::default());
        let certificates = Arc::new(MemoryDocumentStore::<Certificate>::default());
        let contacts = Arc::new(MemoryContactStore::default());
        let storage = Arc::new(RecordingStorage::default());
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState::new(
            config,
            Services {
                database: None,
                users: users.clone(),
                products: products.clone(),
                projects: projects.clone(),
                certificates: certificates.clone(),
                contacts: contacts.clone(),
                storage: storage.clone(),
                mailer: mailer.clone(),
            },
        );

        Self {
            router: app::router(state.clone()),
            state,
            users,
            products,
            projects,
            certificates,
            contacts,
            storage,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    /// Seed a user directly and mint a token for them. The single admin is reused.
    pub async fn token_for(&self, role: Role) -> String {
        let existing = match role {
            Role::Admin => self.users.find_by_role(Role::Admin).await.unwrap(),
            Role::User => None,
        };
        let user = match existing {
            Some(admin) => admin,
            None => self.seed_user(role).await,
        };

        let claims = Claims::new(user.id, role, 1);
        generate_jwt(&claims, &self.state.config.security.jwt_secret).unwrap()
    }

    async fn seed_user(&self, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("{}-{}", role, Uuid::new_v4().simple()),
            password_hash: "not-used".to_string(),
            role,
            is_permanent: role == Role::Admin,
            created_at: chrono::Utc::now(),
        };
        self.users.insert(&user).await.unwrap();
        user
    }

    pub async fn admin_token(&self) -> String {
        self.token_for(Role::Admin).await
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

const BOUNDARY: &str = "jsp-test-boundary";

/// multipart/form-data body builder
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
