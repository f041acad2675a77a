//! In-memory collaborators for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::{ChatServices, MediaBuckets, SessionController};
use crate::cache::{LocalSessionCache, MemoryKeyValueStore};
use crate::config::SessionAuthority;
use crate::db::session_repository::new_thread_id;
use crate::db::DataGateway;
use crate::errors::AppError;
use crate::gateway::{ConversationGateway, GatewayRequest};
use crate::models::{Session, Topic};
use crate::routes::view_route::{Navigator, ViewRoute};

#[derive(Default)]
struct DataState {
    topics: Vec<Topic>,
    sessions: HashMap<String, Session>,
    created: usize,
    resets: usize,
    deleted: Vec<String>,
    uploads: Vec<(String, String)>,
    fail_get_session: bool,
    fail_create: bool,
    fail_reset: bool,
    fail_delete: bool,
    fail_upload: bool,
}

#[derive(Default)]
pub struct FakeData {
    state: Mutex<DataState>,
}

impl FakeData {
    fn with<R>(&self, f: impl FnOnce(&mut DataState) -> R) -> R {
        f(&mut *self.state.lock().unwrap())
    }

    pub fn add_topic(&self, topic: Topic) {
        self.with(|s| s.topics.push(topic));
    }

    pub fn insert_session(&self, id: &str, thread_id: &str) -> Session {
        self.insert_session_for(id, Harness::TOPIC_ID, thread_id)
    }

    pub fn insert_session_for(&self, id: &str, topic_id: &str, thread_id: &str) -> Session {
        let session = Session::new(id.to_string(), topic_id.to_string(), thread_id.to_string());
        self.with(|s| s.sessions.insert(id.to_string(), session.clone()));
        session
    }

    pub fn created(&self) -> usize {
        self.with(|s| s.created)
    }

    pub fn resets(&self) -> usize {
        self.with(|s| s.resets)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.with(|s| s.deleted.clone())
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        self.with(|s| s.uploads.clone())
    }

    pub fn fail_get_session(&self, on: bool) {
        self.with(|s| s.fail_get_session = on);
    }

    pub fn fail_create(&self, on: bool) {
        self.with(|s| s.fail_create = on);
    }

    pub fn fail_reset(&self, on: bool) {
        self.with(|s| s.fail_reset = on);
    }

    pub fn fail_delete(&self, on: bool) {
        self.with(|s| s.fail_delete = on);
    }

    pub fn fail_upload(&self, on: bool) {
        self.with(|s| s.fail_upload = on);
    }
}

fn unreachable_store() -> AppError {
    AppError::Connection("store unreachable".to_string())
}

#[async_trait]
impl DataGateway for FakeData {
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError> {
        Ok(self.with(|s| s.topics.iter().find(|t| t.slug == slug && t.is_active).cloned()))
    }

    async fn create_session(&self, topic_id: &str) -> Result<Session, AppError> {
        self.with(|s| {
            if s.fail_create {
                return Err(unreachable_store());
            }
            let session = Session::new(
                uuid::Uuid::new_v4().to_string(),
                topic_id.to_string(),
                new_thread_id(),
            );
            s.created += 1;
            s.sessions.insert(session.id.clone(), session.clone());
            Ok(session)
        })
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        self.with(|s| {
            if s.fail_get_session {
                return Err(unreachable_store());
            }
            Ok(s.sessions.get(id).cloned())
        })
    }

    async fn reset_session(&self, id: &str) -> Result<String, AppError> {
        self.with(|s| {
            if s.fail_reset {
                return Err(unreachable_store());
            }
            let session = s.sessions.get_mut(id).ok_or_else(|| AppError::not_found("session", id))?;
            session.thread_id = new_thread_id();
            s.resets += 1;
            Ok(session.thread_id.clone())
        })
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        self.with(|s| {
            if s.fail_delete {
                return Err(unreachable_store());
            }
            s.sessions.remove(id);
            s.deleted.push(id.to_string());
            Ok(())
        })
    }

    async fn upload_binary(
        &self,
        bucket: &str,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        self.with(|s| {
            if s.fail_upload {
                return Err(AppError::UploadFailed("bucket rejected object".to_string()));
            }
            s.uploads.push((bucket.to_string(), path.to_string()));
            Ok(format!("https://cdn.test/{bucket}/{path}"))
        })
    }
}

/// Scripted conversation backend. Replies are served in push order; with
/// nothing queued it answers with a plain text assistant message.
#[derive(Default)]
pub struct FakeConversation {
    replies: Mutex<VecDeque<Result<Value, AppError>>>,
    requests: Mutex<Vec<GatewayRequest>>,
    hold: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeConversation {
    pub fn push(&self, reply: Result<Value, AppError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_reply(&self, reply: Value) {
        self.push(Ok(reply));
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Parks the next call until the returned `release` is notified.
    /// `entered` fires once the call is parked.
    pub fn hold_next(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }
}

#[async_trait]
impl ConversationGateway for FakeConversation {
    async fn send(&self, request: &GatewayRequest) -> Result<Value, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let hold = self.hold.lock().unwrap().take();
        if let Some((entered, release)) = hold {
            entered.notify_one();
            release.notified().await;
        }
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(json!({ "success": true, "assistant_message": { "content": "reply" } }))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Replace(String),
    Reload(String),
}

#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn replace(&self, route: &ViewRoute) {
        self.events.lock().unwrap().push(NavEvent::Replace(route.path()));
    }

    fn reload(&self, route: &ViewRoute) {
        self.events.lock().unwrap().push(NavEvent::Reload(route.path()));
    }
}

/// Fakes wired together around one `medusa` topic.
pub struct Harness {
    pub data: Arc<FakeData>,
    pub conversation: Arc<FakeConversation>,
    pub navigator: Arc<RecordingNavigator>,
    pub cache: LocalSessionCache,
    pub authority: SessionAuthority,
}

impl Harness {
    pub const TOPIC_ID: &'static str = "topic-medusa";
    pub const WELCOME: &'static str = "Look me in the eyes, traveller.";

    pub fn new(authority: SessionAuthority) -> Self {
        let data = Arc::new(FakeData::default());
        data.add_topic(Topic {
            id: Self::TOPIC_ID.to_string(),
            slug: "medusa".to_string(),
            name: "Medusa".to_string(),
            subtitle: Some("Gorgon".to_string()),
            avatar_url: None,
            intro_url: None,
            welcome_message: Self::WELCOME.to_string(),
            is_active: true,
        });
        Self {
            data,
            conversation: Arc::new(FakeConversation::default()),
            navigator: Arc::new(RecordingNavigator::default()),
            cache: LocalSessionCache::new(Arc::new(MemoryKeyValueStore::new())),
            authority,
        }
    }

    pub fn services(&self) -> ChatServices {
        ChatServices {
            data: self.data.clone(),
            conversation: self.conversation.clone(),
            cache: self.cache.clone(),
            navigator: self.navigator.clone(),
            authority: self.authority,
            buckets: MediaBuckets {
                image: "user-uploads".to_string(),
                voice: "voice-recordings".to_string(),
            },
        }
    }

    pub fn controller(&self, session_id: Option<&str>) -> SessionController {
        SessionController::new(
            self.services(),
            ViewRoute::new("medusa", session_id.map(str::to_string)),
        )
    }
}
