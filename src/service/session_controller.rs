//! State machine behind one conversation view.
//!
//! `NotStarted → Initializing → Ready ⇄ Sending`, with `Errored` (failed
//! initialization) and `Wiped` as exits. All state lives in a
//! `watch::Sender`; every transition is a synchronous `send_modify`, so the
//! busy check and the switch to `Sending` happen before any `.await`.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::chat_state::{ChatState, Outcome, Phase, ViewError};
use super::ChatServices;
use crate::config::SessionAuthority;
use crate::errors::AppError;
use crate::gateway::{self, GatewayRequest, LoadReply, MessagePayload, MessageReply, ResetReply, WipeReply};
use crate::models::{ContentType, Message, MessageRole, Topic};
use crate::routes::view_route::ViewRoute;
use crate::storage::{media_object_path, MediaKind};

/// Ids captured when an action takes the busy guard.
struct ActiveSession {
    session_id: String,
    thread_id: String,
    welcome_message: Option<String>,
}

/// Holds `Sending` for the duration of one action and hands control back
/// to `Ready` on drop, whatever path the action left by.
struct BusyGuard<'a> {
    state: &'a watch::Sender<ChatState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            if s.phase == Phase::Sending {
                s.phase = Phase::Ready;
                true
            } else {
                false
            }
        });
    }
}

/// The exact message an optimistic insert added, so rollback can remove
/// that one entry and nothing else.
#[must_use]
struct OptimisticInsert {
    message_id: String,
}

impl OptimisticInsert {
    fn rollback(self, state: &watch::Sender<ChatState>) {
        state.send_if_modified(|s| {
            match s.messages.iter().position(|m| m.id == self.message_id) {
                Some(pos) => {
                    s.messages.remove(pos);
                    true
                }
                None => false,
            }
        });
    }
}

struct LoadedView {
    topic: Topic,
    session_id: String,
    thread_id: String,
    messages: Vec<Message>,
}

struct Inner {
    services: ChatServices,
    route: ViewRoute,
    state: watch::Sender<ChatState>,
}

/// Controller for the view mounted at `route`. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(services: ChatServices, route: ViewRoute) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self { inner: Arc::new(Inner { services, route, state }) }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> ChatState {
        self.inner.state.borrow().clone()
    }

    fn slug(&self) -> &str {
        &self.inner.route.topic_slug
    }

    fn set_error(&self, error: ViewError) {
        self.inner.state.send_modify(|s| s.error = Some(error));
    }

    // ── Initialize ───────────────────────────────────────────────────────────

    /// Resolves the topic and a session for this view. Acts only on the first
    /// call; later calls return [`Outcome::Ignored`].
    pub async fn initialize(&self) -> Outcome {
        let started = self.inner.state.send_if_modified(|s| {
            if s.phase != Phase::NotStarted {
                return false;
            }
            s.phase = Phase::Initializing;
            s.error = None;
            true
        });
        if !started {
            return Outcome::Ignored;
        }

        let loaded = match self.inner.services.authority {
            SessionAuthority::DataStore => self.load_from_store().await,
            SessionAuthority::Server => self.load_from_server().await,
        };

        let view = match loaded {
            Ok(view) => view,
            Err(view_error) => {
                self.inner.state.send_replace(ChatState {
                    phase: Phase::Errored,
                    error: Some(view_error),
                    ..ChatState::default()
                });
                return Outcome::Failed;
            }
        };

        let slug = self.slug().to_string();
        self.inner.services.cache.write(&slug, &view.session_id, &view.thread_id);

        let canonical = view.session_id.clone();
        info!("View /{slug} ready on session {canonical}");
        self.inner.state.send_replace(ChatState {
            phase: Phase::Ready,
            topic: Some(view.topic),
            messages: view.messages,
            session_id: Some(view.session_id),
            thread_id: Some(view.thread_id),
            error: None,
        });

        if self.inner.route.session_id.as_deref() != Some(canonical.as_str()) {
            self.inner.services.navigator.replace(&ViewRoute::new(slug, Some(canonical)));
        }
        Outcome::Done
    }

    /// Session id to try resuming: the route's, else the cached one.
    fn resume_candidate(&self) -> Option<String> {
        self.inner.route.session_id.clone().or_else(|| {
            self.inner.services.cache.read(self.slug()).map(|stored| stored.session_id)
        })
    }

    async fn load_from_store(&self) -> Result<LoadedView, ViewError> {
        let data = &self.inner.services.data;
        let slug = self.slug();

        let topic = data
            .get_topic_by_slug(slug)
            .await
            .map_err(|e| {
                error!("Failed to load topic {slug}: {e}");
                ViewError::ConnectionFailed
            })?
            .ok_or_else(|| {
                info!("Topic {slug} not found");
                ViewError::NotFound
            })?;

        let mut resumed = None;
        if let Some(candidate) = self.resume_candidate() {
            match data.get_session(&candidate).await {
                Ok(Some(session)) if session.topic_id == topic.id => resumed = Some(session),
                Ok(Some(_)) => warn!("Session {candidate} belongs to another topic, starting fresh"),
                Ok(None) => info!("Session {candidate} no longer exists, starting fresh"),
                Err(e) => warn!("Could not resume session {candidate}, starting fresh: {e}"),
            }
        }

        let session = match resumed {
            Some(session) => session,
            None => data.create_session(&topic.id).await.map_err(|e| {
                error!("Failed to create session for {slug}: {e}");
                ViewError::ConnectionFailed
            })?,
        };

        let opening = Message::opening(&session.id, &session.thread_id, &topic.welcome_message);
        Ok(LoadedView {
            topic,
            session_id: session.id,
            thread_id: session.thread_id,
            messages: vec![opening],
        })
    }

    async fn load_from_server(&self) -> Result<LoadedView, ViewError> {
        let slug = self.slug();
        let request = GatewayRequest::Load {
            entity_slug: slug.to_string(),
            session_id: self.resume_candidate(),
        };
        let reply: LoadReply = gateway::call(self.inner.services.conversation.as_ref(), request)
            .await
            .map_err(|e| {
                error!("Failed to load /{slug} from backend: {e}");
                match e {
                    AppError::Gateway { status: 404, .. } => ViewError::NotFound,
                    _ => ViewError::ConnectionFailed,
                }
            })?;
        Ok(LoadedView {
            topic: reply.entity,
            session_id: reply.session_id,
            thread_id: reply.thread_id,
            messages: reply.messages,
        })
    }

    // ── Busy guard ───────────────────────────────────────────────────────────

    /// Moves `Ready → Sending` if there is an active session. Returns `None`
    /// (and changes nothing) otherwise.
    fn begin(&self) -> Option<(BusyGuard<'_>, ActiveSession)> {
        let mut active = None;
        self.inner.state.send_if_modified(|s| {
            if s.phase != Phase::Ready {
                return false;
            }
            let (Some(session_id), Some(thread_id)) = (&s.session_id, &s.thread_id) else {
                return false;
            };
            active = Some(ActiveSession {
                session_id: session_id.clone(),
                thread_id: thread_id.clone(),
                welcome_message: s.topic.as_ref().map(|t| t.welcome_message.clone()),
            });
            s.phase = Phase::Sending;
            s.error = None;
            true
        });
        active.map(|a| (BusyGuard { state: &self.inner.state }, a))
    }

    // ── Send ─────────────────────────────────────────────────────────────────

    pub async fn send_text(&self, text: &str) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Ignored;
        }
        let Some((_guard, active)) = self.begin() else {
            return Outcome::Ignored;
        };
        self.exchange(&active, ContentType::Text, Some(text.to_string()), None).await
    }

    pub async fn send_image(&self, bytes: Vec<u8>) -> Outcome {
        self.send_media(MediaKind::Image, bytes).await
    }

    pub async fn send_voice(&self, bytes: Vec<u8>) -> Outcome {
        self.send_media(MediaKind::Voice, bytes).await
    }

    /// Uploads first; nothing is inserted or sent if the upload fails.
    async fn send_media(&self, kind: MediaKind, bytes: Vec<u8>) -> Outcome {
        let Some((_guard, active)) = self.begin() else {
            return Outcome::Ignored;
        };

        let services = &self.inner.services;
        let path = media_object_path(&active.session_id, kind, Utc::now());
        let bucket = services.buckets.for_kind(kind);
        let url = match services.data.upload_binary(bucket, &path, bytes, kind.mime_type()).await {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to upload {kind} for session {}: {e}", active.session_id);
                self.set_error(ViewError::UploadFailed(kind));
                return Outcome::Failed;
            }
        };

        let content_type = match kind {
            MediaKind::Image => ContentType::Image,
            MediaKind::Voice => ContentType::Audio,
        };
        self.exchange(&active, content_type, None, Some(url)).await
    }

    /// Optimistic insert, gateway round trip, then either the assistant
    /// reply is appended or the insert is rolled back.
    async fn exchange(
        &self,
        active: &ActiveSession,
        content_type: ContentType,
        content: Option<String>,
        media_url: Option<String>,
    ) -> Outcome {
        let outgoing = Message::provisional(
            &active.session_id,
            &active.thread_id,
            content_type,
            content.clone(),
            media_url.clone(),
        );
        let inserted = OptimisticInsert { message_id: outgoing.id.clone() };
        self.inner.state.send_modify(|s| s.messages.push(outgoing));

        let request = GatewayRequest::Message {
            entity_slug: self.slug().to_string(),
            session_id: active.session_id.clone(),
            thread_id: active.thread_id.clone(),
            payload: MessagePayload { content_type, content, media_url },
        };

        let reply = gateway::call::<MessageReply>(self.inner.services.conversation.as_ref(), request)
            .await
            .and_then(MessageReply::into_content);
        match reply {
            Ok(body) => {
                let assistant = Message {
                    id: uuid::Uuid::new_v4().to_string(),
                    session_id: active.session_id.clone(),
                    thread_id: active.thread_id.clone(),
                    role: MessageRole::Assistant,
                    content_type: body.content_type.unwrap_or_default(),
                    content: body.content,
                    media_url: body.media_url,
                    created_at: Utc::now(),
                };
                self.inner.state.send_modify(|s| s.messages.push(assistant));
                Outcome::Done
            }
            Err(e) => {
                error!("Failed to send message on session {}: {e}", active.session_id);
                inserted.rollback(&self.inner.state);
                self.set_error(ViewError::SendFailed);
                Outcome::Failed
            }
        }
    }

    // ── Reset ────────────────────────────────────────────────────────────────

    /// Starts a new thread on the same session. On failure nothing changes
    /// except the error.
    pub async fn reset(&self) -> Outcome {
        let Some((_guard, active)) = self.begin() else {
            return Outcome::Ignored;
        };
        let services = &self.inner.services;
        let slug = self.slug();

        let result = match services.authority {
            SessionAuthority::DataStore => {
                services.data.reset_session(&active.session_id).await.map(|thread_id| {
                    let welcome = active.welcome_message.as_deref().unwrap_or_default();
                    let opening = Message::opening(&active.session_id, &thread_id, welcome);
                    (thread_id, opening)
                })
            }
            SessionAuthority::Server => {
                let request = GatewayRequest::Reset {
                    entity_slug: slug.to_string(),
                    session_id: active.session_id.clone(),
                };
                gateway::call::<ResetReply>(services.conversation.as_ref(), request)
                    .await
                    .map(|reply| (reply.thread_id, reply.welcome_message))
            }
        };

        match result {
            Ok((thread_id, opening)) => {
                services.cache.update_thread_id(slug, &thread_id);
                info!("Session {} reset to thread {thread_id}", active.session_id);
                self.inner.state.send_modify(|s| {
                    s.thread_id = Some(thread_id);
                    s.messages = vec![opening];
                });
                Outcome::Done
            }
            Err(e) => {
                error!("Failed to reset session {}: {e}", active.session_id);
                self.set_error(ViewError::ResetFailed);
                Outcome::Failed
            }
        }
    }

    // ── Wipe ─────────────────────────────────────────────────────────────────

    /// Deletes the session and everything under it, forgets it locally and
    /// asks the host to reload the topic's base address.
    pub async fn wipe(&self) -> Outcome {
        let Some((_guard, active)) = self.begin() else {
            return Outcome::Ignored;
        };
        let services = &self.inner.services;
        let slug = self.slug();

        let result = match services.authority {
            SessionAuthority::DataStore => services.data.delete_session(&active.session_id).await,
            SessionAuthority::Server => {
                let request = GatewayRequest::Wipe {
                    entity_slug: slug.to_string(),
                    session_id: active.session_id.clone(),
                };
                gateway::call::<WipeReply>(services.conversation.as_ref(), request)
                    .await
                    .map(|_| ())
            }
        };

        if let Err(e) = result {
            error!("Failed to wipe session {}: {e}", active.session_id);
            self.set_error(ViewError::WipeFailed);
            return Outcome::Failed;
        }

        services.cache.clear(slug);
        info!("Wiped session {} of /{slug}", active.session_id);
        self.inner.state.send_replace(ChatState { phase: Phase::Wiped, ..ChatState::default() });
        services.navigator.reload(&ViewRoute::base(slug));
        Outcome::Done
    }
}
