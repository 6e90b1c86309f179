//! In-memory registry of live interview sessions, keyed by session id.
//!
//! The outer lock guards insert/lookup/remove only. Each session sits behind its
//! own mutex, so turns of one session are serialized while other sessions proceed
//! independently. Completed sessions are removed by the caller once archived.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::interview::session::InterviewSession;

pub type SharedSession = Arc<Mutex<InterviewSession>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under its own id and returns that id.
    pub async fn insert(&self, session: InterviewSession) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
