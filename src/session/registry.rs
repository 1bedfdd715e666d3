//! Session registry: spawning sessions and routing origins to them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::SessionError;
use super::actor::{SessionActor, SessionHandle};
use super::config::SessionConfig;
use crate::game::Game;
use crate::game::entities::PlayerId;

/// Where a session lives on the chat platform (a guild or channel key).
/// At most one session runs per origin.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct OriginKey(String);

impl OriginKey {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OriginKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OriginKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Registry of running sessions. The map is the only structure shared
/// across inbound events, so every insert/lookup/remove goes through its
/// lock; everything per-session happens inside that session's actor.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<OriginKey, SessionHandle>>>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Create and spawn a session with `initiator` as its host.
    ///
    /// Fails without side effects when the config is unusable or a live
    /// session already occupies the origin; no partial session is ever
    /// left registered.
    ///
    /// # Arguments
    ///
    /// * `initiator` - User creating the session; they host it
    /// * `origin` - Platform key the session is bound to
    ///
    /// # Returns
    ///
    /// * `Result<SessionHandle, SessionError>` - Handle or creation failure
    pub async fn create_session(
        &self,
        initiator: PlayerId,
        origin: OriginKey,
    ) -> Result<SessionHandle, SessionError> {
        self.config.validate().map_err(|reason| {
            log::error!("refusing to create session in {origin}: {reason}");
            SessionError::CreationFailed
        })?;

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&origin)
            .is_some_and(|handle| !handle.is_closed())
        {
            return Err(SessionError::CreationFailed);
        }

        let session_id = Uuid::new_v4();
        let game = Game::new(session_id, initiator, self.config.game_settings());
        let (actor, handle) = SessionActor::new(game, self.config.clone());
        sessions.insert(origin.clone(), handle.clone());
        drop(sessions);

        // The wrapper unregisters the session once its actor exits (win
        // or host delete). Matching on the session ID keeps a racing
        // re-create on the same origin from being clobbered.
        let registry = Arc::clone(&self.sessions);
        let key = origin.clone();
        tokio::spawn(async move {
            actor.run().await;
            let mut sessions = registry.write().await;
            if sessions
                .get(&key)
                .is_some_and(|handle| handle.session_id() == session_id)
            {
                sessions.remove(&key);
            }
        });

        log::info!("created session {session_id} in {origin}");
        Ok(handle)
    }

    /// Look up the live session at `origin`. A session whose actor has
    /// already exited reports not-found even before the cleanup task has
    /// pruned it.
    pub async fn find_session(&self, origin: &OriginKey) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(origin)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Host-initiated teardown, routed through the session itself.
    pub async fn delete_session(
        &self,
        origin: &OriginKey,
        identity: PlayerId,
    ) -> Result<(), SessionError> {
        let handle = self
            .find_session(origin)
            .await
            .ok_or(SessionError::NotFound)?;
        handle.delete(identity).await
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|handle| !handle.is_closed())
            .count()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
