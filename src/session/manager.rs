use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::info;

use super::types::{Session, SessionInitPayload, UserId};
use crate::models::{ChatMessage, CompletionGateway};
use crate::utils::MythosError;

/// Per-user slot. The slot mutex serializes all work on one user's
/// transcript, including the outbound completion call.
type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Owns every live conversation, keyed by external user identifier.
/// Sessions live for the process lifetime only; a restart forgets them.
pub struct SessionManager {
    gateway: CompletionGateway,
    sessions: RwLock<HashMap<UserId, SessionSlot>>,
}

impl SessionManager {
    pub fn new(gateway: CompletionGateway) -> Self {
        Self {
            gateway,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start (or restart) the conversation for a user, destructively
    /// replacing any prior session. The new session is committed in one
    /// step after the opening reply arrives, so the old transcript is
    /// never left half-overwritten. Gateway failure is not an error here:
    /// the fallback reply is appended and returned like any other turn.
    pub async fn initialize_session(&self, user_id: UserId, payload: SessionInitPayload) -> String {
        let slot = self.slot(user_id);
        let mut guard = slot.lock().await;

        let mut session = Session::new(&payload);
        let reply = self.gateway.generate(session.transcript()).await;
        session.push(ChatMessage::assistant(reply.clone()));

        *guard = Some(session);
        info!("session initialized for user {user_id}");
        reply
    }

    /// Append a user turn, replay the full transcript through the gateway,
    /// and append the reply. Returns `NoSession` when the user never
    /// initialized; no session is created as a side effect.
    pub async fn continue_session(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<String, MythosError> {
        let slot = self
            .sessions
            .read()
            .get(&user_id)
            .cloned()
            .ok_or(MythosError::NoSession)?;
        let mut guard = slot.lock().await;
        let session = guard.as_mut().ok_or(MythosError::NoSession)?;

        session.push(ChatMessage::user(text));
        let reply = self.gateway.generate(session.transcript()).await;
        session.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Whether the user currently has an initialized session
    pub async fn has_session(&self, user_id: UserId) -> bool {
        let slot = { self.sessions.read().get(&user_id).cloned() };
        match slot {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Snapshot of a user's transcript, for diagnostics and tests
    pub async fn transcript_snapshot(&self, user_id: UserId) -> Option<Vec<ChatMessage>> {
        let slot = { self.sessions.read().get(&user_id).cloned() }?;
        let guard = slot.lock().await;
        guard.as_ref().map(|session| session.transcript().to_vec())
    }

    /// Get or create the slot for a user. The map lock is held only for
    /// the lookup; the slot mutex is what guards the transcript, so work
    /// for different users never contends on a shared lock.
    fn slot(&self, user_id: UserId) -> SessionSlot {
        if let Some(slot) = self.sessions.read().get(&user_id) {
            return slot.clone();
        }
        self.sessions.write().entry(user_id).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_AI_NAME, FALLBACK_REPLY};
    use crate::models::{CompletionBackend, MessageRole, MockCompletionBackend};
    use anyhow::Result;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn manager_with(backend: MockCompletionBackend) -> SessionManager {
        SessionManager::new(CompletionGateway::new(Box::new(backend)))
    }

    fn vex_payload() -> SessionInitPayload {
        SessionInitPayload::from_json(r#"{"ai_name": "Vex", "scenario": "A dim tavern."}"#).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_builds_three_turn_transcript() {
        let mut backend = MockCompletionBackend::new();
        backend.expect_complete().returning(|messages| {
            // the gateway sees exactly the system turn and the scenario opener
            assert_eq!(messages.len(), 2);
            Ok("A hooded figure looks up.".to_string())
        });
        let manager = manager_with(backend);

        let reply = manager.initialize_session(7, vex_payload()).await;
        assert_eq!(reply, "A hooded figure looks up.");

        let transcript = manager.transcript_snapshot(7).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].role, MessageRole::System);
        assert!(transcript[0].content.contains("Vex"));
        assert_eq!(transcript[1].role, MessageRole::User);
        assert!(transcript[1].content.contains("A dim tavern."));
        assert_eq!(transcript[2].role, MessageRole::Assistant);
        assert_eq!(transcript[2].content, "A hooded figure looks up.");
    }

    #[tokio::test]
    async fn test_initialize_with_empty_payload_uses_defaults() {
        let mut backend = MockCompletionBackend::new();
        backend
            .expect_complete()
            .returning(|_| Ok("The throne room is quiet.".to_string()));
        let manager = manager_with(backend);

        let reply = manager
            .initialize_session(1, SessionInitPayload::default())
            .await;
        assert_eq!(reply, "The throne room is quiet.");

        let transcript = manager.transcript_snapshot(1).await.unwrap();
        assert!(transcript[0].content.contains(DEFAULT_AI_NAME));
    }

    #[tokio::test]
    async fn test_continue_without_session_is_no_session() {
        let manager = manager_with(MockCompletionBackend::new());

        let result = manager.continue_session(42, "hello?").await;
        assert!(matches!(result, Err(MythosError::NoSession)));
        // the failed continue must not create a session as a side effect
        assert!(!manager.has_session(42).await);
    }

    #[tokio::test]
    async fn test_continue_appends_user_and_assistant_turns() {
        let mut backend = MockCompletionBackend::new();
        backend
            .expect_complete()
            .returning(|_| Ok("She raises an eyebrow.".to_string()));
        let manager = manager_with(backend);

        manager.initialize_session(7, vex_payload()).await;
        let reply = manager.continue_session(7, "I sit at the bar.").await.unwrap();
        assert_eq!(reply, "She raises an eyebrow.");

        let transcript = manager.transcript_snapshot(7).await.unwrap();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[3].role, MessageRole::User);
        assert_eq!(transcript[3].content, "I sit at the bar.");
        assert_eq!(transcript[4].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_reinitialize_discards_prior_history() {
        let mut backend = MockCompletionBackend::new();
        backend
            .expect_complete()
            .returning(|_| Ok("reply".to_string()));
        let manager = manager_with(backend);

        manager.initialize_session(7, vex_payload()).await;
        manager.continue_session(7, "first").await.unwrap();
        manager.continue_session(7, "second").await.unwrap();
        assert_eq!(manager.transcript_snapshot(7).await.unwrap().len(), 7);

        manager
            .initialize_session(7, SessionInitPayload::default())
            .await;
        let transcript = manager.transcript_snapshot(7).await.unwrap();
        assert_eq!(transcript.len(), 3);
        assert!(transcript[0].content.contains(DEFAULT_AI_NAME));
    }

    #[tokio::test]
    async fn test_gateway_failure_still_appends_fallback() {
        let mut backend = MockCompletionBackend::new();
        backend
            .expect_complete()
            .returning(|_| Err(anyhow::anyhow!("503 from upstream")));
        backend.expect_name().return_const("mock".to_string());
        let manager = manager_with(backend);

        let reply = manager.initialize_session(7, vex_payload()).await;
        assert_eq!(reply, FALLBACK_REPLY);

        let reply = manager.continue_session(7, "are you there?").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);

        // the fallback is woven into the transcript like a real turn
        let transcript = manager.transcript_snapshot(7).await.unwrap();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[2].content, FALLBACK_REPLY);
        assert_eq!(transcript[4].content, FALLBACK_REPLY);
    }

    /// Scripted backend with a real delay, for the concurrency properties
    struct SlowBackend {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionBackend for SlowBackend {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok("woven".to_string())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_users_do_not_block_each_other() {
        let backend = SlowBackend {
            delay: Duration::from_millis(150),
            calls: AtomicUsize::new(0),
        };
        let manager = Arc::new(SessionManager::new(CompletionGateway::new(Box::new(backend))));

        for id in [1, 2] {
            manager
                .initialize_session(id, SessionInitPayload::default())
                .await;
        }

        let start = std::time::Instant::now();
        let first = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.continue_session(1, "one").await }
        });
        let second = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.continue_session(2, "two").await }
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        // two parallel 150ms calls should finish well under the 300ms a
        // serialized pair would take
        assert!(
            start.elapsed() < Duration::from_millis(280),
            "continues for different users serialized: {:?}",
            start.elapsed()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_user_concurrent_continues_lose_no_turns() {
        let backend = SlowBackend {
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
        };
        let manager = Arc::new(SessionManager::new(CompletionGateway::new(Box::new(backend))));

        manager
            .initialize_session(9, SessionInitPayload::default())
            .await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager
                    .continue_session(9, &format!("turn {i}"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let transcript = manager.transcript_snapshot(9).await.unwrap();
        // three turns from init, then two per processed event
        assert_eq!(transcript.len(), 3 + 2 * 8);
        // every user turn is immediately followed by its assistant reply
        for pair in transcript[1..].chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].role, MessageRole::Assistant);
        }
    }
}
