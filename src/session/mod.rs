//! Multi-turn conversation over any [`ChatProvider`].

use crate::provider::{ChatProvider, ChatTurn, CompletionOptions, Error};
use std::sync::Arc;

/// An ordered transcript plus the provider that answers it.
///
/// `send` takes `&mut self`, so turns on one session never interleave.
pub struct Session {
    pub id: String,
    provider: Arc<dyn ChatProvider>,
    system_prompt: Option<String>,
    options: CompletionOptions,
    turns: Vec<ChatTurn>,
}

impl Session {
    /// Start a conversation. A non-empty system prompt becomes the first turn.
    pub fn new(provider: Arc<dyn ChatProvider>, system_prompt: Option<String>) -> Self {
        let options = provider.default_options();
        let system_prompt = system_prompt.filter(|s| !s.is_empty());
        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            system_prompt,
            options,
            turns: Vec::new(),
        };
        session.seed();
        session
    }

    /// Override the per-turn completion options.
    #[must_use]
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    fn seed(&mut self) {
        if let Some(system) = &self.system_prompt {
            self.turns.push(ChatTurn::system(system.clone()));
        }
    }

    /// Send one user message with the whole transcript and record the reply.
    ///
    /// The transcript only changes once the reply arrives, so a failed or
    /// dropped call leaves it untouched.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<String, Error> {
        let mut pending = self.turns.clone();
        pending.push(ChatTurn::user(text));

        tracing::debug!(
            session = %self.id,
            provider = self.provider.id(),
            turns = pending.len(),
            "Sending conversation"
        );

        let result = self
            .provider
            .complete_with_history(&pending, &self.options)
            .await?;

        pending.push(ChatTurn::assistant(result.text.clone()));
        self.turns = pending;
        Ok(result.text)
    }

    /// Forget the conversation, keeping the system prompt.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.seed();
    }

    /// Snapshot of the transcript.
    #[must_use]
    pub fn history(&self) -> Vec<ChatTurn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("provider", &self.provider.id())
            .field("turns", &self.turns.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CompletionResult, Role};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies with "reply N" and records every transcript it receives.
    #[derive(Default)]
    struct Echo {
        seen: Mutex<Vec<Vec<ChatTurn>>>,
        fail: bool,
        delay: Duration,
    }

    #[async_trait]
    impl ChatProvider for Echo {
        fn id(&self) -> &'static str {
            "echo"
        }

        fn default_options(&self) -> CompletionOptions {
            CompletionOptions::new(0.3, 64)
        }

        async fn complete_with_history(
            &self,
            turns: &[ChatTurn],
            _options: &CompletionOptions,
        ) -> Result<CompletionResult, Error> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(Error::Api {
                    provider: "echo",
                    status: 500,
                    body: "boom".into(),
                });
            }
            let mut seen = self.seen.lock().unwrap();
            seen.push(turns.to_vec());
            Ok(CompletionResult::from_text(Some(format!("reply {}", seen.len()))))
        }
    }

    #[tokio::test]
    async fn test_two_sends_record_four_turns() {
        let echo = Arc::new(Echo::default());
        let mut session = Session::new(echo.clone(), None);

        assert_eq!(session.send("first").await.unwrap(), "reply 1");
        assert_eq!(session.send("second").await.unwrap(), "reply 2");

        assert_eq!(
            session.history(),
            vec![
                ChatTurn::user("first"),
                ChatTurn::assistant("reply 1"),
                ChatTurn::user("second"),
                ChatTurn::assistant("reply 2"),
            ]
        );

        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][2], ChatTurn::user("second"));
    }

    #[tokio::test]
    async fn test_system_prompt_leads_transcript() {
        let echo = Arc::new(Echo::default());
        let mut session = Session::new(echo.clone(), Some("be kind".into()));
        assert_eq!(session.len(), 1);

        session.send("hi").await.unwrap();
        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][0].text, "be kind");
    }

    #[tokio::test]
    async fn test_reset() {
        let mut plain = Session::new(Arc::new(Echo::default()), None);
        plain.send("hi").await.unwrap();
        plain.reset();
        assert!(plain.is_empty());

        let mut seeded = Session::new(Arc::new(Echo::default()), Some("sys".into()));
        seeded.send("hi").await.unwrap();
        assert_eq!(seeded.len(), 3);
        seeded.reset();
        assert_eq!(seeded.history(), vec![ChatTurn::system("sys")]);
    }

    #[test]
    fn test_empty_system_prompt_ignored() {
        let session = Session::new(Arc::new(Echo::default()), Some(String::new()));
        assert!(session.is_empty());
        assert_eq!(session.system_prompt(), None);
    }

    #[tokio::test]
    async fn test_history_is_snapshot() {
        let mut session = Session::new(Arc::new(Echo::default()), None);
        session.send("one").await.unwrap();
        let mut snapshot = session.history();
        snapshot.clear();
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_rolls_back() {
        let failing = Arc::new(Echo {
            fail: true,
            ..Echo::default()
        });
        let mut session = Session::new(failing, Some("sys".into()));

        let err = session.send("hello").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(session.history(), vec![ChatTurn::system("sys")]);
    }

    #[tokio::test]
    async fn test_dropped_send_leaves_transcript_untouched() {
        let slow = Arc::new(Echo {
            delay: Duration::from_secs(5),
            ..Echo::default()
        });
        let mut session = Session::new(slow, None);

        let outcome = tokio::time::timeout(Duration::from_millis(20), session.send("hi")).await;
        assert!(outcome.is_err());
        assert!(session.is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_options_default_from_provider() {
        let session = Session::new(Arc::new(Echo::default()), None);
        assert_eq!(session.options().max_tokens, 64);

        let session = session.with_options(CompletionOptions::new(0.9, 10).with_model("m"));
        assert_eq!(session.options().model.as_deref(), Some("m"));
        assert_ne!(session.id, "");
    }
}
