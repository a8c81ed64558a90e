pub mod completion;

use std::sync::Arc;
use std::time::{Duration, Instant};

use estate_core::{classify_intent, dispatch_automation, ChatReply};
use estate_observability::AppMetrics;
use tracing::{info, instrument, warn};

pub use completion::{
    CompletionClient, CompletionConfig, CompletionError, GeminiClient, DEFAULT_COMPLETION_TIMEOUT,
};

pub const FALLBACK_REPLY: &str =
    "I'm here to help with real estate! Are you looking to buy a property, sell one, or need information?";

pub fn build_prompt(message: &str) -> String {
    format!(
        "You are a helpful real estate assistant. Please respond to this user message: {}",
        message
    )
}

#[derive(Clone)]
pub struct EstateAgent<C>
where
    C: CompletionClient,
{
    completion: Arc<C>,
    deadline: Duration,
    metrics: Arc<AppMetrics>,
}

impl<C> EstateAgent<C>
where
    C: CompletionClient,
{
    pub fn new(completion: Arc<C>, deadline: Duration, metrics: Arc<AppMetrics>) -> Self {
        Self {
            completion,
            deadline,
            metrics,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion
    }

    /// Never fails: completion errors are logged and replaced by
    /// [`FALLBACK_REPLY`]. Intent and automation come from `message` alone.
    #[instrument(skip(self, message))]
    pub async fn handle_chat(&self, message: &str) -> ChatReply {
        let started = Instant::now();
        self.metrics.inc_chat_request();

        let intent = classify_intent(message);
        let automation = dispatch_automation(intent);

        let (reply, fallback_used) = match self.complete_with_deadline(message).await {
            Ok(reply) => {
                self.metrics.inc_completion_success();
                (reply, false)
            }
            Err(err) => {
                self.metrics.inc_fallback();
                warn!(error = %err, "completion failed, using fallback reply");
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        self.metrics.observe_chat_latency(started.elapsed());
        info!(
            intent = %intent,
            automation = automation,
            fallback_used,
            "chat handled"
        );

        ChatReply {
            intent,
            reply,
            automation: automation.to_string(),
        }
    }

    /// One completion attempt bounded by the agent deadline. Dropping the
    /// returned future cancels the outbound call.
    pub async fn complete_with_deadline(&self, message: &str) -> Result<String, CompletionError> {
        let prompt = build_prompt(message);

        match tokio::time::timeout(self.deadline, self.completion.complete(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(self.deadline)),
        }
    }
}
