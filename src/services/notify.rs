//! Outbound "Discord-style" webhook (§6), fire-and-forget per §5.
//!
//! Grounded in the teacher's `llm/client.rs` `reqwest` usage: a thin client
//! struct wrapping a base URL, posting a small JSON body, with errors
//! reduced to logging rather than propagated to the caller.

use std::time::Duration;

use serde::Serialize;

/// Anything that can receive a fire-and-forget textual notification.
///
/// A trait (rather than a concrete `WebhookSink`) so tests can inject a
/// recording fake instead of making network calls.
pub trait MessageSink: Send + Sync {
    fn notify(&self, message: String);
}

/// No comms configured — drops messages silently.
pub struct NullMessageSink;

impl MessageSink for NullMessageSink {
    fn notify(&self, _message: String) {}
}

#[derive(Serialize)]
struct WebhookPayload {
    content: String,
    username: String,
}

/// Posts to a Discord-compatible incoming webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
    username: String,
}

impl WebhookSink {
    pub fn new(url: String, username: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url,
            username,
        }
    }
}

impl MessageSink for WebhookSink {
    fn notify(&self, message: String) {
        let client = self.client.clone();
        let url = self.url.clone();
        let payload = WebhookPayload {
            content: message,
            username: self.username.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&payload).send().await {
                tracing::warn!(error = %e, "webhook delivery failed");
            }
        });
    }
}

#[cfg(test)]
pub mod test_support {
    use super::MessageSink;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingMessageSink {
        pub messages: Mutex<Vec<String>>,
    }

    impl MessageSink for RecordingMessageSink {
        fn notify(&self, message: String) {
            self.messages.lock().unwrap().push(message);
        }
    }
}
