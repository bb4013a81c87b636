//! Conversational fallback
//!
//! Invoked only for Unknown intents. Delegates text generation to an
//! external chat backend and absorbs every failure into a safe canned
//! reply; nothing from this path may propagate into the pipeline.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Reply used when the chat backend is unreachable or disabled
pub const SAFE_REPLY: &str = "Sorry, I'm having trouble thinking right now. Could you try again?";

/// External conversational text generator
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a reply to the user's utterance
    async fn generate_reply(&self, text: &str) -> Result<String>;
}

/// Chat API response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// HTTP chat client (Ollama-style generate endpoint)
#[derive(Clone)]
pub struct HttpChat {
    url: String,
    model: String,
}

impl HttpChat {
    pub fn new(config: &crate::config::Config) -> Self {
        Self {
            url: config.chat_url.clone(),
            model: config.chat_model.clone(),
        }
    }

    fn build_prompt(&self, text: &str) -> String {
        format!(
            r#"You are the voice of a small hobby rover. You are helpful, friendly
and concise; keep replies to one or two short sentences. You can drive to
the cafeteria, play the radio, dance, and chat.

The user said: "{text}"

Reply:"#
        )
    }
}

#[async_trait]
impl ChatBackend for HttpChat {
    async fn generate_reply(&self, text: &str) -> Result<String> {
        let prompt = self.build_prompt(text);

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/api/generate", self.url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": 0.7,
                    "num_predict": 128
                }
            }))
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            anyhow::bail!("chat API error ({}): {}", status, body_text);
        }

        let chat_resp: ChatResponse = serde_json::from_str(&body_text)?;
        let reply = chat_resp.response.trim().to_string();
        debug!("💬 Chat reply: '{}'", reply);
        Ok(reply)
    }
}

/// Selection policy around the chat backend: when it runs and how its
/// failure is absorbed.
pub struct FallbackResponder {
    backend: Option<std::sync::Arc<dyn ChatBackend>>,
}

impl FallbackResponder {
    pub fn new(backend: std::sync::Arc<dyn ChatBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Responder with conversation disabled; always answers with the
    /// safe reply.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Produce a conversational reply. `Ok` carries generated text;
    /// `Err` means the caller should fall back to the safe reply.
    pub async fn respond(&self, text: &str) -> Result<String> {
        let backend = match &self.backend {
            Some(b) => b,
            None => {
                info!("💬 Chat disabled, using canned reply");
                return Ok(SAFE_REPLY.to_string());
            }
        };

        info!("💬 Conversational input: '{}'", text);
        match backend.generate_reply(text).await {
            Ok(reply) if !reply.is_empty() => Ok(reply),
            Ok(_) => {
                warn!("💬 Chat backend returned an empty reply");
                anyhow::bail!("empty chat reply")
            }
            Err(e) => {
                warn!("💬 Chat backend failed: {}", e);
                Err(e)
            }
        }
    }
}
