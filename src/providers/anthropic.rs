use crate::providers::traits::{
    ChatMessage, Provider, StreamChunk, StreamError, StreamOptions, StreamResult,
};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    credential: Option<String>,
    base_url: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    temperature: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// One `data:` payload from the Messages API event stream. All event kinds
/// share this envelope; fields irrelevant to a kind stay `None`.
#[derive(Debug, Deserialize)]
struct SseEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<SseDelta>,
    #[serde(default)]
    error: Option<SseError>,
}

#[derive(Debug, Deserialize)]
struct SseDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseError {
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
enum SsePayload {
    Delta(String),
    Stop,
}

/// Parse one SSE line from the Messages API. `event:` lines are redundant
/// (the JSON carries its own `type`) and are skipped along with comments.
fn parse_sse_line(line: &str) -> StreamResult<Option<SsePayload>> {
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
        return Ok(None);
    }

    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();

    if data == "[DONE]" {
        return Ok(Some(SsePayload::Stop));
    }

    let event: SseEvent = serde_json::from_str(data).map_err(StreamError::Json)?;
    match event.kind.as_str() {
        "content_block_delta" => Ok(event
            .delta
            .and_then(|d| d.text)
            .filter(|t| !t.is_empty())
            .map(SsePayload::Delta)),
        "message_stop" => Ok(Some(SsePayload::Stop)),
        "error" => {
            let message = event
                .error
                .map_or_else(|| "unknown provider error".to_string(), |e| e.message);
            Err(StreamError::Provider(message))
        }
        _ => Ok(None),
    }
}

/// Convert the SSE byte stream to text chunks. Byte chunks are buffered so a
/// line (or a multi-byte character) split across network reads reassembles
/// before parsing.
fn sse_bytes_to_chunks(
    response: reqwest::Response,
    count_tokens: bool,
) -> stream::BoxStream<'static, StreamResult<StreamChunk>> {
    let (tx, rx) = tokio::sync::mpsc::channel::<StreamResult<StreamChunk>>(100);

    tokio::spawn(async move {
        let mut buffer: Vec<u8> = Vec::new();
        let mut bytes_stream = response.bytes_stream();

        while let Some(item) = bytes_stream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = tx.send(Err(StreamError::Http(e))).await;
                    return;
                }
            };

            buffer.extend_from_slice(&bytes);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line_bytes);

                match parse_sse_line(&line) {
                    Ok(Some(SsePayload::Delta(text))) => {
                        let mut chunk = StreamChunk::delta(text);
                        if count_tokens {
                            chunk = chunk.with_token_estimate();
                        }
                        if tx.send(Ok(chunk)).await.is_err() {
                            return; // Receiver dropped
                        }
                    }
                    Ok(Some(SsePayload::Stop)) => {
                        let _ = tx.send(Ok(StreamChunk::final_chunk())).await;
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }

        // Body ended without a message_stop; close the stream cleanly anyway.
        let _ = tx.send(Ok(StreamChunk::final_chunk())).await;
    });

    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
    .boxed()
}

impl AnthropicProvider {
    pub fn new(credential: Option<&str>) -> Self {
        Self::with_base_url(credential, None)
    }

    pub fn with_base_url(credential: Option<&str>, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or("https://api.anthropic.com")
            .to_string();
        Self {
            credential: credential
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            base_url,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn is_setup_token(token: &str) -> bool {
        token.starts_with("sk-ant-oat01-")
    }

    fn apply_auth(
        request: reqwest::RequestBuilder,
        credential: &str,
    ) -> reqwest::RequestBuilder {
        if Self::is_setup_token(credential) {
            request
                .header("Authorization", format!("Bearer {credential}"))
                .header("anthropic-beta", "oauth-2025-04-20")
        } else {
            request.header("x-api-key", credential)
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn credential(&self) -> anyhow::Result<&str> {
        self.credential
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key not set"))
    }

    /// Split conversation history into the request's `system` field and the
    /// user/assistant message list. The Messages API rejects a `system` role
    /// inside `messages`.
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<Message>) {
        let mut system = None;
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role.as_str() {
                "system" => {
                    if system.is_none() {
                        system = Some(msg.content.clone());
                    }
                }
                "assistant" => converted.push(Message {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
                _ => converted.push(Message {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        (system, converted)
    }

    fn parse_text_response(response: ChatResponse) -> anyhow::Result<String> {
        response
            .content
            .into_iter()
            .find(|c| c.kind == "text")
            .and_then(|c| c.text)
            .ok_or_else(|| anyhow::anyhow!("No response from Anthropic"))
    }

    async fn post_messages(&self, request: &ChatRequest) -> anyhow::Result<String> {
        let credential = self.credential()?;
        let client = Client::new();
        let req_builder = Self::apply_auth(
            client
                .post(self.messages_url())
                .header("anthropic-version", "2023-06-01"),
            credential,
        );

        let response = req_builder.json(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error {status}: {body}");
        }

        Self::parse_text_response(response.json::<ChatResponse>().await?)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat_with_system(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            system: system_prompt.map(ToString::to_string),
            messages: vec![Message {
                role: "user".to_string(),
                content: message.to_string(),
            }],
            temperature,
            stream: false,
        };
        self.post_messages(&request).await
    }

    async fn chat_with_history(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let (system, converted) = Self::convert_messages(messages);
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            system,
            messages: converted,
            temperature,
            stream: false,
        };
        self.post_messages(&request).await
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn stream_chat_with_history(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
        options: StreamOptions,
    ) -> stream::BoxStream<'static, StreamResult<StreamChunk>> {
        let credential = match self.credential.as_ref() {
            Some(value) => value.clone(),
            None => {
                return stream::once(async {
                    Err(StreamError::Provider("Anthropic API key not set".into()))
                })
                .boxed();
            }
        };

        let (system, converted) = Self::convert_messages(messages);
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            system,
            messages: converted,
            temperature,
            stream: true,
        };
        let url = self.messages_url();

        let (tx, rx) = tokio::sync::mpsc::channel::<StreamResult<StreamChunk>>(100);

        tokio::spawn(async move {
            let client = Client::new();
            let req_builder = AnthropicProvider::apply_auth(
                client
                    .post(&url)
                    .header("anthropic-version", "2023-06-01")
                    .header("Accept", "text/event-stream"),
                &credential,
            );

            let response = match req_builder.json(&request).send().await {
                Ok(r) => r,
                Err(e) => {
                    let _ = tx.send(Err(StreamError::Http(e))).await;
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let error = match response.text().await {
                    Ok(e) => e,
                    Err(_) => format!("HTTP error: {status}"),
                };
                let _ = tx
                    .send(Err(StreamError::Provider(format!("{status}: {error}"))))
                    .await;
                return;
            }

            let mut chunk_stream = sse_bytes_to_chunks(response, options.count_tokens);
            while let Some(chunk) = chunk_stream.next().await {
                if tx.send(chunk).await.is_err() {
                    break; // Receiver dropped
                }
            }
        });

        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .boxed()
    }
}
