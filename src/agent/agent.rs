use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::config::{Config, ModelInfo, DEFAULT_MODEL};
use crate::observability::{create_observer, NoopObserver, Observer, ObserverEvent};
use crate::parser::{StreamParser, UtensilCall};
use crate::providers::{
    create_provider_with_max_tokens, ChatMessage, Provider, StreamOptions,
};
use crate::utensils::UtensilRegistry;

/// Drives the conversation loop: sends the history to the provider, parses
/// utensil calls out of the streamed response, executes them through the
/// registry, and feeds the results back until the model answers without
/// calling anything.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: UtensilRegistry,
    observer: Arc<dyn Observer>,
    history: Vec<ChatMessage>,
    model: String,
    temperature: f64,
    max_turns: usize,
    models: BTreeMap<String, ModelInfo>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_turns", &self.max_turns)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    /// Wires an agent from config: provider with the model's token budget,
    /// the observer backend, and the default utensil registry.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_observer(config, create_observer(&config.observability))
    }

    /// `from_config` with a caller-supplied observer, used by the
    /// interactive session to mirror utensil activity onto the console.
    pub fn from_config_with_observer(
        config: &Config,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        let model = config.resolved_model();
        let provider = create_provider_with_max_tokens(
            "anthropic",
            config.api_key.as_deref(),
            config.api_url.as_deref(),
            Some(config.max_tokens_for(&model)),
        )?;

        Agent::builder()
            .provider(provider)
            .observer(observer)
            .model(model)
            .temperature(config.default_temperature)
            .max_turns(config.agent.max_turns)
            .models(config.models.clone())
            .build()
    }

    /// Runs one task to completion and returns the final narrative.
    ///
    /// The conversation history persists across tasks, so follow-up prompts
    /// see earlier turns; `clear_history` starts over.
    pub async fn run_task(&mut self, task: &str) -> Result<String> {
        if self.history.is_empty() {
            self.history
                .push(ChatMessage::system(self.registry.system_prompt()));
        }
        self.history.push(ChatMessage::user(task));

        self.observer.record_event(&ObserverEvent::AgentStart);
        let outcome = self.drive_to_completion().await;
        self.observer.record_event(&ObserverEvent::AgentEnd {
            success: outcome.is_ok(),
        });
        outcome
    }

    async fn drive_to_completion(&mut self) -> Result<String> {
        for turn in 0..self.max_turns {
            debug!(turn, model = %self.model, "requesting completion");
            let (narrative, calls) = self.collect_turn().await?;

            if calls.is_empty() {
                self.history.push(ChatMessage::assistant(narrative.clone()));
                return Ok(narrative);
            }

            info!(count = calls.len(), "executing utensil calls");

            // The assistant message replays the literal call blocks so the
            // model sees exactly what it asked for.
            let mut transcript = Vec::with_capacity(calls.len() + 1);
            if !narrative.is_empty() {
                transcript.push(narrative);
            }
            for call in &calls {
                transcript.push(call.raw_text.clone());
            }
            self.history
                .push(ChatMessage::assistant(transcript.join("\n\n")));

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                debug!(utensil = %call.name, "executing utensil");
                let start = Instant::now();
                let result = self.registry.execute_call(call).await;
                self.observer.record_event(&ObserverEvent::UtensilCall {
                    utensil: call.name.clone(),
                    duration: start.elapsed(),
                    success: !result.starts_with("Error"),
                });
                results.push(result);
            }

            let feedback = if results.len() == 1 {
                results.remove(0)
            } else {
                calls
                    .iter()
                    .zip(&results)
                    .map(|(call, result)| {
                        format!("Result of utensil '{}':\n{}", call.name, result)
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            };
            self.history.push(ChatMessage::user(feedback));
        }

        anyhow::bail!("Agent exceeded maximum turns ({})", self.max_turns)
    }

    /// One provider round-trip: returns the narrative and the completed
    /// calls found in the response, in stream order.
    async fn collect_turn(&self) -> Result<(String, Vec<UtensilCall>)> {
        let mut parser = StreamParser::with_observer(self.observer.clone());

        if self.provider.supports_streaming() {
            let mut stream = self.provider.stream_chat_with_history(
                &self.history,
                &self.model,
                self.temperature,
                StreamOptions::new(true),
            );
            while let Some(item) = stream.next().await {
                let chunk = item?;
                if !chunk.delta.is_empty() {
                    parser.ingest(&chunk.delta);
                }
            }
        } else {
            let response = self
                .provider
                .chat_with_history(&self.history, &self.model, self.temperature)
                .await?;
            parser.ingest(&response);
        }

        parser.finalize();
        let narrative = parser.text().to_string();
        let calls = parser.drain_calls();
        Ok((narrative, calls))
    }

    /// Summarizes the transcript and replaces the history with the system
    /// message plus one summary message. Returns the summary text.
    pub async fn compact_history(&mut self) -> Result<String> {
        let transcript = self
            .history
            .iter()
            .filter(|message| message.role != "system")
            .map(|message| {
                let role = match message.role.as_str() {
                    "user" => "User",
                    "assistant" => "Assistant",
                    other => other,
                };
                format!("{}: {}\n", role, message.content)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let summary_prompt = format!(
            "Please provide a succinct summary of the following conversation history.\n\
             The summary should preserve key context, decisions made, and important information, but be much shorter than the original.\n\
             Focus on what's essential for continuing the conversation effectively.\n\n\
             Conversation history:\n{transcript}\n\n\
             Please respond with ONLY the summary, no preamble or explanation."
        );

        let summary = self
            .provider
            .chat_with_system(None, &summary_prompt, &self.model, self.temperature)
            .await?;

        let system = self
            .history
            .iter()
            .find(|message| message.role == "system")
            .cloned();
        self.history.clear();
        if let Some(system) = system {
            self.history.push(system);
        }
        self.history.push(ChatMessage::user(format!(
            "[Previous conversation summary]: {summary}"
        )));

        info!("conversation history compacted");
        Ok(summary)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switches the model after validating the id against the catalog.
    /// Returns false (and keeps the current model) for unknown ids.
    pub fn switch_model(&mut self, model: &str) -> bool {
        if self.models.contains_key(model) {
            self.model = model.to_string();
            info!(model = %self.model, "model switched");
            true
        } else {
            false
        }
    }

    pub fn models(&self) -> &BTreeMap<String, ModelInfo> {
        &self.models
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }
}

#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Box<dyn Provider>>,
    registry: Option<UtensilRegistry>,
    observer: Option<Arc<dyn Observer>>,
    model: Option<String>,
    temperature: Option<f64>,
    max_turns: Option<usize>,
    models: Option<BTreeMap<String, ModelInfo>>,
}

impl AgentBuilder {
    pub fn provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn registry(mut self, registry: UtensilRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn models(mut self, models: BTreeMap<String, ModelInfo>) -> Self {
        self.models = Some(models);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| anyhow::anyhow!("provider is required"))?;

        Ok(Agent {
            provider,
            registry: self.registry.unwrap_or_else(UtensilRegistry::with_defaults),
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(NoopObserver {})),
            history: Vec::new(),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(0.7),
            max_turns: self.max_turns.unwrap_or(20),
            models: self.models.unwrap_or_else(|| Config::default().models),
        })
    }
}
