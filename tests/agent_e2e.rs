//! End-to-end integration tests for the agent loop.
//!
//! These drive the full turn cycle through the public API with a scripted
//! provider and the real utensil registry, so file contents written by the
//! model-issued calls land on disk and results flow back into the
//! conversation, without any external service dependency.

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use parking_lot::Mutex;
use tempfile::TempDir;

use skillet::providers::{
    ChatMessage, Provider, StreamChunk, StreamOptions, StreamResult,
};
use skillet::Agent;

/// Provider that replays canned responses, chunked to exercise line
/// reassembly across fragment boundaries.
struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: &[String]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().rev().cloned().collect()),
        }
    }

    fn next_response(&self) -> String {
        self.responses.lock().pop().unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat_with_system(
        &self,
        _system_prompt: Option<&str>,
        _message: &str,
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<String> {
        Ok(self.next_response())
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn stream_chat_with_history(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _temperature: f64,
        _options: StreamOptions,
    ) -> stream::BoxStream<'static, StreamResult<StreamChunk>> {
        let text = self.next_response();
        let mut chunks: Vec<StreamResult<StreamChunk>> = text
            .as_bytes()
            .chunks(5)
            .map(|piece| Ok(StreamChunk::delta(String::from_utf8_lossy(piece).into_owned())))
            .collect();
        chunks.push(Ok(StreamChunk::final_chunk()));
        stream::iter(chunks).boxed()
    }
}

fn agent_for(responses: &[String]) -> Agent {
    Agent::builder()
        .provider(Box::new(ScriptedProvider::new(responses)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn write_then_read_cycle_touches_the_real_filesystem() {
    let workspace = TempDir::new().unwrap();
    let file_path = workspace.path().join("greeting.py");
    let path = file_path.display();

    let responses = [
        format!(
            "Creating the script now.\n\
             UTENSIL:write_file\n\
             PARAM:file_path={path}\n\
             PARAM:content=BEGIN_VALUE\n\
             def greet():\n    return \"hello\"\n\
             END_VALUE\n\
             END_UTENSIL\n"
        ),
        format!(
            "Let me double-check what was written.\n\
             UTENSIL:read_file\n\
             PARAM:file_path={path}\n\
             END_UTENSIL\n"
        ),
        "The script defines greet().".to_string(),
    ];
    let mut agent = agent_for(&responses);

    let answer = agent.run_task("write a greeting script").await.unwrap();
    assert_eq!(answer, "The script defines greet().");

    let on_disk = std::fs::read_to_string(&file_path).unwrap();
    assert_eq!(on_disk, "def greet():\n    return \"hello\"");

    // The read_file result carries the file contents back to the model.
    let read_feedback = &agent.history()[5];
    assert_eq!(read_feedback.role, "user");
    assert!(read_feedback.content.contains("def greet():"));
}

#[tokio::test]
async fn multiline_payload_survives_fragmented_streaming() {
    let workspace = TempDir::new().unwrap();
    let file_path = workspace.path().join("table.csv");
    let path = file_path.display();

    let body = "id,name\n1,alpha\n2,beta\n3,gamma";
    let responses = [
        format!(
            "UTENSIL:write_file\n\
             PARAM:file_path={path}\n\
             PARAM:content=BEGIN_VALUE\n\
             {body}\n\
             END_VALUE\n\
             END_UTENSIL\n"
        ),
        "Saved.".to_string(),
    ];
    let mut agent = agent_for(&responses);

    agent.run_task("save the table").await.unwrap();
    assert_eq!(std::fs::read_to_string(&file_path).unwrap(), body);
}

#[tokio::test]
async fn edit_call_rewrites_an_existing_file() {
    let workspace = TempDir::new().unwrap();
    let file_path = workspace.path().join("config.ini");
    std::fs::write(&file_path, "retries = 3\ntimeout = 10\n").unwrap();
    let path = file_path.display();

    let responses = [
        format!(
            "UTENSIL:edit_file\n\
             PARAM:file_path={path}\n\
             PARAM:old_text=timeout = 10\n\
             PARAM:new_text=timeout = 30\n\
             END_UTENSIL\n"
        ),
        "Bumped the timeout.".to_string(),
    ];
    let mut agent = agent_for(&responses);

    agent.run_task("raise the timeout").await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&file_path).unwrap(),
        "retries = 3\ntimeout = 30\n"
    );
}

#[tokio::test]
async fn missing_file_error_is_folded_into_the_conversation() {
    let responses = [
        "UTENSIL:read_file\n\
         PARAM:file_path=/no/such/skillet/file.txt\n\
         END_UTENSIL\n"
            .to_string(),
        "That file does not exist.".to_string(),
    ];
    let mut agent = agent_for(&responses);

    let answer = agent.run_task("read the file").await.unwrap();
    assert_eq!(answer, "That file does not exist.");
    assert_eq!(
        agent.history()[3].content,
        "Error: File not found at path '/no/such/skillet/file.txt'"
    );
}

#[tokio::test]
async fn two_calls_in_one_response_run_in_stream_order() {
    let workspace = TempDir::new().unwrap();
    let first = workspace.path().join("first.txt");
    let second = workspace.path().join("second.txt");

    let responses = [
        format!(
            "UTENSIL:write_file\n\
             PARAM:file_path={}\n\
             PARAM:content=one\n\
             END_UTENSIL\n\
             UTENSIL:write_file\n\
             PARAM:file_path={}\n\
             PARAM:content=two\n\
             END_UTENSIL\n",
            first.display(),
            second.display()
        ),
        "Both written.".to_string(),
    ];
    let mut agent = agent_for(&responses);

    agent.run_task("write both files").await.unwrap();

    assert_eq!(std::fs::read_to_string(&first).unwrap(), "one");
    assert_eq!(std::fs::read_to_string(&second).unwrap(), "two");

    let feedback = &agent.history()[3];
    assert!(feedback.content.starts_with("Result of utensil 'write_file':"));
    assert_eq!(feedback.content.matches("Result of utensil").count(), 2);
}

#[tokio::test]
async fn validation_utensil_reports_through_the_loop() {
    let workspace = TempDir::new().unwrap();
    let file_path = workspace.path().join("data.json");
    std::fs::write(&file_path, "{\"ok\": true}").unwrap();

    let responses = [
        format!(
            "UTENSIL:validate_syntax\n\
             PARAM:file_path={}\n\
             END_UTENSIL\n",
            file_path.display()
        ),
        "The JSON is valid.".to_string(),
    ];
    let mut agent = agent_for(&responses);

    agent.run_task("check the json").await.unwrap();
    assert_eq!(agent.history()[3].content, "✓ Syntax is valid (json)");
}
