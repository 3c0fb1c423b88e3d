use super::*;
use crate::config::{Config, GeminiConfig, OllamaConfig};
use crate::database::{Record, VectorStore};
use crate::embeddings::chunking::ChunkingConfig;
use crate::embeddings::ollama::OllamaClient;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn transcript_preserves_insertion_order() {
    let mut transcript = Transcript::new();
    assert!(transcript.is_empty());

    transcript.push_user("first question");
    transcript.push_assistant("first answer");
    transcript.push_user("second question");

    assert_eq!(transcript.len(), 3);
    let turns = transcript.turns();
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "first question");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[2].content, "second question");
}

#[test]
fn role_display_names() {
    assert_eq!(Role::User.to_string(), "user");
    assert_eq!(Role::Assistant.to_string(), "assistant");
}

async fn session_for(
    ollama_server: &MockServer,
    gemini_server: &MockServer,
) -> (ChatSession, TempDir) {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let address = ollama_server.address();
    let ollama_config = OllamaConfig {
        protocol: "http".to_string(),
        host: address.ip().to_string(),
        port: address.port(),
        model: "test-model".to_string(),
        batch_size: 16,
    };
    let ollama = OllamaClient::new(&ollama_config).expect("should create ollama client");
    let store = VectorStore::new(&config)
        .await
        .expect("should create vector store");
    let retriever = crate::retriever::Retriever::new(ollama, store, ChunkingConfig::default());

    let gemini_config = GeminiConfig {
        endpoint: gemini_server.uri(),
        api_key: Some("test-key".to_string()),
    };
    let llm = tokio::task::spawn_blocking(move || GeminiClient::new(&gemini_config))
        .await
        .expect("task should not panic")
        .expect("should create gemini client");

    (ChatSession::new(retriever, llm), temp_dir)
}

async fn mount_embedding(server: &MockServer, vector: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": vector })))
        .mount(server)
        .await;
}

async fn mount_gemini_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent"]}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_index_produces_fixed_message_without_calling_the_model() {
    let ollama_server = MockServer::start().await;
    let gemini_server = MockServer::start().await;

    mount_embedding(&ollama_server, &[0.1, 0.2, 0.3]).await;
    mount_gemini_listing(&gemini_server).await;

    // The generation endpoint must never be hit
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gemini_server)
        .await;

    let (mut session, _temp_dir) = session_for(&ollama_server, &gemini_server).await;
    let answer = session.ask("Who is enrolled?").await;

    assert_eq!(answer, NO_CONTEXT_MESSAGE);
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_answers_from_retrieved_context() {
    let ollama_server = MockServer::start().await;
    let gemini_server = MockServer::start().await;

    mount_embedding(&ollama_server, &[1.0, 0.0, 0.0]).await;
    mount_gemini_listing(&gemini_server).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "Ada is 21."}]}}
            ]
        })))
        .mount(&gemini_server)
        .await;

    let (mut session, _temp_dir) = session_for(&ollama_server, &gemini_server).await;

    let records = vec![Record {
        table: "students".to_string(),
        text: "Table: students, name: Ada, age: 21".to_string(),
    }];
    session
        .retriever()
        .rebuild(&records)
        .await
        .expect("should index records");

    let answer = session.ask("How old is Ada?").await;
    assert_eq!(answer, "Ada is 21.");

    let turns = session.transcript().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "How old is Ada?");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Ada is 21.");
}
