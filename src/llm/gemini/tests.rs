use super::*;
use crate::config::GeminiConfig;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GeminiConfig {
    GeminiConfig {
        endpoint: server.uri(),
        api_key: Some("test-key".to_string()),
    }
}

async fn mount_model_listing(server: &MockServer, names: &[&str]) {
    let models: Vec<_> = names
        .iter()
        .map(|name| {
            json!({
                "name": name,
                "supportedGenerationMethods": ["generateContent"]
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

#[test]
fn preference_list_entry_wins() {
    let available = vec![
        "models/gemini-1.0-pro".to_string(),
        "models/gemini-1.5-flash".to_string(),
        "models/some-other".to_string(),
    ];

    assert_eq!(select_preferred_model(&available), "models/gemini-1.5-flash");
}

#[test]
fn preference_order_is_respected() {
    let available = vec![
        "models/gemini-pro".to_string(),
        "models/gemini-1.5-flash-latest".to_string(),
    ];

    assert_eq!(
        select_preferred_model(&available),
        "models/gemini-1.5-flash-latest"
    );
}

#[test]
fn first_available_when_no_preference_matches() {
    let available = vec![
        "models/custom-a".to_string(),
        "models/custom-b".to_string(),
    ];

    assert_eq!(select_preferred_model(&available), "models/custom-a");
}

#[test]
fn hardcoded_fallback_when_nothing_available() {
    assert_eq!(select_preferred_model(&[]), "gemini-1.5-flash");
}

#[test]
fn selection_is_deterministic() {
    let available = vec![
        "models/gemini-pro".to_string(),
        "models/gemini-1.0-pro".to_string(),
    ];

    let first = select_preferred_model(&available);
    let second = select_preferred_model(&available);
    assert_eq!(first, second);
    assert_eq!(first, "models/gemini-pro");
}

#[test]
fn prompt_frames_context_and_question() {
    let prompt = build_prompt("Who is enrolled?", "Table: students, name: Ada");

    assert!(prompt.starts_with("You are a helpful assistant."));
    assert!(prompt.contains("Answer ONLY from the context."));
    assert!(prompt.contains("Context:\nTable: students, name: Ada"));
    assert!(prompt.contains("Question:\nWho is enrolled?"));
    assert!(prompt.trim_end().ends_with("Answer:"));
}

#[test]
fn model_path_prefixes_bare_names() {
    assert_eq!(model_path("gemini-1.5-flash"), "models/gemini-1.5-flash");
    assert_eq!(model_path("models/gemini-pro"), "models/gemini-pro");
}

#[tokio::test]
async fn construction_selects_preferred_model() {
    let server = MockServer::start().await;
    mount_model_listing(
        &server,
        &["models/gemini-1.0-pro", "models/gemini-1.5-flash"],
    )
    .await;

    let config = config_for(&server);
    let client = tokio::task::spawn_blocking(move || GeminiClient::new(&config))
        .await
        .expect("task should not panic")
        .expect("client construction should succeed");

    assert_eq!(client.model(), "models/gemini-1.5-flash");
}

#[tokio::test]
async fn construction_falls_back_when_listing_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = tokio::task::spawn_blocking(move || GeminiClient::new(&config))
        .await
        .expect("task should not panic")
        .expect("client construction should survive a listing failure");

    assert_eq!(client.model(), "gemini-1.5-flash");
}

#[tokio::test]
async fn missing_api_key_is_fatal_at_construction() {
    let config = GeminiConfig {
        endpoint: "https://generativelanguage.googleapis.com".to_string(),
        api_key: None,
    };

    if std::env::var("GEMINI_API_KEY").is_err() {
        let result = tokio::task::spawn_blocking(move || GeminiClient::new(&config))
            .await
            .expect("task should not panic");
        assert!(result.is_err());
    }
}

#[tokio::test]
async fn answer_returns_trimmed_response_text() {
    let server = MockServer::start().await;
    mount_model_listing(&server, &["models/gemini-1.5-flash"]).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"parts": [{"text": "  Ada is enrolled.\n"}]}}
            ]
        })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let answer = tokio::task::spawn_blocking(move || {
        let client = GeminiClient::new(&config).expect("client should construct");
        client.generate_answer(
            "Who is enrolled?",
            &["Table: students, name: Ada".to_string()],
        )
    })
    .await
    .expect("task should not panic");

    assert_eq!(answer, "Ada is enrolled.");
}

#[tokio::test]
async fn empty_response_degrades_to_fixed_fallback() {
    let server = MockServer::start().await;
    mount_model_listing(&server, &["models/gemini-1.5-flash"]).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let answer = tokio::task::spawn_blocking(move || {
        let client = GeminiClient::new(&config).expect("client should construct");
        client.generate_answer("anything", &["some context".to_string()])
    })
    .await
    .expect("task should not panic");

    assert_eq!(answer, "I don't know.");
}

#[tokio::test]
async fn failed_call_embeds_the_error_message() {
    let server = MockServer::start().await;
    mount_model_listing(&server, &["models/gemini-1.5-flash"]).await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let answer = tokio::task::spawn_blocking(move || {
        let client = GeminiClient::new(&config).expect("client should construct");
        client.generate_answer("anything", &["some context".to_string()])
    })
    .await
    .expect("task should not panic");

    assert!(answer.starts_with("I don't know (Error:"));
}
