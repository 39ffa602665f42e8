// Integration tests for provider dispatch against mocked HTTP providers

use ai3d::config::Config;
use ai3d::conversation::{NewMessage, Settings};
use ai3d::providers::{create_dispatcher, ProviderKind, ERROR_SENTINEL};
use ai3d::store::{InteractionStore, MessageStore, SqliteStore};
use mockito::Matcher;
use serde_json::json;

fn config_for(server: &mockito::ServerGuard) -> Config {
    let mut config = Config::default();
    config.providers.openai_api_key = Some("sk-test".into());
    config.providers.gemini_api_key = Some("g-test".into());
    config.providers.openai_base_url = server.url();
    config.providers.gemini_base_url = server.url();
    config.providers.free_proxy_url = format!("{}/proxy", server.url());
    config
}

async fn interaction(store: &SqliteStore, model: &str) -> ai3d::conversation::Interaction {
    store
        .create_interaction(Settings::new(model, "P"))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_openai_with_history() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::Json(json!({
            "model": "gpt-4-1106-preview",
            "messages": [
                {"role": "system", "content": "P"},
                {"role": "user", "content": "a"},
                {"role": "assistant", "content": "b"},
                {"role": "user", "content": "c"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let interaction = interaction(&store, "gpt-4-1106-preview").await;
    store
        .append_messages(
            interaction.id,
            vec![NewMessage::user("a"), NewMessage::assistant("b")],
        )
        .await
        .unwrap();

    let dispatcher = create_dispatcher(&config_for(&server)).unwrap();
    assert_eq!(dispatcher.select("gpt-4-1106-preview"), ProviderKind::OpenAi);

    let reply = dispatcher
        .generate_with_history(&store, &interaction, "c")
        .await
        .unwrap();
    assert_eq!(reply, "Hi there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_gets_single_prompt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-pro:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "g-test".into()))
        .match_body(Matcher::Json(json!({
            "contents": [{"parts": [{"text": "P\n\nc"}]}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"gemini says hi"}]}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let interaction = interaction(&store, "gemini-pro").await;
    store
        .append_messages(interaction.id, vec![NewMessage::user("ignored")])
        .await
        .unwrap();

    let dispatcher = create_dispatcher(&config_for(&server)).unwrap();
    let reply = dispatcher
        .generate_with_history(&store, &interaction, "c")
        .await
        .unwrap();
    assert_eq!(reply, "gemini says hi");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_proxy_fallback_and_failures() {
    let mut server = mockito::Server::new_async().await;
    let proxy = server
        .mock("POST", "/proxy/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({"model": "mistralai/Mixtral-8x7B-Instruct-v0.1"})))
        .with_status(200)
        .with_body("proxy text")
        .expect(1)
        .create_async()
        .await;
    let openai = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .expect(1)
        .create_async()
        .await;

    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let dispatcher = create_dispatcher(&config_for(&server)).unwrap();

    let mixtral = interaction(&store, "mixtral-8x7b").await;
    assert_eq!(dispatcher.generate_response(&mixtral, "c").await, "proxy text");

    // unknown to the proxy table: fails before any request
    let unknown = interaction(&store, "no-such-model").await;
    assert_eq!(dispatcher.generate_response(&unknown, "c").await, ERROR_SENTINEL);

    let gpt = interaction(&store, "gpt-4").await;
    assert_eq!(dispatcher.generate_response(&gpt, "c").await, ERROR_SENTINEL);

    proxy.assert_async().await;
    openai.assert_async().await;
}

#[tokio::test]
async fn test_without_credentials_everything_goes_to_proxy() {
    let mut server = mockito::Server::new_async().await;
    let proxy = server
        .mock("POST", "/proxy/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-4-turbo"})))
        .with_status(200)
        .with_body("free reply")
        .expect(1)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.providers.openai_api_key = None;
    config.providers.gemini_api_key = Some(String::new());

    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    let dispatcher = create_dispatcher(&config).unwrap();
    assert_eq!(dispatcher.select("gemini-pro"), ProviderKind::FreeProxy);

    let gpt = interaction(&store, "gpt-4-1106-preview").await;
    assert_eq!(dispatcher.generate_response(&gpt, "c").await, "free reply");
    proxy.assert_async().await;
}
