use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolArgs,
        ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
    },
    Client,
};
use anyhow::{bail, Context, Result};
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ModelSettings;
use crate::registry::Registry;

/// The hosted model that does all the reasoning.
///
/// Implementations receive the tool catalog by reference and decide on their
/// own whether, how often and in which order to call back into it.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn invoke(&self, system: &str, prompt: &str, tools: &Registry) -> Result<String>;
}

pub struct Brain {
    client: Client<OpenAIConfig>,
    model: String,
    max_tool_rounds: usize,
}

impl Brain {
    pub fn new(settings: &ModelSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(&settings.api_key);
        if let Some(api_base) = &settings.api_base {
            config = config.with_api_base(api_base);
        }
        // A 429 must surface on the first reply instead of being retried.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = Client::with_config(config).with_backoff(no_retry);

        info!("Brain connected. Model: {}", settings.model);
        Self {
            client,
            model: settings.model.clone(),
            max_tool_rounds: settings.max_tool_rounds,
        }
    }

    /// Converts registry tools into OpenAI function definitions.
    pub fn tool_definitions(tools: &Registry) -> Result<Vec<ChatCompletionTool>> {
        tools
            .tools()
            .iter()
            .map(|t| -> Result<ChatCompletionTool> {
                let function = FunctionObjectArgs::default()
                    .name(&t.name)
                    .description(&t.description)
                    .parameters(t.parameters.clone())
                    .build()?;
                let tool = ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()?;
                Ok(tool)
            })
            .collect()
    }
}

#[async_trait]
impl Collaborator for Brain {
    // Round trip until the model answers in text. Every tool call it issues is
    // executed through the registry and fed back as a tool message.
    async fn invoke(&self, system: &str, prompt: &str, tools: &Registry) -> Result<String> {
        let definitions = Self::tool_definitions(tools)?;

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ];

        let mut rounds = 0;
        loop {
            let mut builder = CreateChatCompletionRequestArgs::default();
            builder.model(&self.model).messages(messages.clone());
            if !definitions.is_empty() {
                builder.tools(definitions.clone());
            }
            let request = builder.build()?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .context("Model request failed")?;
            let message = response
                .choices
                .into_iter()
                .next()
                .context("Model returned no choices")?
                .message;

            let tool_calls = message.tool_calls.unwrap_or_default();
            if tool_calls.is_empty() {
                return message
                    .content
                    .context("Model returned neither text nor tool calls");
            }

            rounds += 1;
            if rounds > self.max_tool_rounds {
                bail!(
                    "Model was still calling tools after {} rounds",
                    self.max_tool_rounds
                );
            }
            info!("Brain requested {} tool call(s)", tool_calls.len());

            messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()?
                    .into(),
            );

            for call in tool_calls {
                debug!(
                    "Calling tool '{}' with {}",
                    call.function.name, call.function.arguments
                );
                let output = tools.invoke(&call.function.name, &call.function.arguments)?;
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call.id)
                        .content(output)
                        .build()?
                        .into(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn completion(message: Value, finish_reason: &str) -> Json<Value> {
        Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 0,
            "model": "fake",
            "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }]
        }))
    }

    fn flight_call() -> Value {
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {
                    "name": "searchFlights",
                    "arguments": "{\"departure\":\"NYC\",\"arrival\":\"LAX\"}"
                }
            }]
        })
    }

    // Asks for one flight search, then answers with whatever the tool said.
    async fn one_tool_then_answer(Json(body): Json<Value>) -> Json<Value> {
        let messages = body["messages"].as_array().cloned().unwrap_or_default();
        match messages.iter().find(|m| m["role"] == "tool") {
            Some(tool) => completion(
                json!({
                    "role": "assistant",
                    "content": format!("Here is what I found: {}", tool["content"].as_str().unwrap_or_default())
                }),
                "stop",
            ),
            None => completion(flight_call(), "tool_calls"),
        }
    }

    async fn tools_forever(Json(_): Json<Value>) -> Json<Value> {
        completion(flight_call(), "tool_calls")
    }

    async fn fake_model(router: Router) -> Brain {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        Brain::new(&ModelSettings {
            api_key: "sk-test".to_string(),
            model: "fake".to_string(),
            api_base: Some(format!("http://{}/v1", addr)),
            max_tool_rounds: 2,
        })
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_to_the_model() {
        let brain =
            fake_model(Router::new().route("/v1/chat/completions", post(one_tool_then_answer)))
                .await;

        let text = brain
            .invoke("system", "The user's request is: NYC to LAX", &Registry::load())
            .await
            .unwrap();

        assert!(text.starts_with("Here is what I found:"));
        assert!(text.contains("NYC") && text.contains("LAX") && text.contains("$550"));
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_the_round_limit() {
        let brain =
            fake_model(Router::new().route("/v1/chat/completions", post(tools_forever))).await;

        let err = brain
            .invoke("system", "prompt", &Registry::load())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 2 rounds"));
    }

    async fn rate_limited(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, Json<Value>) {
        hits.fetch_add(1, Ordering::SeqCst);
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": {
                    "message": "Rate limit reached",
                    "type": "requests",
                    "param": null,
                    "code": "rate_limit_exceeded"
                }
            })),
        )
    }

    #[tokio::test]
    async fn rate_limit_fails_on_the_first_reply() {
        let hits = Arc::new(AtomicUsize::new(0));
        let brain = fake_model(
            Router::new()
                .route("/v1/chat/completions", post(rate_limited))
                .with_state(hits.clone()),
        )
        .await;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            brain.invoke("system", "prompt", &Registry::load()),
        )
        .await
        .expect("rate-limited call should not be retried");

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).starts_with("Model request failed"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_becomes_function_tools() {
        let definitions = Brain::tool_definitions(&Registry::load()).unwrap();
        assert_eq!(definitions.len(), 2);

        let names: Vec<&str> = definitions
            .iter()
            .map(|d| d.function.name.as_str())
            .collect();
        assert_eq!(names, ["searchFlights", "suggestHotel"]);

        let flight = &definitions[0].function;
        assert_eq!(
            flight.description.as_deref(),
            Some("Searches for flights between a departure and arrival city.")
        );
        assert_eq!(
            flight.parameters.as_ref().unwrap()["required"],
            serde_json::json!(["departure", "arrival"])
        );
    }

    #[test]
    fn brain_builds_without_network() {
        let settings = ModelSettings {
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            api_base: Some("http://127.0.0.1:1/v1".to_string()),
            max_tool_rounds: 3,
        };
        let brain = Brain::new(&settings);
        assert_eq!(brain.model, "gpt-4o");
        assert_eq!(brain.max_tool_rounds, 3);
    }
}
