//! Integration tests for the assistant using wiremock
//!
//! Both the WeatherAPI.com forecast endpoint and the chat-completion endpoint
//! are served by one mock server, so call counts and request bodies can be
//! checked end to end.

use laundry_core::{Assistant, Config, Error, RainChance, WeatherProviderError};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, Request, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

fn forecast_day(date: &str, rain: Option<u8>, condition: &str) -> Value {
    let mut day = json!({
        "date": date,
        "date_epoch": 1_748_736_000,
        "day": {
            "maxtemp_c": 33.4,
            "mintemp_c": 24.1,
            "avgtemp_c": 28.6,
            "maxwind_kph": 14.8,
            "totalprecip_mm": 0.2,
            "avghumidity": 72,
            "daily_will_it_rain": 0,
            "condition": {"text": condition, "code": 1003}
        },
        "hour": []
    });
    if let Some(rain) = rain {
        day["day"]["daily_chance_of_rain"] = json!(rain);
    }
    day
}

/// Sample WeatherAPI.com forecast response for testing
fn sample_forecast_response() -> Value {
    json!({
        "location": {"name": "Tuguegarao", "country": "Philippines"},
        "current": {"temp_c": 30.0},
        "forecast": {
            "forecastday": [
                forecast_day("2025-06-01", Some(12), "Sunny"),
                forecast_day("2025-06-02", None, "Partly cloudy"),
                forecast_day("2025-06-03", Some(85), "Moderate rain"),
            ]
        }
    })
}

fn completion(message: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}]
    })
}

fn text_completion(text: &str) -> Value {
    completion(json!({"role": "assistant", "content": text}))
}

fn tool_call(id: &str) -> Value {
    json!({
        "id": id,
        "type": "function",
        "function": {"name": "call_weather_api", "arguments": "{\"location\":\"Manila\"}"}
    })
}

fn tool_call_completion(calls: Vec<Value>) -> Value {
    completion(json!({"role": "assistant", "content": null, "tool_calls": calls}))
}

fn test_config(mock_server: &MockServer) -> Config {
    Config {
        weather_api_key: Some("WEATHER_KEY".into()),
        model_api_key: Some("MODEL_KEY".into()),
        weather_base_url: Some(mock_server.uri()),
        model_base_url: Some(mock_server.uri()),
        timeout_secs: Some(5),
        ..Config::default()
    }
}

#[allow(clippy::expect_used)]
fn create_assistant(mock_server: &MockServer) -> Assistant<laundry_core::WeatherApiProvider, laundry_core::ChatCompletionsClient> {
    Assistant::from_config(&test_config(mock_server)).expect("Failed to create assistant")
}

/// Setup a mock for the /forecast.json endpoint expecting `calls` requests
async fn setup_forecast_mock(mock_server: &MockServer, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .respond_with(response)
        .expect(calls)
        .mount(mock_server)
        .await;
}

/// The follow-up request is the only one that carries a tool result.
async fn setup_follow_up_mock(mock_server: &MockServer, body: Value, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .with_priority(1)
        .mount(mock_server)
        .await;
}

async fn setup_first_completion_mock(mock_server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn completion_bodies(mock_server: &MockServer) -> Vec<Value> {
    let requests: Vec<Request> = mock_server.received_requests().await.unwrap_or_default();
    requests
        .iter()
        .filter(|r| r.url.path() == "/chat/completions")
        .map(|r| r.body_json::<Value>().unwrap())
        .collect()
}

// ============================================================================
// Forecast
// ============================================================================

#[tokio::test]
async fn test_fetch_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("q", "Tuguegarao"))
        .and(query_param("days", "3"))
        .and(query_param("key", "WEATHER_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let assistant = create_assistant(&mock_server);
    let days = assistant.fetch_forecast().await.unwrap();

    assert_eq!(days.len(), 3);
    assert_eq!(days[0].date.to_string(), "2025-06-01");
    assert_eq!(days[0].daily_chance_of_rain, RainChance::Percent(12));
    assert_eq!(days[2].condition, "Moderate rain");
    assert!((days[0].avg_humidity - 72.0).abs() < 0.1);
    assert!((days[0].max_wind_kph - 14.8).abs() < 0.1);
}

#[tokio::test]
async fn test_missing_rain_chance_becomes_na() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_forecast_response()),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    let days = assistant.fetch_forecast().await.unwrap();
    let serialized = serde_json::to_value(&days).unwrap();

    assert_eq!(serialized[1]["daily_chance_of_rain"], json!("N/A"));
    assert_eq!(serialized[1]["condition"], json!("Partly cloudy"));
    assert_eq!(serialized[0]["daily_chance_of_rain"], json!(12));
    for day in serialized.as_array().unwrap() {
        assert_eq!(day.as_object().unwrap().len(), 9);
    }
}

#[tokio::test]
async fn test_fetch_forecast_unauthorized() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid key"}"#),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    let err = assistant.fetch_forecast().await.unwrap_err();

    match &err {
        Error::Weather(WeatherProviderError::Status { status, body }) => {
            assert_eq!(*status, 401);
            assert_eq!(body, r#"{"error":"invalid key"}"#);
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_fetch_forecast_malformed_body() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"forecast": {"forecastday": [{"date": "2025-06-01"}]}})),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    let result = assistant.fetch_forecast().await;

    assert!(matches!(result, Err(Error::Weather(WeatherProviderError::Malformed(_)))));
}

#[tokio::test]
async fn test_fetch_forecast_empty_day_list() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"forecast": {"forecastday": []}})),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    let result = assistant.fetch_forecast().await;

    assert!(matches!(
        result,
        Err(Error::Weather(WeatherProviderError::DayCount { expected: 3, got: 0 }))
    ));
}

#[tokio::test]
async fn test_short_forecast_fails_recommendation() {
    let mock_server = MockServer::start().await;
    let short = json!({"forecast": {"forecastday": [forecast_day("2025-06-01", Some(12), "Sunny")]}});
    setup_forecast_mock(&mock_server, ResponseTemplate::new(200).set_body_json(short), 1).await;
    setup_first_completion_mock(&mock_server, tool_call_completion(vec![tool_call("call_1")])).await;
    setup_follow_up_mock(&mock_server, text_completion("unused"), 0).await;

    let assistant = create_assistant(&mock_server);
    let result = assistant.get_recommendation().await;

    assert!(matches!(
        result,
        Err(Error::Weather(WeatherProviderError::DayCount { expected: 3, got: 1 }))
    ));
}

// ============================================================================
// Recommendation flow
// ============================================================================

#[tokio::test]
async fn test_direct_answer_makes_no_weather_call() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(&mock_server, ResponseTemplate::new(200), 0).await;
    setup_first_completion_mock(&mock_server, text_completion("Tuesday is your best bet.")).await;

    let assistant = create_assistant(&mock_server);
    let text = assistant.get_recommendation().await.unwrap();

    assert_eq!(text, "Tuesday is your best bet.");

    let bodies = completion_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["tool_choice"], "auto");
    assert_eq!(bodies[0]["tools"][0]["function"]["name"], "call_weather_api");
    assert_eq!(
        bodies[0]["tools"][0]["function"]["parameters"]["required"],
        json!(["location"])
    );
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(bodies[0]["messages"][1]["role"], "user");
}

#[tokio::test]
async fn test_tool_call_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer MODEL_KEY"))
        .and(body_string_contains("tool_call_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_completion("Go for June 1st.")))
        .expect(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    setup_first_completion_mock(&mock_server, tool_call_completion(vec![tool_call("call_42")]))
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        // The configured location is used, not the model's argument.
        .and(query_param("q", "Tuguegarao"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let assistant = create_assistant(&mock_server);
    let text = assistant.get_recommendation().await.unwrap();
    assert_eq!(text, "Go for June 1st.");

    let bodies = completion_bodies(&mock_server).await;
    assert_eq!(bodies.len(), 2);

    let messages = bodies[1]["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["system", "user", "assistant", "tool"]);

    assert_eq!(messages[0], bodies[0]["messages"][0]);
    assert_eq!(messages[1], bodies[0]["messages"][1]);
    assert_eq!(messages[2]["tool_calls"], json!([tool_call("call_42")]));
    assert_eq!(messages[3]["tool_call_id"], "call_42");

    let content: Value = serde_json::from_str(messages[3]["content"].as_str().unwrap()).unwrap();
    let days = content.as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["date"], "2025-06-01");
    assert_eq!(days[1]["daily_chance_of_rain"], "N/A");
}

#[tokio::test]
async fn test_only_first_tool_call_is_answered() {
    let mock_server = MockServer::start().await;
    setup_follow_up_mock(&mock_server, text_completion("Thursday."), 1).await;
    setup_first_completion_mock(
        &mock_server,
        tool_call_completion(vec![tool_call("call_a"), tool_call("call_b")]),
    )
    .await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_forecast_response()),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    assert_eq!(assistant.get_recommendation().await.unwrap(), "Thursday.");

    let bodies = completion_bodies(&mock_server).await;
    let messages = bodies[1]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["tool_calls"].as_array().unwrap().len(), 1);
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_a");
    assert_eq!(messages[3]["tool_call_id"], "call_a");
}

#[tokio::test]
async fn test_weather_failure_aborts_recommendation() {
    let mock_server = MockServer::start().await;
    setup_follow_up_mock(&mock_server, text_completion("unused"), 0).await;
    setup_first_completion_mock(&mock_server, tool_call_completion(vec![tool_call("call_1")]))
        .await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid key"}"#),
        1,
    )
    .await;

    let assistant = create_assistant(&mock_server);
    let err = assistant.get_recommendation().await.unwrap_err();

    assert!(matches!(err, Error::Weather(WeatherProviderError::Status { status: 401, .. })));
}

#[tokio::test]
async fn test_model_error_status_is_surfaced() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(&mock_server, ResponseTemplate::new(200), 0).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let assistant = create_assistant(&mock_server);
    let err = assistant.get_recommendation().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Model(laundry_core::ModelProviderError::Status { status: 429, .. })
    ));
}

#[tokio::test]
async fn test_empty_choices_is_model_error() {
    let mock_server = MockServer::start().await;
    setup_first_completion_mock(&mock_server, json!({"choices": []})).await;

    let assistant = create_assistant(&mock_server);
    let err = assistant.get_recommendation().await.unwrap_err();

    assert!(matches!(err, Error::Model(laundry_core::ModelProviderError::EmptyChoices)));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let mock_server = MockServer::start().await;

    for cfg in [
        Config { weather_api_key: None, ..test_config(&mock_server) },
        Config { model_api_key: None, ..test_config(&mock_server) },
    ] {
        let result = Assistant::from_config(&cfg);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}
