//! Integration tests for WebDriverClient and a full run against mock servers.

use coldstart_core::{
    AppConfig, AutomationDriver, DeviceConfig, GridConfig, GridError, LaunchConfig,
    PerformanceRun, PollPolicy, RunConfig, Selector, SessionApiClient, WebDriverClient,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grid(hub: &MockServer) -> GridConfig {
    GridConfig::default()
        .with_hub_url(hub.uri())
        .with_credentials("user", "key")
        .with_timeout_secs(5)
}

fn app() -> AppConfig {
    AppConfig {
        package: "com.example.shop".into(),
        activity: None,
        app_url: Some("lt://APP1".into()),
    }
}

async fn mount_session(hub: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(header("authorization", "Basic dXNlcjprZXk="))
        .and(body_partial_json(json!({
            "capabilities": {"alwaysMatch": {"appium:app": "lt://APP1"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": session_id, "capabilities": {}}
        })))
        .expect(1)
        .mount(hub)
        .await;
}

async fn mount_lifecycle(hub: &MockServer, session_id: &str) {
    for command in ["activate_app", "terminate_app"] {
        Mock::given(method("POST"))
            .and(path(format!("/session/{session_id}/appium/device/{command}")))
            .and(body_partial_json(json!({"appId": "com.example.shop"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .mount(hub)
            .await;
    }
}

#[tokio::test]
async fn test_connect_reads_w3c_session_id() {
    let hub = MockServer::start().await;
    mount_session(&hub, "wd-1").await;

    let driver = WebDriverClient::connect(&grid(&hub), &DeviceConfig::default(), &app())
        .await
        .expect("connect failed");
    assert_eq!(driver.session_id(), "wd-1");
}

#[tokio::test]
async fn test_connect_rejected_capabilities_is_driver_error() {
    let hub = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": {"error": "session not created", "message": "device unavailable"}
        })))
        .mount(&hub)
        .await;

    let err = WebDriverClient::connect(&grid(&hub), &DeviceConfig::default(), &app())
        .await
        .unwrap_err();
    match err {
        GridError::Driver { message } => assert!(message.contains("device unavailable")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_bad_credentials_is_unauthorized() {
    let hub = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&hub)
        .await;

    let err = WebDriverClient::connect(&grid(&hub), &DeviceConfig::default(), &app())
        .await
        .unwrap_err();
    assert!(matches!(err, GridError::Unauthorized { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_lifecycle_and_element_lookup() {
    let hub = MockServer::start().await;
    mount_session(&hub, "wd-2").await;
    mount_lifecycle(&hub, "wd-2").await;

    Mock::given(method("POST"))
        .and(path("/session/wd-2/element"))
        .and(body_partial_json(json!({"using": "accessibility id", "value": "home"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"element-6066-11e4-a52e-4f735466cecf": "el-1"}
        })))
        .mount(&hub)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/wd-2/element"))
        .and(body_partial_json(json!({"using": "xpath"})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {"error": "no such element", "message": "not found"}
        })))
        .mount(&hub)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/wd-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(&hub)
        .await;

    let driver = WebDriverClient::connect(&grid(&hub), &DeviceConfig::default(), &app())
        .await
        .expect("connect failed");

    driver.terminate_app("com.example.shop").await.expect("terminate");
    driver.activate_app("com.example.shop").await.expect("activate");
    assert!(driver
        .element_present(&Selector::AccessibilityId("home".into()))
        .await
        .expect("lookup"));
    assert!(!driver
        .element_present(&Selector::Text("Log In".into()))
        .await
        .expect("lookup"));
    driver.quit().await.expect("quit");
}

#[tokio::test]
async fn test_lifecycle_failure_is_driver_error() {
    let hub = MockServer::start().await;
    mount_session(&hub, "wd-3").await;
    Mock::given(method("POST"))
        .and(path("/session/wd-3/appium/device/activate_app"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": {"error": "unknown error", "message": "app not installed"}
        })))
        .mount(&hub)
        .await;

    let driver = WebDriverClient::connect(&grid(&hub), &DeviceConfig::default(), &app())
        .await
        .expect("connect failed");
    let err = driver.activate_app("com.example.shop").await.unwrap_err();
    assert!(matches!(err, GridError::Driver { .. }));
    assert!(err.to_string().contains("app not installed"));
}

#[tokio::test]
async fn test_full_run_against_mock_grid() {
    let hub = MockServer::start().await;
    let api = MockServer::start().await;

    mount_session(&hub, "wd-run").await;
    mount_lifecycle(&hub, "wd-run").await;
    Mock::given(method("POST"))
        .and(path("/session/wd-run/element"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": {}})))
        .mount(&hub)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/wd-run"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hub)
        .await;

    Mock::given(method("POST"))
        .and(path("/sessions/wd-run/stop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/sessions/wd-run/log/appmetrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"anrCount": 0},
            "fps": [{"count": 61}],
            "cpu": [{"app": 22.5}]
        })))
        .mount(&api)
        .await;

    let mut config = RunConfig::default();
    config.grid = grid(&hub).with_api_url(api.uri());
    config.app = app();
    config.launch = LaunchConfig {
        target_launches: 3,
        load_timeout_secs: 0.0,
        marker_poll_interval_secs: 0.0,
        settle_delay_secs: 0.0,
        ..LaunchConfig::default()
    };
    config.polling = PollPolicy::immediate(2);

    let client = SessionApiClient::new(config.grid.clone()).expect("client");
    let driver = WebDriverClient::connect(&config.grid, &config.device, &config.app)
        .await
        .expect("connect failed");

    let out = tempfile::tempdir().unwrap();
    let outcome = PerformanceRun::new(&client, &config, out.path())
        .execute(driver)
        .await
        .expect("run failed");

    assert!(outcome.passed());
    assert!(outcome.profiling_ready);
    assert_eq!(outcome.report.test_info.successful_launches, 3);
    assert_eq!(outcome.report.performance_data.metrics.max_cpu_utilization, 22.5);
    assert!(outcome.report_path.starts_with(out.path()));
}
