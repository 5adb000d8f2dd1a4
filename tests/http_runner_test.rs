//! HTTP runner adapter against a mock execution service.

use covloop::domain::errors::DomainError;
use covloop::domain::models::{ExecutionStatus, RunnerConfig, RunnerRequest, TargetCoordinates};
use covloop::domain::ports::TestRunner;
use covloop::infrastructure::runner::{build_runner, HttpTestRunner};
use mockito::Matcher;
use serde_json::json;

fn target() -> TargetCoordinates {
    TargetCoordinates {
        repo: "django/django".to_string(),
        version: "5.0".to_string(),
        code_file: "django/views/static.py".to_string(),
    }
}

fn runner_config(url: String) -> RunnerConfig {
    RunnerConfig {
        url,
        code_url: None,
        timeout_secs: 5,
        dry_run: false,
    }
}

#[tokio::test]
async fn test_execute_posts_request_and_decodes_result() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/runner")
        .match_body(Matcher::PartialJson(json!({
            "repo": "django/django",
            "code_file": "django/views/static.py",
            "test_src": "def test_a():\n    assert True\n"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "passed",
                "success": true,
                "coverage": "63.5",
                "mutation_score": 41.0,
                "coverageDetails": {"missing_lines": [12, 40]}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let runner = HttpTestRunner::new(&runner_config(format!("{}/runner", server.url()))).unwrap();
    let request = RunnerRequest::new(&target(), "def test_a():\n    assert True\n");
    let result = runner.execute(&request).await.unwrap().result;

    mock.assert_async().await;
    assert_eq!(result.status, ExecutionStatus::Passed);
    assert!((result.coverage - 63.5).abs() < f64::EPSILON);
    assert!((result.mutation_score - 41.0).abs() < f64::EPSILON);
    assert_eq!(result.missing_lines(), &[12, 40]);
}

#[tokio::test]
async fn test_service_payload_is_kept_verbatim() {
    let payload = json!({
        "status": "success",
        "success": true,
        "exitCode": -1,
        "executionTime": 0.0,
        "coverage": 80.0,
        "coverageDetails": {},
        "stdout": "3 passed",
        "stderr": "",
        "repoPath": "/dev/null",
        "code_file": "django/views/static.py",
        "test_error": "",
        "task_id": "t1",
        "instance_id": "django__django-5.0",
        "log_path": "/logs/t1.log",
        "mutation_score": 55.0,
        "mutation_uncertainty": 4.5,
        "mutation_num": 20
    });
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/runner")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload.to_string())
        .create_async()
        .await;

    let runner = HttpTestRunner::new(&runner_config(format!("{}/runner", server.url()))).unwrap();
    let response = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap();

    assert_eq!(response.result.status, ExecutionStatus::Passed);
    assert!(response.result.success);
    assert!((response.result.coverage - 80.0).abs() < f64::EPSILON);
    assert_eq!(response.raw, payload);
}

#[tokio::test]
async fn test_missing_fields_use_conservative_defaults() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/runner")
        .with_status(200)
        .with_body(r#"{"status": "weird", "coverage": null}"#)
        .create_async()
        .await;

    let runner = HttpTestRunner::new(&runner_config(format!("{}/runner", server.url()))).unwrap();
    let result = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap()
        .result;

    assert_eq!(result.status, ExecutionStatus::Error);
    assert!(!result.success);
    assert!(result.coverage.abs() < f64::EPSILON);
    assert!(!result.mutation_available());
}

#[tokio::test]
async fn test_non_success_status_is_infrastructure_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/runner")
        .with_status(503)
        .with_body("sandbox pool exhausted")
        .create_async()
        .await;

    let runner = HttpTestRunner::new(&runner_config(format!("{}/runner", server.url()))).unwrap();
    let err = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap_err();
    match err {
        DomainError::RunnerUnavailable(msg) => assert!(msg.contains("sandbox pool exhausted")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unparsable_body_is_serialization_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/runner")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let runner = HttpTestRunner::new(&runner_config(format!("{}/runner", server.url()))).unwrap();
    let err = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::SerializationError(_)));
}

#[tokio::test]
async fn test_connection_refused_is_infrastructure_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let runner = HttpTestRunner::new(&runner_config(format!("http://{addr}/runner"))).unwrap();
    let err = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RunnerUnavailable(_)));
}

#[tokio::test]
async fn test_timeout_fails_closed_with_error_result() {
    // Accepts connections but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    let config = RunnerConfig {
        timeout_secs: 1,
        ..runner_config(format!("http://{addr}/runner"))
    };
    let runner = HttpTestRunner::new(&config).unwrap();
    let result = runner
        .execute(&RunnerRequest::new(&target(), "x"))
        .await
        .unwrap()
        .result;

    assert_eq!(result.status, ExecutionStatus::Error);
    assert!(!result.success);
    assert!(result.test_error.contains("timed out"));
    hold.abort();
}

#[tokio::test]
async fn test_fetch_target_source() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/code")
        .match_body(Matcher::Json(json!({
            "repo": "django/django",
            "version": "5.0",
            "code_file": "django/views/static.py"
        })))
        .with_status(200)
        .with_body(r#"{"contents": "def serve(request, path):\n    pass\n"}"#)
        .create_async()
        .await;

    let config = RunnerConfig {
        code_url: Some(format!("{}/code", server.url())),
        ..runner_config(format!("{}/runner", server.url()))
    };
    let runner = HttpTestRunner::new(&config).unwrap();
    let source = runner.fetch_target_source(&target()).await.unwrap();
    assert_eq!(source.as_deref(), Some("def serve(request, path):\n    pass\n"));
}

#[tokio::test]
async fn test_fetch_without_contents_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/code")
        .with_status(200)
        .with_body(r#"{"error": "unknown file"}"#)
        .create_async()
        .await;

    let config = RunnerConfig {
        code_url: Some(format!("{}/code", server.url())),
        ..runner_config(format!("{}/runner", server.url()))
    };
    let runner = HttpTestRunner::new(&config).unwrap();
    assert!(runner.fetch_target_source(&target()).await.is_err());
}

#[tokio::test]
async fn test_dry_run_url_selects_offline_runner() {
    let runner = build_runner(&runner_config("dryrun://local".to_string())).unwrap();
    assert_eq!(runner.name(), "dry_run");
    assert!(runner.fetch_target_source(&target()).await.unwrap().is_none());

    let result = runner
        .execute(&RunnerRequest::new(&target(), "import os\n"))
        .await
        .unwrap()
        .result;
    assert_eq!(result.status, ExecutionStatus::NoTestsCollected);
}
