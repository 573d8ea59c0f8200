mod common;

use std::sync::Arc;

use axum::{http::StatusCode, routing::post, Json, Router};
use infra_portal::{
    models::{DraftPatch, Environment},
    session::Session,
    upstream::{DecisionClient, UpstreamError, GENERATE_PATH, VALIDATE_PATH},
    workflow::{Phase, WorkflowError, GENERATION_FAILED},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{orders_patch, spawn_upstream, Gated};

const MANIFEST: &str = "apiVersion: apps/v1\nkind: Deployment\n...";

async fn decision_service() -> String {
    let app = Router::new()
        .route(
            VALIDATE_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body,
                    json!({
                        "service_name": "orders",
                        "environment": "production",
                        "instance_type": "t3.medium",
                        "replicas": 3,
                        "cpu_limit": "500m",
                        "memory_limit": "512Mi"
                    })
                );
                Json(json!({
                    "validation": "```json\n{\"valid\":true,\"warnings\":[\"low replica count for production\"]}\n```"
                }))
            }),
        )
        .route(GENERATE_PATH, post(|| async { Json(json!({ "yaml": MANIFEST })) }));
    spawn_upstream(app).await
}

#[tokio::test]
async fn validated_then_generated() {
    let session = Session::new(Arc::new(DecisionClient::new(decision_service().await)));
    session.edit(orders_patch()).unwrap();

    let phase = session.submit().await.unwrap();
    let Phase::Validated { outcome } = phase else {
        panic!("expected a validated phase");
    };
    assert!(outcome.valid);
    assert_eq!(outcome.warnings, vec!["low replica count for production".to_string()]);
    assert!(outcome.issues.is_empty());
    assert!(outcome.suggestions.is_empty());

    let phase = session.generate().await.unwrap();
    let Phase::Generated { artifact } = phase else {
        panic!("expected a generated phase");
    };
    assert_eq!(artifact.manifest, MANIFEST);

    let file = session.download().unwrap();
    assert_eq!(file.file_name, "orders-production.yaml");
    assert_eq!(file.content_type, "text/yaml");
    assert_eq!(file.contents, MANIFEST);
}

#[tokio::test]
async fn server_detail_becomes_the_failure_message() {
    let app = Router::new().route(
        VALIDATE_PATH,
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "service unreachable" })))
        }),
    );
    let session = Session::new(Arc::new(DecisionClient::new(spawn_upstream(app).await)));
    session.edit(orders_patch()).unwrap();

    let phase = session.submit().await.unwrap();
    assert_eq!(phase, Phase::Failed { message: "service unreachable".into() });
    assert!(session.snapshot().last_outcome.is_none());
}

#[tokio::test]
async fn empty_detail_still_yields_a_message() {
    let app = Router::new().route(
        VALIDATE_PATH,
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "" }))) }),
    );
    let session = Session::new(Arc::new(DecisionClient::new(spawn_upstream(app).await)));
    session.edit(orders_patch()).unwrap();

    let phase = session.submit().await.unwrap();
    assert_eq!(phase, Phase::Failed { message: "Failed to validate request".into() });
}

#[tokio::test]
async fn unreachable_service_uses_generic_message() {
    // Nothing listens on port 9 locally; the connection is refused.
    let session = Session::new(Arc::new(DecisionClient::new("http://127.0.0.1:9")));
    session.edit(orders_patch()).unwrap();

    let phase = session.submit().await.unwrap();
    assert_eq!(phase, Phase::Failed { message: "Failed to validate request".into() });
    assert!(session.submit().await.is_ok());
}

#[tokio::test]
async fn later_submission_wins_when_earlier_resolves_last() {
    let backend = Arc::new(Gated::default());
    let first_gate = backend.gate_validation();
    let second_gate = backend.gate_validation();
    let session = Session::new(backend.clone());
    session.edit(orders_patch()).unwrap();

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    backend.wait_for_calls(1).await;

    session
        .edit(DraftPatch { environment: Some("staging".into()), ..DraftPatch::default() })
        .unwrap();
    let second = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    backend.wait_for_calls(2).await;
    assert_eq!(session.phase(), Phase::Validating);

    second_gate
        .send(Ok("{\"valid\":true,\"suggestions\":[\"staging looks right\"]}".into()))
        .unwrap();
    second.await.unwrap().unwrap();

    first_gate
        .send(Err(UpstreamError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: Some("stale failure".into()),
        }))
        .unwrap();
    first.await.unwrap().unwrap();

    let Phase::Validated { outcome } = session.phase() else {
        panic!("stale result overwrote the newer phase");
    };
    assert_eq!(outcome.suggestions, vec!["staging looks right".to_string()]);

    let seen = backend.seen();
    assert_eq!(seen[0].environment, Environment::Production);
    assert_eq!(seen[1].environment, Environment::Staging);
}

#[tokio::test]
async fn reset_discards_an_in_flight_generation() {
    let backend = Arc::new(Gated::default());
    backend.gate_validation().send(Ok("{\"valid\":true}".into())).unwrap();
    let gen_gate = backend.gate_generation();
    let session = Session::new(backend.clone());
    session.edit(orders_patch()).unwrap();
    session.submit().await.unwrap();

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.generate().await }
    });
    backend.wait_for_calls(2).await;
    assert_eq!(session.phase(), Phase::Generating);

    assert_eq!(session.reset(), Phase::Idle);
    gen_gate.send(Ok("kind: Deployment".into())).unwrap();
    pending.await.unwrap().unwrap();

    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.snapshot().draft.service_name, "");
}

#[tokio::test]
async fn generation_failure_keeps_outcome_for_retry() {
    let backend = Arc::new(Gated::default());
    backend.gate_validation().send(Ok("```\n{\"valid\":true}\n```".into())).unwrap();
    backend
        .gate_generation()
        .send(Err(UpstreamError::Status {
            status: StatusCode::BAD_GATEWAY,
            detail: None,
        }))
        .unwrap();
    backend.gate_generation().send(Ok("kind: Service".into())).unwrap();

    let session = Session::new(backend);
    session.edit(orders_patch()).unwrap();
    session.submit().await.unwrap();

    let phase = session.generate().await.unwrap();
    assert_eq!(phase, Phase::Failed { message: GENERATION_FAILED.into() });
    assert!(session.snapshot().last_outcome.is_some_and(|o| o.valid));
    assert_eq!(session.back().unwrap_err(), WorkflowError::NotGenerated);

    let phase = session.generate().await.unwrap();
    assert!(matches!(phase, Phase::Generated { .. }));
    assert!(matches!(session.back().unwrap(), Phase::Validated { .. }));
}

#[tokio::test]
async fn invalid_outcome_blocks_generation() {
    let backend = Arc::new(Gated::default());
    backend
        .gate_validation()
        .send(Ok("{\"valid\":false,\"issues\":[\"memory limit too low\"]}".into()))
        .unwrap();
    let session = Session::new(backend.clone());
    session.edit(orders_patch()).unwrap();
    session.submit().await.unwrap();

    let before = session.phase();
    assert_eq!(session.generate().await.unwrap_err(), WorkflowError::GenerationUnavailable);
    assert_eq!(session.phase(), before);
    assert_eq!(backend.calls(), 1);
}
