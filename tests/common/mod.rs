#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::Router;
use infra_portal::{
    host::{Clipboard, HostError},
    models::{DraftPatch, ReplicaInput, RequestDraft},
    upstream::{DecisionBackend, UpstreamError},
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

pub type Reply = Result<String, UpstreamError>;

/// Serves `app` on an ephemeral port and returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

pub fn orders_patch() -> DraftPatch {
    DraftPatch {
        service_name: Some("orders".into()),
        environment: Some("production".into()),
        instance_type: Some("t3.medium".into()),
        replicas: Some(ReplicaInput::Number(3)),
        cpu_limit: Some("500m".into()),
        memory_limit: Some("512Mi".into()),
    }
}

/// Backend whose replies are released by the test, one gate per call.
#[derive(Default)]
pub struct Gated {
    validations: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    generations: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<RequestDraft>>,
}

impl Gated {
    pub fn gate_validation(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.validations.lock().push_back(rx);
        tx
    }

    pub fn gate_generation(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.generations.lock().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<RequestDraft> {
        self.seen.lock().clone()
    }

    /// Yields until `n` calls have reached the backend.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl DecisionBackend for Gated {
    async fn validate(&self, draft: &RequestDraft) -> Result<String, UpstreamError> {
        let rx = self.validations.lock().pop_front().expect("no validation gate queued");
        self.seen.lock().push(draft.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        rx.await.expect("validation gate dropped")
    }

    async fn generate_config(&self, draft: &RequestDraft) -> Result<String, UpstreamError> {
        let rx = self.generations.lock().pop_front().expect("no generation gate queued");
        self.seen.lock().push(draft.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        rx.await.expect("generation gate dropped")
    }
}

/// Backend that always answers the same way.
pub struct Canned {
    pub validation: String,
    pub yaml: String,
}

#[async_trait]
impl DecisionBackend for Canned {
    async fn validate(&self, _: &RequestDraft) -> Result<String, UpstreamError> {
        Ok(self.validation.clone())
    }

    async fn generate_config(&self, _: &RequestDraft) -> Result<String, UpstreamError> {
        Ok(self.yaml.clone())
    }
}

#[derive(Default)]
pub struct RecordingClipboard(pub Mutex<Vec<String>>);

impl Clipboard for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<(), HostError> {
        self.0.lock().push(text.to_string());
        Ok(())
    }
}
