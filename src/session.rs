use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    host::{Clipboard, Download},
    models::{DraftPatch, RequestDraft, ValidationOutcome},
    upstream::DecisionBackend,
    workflow::{Phase, Workflow, WorkflowError},
};

/// What the rendering layer needs to draw the current state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub session_id: Uuid,
    pub draft: RequestDraft,
    #[serde(flatten)]
    pub phase: Phase,
    /// Retained even while a generation failure is shown.
    pub last_outcome: Option<ValidationOutcome>,
}

/// Drives one [`Workflow`] against a decision backend. The lock is never held
/// across a network call, so overlapping operations interleave and the
/// workflow's tickets decide whose result lands.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    workflow: Arc<Mutex<Workflow>>,
    backend: Arc<dyn DecisionBackend>,
}

impl Session {
    pub fn new(backend: Arc<dyn DecisionBackend>) -> Self {
        Self { id: Uuid::new_v4(), workflow: Arc::default(), backend }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> Snapshot {
        let wf = self.workflow.lock();
        Snapshot {
            session_id: self.id,
            draft: wf.draft().clone(),
            phase: wf.phase(),
            last_outcome: wf.outcome().cloned(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.workflow.lock().phase()
    }

    pub fn edit(&self, patch: DraftPatch) -> Result<(), WorkflowError> {
        self.workflow.lock().edit(patch)
    }

    pub async fn submit(&self) -> Result<Phase, WorkflowError> {
        let call = self.workflow.lock().begin_validation()?;
        let result = self.backend.validate(&call.draft).await;
        let mut wf = self.workflow.lock();
        wf.finish_validation(call.ticket, result);
        Ok(wf.phase())
    }

    pub async fn generate(&self) -> Result<Phase, WorkflowError> {
        let call = self.workflow.lock().begin_generation()?;
        let result = self.backend.generate_config(&call.draft).await;
        let mut wf = self.workflow.lock();
        wf.finish_generation(call.ticket, result);
        Ok(wf.phase())
    }

    pub fn back(&self) -> Result<Phase, WorkflowError> {
        let mut wf = self.workflow.lock();
        wf.back()?;
        Ok(wf.phase())
    }

    pub fn reset(&self) -> Phase {
        let mut wf = self.workflow.lock();
        wf.reset();
        wf.phase()
    }

    pub fn download(&self) -> Result<Download, WorkflowError> {
        self.workflow.lock().download()
    }

    pub fn copy_to_clipboard(&self, clipboard: &dyn Clipboard) -> Result<(), WorkflowError> {
        self.workflow.lock().copy_to_clipboard(clipboard)
    }
}
