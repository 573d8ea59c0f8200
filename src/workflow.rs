//! The request workflow as a single owned state record.
//!
//! Network calls are split in two: `begin_*` hands out a [`PendingCall`]
//! carrying a sequence-numbered [`Ticket`] and a snapshot of the draft, and
//! `finish_*` applies the result only if that ticket is still the latest one
//! issued. Results from superseded calls are dropped.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    fences::decode_outcome,
    host::{Clipboard, Download},
    models::{DraftError, DraftPatch, GeneratedArtifact, RequestDraft, ValidationOutcome},
    upstream::UpstreamError,
};

pub const VALIDATION_FAILED: &str = "Failed to validate request";
pub const GENERATION_FAILED: &str = "Failed to generate configuration";
pub const MALFORMED_RESPONSE: &str = "malformed validation response";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("generation requires a successful validation")]
    GenerationUnavailable,
    #[error("no generated manifest")]
    NotGenerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Validation,
    Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    kind: CallKind,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }
}

/// An issued call: who it is and what to send.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub draft: RequestDraft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Validating,
    Validated { outcome: ValidationOutcome },
    Generating,
    Generated { artifact: GeneratedArtifact },
    Failed { message: String },
}

#[derive(Debug, Default)]
pub struct Workflow {
    draft: RequestDraft,
    outcome: Option<ValidationOutcome>,
    artifact: Option<GeneratedArtifact>,
    error: Option<String>,
    in_flight: Option<Ticket>,
    issued: u64,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    /// The last decoded outcome. Survives a generation failure.
    pub fn outcome(&self) -> Option<&ValidationOutcome> {
        self.outcome.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if let Some(ticket) = self.in_flight {
            return match ticket.kind {
                CallKind::Validation => Phase::Validating,
                CallKind::Generation => Phase::Generating,
            };
        }
        if let Some(message) = &self.error {
            return Phase::Failed { message: message.clone() };
        }
        if let Some(artifact) = &self.artifact {
            return Phase::Generated { artifact: artifact.clone() };
        }
        match &self.outcome {
            Some(outcome) => Phase::Validated { outcome: outcome.clone() },
            None => Phase::Idle,
        }
    }

    pub fn edit(&mut self, patch: DraftPatch) -> Result<(), WorkflowError> {
        Ok(self.draft.apply(patch)?)
    }

    fn issue(&mut self, kind: CallKind) -> PendingCall {
        self.issued += 1;
        let ticket = Ticket { seq: self.issued, kind };
        self.in_flight = Some(ticket);
        PendingCall { ticket, draft: self.draft.clone() }
    }

    fn take_if_current(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            debug!(seq = ticket.seq, latest = self.issued, "dropping superseded {:?} result", ticket.kind);
            false
        }
    }

    /// Starts a validation round, replacing whatever was shown or in flight.
    pub fn begin_validation(&mut self) -> Result<PendingCall, WorkflowError> {
        self.draft.check_ready()?;
        self.outcome = None;
        self.artifact = None;
        self.error = None;
        let call = self.issue(CallKind::Validation);
        info!(seq = call.ticket.seq, "🎯 Validating request for '{}'", call.draft.service_name);
        Ok(call)
    }

    pub fn finish_validation(
        &mut self,
        ticket: Ticket,
        result: Result<String, UpstreamError>,
    ) -> Applied {
        if ticket.kind != CallKind::Validation || !self.take_if_current(ticket) {
            return Applied::Superseded;
        }
        match result {
            Ok(text) => match decode_outcome(&text) {
                Ok(outcome) => {
                    info!(
                        valid = outcome.valid,
                        issues = outcome.issues.len(),
                        warnings = outcome.warnings.len(),
                        "✅ Validation outcome applied"
                    );
                    self.outcome = Some(outcome);
                }
                Err(e) => {
                    error!("❌ {}", e);
                    self.error = Some(MALFORMED_RESPONSE.to_string());
                }
            },
            Err(e) => {
                error!("❌ Validation failed: {}", e);
                self.error = Some(e.user_message(VALIDATION_FAILED));
            }
        }
        Applied::Applied
    }

    /// Generation needs a retained `valid = true` outcome and nothing in
    /// flight or already generated. A failed generation can be retried.
    pub fn can_generate(&self) -> bool {
        self.in_flight.is_none()
            && self.artifact.is_none()
            && self.outcome.as_ref().is_some_and(|o| o.valid)
    }

    pub fn begin_generation(&mut self) -> Result<PendingCall, WorkflowError> {
        if !self.can_generate() {
            return Err(WorkflowError::GenerationUnavailable);
        }
        self.error = None;
        let call = self.issue(CallKind::Generation);
        info!(seq = call.ticket.seq, "🎯 Generating manifest for '{}'", call.draft.service_name);
        Ok(call)
    }

    pub fn finish_generation(
        &mut self,
        ticket: Ticket,
        result: Result<String, UpstreamError>,
    ) -> Applied {
        if ticket.kind != CallKind::Generation || !self.take_if_current(ticket) {
            return Applied::Superseded;
        }
        match result {
            Ok(manifest) => {
                let artifact = GeneratedArtifact::new(manifest);
                info!(id = %artifact.id, "✅ Manifest generated ({} chars)", artifact.manifest.len());
                self.artifact = Some(artifact);
            }
            Err(e) => {
                error!("❌ Generation failed: {}", e);
                self.error = Some(e.user_message(GENERATION_FAILED));
            }
        }
        Applied::Applied
    }

    /// Leaves the manifest view and shows the outcome it was generated from.
    pub fn back(&mut self) -> Result<(), WorkflowError> {
        self.generated()?;
        self.artifact = None;
        Ok(())
    }

    /// Back to a blank form. In-flight results are dropped when they land.
    pub fn reset(&mut self) {
        self.draft = RequestDraft::default();
        self.outcome = None;
        self.artifact = None;
        self.error = None;
        self.in_flight = None;
        info!("🔄 Workflow reset");
    }

    fn generated(&self) -> Result<&GeneratedArtifact, WorkflowError> {
        match (&self.artifact, self.in_flight, &self.error) {
            (Some(artifact), None, None) => Ok(artifact),
            _ => Err(WorkflowError::NotGenerated),
        }
    }

    /// The manifest as a file named after the current draft.
    pub fn download(&self) -> Result<Download, WorkflowError> {
        let artifact = self.generated()?;
        Ok(Download::manifest(self.draft.manifest_file_name(), artifact.manifest.clone()))
    }

    /// Best effort: a clipboard failure is logged and otherwise ignored.
    pub fn copy_to_clipboard(&self, clipboard: &dyn Clipboard) -> Result<(), WorkflowError> {
        let artifact = self.generated()?;
        if let Err(e) = clipboard.set_text(&artifact.manifest) {
            warn!("⚠️ Could not copy manifest: {}", e);
        }
        Ok(())
    }
}
