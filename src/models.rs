use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_REPLICAS: u8 = 1;
pub const MAX_REPLICAS: u8 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("replicas must be a whole number, got {0:?}")]
    ReplicasNotNumeric(String),
    #[error("replicas must be between 1 and 10, got {0}")]
    ReplicasOutOfRange(i64),
    #[error("unknown environment {0:?}")]
    UnknownEnvironment(String),
    #[error("unknown instance type {0:?}")]
    UnknownInstanceType(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(DraftError::UnknownEnvironment(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceType {
    #[serde(rename = "t3.micro")]
    T3Micro,
    #[serde(rename = "t3.small")]
    T3Small,
    #[default]
    #[serde(rename = "t3.medium")]
    T3Medium,
    #[serde(rename = "t3.large")]
    T3Large,
}

impl InstanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceType::T3Micro => "t3.micro",
            InstanceType::T3Small => "t3.small",
            InstanceType::T3Medium => "t3.medium",
            InstanceType::T3Large => "t3.large",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "t3.micro" => Ok(InstanceType::T3Micro),
            "t3.small" => Ok(InstanceType::T3Small),
            "t3.medium" => Ok(InstanceType::T3Medium),
            "t3.large" => Ok(InstanceType::T3Large),
            other => Err(DraftError::UnknownInstanceType(other.to_string())),
        }
    }
}

/// Replica count, always within `MIN_REPLICAS..=MAX_REPLICAS`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "i64", into = "u8")]
pub struct Replicas(u8);

impl Replicas {
    pub fn get(self) -> u8 {
        self.0
    }

    /// Parses raw form input. Anything that is not a whole number is rejected
    /// instead of being coerced.
    pub fn parse(input: &str) -> Result<Self, DraftError> {
        let trimmed = input.trim();
        let n: i64 = trimmed
            .parse()
            .map_err(|_| DraftError::ReplicasNotNumeric(trimmed.to_string()))?;
        Self::try_from(n)
    }
}

impl Default for Replicas {
    fn default() -> Self {
        Replicas(2)
    }
}

impl TryFrom<i64> for Replicas {
    type Error = DraftError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_REPLICAS)..=i64::from(MAX_REPLICAS)).contains(&n) {
            Ok(Replicas(n as u8))
        } else {
            Err(DraftError::ReplicasOutOfRange(n))
        }
    }
}

impl From<Replicas> for u8 {
    fn from(r: Replicas) -> u8 {
        r.0
    }
}

/// The in-progress request. Serializes to the request body both decision
/// service endpoints expect.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub service_name: String,
    pub environment: Environment,
    pub instance_type: InstanceType,
    pub replicas: Replicas,
    pub cpu_limit: String,
    pub memory_limit: String,
}

impl Default for RequestDraft {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            environment: Environment::default(),
            instance_type: InstanceType::default(),
            replicas: Replicas::default(),
            cpu_limit: "500m".to_string(),
            memory_limit: "512Mi".to_string(),
        }
    }
}

impl RequestDraft {
    /// Applies every field present in `patch`. Either all of them land or none do.
    pub fn apply(&mut self, patch: DraftPatch) -> Result<(), DraftError> {
        let mut next = self.clone();
        if let Some(name) = patch.service_name {
            next.service_name = name;
        }
        if let Some(env) = patch.environment {
            next.environment = env.parse()?;
        }
        if let Some(instance) = patch.instance_type {
            next.instance_type = instance.parse()?;
        }
        if let Some(replicas) = patch.replicas {
            next.replicas = match replicas {
                ReplicaInput::Number(n) => Replicas::try_from(n)?,
                ReplicaInput::Text(text) => Replicas::parse(&text)?,
            };
        }
        if let Some(cpu) = patch.cpu_limit {
            next.cpu_limit = cpu;
        }
        if let Some(memory) = patch.memory_limit {
            next.memory_limit = memory;
        }
        *self = next;
        Ok(())
    }

    pub fn check_ready(&self) -> Result<(), DraftError> {
        if self.service_name.trim().is_empty() {
            return Err(DraftError::MissingField("service_name"));
        }
        if self.cpu_limit.trim().is_empty() {
            return Err(DraftError::MissingField("cpu_limit"));
        }
        if self.memory_limit.trim().is_empty() {
            return Err(DraftError::MissingField("memory_limit"));
        }
        Ok(())
    }

    pub fn manifest_file_name(&self) -> String {
        format!("{}-{}.yaml", self.service_name, self.environment)
    }
}

/// Raw replica input, either as typed by the user or already numeric.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReplicaInput {
    Number(i64),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub replicas: Option<ReplicaInput>,
    #[serde(default)]
    pub cpu_limit: Option<String>,
    #[serde(default)]
    pub memory_limit: Option<String>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub id: Uuid,
    pub manifest: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn new(manifest: String) -> Self {
        Self { id: Uuid::new_v4(), manifest, generated_at: Utc::now() }
    }
}

// --- Decision service wire bodies ---

#[derive(Debug, Deserialize)]
pub struct ValidateResponse {
    pub validation: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub yaml: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorDetail {
    pub detail: String,
}
