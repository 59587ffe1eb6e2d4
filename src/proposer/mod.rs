//! Fix proposals
//!
//! A [`FixProposer`] receives one module with its prioritized issues and a
//! little neighborhood context, and answers with a corrected record. The
//! repair loop treats it as an untrusted external collaborator: answers are
//! decoded leniently, checked for the required field set, and failures are
//! typed so the loop can retry or skip.

pub mod command;
pub mod decode;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Module, REQUIRED_FIELDS};

pub use command::CommandProposer;
pub use decode::{DecodeStrategy, decode_object};

/// How a related module is connected to the one being fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// The module being fixed depends on it
    Dependency,
    /// It depends on the module being fixed
    Dependent,
    /// Shares a name stem (`UserService` / `UserController`)
    SimilarName,
}

/// Summary of a neighboring module sent along with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedModule {
    pub name: String,
    pub relationship: Relationship,
    pub responsibilities: Vec<String>,
    pub key_apis: Vec<String>,
}

/// Everything a proposer gets to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRequest {
    pub module_name: String,
    /// Prioritized, most important first
    pub issues: Vec<String>,
    pub current: Module,
    pub related: Vec<RelatedModule>,
}

/// Why a proposal could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("proposer failed: {0}")]
    Transport(String),

    #[error("proposal is missing required fields: {}", missing.join(", "))]
    Malformed { missing: Vec<String> },

    #[error("proposal has invalid field values: {0}")]
    Invalid(String),

    #[error("proposer timed out")]
    Timeout,
}

/// Source of corrected module records
#[async_trait]
pub trait FixProposer: Send + Sync {
    async fn propose(&self, request: &FixRequest) -> Result<Module, ProposalError>;
}

/// Turn raw proposer output into a module record
pub fn parse_proposal(text: &str) -> Result<Module, ProposalError> {
    let (object, strategy) = decode_object(text);
    if strategy != DecodeStrategy::Strict {
        tracing::debug!(?strategy, "proposal needed lenient decoding");
    }
    module_from_object(object)
}

/// Check the required field set and build a [`Module`]
pub fn module_from_object(mut object: Map<String, Value>) -> Result<Module, ProposalError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| (*field).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ProposalError::Malformed { missing });
    }

    // Nested objects are flattened to their JSON text
    for value in object.values_mut() {
        if value.is_object() {
            *value = Value::String(value.to_string());
        }
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| ProposalError::Invalid(e.to_string()))
}
