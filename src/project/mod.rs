//! # Projects
//!
//! A project groups endpoints and their generated test cases. Projects live
//! on the backend; this module defines the operations the client relies on
//! and a session that keeps a local snapshot in step with them.

pub mod session;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collections::EndpointDescriptor;
use crate::http::method::HttpMethod;
use crate::testing::TestCase;

pub use session::ProjectSession;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn endpoint(&self, endpoint_id: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|ep| ep.id == endpoint_id)
    }
}

/// Partial endpoint update; unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
}

impl EndpointPatch {
    pub fn folder(folder_path: impl Into<String>) -> Self {
        Self {
            folder_path: Some(folder_path.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Remote operations on a project.
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    async fn get_project(&self, project_id: &str) -> Result<Project, BackendError>;

    /// Persists `patch` and returns the endpoint as stored.
    async fn update_endpoint(
        &self,
        project_id: &str,
        endpoint_id: &str,
        patch: &EndpointPatch,
    ) -> Result<EndpointDescriptor, BackendError>;

    /// Generates `count` new test cases (1 to 20) and returns them.
    async fn generate_test_cases(&self, project_id: &str, count: u32) -> Result<Vec<TestCase>, BackendError>;

    async fn delete_test_case(&self, project_id: &str, case_id: &str) -> Result<(), BackendError>;

    async fn delete_endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<(), BackendError>;
}
