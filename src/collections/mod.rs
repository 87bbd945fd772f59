//! # Endpoint Collections
//!
//! Endpoints of a project, organized in a folder tree derived from each
//! endpoint's slash-delimited `folderPath`, with drag-and-drop moves and
//! editable drafts.

pub mod drag;
pub mod tree;

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::http::curl::{CurlBody, ParsedCurlRequest};
use crate::http::method::HttpMethod;

pub use drag::{DragSession, MoveRequest};
pub use tree::{FolderNode, WalkEntry, build_tree, folder_segments, folder_suggestions};

const DRAFT_NAME: &str = "New Endpoint";

/// A single API endpoint as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub folder_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub route_path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("URL is required")]
    MissingUrl,
}

impl EndpointDescriptor {
    /// A blank endpoint placed in `folder`, not yet saved.
    pub fn draft(folder: &str) -> Self {
        Self {
            id: String::new(),
            name: DRAFT_NAME.to_string(),
            method: HttpMethod::Get,
            url: String::new(),
            folder_path: folder.to_string(),
            route_path: String::new(),
            headers: BTreeMap::new(),
            query_params: BTreeMap::new(),
            body: json!({}),
            description: None,
        }
    }

    /// Fills the draft from an imported cURL command.
    ///
    /// Parsed headers are merged over existing ones. The body is only
    /// replaced by a JSON payload; a raw string payload leaves it alone.
    pub fn apply_curl(&mut self, parsed: &ParsedCurlRequest) {
        match parsed.method.parse::<HttpMethod>() {
            Ok(method) => self.method = method,
            Err(err) => warn!("keeping {} for imported request: {err}", self.method),
        }
        if let Some(url) = &parsed.url {
            self.url = url.clone();
        }
        for (name, value) in &parsed.headers {
            self.headers.insert(name.clone(), value.clone());
        }
        if let Some(CurlBody::Json(body)) = &parsed.body {
            self.body = body.clone();
        }
    }

    /// The endpoint as it should be sent on save.
    pub fn normalized(&self) -> Result<EndpointDescriptor, DraftError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(DraftError::MissingUrl);
        }

        let name = match self.name.trim() {
            "" => format!("{} {url}", self.method),
            name => name.to_string(),
        };
        let id = if self.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.id.clone()
        };

        Ok(EndpointDescriptor {
            id,
            name,
            method: self.method,
            url: url.to_string(),
            folder_path: self.folder_path.trim().to_string(),
            route_path: self.route_path.trim().to_string(),
            headers: self.headers.clone(),
            query_params: self.query_params.clone(),
            body: self.body.clone(),
            description: self.description.clone(),
        })
    }

    /// Display label used by listings: the name, or the URL when unnamed.
    pub fn label(&self) -> &str {
        if self.name.is_empty() { &self.url } else { &self.name }
    }
}

#[cfg(test)]
pub(crate) fn endpoint(id: &str, folder: &str) -> EndpointDescriptor {
    EndpointDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        url: format!("https://api.example.com/{id}"),
        ..EndpointDescriptor::draft(folder)
    }
}
