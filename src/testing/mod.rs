//! # Test Cases
//!
//! Test cases generated for a project's endpoints and the view that splits
//! them into freshly generated and previously existing ones.

pub mod partition;

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use partition::{Bucket, PAGE_SIZE, Partition, TestCasePage, TestCaseViewState, total_pages};

/// Smallest and largest number of test cases one generation may request.
pub const MIN_GENERATE: u32 = 1;
pub const MAX_GENERATE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    #[default]
    Pending,
}

impl Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Pending => "pending",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub endpoint_id: String,
    #[serde(default)]
    pub status: TestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub test_steps: Vec<String>,
    #[serde(default)]
    pub expected_results: Vec<String>,
}

/// Clamps a requested generation count into the accepted range.
pub fn clamp_generate_count(count: u32) -> u32 {
    count.clamp(MIN_GENERATE, MAX_GENERATE)
}

#[cfg(test)]
pub(crate) fn test_case(id: &str, created_at: &str) -> TestCase {
    TestCase {
        id: id.to_string(),
        name: format!("case {id}"),
        endpoint_id: "e1".to_string(),
        status: TestStatus::Pending,
        created_at: created_at.parse().unwrap(),
        test_steps: Vec::new(),
        expected_results: Vec::new(),
    }
}
