use std::collections::HashSet;

use log::{info, warn};

use crate::collections::{DragSession, FolderNode, build_tree};
use crate::testing::{Partition, clamp_generate_count};

use super::{BackendError, EndpointPatch, Project, ProjectBackend};

/// Client-side view of one project.
///
/// The session keeps the last project snapshot returned by the backend and
/// derives the folder tree and test-case partition from it on demand. Every
/// change goes to the backend first and is followed by a full reload; the
/// snapshot is never patched locally, and a failed call leaves it as it was.
pub struct ProjectSession<B> {
    backend: B,
    project_id: String,
    project: Option<Project>,
    recently_generated: HashSet<String>,
    drag: DragSession,
}

impl<B: ProjectBackend> ProjectSession<B> {
    pub fn new(backend: B, project_id: impl Into<String>) -> Self {
        Self {
            backend,
            project_id: project_id.into(),
            project: None,
            recently_generated: HashSet::new(),
            drag: DragSession::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The last snapshot, if one was loaded.
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub async fn reload(&mut self) -> Result<&Project, BackendError> {
        let project = self.backend.get_project(&self.project_id).await?;
        Ok(&*self.project.insert(project))
    }

    pub fn tree(&self) -> FolderNode<'_> {
        match &self.project {
            Some(project) => build_tree(&project.endpoints),
            None => FolderNode::default(),
        }
    }

    pub fn partition(&self) -> Partition<'_> {
        match &self.project {
            Some(project) => Partition::new(&project.test_cases, &self.recently_generated),
            None => Partition::default(),
        }
    }

    pub fn recently_generated(&self) -> &HashSet<String> {
        &self.recently_generated
    }

    /// Drops the "new" marking, as when the user leaves the project.
    pub fn forget_generated(&mut self) {
        self.recently_generated.clear();
    }

    pub fn drag(&mut self) -> &mut DragSession {
        &mut self.drag
    }

    /// Moves an endpoint to `folder_path`, replacing its previous folder.
    ///
    /// Returns `Ok(false)` without contacting the backend when the endpoint
    /// is not part of the loaded project.
    pub async fn move_endpoint(&mut self, endpoint_id: &str, folder_path: &str) -> Result<bool, BackendError> {
        let known = self
            .project
            .as_ref()
            .is_some_and(|project| project.endpoint(endpoint_id).is_some());
        if !known {
            warn!("cannot move unknown endpoint {endpoint_id}");
            return Ok(false);
        }

        self.backend
            .update_endpoint(&self.project_id, endpoint_id, &EndpointPatch::folder(folder_path))
            .await?;
        info!("moved endpoint {endpoint_id} to `{folder_path}`");
        self.reload().await?;
        Ok(true)
    }

    /// Completes a drag onto `folder_path`. Without an active drag, or
    /// without a project id, nothing happens.
    pub async fn drop_dragged(&mut self, folder_path: &str) -> Result<bool, BackendError> {
        let project_id = (!self.project_id.is_empty()).then_some(self.project_id.as_str());
        let Some(request) = self.drag.drop_on(folder_path, project_id) else {
            return Ok(false);
        };
        self.move_endpoint(&request.endpoint_id, &request.folder_path).await
    }

    /// Generates test cases and marks them as new. Returns how many were created.
    pub async fn generate_test_cases(&mut self, count: u32) -> Result<usize, BackendError> {
        let count = clamp_generate_count(count);
        let created = self.backend.generate_test_cases(&self.project_id, count).await?;
        info!("generated {} test case(s) for project {}", created.len(), self.project_id);

        self.recently_generated = created.into_iter().map(|case| case.id).collect();
        self.reload().await?;
        Ok(self.recently_generated.len())
    }

    pub async fn delete_test_case(&mut self, case_id: &str) -> Result<(), BackendError> {
        self.backend.delete_test_case(&self.project_id, case_id).await?;
        info!("deleted test case {case_id}");
        self.reload().await?;
        Ok(())
    }

    pub async fn delete_endpoint(&mut self, endpoint_id: &str) -> Result<(), BackendError> {
        self.backend.delete_endpoint(&self.project_id, endpoint_id).await?;
        info!("deleted endpoint {endpoint_id}");
        self.reload().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::collections::{EndpointDescriptor, endpoint};
    use crate::testing::{Bucket, TestCase, test_case};

    /// In-memory backend that applies changes to its own project copy.
    /// Clones share state, so a test can inspect what the session did.
    #[derive(Clone)]
    struct MemoryBackend {
        project: Arc<Mutex<Project>>,
        calls: Arc<Mutex<Vec<String>>>,
        next_case: Arc<Mutex<u32>>,
        fail_writes: bool,
    }

    impl MemoryBackend {
        fn new(endpoints: Vec<EndpointDescriptor>, test_cases: Vec<TestCase>) -> Self {
            Self {
                project: Arc::new(Mutex::new(Project {
                    id: "p1".into(),
                    name: "Shop".into(),
                    description: None,
                    endpoints,
                    test_cases,
                    created_at: None,
                    updated_at: None,
                })),
                calls: Arc::default(),
                next_case: Arc::default(),
                fail_writes: false,
            }
        }

        fn failing(mut self) -> Self {
            self.fail_writes = true;
            self
        }

        fn record(&self, call: String) -> Result<(), BackendError> {
            self.calls.lock().unwrap().push(call);
            if self.fail_writes {
                return Err(BackendError::Status {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProjectBackend for MemoryBackend {
        async fn get_project(&self, project_id: &str) -> Result<Project, BackendError> {
            self.calls.lock().unwrap().push(format!("get {project_id}"));
            Ok(self.project.lock().unwrap().clone())
        }

        async fn update_endpoint(
            &self,
            project_id: &str,
            endpoint_id: &str,
            patch: &EndpointPatch,
        ) -> Result<EndpointDescriptor, BackendError> {
            self.record(format!("update {project_id} {endpoint_id}"))?;
            let mut project = self.project.lock().unwrap();
            let ep = project
                .endpoints
                .iter_mut()
                .find(|ep| ep.id == endpoint_id)
                .ok_or_else(|| BackendError::Status {
                    status: 404,
                    message: "Endpoint not found".into(),
                })?;
            if let Some(folder) = &patch.folder_path {
                ep.folder_path = folder.clone();
            }
            Ok(ep.clone())
        }

        async fn generate_test_cases(&self, project_id: &str, count: u32) -> Result<Vec<TestCase>, BackendError> {
            self.record(format!("generate {project_id} {count}"))?;
            let mut next = self.next_case.lock().unwrap();
            let mut created = Vec::new();
            for _ in 0..count {
                *next += 1;
                created.push(test_case(&format!("gen{next}"), "2024-06-01T00:00:00Z"));
            }
            self.project.lock().unwrap().test_cases.extend(created.clone());
            Ok(created)
        }

        async fn delete_test_case(&self, project_id: &str, case_id: &str) -> Result<(), BackendError> {
            self.record(format!("delete-test {project_id} {case_id}"))?;
            self.project.lock().unwrap().test_cases.retain(|case| case.id != case_id);
            Ok(())
        }

        async fn delete_endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<(), BackendError> {
            self.record(format!("delete-endpoint {project_id} {endpoint_id}"))?;
            self.project.lock().unwrap().endpoints.retain(|ep| ep.id != endpoint_id);
            Ok(())
        }
    }

    fn ids(items: &[&EndpointDescriptor]) -> Vec<String> {
        items.iter().map(|ep| ep.id.clone()).collect()
    }

    #[tokio::test]
    async fn move_rebuilds_tree_from_reload() {
        let backend = MemoryBackend::new(vec![endpoint("e1", "x"), endpoint("e2", "")], vec![]);
        let mut session = ProjectSession::new(backend.clone(), "p1");
        session.reload().await.unwrap();
        assert!(session.tree().get("x").is_some());

        assert!(session.move_endpoint("e1", "y/z").await.unwrap());

        let tree = session.tree();
        assert!(tree.get("x").is_none());
        assert_eq!(ids(&tree.get("y/z").unwrap().items), vec!["e1"]);
        assert_eq!(ids(&tree.items), vec!["e2"]);
        assert_eq!(backend.calls(), vec!["get p1", "update p1 e1", "get p1"]);
    }

    #[tokio::test]
    async fn move_of_unknown_endpoint_sends_nothing() {
        let backend = MemoryBackend::new(vec![endpoint("e1", "x")], vec![]);
        let mut session = ProjectSession::new(backend.clone(), "p1");
        assert!(!session.move_endpoint("e1", "y").await.unwrap());

        session.reload().await.unwrap();
        assert!(!session.move_endpoint("ghost", "y").await.unwrap());
        assert_eq!(backend.calls(), vec!["get p1"]);
    }

    #[tokio::test]
    async fn failed_move_keeps_snapshot() {
        let backend = MemoryBackend::new(vec![endpoint("e1", "x")], vec![]).failing();
        let mut session = ProjectSession::new(backend.clone(), "p1");
        session.reload().await.unwrap();

        let err = session.move_endpoint("e1", "y").await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
        assert_eq!(session.tree().locate("e1").as_deref(), Some("x"));
        assert_eq!(backend.calls(), vec!["get p1", "update p1 e1"]);
    }

    #[tokio::test]
    async fn drop_moves_dragged_endpoint() {
        let backend = MemoryBackend::new(vec![endpoint("e1", ""), endpoint("e2", "b")], vec![]);
        let mut session = ProjectSession::new(backend.clone(), "p1");
        session.reload().await.unwrap();

        assert!(!session.drop_dragged("b").await.unwrap());

        session.drag().begin("e1");
        assert!(session.drop_dragged("b").await.unwrap());
        assert_eq!(ids(&session.tree().get("b").unwrap().items), vec!["e1", "e2"]);
        assert!(!session.drag().is_active());
    }

    #[tokio::test]
    async fn drop_without_project_id_is_noop() {
        let backend = MemoryBackend::new(vec![endpoint("e1", "")], vec![]);
        let mut session = ProjectSession::new(backend.clone(), "");
        session.drag().begin("e1");
        assert!(!session.drop_dragged("b").await.unwrap());
        assert!(!session.drag().is_active());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn generation_marks_new_bucket() {
        let old = vec![
            test_case("old1", "2024-01-01T00:00:00Z"),
            test_case("old2", "2024-02-01T00:00:00Z"),
        ];
        let backend = MemoryBackend::new(vec![endpoint("e1", "")], old);
        let mut session = ProjectSession::new(backend.clone(), "p1");
        session.reload().await.unwrap();

        assert_eq!(session.generate_test_cases(3).await.unwrap(), 3);

        let partition = session.partition();
        assert_eq!(partition.bucket(Bucket::New).len(), 3);
        let previous: Vec<&str> = partition.previous.iter().map(|case| case.id.as_str()).collect();
        assert_eq!(previous, vec!["old2", "old1"]);

        session.forget_generated();
        assert!(session.partition().new.is_empty());
        assert_eq!(session.partition().previous.len(), 5);
    }

    #[tokio::test]
    async fn generation_count_is_clamped() {
        let backend = MemoryBackend::new(vec![], vec![]);
        let mut session = ProjectSession::new(backend.clone(), "p1");
        assert_eq!(session.generate_test_cases(50).await.unwrap(), 20);
        assert_eq!(session.generate_test_cases(0).await.unwrap(), 1);
        assert_eq!(backend.calls()[0], "generate p1 20");
    }

    #[tokio::test]
    async fn failed_generation_keeps_previous_marks() {
        let backend = MemoryBackend::new(vec![], vec![]).failing();
        let mut session = ProjectSession::new(backend.clone(), "p1");
        assert!(session.generate_test_cases(2).await.is_err());
        assert!(session.recently_generated().is_empty());
        assert!(session.project().is_none());
    }

    #[tokio::test]
    async fn deletes_reload_the_project() {
        let backend = MemoryBackend::new(
            vec![endpoint("e1", "solo"), endpoint("e2", "")],
            vec![test_case("t1", "2024-01-01T00:00:00Z")],
        );
        let mut session = ProjectSession::new(backend.clone(), "p1");
        session.reload().await.unwrap();

        session.delete_endpoint("e1").await.unwrap();
        assert!(session.tree().get("solo").is_none());

        session.delete_test_case("t1").await.unwrap();
        assert!(session.project().unwrap().test_cases.is_empty());
        assert_eq!(
            backend.calls(),
            vec!["get p1", "delete-endpoint p1 e1", "get p1", "delete-test p1 t1", "get p1"]
        );
    }

    #[test]
    fn unloaded_session_has_empty_views() {
        let backend = MemoryBackend::new(vec![endpoint("e1", "")], vec![]);
        let session = ProjectSession::new(backend.clone(), "p1");
        assert!(session.tree().is_empty());
        assert_eq!(session.partition().total_pages(Bucket::Previous), 1);
    }
}
