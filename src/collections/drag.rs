use log::debug;

/// A move produced by dropping a dragged endpoint onto a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub project_id: String,
    pub endpoint_id: String,
    pub folder_path: String,
}

/// Drag-and-drop state owned by the caller.
///
/// Dragging an endpoint records its id; dropping it onto a folder turns the
/// recorded id into a [`MoveRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragSession {
    source: Option<String>,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, endpoint_id: impl Into<String>) {
        self.source = Some(endpoint_id.into());
    }

    pub fn cancel(&mut self) {
        self.source = None;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Whether a folder should accept a drop right now.
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Ends the drag on `folder_path`. The drag source is cleared either way;
    /// without a source or a project id nothing is moved.
    pub fn drop_on(&mut self, folder_path: &str, project_id: Option<&str>) -> Option<MoveRequest> {
        let endpoint_id = self.source.take()?;
        let Some(project_id) = project_id else {
            debug!("dropped {endpoint_id} without a project; ignoring");
            return None;
        };
        Some(MoveRequest {
            project_id: project_id.to_string(),
            endpoint_id,
            folder_path: folder_path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_after_drag_produces_move() {
        let mut drag = DragSession::new();
        drag.begin("e1");
        assert!(drag.is_active());

        let request = drag.drop_on("y/z", Some("p1")).unwrap();
        assert_eq!(
            request,
            MoveRequest {
                project_id: "p1".into(),
                endpoint_id: "e1".into(),
                folder_path: "y/z".into(),
            }
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn drop_without_drag_is_noop() {
        let mut drag = DragSession::new();
        assert_eq!(drag.drop_on("a", Some("p1")), None);
    }

    #[test]
    fn drop_without_project_is_noop_and_clears() {
        let mut drag = DragSession::new();
        drag.begin("e1");
        assert_eq!(drag.drop_on("a", None), None);
        assert_eq!(drag.source(), None);
    }

    #[test]
    fn cancel_clears_source() {
        let mut drag = DragSession::new();
        drag.begin("e1");
        drag.begin("e2");
        assert_eq!(drag.source(), Some("e2"));
        drag.cancel();
        assert_eq!(drag.drop_on("a", Some("p1")), None);
    }
}
