use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::schema::SchemaValidator;
use crate::errors::{WorkflowError, WorkflowResult};
use crate::fs::{DocumentStore, WorkDir};
use crate::models::Project;

/// Loads and saves the single project document, validating both ways.
#[derive(Clone)]
pub struct ProjectStore {
    documents: Rc<dyn DocumentStore>,
    validator: Rc<dyn SchemaValidator>,
    project_dir: PathBuf,
    state_path: PathBuf,
}

impl ProjectStore {
    pub fn new(
        documents: Rc<dyn DocumentStore>,
        validator: Rc<dyn SchemaValidator>,
        project_dir: impl Into<PathBuf>,
    ) -> Self {
        let project_dir = project_dir.into();
        let state_path = project_dir.join("state.yaml");
        Self {
            documents,
            validator,
            project_dir,
            state_path,
        }
    }

    pub fn for_work_dir(
        documents: Rc<dyn DocumentStore>,
        validator: Rc<dyn SchemaValidator>,
        work_dir: &WorkDir,
    ) -> Self {
        Self::new(documents, validator, work_dir.project_dir())
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn exists(&self) -> bool {
        self.documents.exists(&self.state_path)
    }

    pub fn load(&self) -> WorkflowResult<Project> {
        if !self.exists() {
            return Err(WorkflowError::NoProject);
        }
        let bytes = self
            .documents
            .read(&self.state_path)
            .map_err(|e| WorkflowError::external("load project", e))?;
        self.validator
            .validate(&bytes)
            .map_err(|e| WorkflowError::external("validate project", e))?;
        serde_yaml::from_slice(&bytes)
            .map_err(|e| WorkflowError::external("load project", anyhow!(e)))
    }

    /// Serialize, validate and atomically replace the document.
    pub fn save(&self, project: &Project) -> WorkflowResult<()> {
        let yaml = serde_yaml::to_string(project)
            .map_err(|e| WorkflowError::external("save project", anyhow!(e)))?;
        self.validator
            .validate(yaml.as_bytes())
            .map_err(|e| WorkflowError::external("validate project", e))?;
        self.documents
            .write(&self.state_path, yaml.as_bytes())
            .map_err(|e| WorkflowError::external("save project", e))
    }

    /// Remove the whole project tree.
    pub fn delete(&self) -> WorkflowResult<()> {
        self.documents
            .delete_tree(&self.project_dir)
            .map_err(|e| WorkflowError::external("delete project", e))
    }
}

impl std::fmt::Debug for ProjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectStore")
            .field("state_path", &self.state_path)
            .finish()
    }
}
