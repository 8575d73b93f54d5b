//! Add-project wizard
//!
//! Architecture → Details → Microservices. A microservice package is created
//! as soon as the details step is confirmed; its id is then reused for every
//! microservice added in the same session.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{NewProject, Project, ProjectType};

/// Project persistence used by the wizard; implemented by the project service
pub trait ProjectGateway {
    fn create_project(&self, project: &NewProject) -> impl Future<Output = ApiResult<Project>> + Send;
    fn delete_project(&self, id: i64) -> impl Future<Output = ApiResult<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Monolithic,
    Microservices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Architecture,
    Details,
    Microservices,
    Finished,
}

/// A microservice not yet saved
#[derive(Debug, Clone, PartialEq)]
pub struct MicroserviceDraft {
    pub name: String,
    pub project_tag: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub repository_link: Option<String>,
}

impl MicroserviceDraft {
    pub fn new(name: impl Into<String>, project_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_tag: project_tag.into(),
            description: None,
            technologies: Vec::new(),
            repository_link: None,
        }
    }

    fn to_new_project(&self, package_id: i64) -> NewProject {
        let mut project = NewProject::new(&self.name, &self.project_tag, ProjectType::Microservices);
        project.description = self.description.clone();
        project.technologies = self.technologies.clone();
        project.repository_link = self.repository_link.clone();
        project.parent_project_id = Some(package_id);
        project
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("expected step {expected:?}, wizard is at {actual:?}")]
    WrongStep {
        expected: WizardStep,
        actual: WizardStep,
    },

    #[error("{0}")]
    Invalid(String),
}

pub type WizardResult<T> = Result<T, WizardError>;

#[derive(Debug)]
pub struct ProjectWizard {
    step: WizardStep,
    architecture: Option<Architecture>,
    details: Option<NewProject>,
    /// Monolith or package, once saved
    project: Option<Project>,
    pending: Vec<MicroserviceDraft>,
    created: Vec<Project>,
}

impl Default for ProjectWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Architecture,
            architecture: None,
            details: None,
            project: None,
            pending: Vec::new(),
            created: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Id of the saved package, if any
    pub fn package_id(&self) -> Option<i64> {
        self.project
            .as_ref()
            .filter(|p| p.is_package())
            .map(|p| p.id)
    }

    pub fn pending(&self) -> &[MicroserviceDraft] {
        &self.pending
    }

    pub fn created(&self) -> &[Project] {
        &self.created
    }

    fn expect_step(&self, expected: WizardStep) -> WizardResult<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    pub fn choose_architecture(&mut self, architecture: Architecture) -> WizardResult<()> {
        self.expect_step(WizardStep::Architecture)?;
        if self.project.is_some() && self.architecture != Some(architecture) {
            return Err(WizardError::Invalid(
                "architecture cannot change once the project is saved".to_string(),
            ));
        }
        self.architecture = Some(architecture);
        Ok(())
    }

    /// Details can only change until the project is saved
    pub fn set_details(&mut self, details: NewProject) -> WizardResult<()> {
        self.expect_step(WizardStep::Details)?;
        if let Some(saved) = &self.project {
            return Err(WizardError::Invalid(format!(
                "project '{}' is already saved; edit it from the project page",
                saved.name
            )));
        }
        if details.name.trim().is_empty() || details.project_tag.trim().is_empty() {
            return Err(WizardError::Invalid("name and project tag are required".to_string()));
        }
        self.details = Some(details);
        Ok(())
    }

    /// Advance one step, saving whatever the current step owns
    pub async fn next<G: ProjectGateway>(&mut self, gateway: &G) -> WizardResult<WizardStep> {
        self.step = match self.step {
            WizardStep::Architecture => {
                if self.architecture.is_none() {
                    return Err(WizardError::Invalid("choose an architecture first".to_string()));
                }
                WizardStep::Details
            }
            WizardStep::Details => self.save_details(gateway).await?,
            WizardStep::Microservices => {
                self.submit(gateway).await?;
                WizardStep::Finished
            }
            WizardStep::Finished => WizardStep::Finished,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Details => WizardStep::Architecture,
            WizardStep::Microservices => WizardStep::Details,
            other => other,
        };
        self.step
    }

    async fn save_details<G: ProjectGateway>(&mut self, gateway: &G) -> WizardResult<WizardStep> {
        let architecture = self
            .architecture
            .ok_or_else(|| WizardError::Invalid("choose an architecture first".to_string()))?;
        let mut details = self
            .details
            .clone()
            .ok_or_else(|| WizardError::Invalid("fill in the project details".to_string()))?;

        if let Some(existing) = &self.project {
            debug!(project_id = existing.id, "Project already saved, reusing it");
        } else {
            details.project_type = match architecture {
                Architecture::Monolithic => ProjectType::Monolithic,
                Architecture::Microservices => ProjectType::MicroservicesPackage,
            };
            details.parent_project_id = None;
            let saved = gateway.create_project(&details).await?;
            info!(project_id = saved.id, kind = saved.project_type.as_str(), "Project created");
            self.project = Some(saved);
        }

        Ok(match architecture {
            Architecture::Monolithic => WizardStep::Finished,
            Architecture::Microservices => WizardStep::Microservices,
        })
    }

    pub fn add_microservice(&mut self, draft: MicroserviceDraft) -> WizardResult<()> {
        self.expect_step(WizardStep::Microservices)?;
        if draft.name.trim().is_empty() || draft.project_tag.trim().is_empty() {
            return Err(WizardError::Invalid(
                "microservice name and tag are required".to_string(),
            ));
        }
        let tag_in_use = self
            .pending
            .iter()
            .any(|d| d.project_tag.eq_ignore_ascii_case(&draft.project_tag))
            || self.created.iter().any(|p| {
                p.project_tag
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(&draft.project_tag))
            });
        if tag_in_use {
            return Err(WizardError::Invalid(format!(
                "tag '{}' is already used in this package",
                draft.project_tag
            )));
        }
        self.pending.push(draft);
        Ok(())
    }

    /// Drop a microservice by tag; saved ones are deleted on the backend
    pub async fn remove_microservice<G: ProjectGateway>(
        &mut self,
        project_tag: &str,
        gateway: &G,
    ) -> WizardResult<()> {
        if let Some(pos) = self
            .pending
            .iter()
            .position(|d| d.project_tag.eq_ignore_ascii_case(project_tag))
        {
            self.pending.remove(pos);
            return Ok(());
        }

        let pos = self
            .created
            .iter()
            .position(|p| {
                p.project_tag
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case(project_tag))
            })
            .ok_or_else(|| WizardError::Invalid(format!("no microservice tagged '{}'", project_tag)))?;

        gateway.delete_project(self.created[pos].id).await?;
        let removed = self.created.remove(pos);
        info!(project_id = removed.id, "Microservice deleted");
        Ok(())
    }

    /// Save every pending microservice under the package
    ///
    /// On failure the drafts not yet saved stay pending, so a retry never
    /// duplicates the ones that went through.
    pub async fn submit<G: ProjectGateway>(&mut self, gateway: &G) -> WizardResult<&[Project]> {
        self.expect_step(WizardStep::Microservices)?;
        let package_id = self
            .package_id()
            .ok_or_else(|| WizardError::Invalid("package has not been saved".to_string()))?;
        if self.pending.is_empty() && self.created.is_empty() {
            return Err(WizardError::Invalid("add at least one microservice".to_string()));
        }

        while let Some(draft) = self.pending.first() {
            let saved = gateway.create_project(&draft.to_new_project(package_id)).await?;
            info!(project_id = saved.id, package_id, "Microservice created");
            self.pending.remove(0);
            self.created.push(saved);
        }

        self.step = WizardStep::Finished;
        Ok(&self.created)
    }
}
