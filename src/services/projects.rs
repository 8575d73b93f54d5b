//! `/api/v1/projects`

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fanout;
use crate::models::{NewProject, Project, User};
use crate::tags::TagLookup;
use crate::wizard::ProjectGateway;

#[derive(Clone)]
pub struct ProjectService {
    client: ApiClient,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagQuery<'a> {
    project_tag: &'a str,
}

/// Text fields of the project form, using the names the backend binds
pub fn project_form_fields(project: &NewProject) -> Vec<(String, String)> {
    let mut fields = vec![
        ("name".to_string(), project.name.clone()),
        ("projectTag".to_string(), project.project_tag.clone()),
        ("projectType".to_string(), project.project_type.as_str().to_string()),
    ];
    let optional = [
        ("description", project.description.clone()),
        ("repositoryLink", project.repository_link.clone()),
        ("deadlineDate", project.deadline_date.map(|d| d.format("%Y-%m-%d").to_string())),
        ("status", project.status.clone()),
        ("priority", project.priority.clone()),
        ("parentProject.id", project.parent_project_id.map(|id| id.to_string())),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            fields.push((name.to_string(), value));
        }
    }
    for (i, tech) in project.technologies.iter().enumerate() {
        fields.push((format!("technologiesArray[{}]", i), tech.clone()));
    }
    for (i, tag) in project.tags.iter().enumerate() {
        fields.push((format!("tags[{}]", i), tag.clone()));
    }
    fields
}

fn project_form(project: &NewProject) -> ApiResult<Form> {
    let mut form = Form::new();
    for (name, value) in project_form_fields(project) {
        form = form.text(name, value);
    }
    if let Some(logo) = &project.logo {
        let part = Part::bytes(logo.bytes.clone())
            .file_name(logo.file_name.clone())
            .mime_str(&logo.mime)?;
        form = form.part("logo", part);
    }
    Ok(form)
}

impl ProjectService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Project>> {
        self.client.get("/projects").await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Project> {
        self.client.get(&format!("/projects/{}", id)).await
    }

    /// Microservices of a package
    pub async fn sub_projects(&self, package_id: i64) -> ApiResult<Vec<Project>> {
        self.client
            .get(&format!("/projects/{}/sub-projects", package_id))
            .await
    }

    pub async fn create(&self, project: &NewProject) -> ApiResult<Project> {
        self.client
            .post_multipart("/projects", project_form(project)?)
            .await
    }

    pub async fn update(&self, id: i64, project: &NewProject) -> ApiResult<Project> {
        self.client
            .put_multipart(&format!("/projects/{}", id), project_form(project)?)
            .await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.delete(&format!("/projects/{}", id)).await
    }

    pub async fn tag_exists(&self, tag: &str) -> ApiResult<bool> {
        self.client
            .get_query("/projects/tag-exists", &TagQuery { project_tag: tag })
            .await
    }

    pub async fn members(&self, project_id: i64) -> ApiResult<Vec<User>> {
        self.client
            .get(&format!("/projects/{}/members", project_id))
            .await
    }

    pub async fn is_member(&self, project_id: i64, user_id: i64) -> ApiResult<bool> {
        self.client
            .get(&format!("/projects/{}/members/{}/exists", project_id, user_id))
            .await
    }

    pub async fn add_member(&self, project_id: i64, user_id: i64) -> ApiResult<()> {
        self.client
            .put_empty(&format!("/projects/{}/members/{}", project_id, user_id))
            .await
    }

    /// Membership of a user in every microservice of a package
    pub async fn package_membership(
        &self,
        package_id: i64,
        user_id: i64,
        concurrency: usize,
    ) -> ApiResult<Vec<(Project, bool)>> {
        let subs = self.sub_projects(package_id).await?;
        fanout::try_bounded(subs, concurrency, |project| async move {
            let member = self.is_member(project.id, user_id).await?;
            Ok::<_, ApiError>((project, member))
        })
        .await
    }
}

impl TagLookup for ProjectService {
    async fn tag_exists(&self, tag: &str) -> ApiResult<bool> {
        ProjectService::tag_exists(self, tag).await
    }
}

impl ProjectGateway for ProjectService {
    async fn create_project(&self, project: &NewProject) -> ApiResult<Project> {
        self.create(project).await
    }

    async fn delete_project(&self, id: i64) -> ApiResult<()> {
        self.delete(id).await
    }
}
