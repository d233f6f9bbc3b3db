use tracing::{info, instrument};

use crate::api::TrainingApi;
use crate::error::{Error, Result};
use crate::models::{Domain, Project, Tag, OBJECT_DETECTION};

/// Pick the domain whose type is exactly `domain_type`.
pub fn find_domain<'a>(domains: &'a [Domain], domain_type: &str) -> Result<&'a Domain> {
    domains
        .iter()
        .find(|d| d.domain_type == domain_type)
        .ok_or_else(|| Error::DomainNotFound(domain_type.to_string()))
}

/// Create a fresh object detection project. Never reuses an existing one.
#[instrument(skip(api))]
pub async fn create_project<T>(api: &T, name: &str) -> Result<Project>
where
    T: TrainingApi + ?Sized,
{
    let domains = api.get_domains().await?;
    let domain = find_domain(&domains, OBJECT_DETECTION)?;
    info!(domain_id = %domain.id, domain_name = %domain.name, "using object detection domain");

    let project = api.create_project(name, &domain.id).await?;
    info!(project_id = %project.id, "project created");
    Ok(project)
}

/// Create `names` as tags of `project_id`, one after the other.
#[instrument(skip(api, names))]
pub async fn create_tags<'a, T, I>(api: &T, project_id: &str, names: I) -> Result<Vec<Tag>>
where
    T: TrainingApi + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut tags = Vec::new();
    for name in names {
        let tag = api.create_tag(project_id, name).await?;
        info!(tag_id = %tag.id, tag = %tag.name, "tag created");
        tags.push(tag);
    }
    Ok(tags)
}
