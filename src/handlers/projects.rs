// handlers/projects.rs - POST /api/projects, PUT /api/projects/:id

use axum::extract::{Multipart, Path, State};
use uuid::Uuid;

use super::catalog::{self, category_error, required, Catalog};
use crate::database::models::{CabinetCategory, Project};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::{image_objects, read_form, PROJECT_FORM};

pub async fn create(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Project> {
    let mut form = read_form(multipart, &PROJECT_FORM).await?;

    let name = required(&form, "name")?.to_string();
    let description = required(&form, "description")?.to_string();
    let location = required(&form, "location")?.to_string();
    let category = required(&form, "category")?
        .parse::<CabinetCategory>()
        .map_err(category_error)?;

    let images = state
        .uploads
        .store_images(form.take_files("images"), Project::FOLDER)
        .await?;
    let uploaded = image_objects(&images).collect();

    let project = Project {
        id: Uuid::new_v4(),
        name,
        description,
        location,
        category,
        images,
    };
    let project = catalog::commit_create(&state, project, uploaded).await?;
    Ok(ApiResponse::created(project))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Project> {
    let id = catalog::parse_id::<Project>(&id)?;
    let mut form = read_form(multipart, &PROJECT_FORM).await?;

    let category = form
        .text("category")
        .map(|c| c.parse::<CabinetCategory>().map_err(category_error))
        .transpose()?;

    let mut project: Project = catalog::load(&state, id).await?;
    for (field, target) in [
        ("name", &mut project.name),
        ("description", &mut project.description),
        ("location", &mut project.location),
    ] {
        if let Some(value) = form.text(field) {
            *target = value.to_string();
        }
    }
    if let Some(category) = category {
        project.category = category;
    }

    let mut uploaded = Vec::new();
    let mut replaced = Vec::new();
    if form.has_files("images") {
        let images = state
            .uploads
            .store_images(form.take_files("images"), Project::FOLDER)
            .await?;
        uploaded = image_objects(&images).collect();
        replaced = image_objects(&project.images).collect();
        project.images = images;
    }

    let project = catalog::commit_update(&state, project, uploaded, replaced).await?;
    Ok(ApiResponse::success(project))
}
