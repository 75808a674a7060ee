use axum::{
    Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::team_member::TeamMember;
use deployment::Deployment;
use services::services::{
    team::{NewTeamMember, TeamError},
    upload::UploadError,
};
use utils_core::response::MessageResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, routes::upload::read_image};

pub async fn list_team(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<Vec<TeamMember>>, ApiError> {
    let members = deployment
        .team()
        .list(&deployment.db().pool)
        .await
        .map_err(|err| ApiError::from(err).context("Error fetching team members"))?;
    Ok(ResponseJson(members))
}

pub async fn upload_team_member(
    State(deployment): State<DeploymentImpl>,
    mut multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<TeamMember>), ApiError> {
    let policy = *deployment.upload_policy();
    let mut form = NewTeamMember::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("name") => form.name = Some(field.text().await?),
            Some("role") => form.role = Some(field.text().await?),
            Some("image") => {
                let Some(file) = read_image(field, &policy).await? else {
                    continue;
                };
                if form.image.is_some() {
                    return Err(UploadError::DuplicateFile("image").into());
                }
                form.image = Some(file);
            }
            _ => {}
        }
    }

    let member = deployment
        .team()
        .create(&deployment.db().pool, form)
        .await
        .map_err(|err| ApiError::from(err).context("Error adding team member"))?;
    Ok((StatusCode::CREATED, ResponseJson(member)))
}

pub async fn delete_team_member(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| TeamError::NotFound)?;
    deployment
        .team()
        .delete(&deployment.db().pool, id)
        .await
        .map_err(|err| ApiError::from(err).context("Error deleting team member"))?;
    Ok(ResponseJson(MessageResponse::new("Team member deleted")))
}

pub fn public_router() -> Router<DeploymentImpl> {
    Router::new().route("/team", get(list_team))
}

pub fn admin_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/uploadteam", post(upload_team_member))
        .route("/team/{id}", delete(delete_team_member))
}
