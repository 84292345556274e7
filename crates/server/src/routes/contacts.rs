use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use service::contact::domain::ContactWithPhones;
use service::errors::ServiceError;
use service::export::DOWNLOAD_NAME;
use service::imaging::ImageError;
use tracing::info;
use utoipa::IntoParams;

use crate::errors::JsonApiError;
use crate::extract::{ContactForm, ContactId};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Substring matched against names and phone numbers, case-insensitive
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
    pub contact: models::contact::Model,
}

/// Count photo uploads by outcome. Only requests that carried a photo count.
fn record_image<T>(had_image: bool, res: &Result<T, ServiceError>) {
    if !had_image {
        return;
    }
    match res {
        Ok(_) => metrics::IMAGE_UPLOADS_TOTAL.inc(),
        Err(ServiceError::Image(ImageError::Upload(_) | ImageError::Config(_))) => metrics::IMAGE_UPLOAD_FAILURES_TOTAL.inc(),
        Err(_) => {}
    }
}

#[utoipa::path(
    post, path = "/contacts", tag = "contacts",
    request_body(content = crate::openapi::ContactFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = crate::openapi::ContactDoc),
        (status = 400, description = "Validation Error"),
        (status = 500, description = "Create Failed")
    )
)]
pub async fn create(State(state): State<AppState>, form: ContactForm) -> Result<(StatusCode, Json<ContactWithPhones>), JsonApiError> {
    let had_image = form.has_image();
    let res = state.contacts.create(form.0).await;
    record_image(had_image, &res);
    let created = res?;
    metrics::CONTACTS_CREATED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/contacts", tag = "contacts",
    responses(
        (status = 200, description = "List OK", body = [crate::openapi::ContactDoc]),
        (status = 500, description = "List Failed")
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ContactWithPhones>>, JsonApiError> {
    let all = state.contacts.list().await?;
    info!(count = all.len(), "list contacts");
    Ok(Json(all))
}

#[utoipa::path(
    get, path = "/contacts/search", tag = "contacts",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching contacts", body = [crate::openapi::ContactDoc]),
        (status = 500, description = "Search Failed")
    )
)]
pub async fn search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Result<Json<Vec<ContactWithPhones>>, JsonApiError> {
    let found = state.contacts.search(q.query.as_deref().unwrap_or_default()).await?;
    Ok(Json(found))
}

#[utoipa::path(
    get, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Found", body = crate::openapi::ContactDoc),
        (status = 404, description = "Contact not found")
    )
)]
pub async fn get(State(state): State<AppState>, ContactId(id): ContactId) -> Result<Json<ContactWithPhones>, JsonApiError> {
    match state.contacts.get(id).await? {
        Some(c) => Ok(Json(c)),
        None => Err(JsonApiError::not_found()),
    }
}

#[utoipa::path(
    put, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    request_body(content = crate::openapi::ContactFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::UpdateResponseDoc),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Contact not found"),
        (status = 500, description = "Update Failed")
    )
)]
pub async fn update(State(state): State<AppState>, ContactId(id): ContactId, form: ContactForm) -> Result<Json<UpdateResponse>, JsonApiError> {
    let had_image = form.has_image();
    let res = state.contacts.update(id, form.0).await;
    record_image(had_image, &res);
    let contact = res?;
    metrics::CONTACTS_UPDATED_TOTAL.inc();
    Ok(Json(UpdateResponse { message: "Contact updated successfully", contact }))
}

#[utoipa::path(
    delete, path = "/contacts/{id}", tag = "contacts",
    params(("id" = i32, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Contact not found"),
        (status = 500, description = "Delete Failed")
    )
)]
pub async fn delete(State(state): State<AppState>, ContactId(id): ContactId) -> Result<StatusCode, JsonApiError> {
    match state.contacts.delete(id).await? {
        Some(_) => {
            metrics::CONTACTS_DELETED_TOTAL.inc();
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(JsonApiError::not_found()),
    }
}

#[utoipa::path(
    get, path = "/contacts/export/contacts", tag = "contacts",
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv", body = String),
        (status = 500, description = "Export Failed")
    )
)]
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, JsonApiError> {
    let exported = state.contacts.export_csv().await?;
    metrics::EXPORTS_TOTAL.inc();
    let disposition = format!("attachment; filename=\"{DOWNLOAD_NAME}\"");
    Ok((
        [(header::CONTENT_TYPE, "text/csv".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        exported.bytes,
    ))
}
