use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumberDoc {
    pub id: i32,
    pub number: String,
    pub contact_id: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDoc {
    pub id: i32,
    pub name: String,
    /// Public URL of the optimized photo
    pub image: Option<String>,
    pub phone_numbers: Vec<PhoneNumberDoc>,
}

/// Contact header row as returned by update (no phone numbers)
#[derive(ToSchema)]
pub struct ContactHeaderDoc {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
}

#[derive(ToSchema)]
pub struct UpdateResponseDoc {
    pub message: String,
    pub contact: ContactHeaderDoc,
}

/// Multipart form for create/update. `phoneNumbers` is JSON text such as
/// `["1234567890","0987654321"]`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormDoc {
    pub name: Option<String>,
    pub phone_numbers: Option<String>,
    #[schema(format = Binary)]
    pub image: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::contacts::create,
        crate::routes::contacts::list,
        crate::routes::contacts::search,
        crate::routes::contacts::get,
        crate::routes::contacts::update,
        crate::routes::contacts::delete,
        crate::routes::contacts::export,
    ),
    components(
        schemas(
            HealthResponse,
            PhoneNumberDoc,
            ContactDoc,
            ContactHeaderDoc,
            UpdateResponseDoc,
            ContactFormDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "contacts")
    )
)]
pub struct ApiDoc;
