use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.2.0",
        description = "Resilient multi-source document retrieval with async job tracking."
    ),
    paths(
        crate::routes::create_retrieval,
        crate::routes::get_job,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CreateRetrievalRequest,
        crate::dto::CreateRetrievalResponse,
        crate::dto::JobResponse,
        crate::dto::ProgressResponse,
        crate::dto::JobResultResponse,
        crate::dto::SummaryResponse,
        crate::dto::TargetOutcomeResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "retrievals", description = "Retrieval job submission"),
        (name = "jobs", description = "Job status polling"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "API key. Set via FOLIO_SERVER_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
