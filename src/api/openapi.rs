//! OpenAPI documentation and schema generation
//!
//! The document is generated at compile time with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the zip-collector REST API
///
/// Served at `/openapi.json`, and through Swagger UI at `/swagger-ui` when
/// enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zip-collector REST API",
        version = "0.1.0",
        description = "Collect remote file URLs into tasks and download them as a single ZIP archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::add_references,
        crate::api::routes::task_status,
        crate::api::routes::drop_task,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::JobState,
        crate::types::AddedReference,
        crate::types::RejectedReference,
        crate::types::AddReport,
        crate::types::Event,

        crate::config::Config,
        crate::config::TaskConfig,
        crate::config::FetchConfig,
        crate::config::ApiConfig,

        crate::api::routes::TaskQuery,
        crate::api::routes::AddQuery,
        crate::api::routes::CreateTaskResponse,
        crate::api::routes::StatusResponse,
        crate::api::routes::HealthResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Collection tasks - Create, add URLs, poll for the archive, drop"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
