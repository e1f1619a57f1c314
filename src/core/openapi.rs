use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::assistant::{dtos as assistant_dtos, handlers as assistant_handlers};
use crate::features::auth;
use crate::features::threads::{dtos as threads_dtos, handlers as threads_handlers};
use crate::modules::storage::{SortOrder, ThreadOrderBy};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Threads
        threads_handlers::thread_handler::create_thread,
        threads_handlers::thread_handler::list_threads,
        threads_handlers::thread_handler::get_thread,
        threads_handlers::thread_handler::update_thread,
        threads_handlers::thread_handler::delete_thread,
        // Assistant
        assistant_handlers::chat_handler::chat_stream,
        assistant_handlers::chat_handler::chat_sync,
        assistant_handlers::rate_limit_handler::rate_limit_status,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::UserContext,
            // Threads
            SortOrder,
            ThreadOrderBy,
            threads_dtos::CreateThreadDto,
            threads_dtos::UpdateThreadDto,
            threads_dtos::ThreadResponseDto,
            ApiResponse<threads_dtos::ThreadResponseDto>,
            ApiResponse<Vec<threads_dtos::ThreadResponseDto>>,
            // Assistant
            assistant_dtos::ChatRequestDto,
            assistant_dtos::ChatResponseDto,
            assistant_dtos::RateLimitStatusDto,
            ApiResponse<assistant_dtos::ChatResponseDto>,
            ApiResponse<assistant_dtos::RateLimitStatusDto>,
        )
    ),
    tags(
        (name = "threads", description = "Multi-tenant conversation threads"),
        (name = "assistant", description = "Assistant chat pass-through and rate limits"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Spindle API",
        version = "0.1.0",
        description = "API documentation for Spindle",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
