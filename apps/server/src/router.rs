use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use whub::domain::constants::ACTOR_HEADER;
use whub::kernel::server::ApiState;

#[derive(OpenApi)]
#[openapi(info(title = "WellnessHub API", description = "Wellness marketplace back office"))]
struct ApiDoc;

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origins)?;
    let api = ApiDoc::openapi();

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(api)
        .merge(whub::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    // Create the Scalar UI routes
    let scalar_routes = Scalar::with_url("/api", api_doc);

    Ok(Router::new().merge(openapi_routes).merge(scalar_routes).layer(cors))
}

/// Any origin when none are configured, otherwise exactly the configured ones.
pub(crate) fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let allowed = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim())
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_must_be_header_values() {
        assert!(cors_layer(&[]).is_ok());
        assert!(cors_layer(&["https://admin.prana.mx".to_owned()]).is_ok());
        assert!(cors_layer(&["https://bad\norigin".to_owned()]).is_err());
    }
}
