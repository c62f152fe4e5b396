use utoipa::OpenApi;

/// OpenAPI document for the gateway's JSON surface. The notification
/// endpoint is excluded: its contract is the provider's form POST, not
/// a JSON API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "worldpay-gateway",
        description = "Offsite (hosted payment page) Worldpay redirect gateway"
    ),
    paths(crate::handlers::checkout::build_worldpay_redirect),
    components(schemas(
        crate::ApiResponse<crate::services::checkout::RedirectPayload>,
        crate::services::checkout::RedirectPayload,
        crate::services::checkout::FormField,
        crate::errors::ErrorResponse,
    )),
    tags((name = "Checkout", description = "Redirect-request construction"))
)]
pub struct ApiDoc;
