use actix_cors::Cors;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, Responder, ResponseError, Result, post, web};
use tracing_subscriber::fmt;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use chat_to_products::catalog::{Product, RecommendRequest, RecommendResponse};
use chat_to_products::config::RelayConfig;
use chat_to_products::error::{ApiError, ErrorResponse};
use chat_to_products::processor::process_recommendation;
use chat_to_products::upstream::GeminiClient;

#[utoipa::path(
    post,
    path = "/",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Recommendation reply and/or matched products", body = RecommendResponse),
        (status = 400, description = "Missing or malformed message/context", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Model provider failure", body = ErrorResponse)
    )
)]
#[post("/")]
async fn recommend(
    body: web::Bytes,
    upstream: web::Data<GeminiClient>,
) -> Result<impl Responder, ApiError> {
    let request_id = uuid::Uuid::new_v4();

    let request: RecommendRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Message and product context are required: {e}")))?;
    request.validate()?;

    tracing::info!(%request_id, products = request.context.len(), "processing recommendation request");

    let response = process_recommendation(&request, upstream.get_ref()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Everything that is not `POST /`: preflight-less OPTIONS gets its 204,
/// anything else is 405.
async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == actix_web::http::Method::OPTIONS {
        HttpResponse::NoContent().finish()
    } else {
        ApiError::MethodNotAllowed.error_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(recommend),
    components(schemas(RecommendRequest, RecommendResponse, Product, ErrorResponse))
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    fmt().with_max_level(tracing::Level::INFO).init();
    dotenvy::dotenv().ok();

    let config = RelayConfig::from_env();
    let client = web::Data::new(GeminiClient::from_config(&config));
    let allowed_origin = config.allowed_origin.clone();

    tracing::info!(
        model = %config.model,
        origin = %allowed_origin,
        "Starting server at http://localhost:8080/swagger-ui/"
    );

    HttpServer::new(move || {
        let cors = if allowed_origin == "*" {
            Cors::default().allow_any_origin().send_wildcard()
        } else {
            Cors::default().allowed_origin(&allowed_origin)
        }
        .allowed_methods(vec!["POST", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .app_data(client.clone())
            .service(recommend)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .default_service(web::route().to(fallback))
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
