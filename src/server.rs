use std::net::SocketAddr;

use anyhow::Result;
use askama::Template;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::models::{ChatRequest, HealthResponse};
use crate::response::StructuredResponse;

const MISSING_MESSAGE: &str = "메시지가 필요합니다.";

#[derive(Clone)]
struct AppState {
    chat: ChatService,
}

pub fn router(config: &AppConfig, chat_service: ChatService) -> Router {
    let state = AppState { chat: chat_service };

    Router::new()
        .route("/", get(index_page))
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: AppConfig, chat_service: ChatService) -> Result<()> {
    let app = router(&config, chat_service);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let buildings = state
        .chat
        .dataset()
        .map(|dataset| dataset.buildings.iter().map(|b| b.name.clone()).collect())
        .unwrap_or_default();

    let template = IndexTemplate { buildings };
    let body = template.render().map_err(ApiError::from)?;

    Ok(Html(body))
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("unreadable chat request: {}", rejection.body_text());
            return ApiError::bad_request(MISSING_MESSAGE).into_response();
        }
    };
    let Some(question) = request.question() else {
        return ApiError::bad_request(MISSING_MESSAGE).into_response();
    };

    match state.chat.answer(question).await {
        Ok(answer) => Json(answer).into_response(),
        Err(err) => {
            tracing::error!("chat request failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StructuredResponse::failure()),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let dataset = state.chat.dataset();
    Json(HealthResponse {
        status: "ok".to_string(),
        dataset_loaded: dataset.is_some(),
        buildings: dataset.map(|d| d.buildings.len()).unwrap_or(0),
    })
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    buildings: Vec<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(value: askama::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use serde_json::{json, Value};

    use super::*;
    use crate::chat::tests::{sample_dataset, service, StubModel};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn state(model: StubModel) -> AppState {
        AppState {
            chat: service(Arc::new(model), Some(sample_dataset())),
        }
    }

    async fn extract(body: &'static str) -> Result<Json<ChatRequest>, JsonRejection> {
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        Json::<ChatRequest>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn null_message_is_rejected_as_json() {
        let response = chat_handler(
            State(state(StubModel::replying("unused"))),
            extract(r#"{"message": null}"#).await,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": MISSING_MESSAGE }));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_as_json() {
        for body in ["not json", r#"{"message": 7}"#] {
            let payload = extract(body).await;
            assert!(payload.is_err(), "body {body:?} should not extract");

            let response =
                chat_handler(State(state(StubModel::replying("unused"))), payload).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await, json!({ "error": MISSING_MESSAGE }));
        }
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let response = chat_handler(
            State(state(StubModel::replying("unused"))),
            Ok(Json(ChatRequest::new("   "))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": MISSING_MESSAGE }));
    }

    #[tokio::test]
    async fn answered_chat_returns_success_body() {
        let reply = "제목: 도서관 4층\n설명: 자료실이 있습니다";
        let response = chat_handler(
            State(state(StubModel::replying(reply))),
            Ok(Json(ChatRequest::new("도서관 자료실"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["title"], json!("도서관 4층"));
        assert_eq!(body["extraInfo"], json!("도서관 시설 정보:\n4F: 자료실"));
        assert_eq!(body["imageUrl"], Value::Null);
        assert_eq!(body["fullResponse"], json!(reply));
    }

    #[tokio::test]
    async fn model_fault_returns_failure_body() {
        let response = chat_handler(
            State(state(StubModel::failing())),
            Ok(Json(ChatRequest::new("3호관"))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["title"], json!("오류 발생"));
        assert_eq!(body["extraInfo"], json!("잠시 후 다시 시도해주세요."));
    }

    #[tokio::test]
    async fn health_reports_dataset() {
        let Json(report) = health(State(state(StubModel::replying("unused")))).await;
        assert_eq!(
            report,
            HealthResponse {
                status: "ok".to_string(),
                dataset_loaded: true,
                buildings: 2,
            }
        );
    }

    #[test]
    fn index_lists_buildings() {
        let page = IndexTemplate {
            buildings: vec!["3호관".to_string(), "도서관".to_string()],
        }
        .render()
        .expect("template renders");
        assert!(page.contains("3호관"));
        assert!(page.contains("/api/chat"));
    }
}
