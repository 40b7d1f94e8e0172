//! HTTP route handlers for the hadith QA API.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tower_http::services::ServeDir;
use tracing::Instrument;
use uuid::Uuid;

use crate::answer::AnswerMode;
use crate::retrieval::QueryResult;

use super::state::AppState;

/// Create the API router with all routes.
///
/// Paths other than `/query` and `/health` are served from the static dir.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/health", get(health_check))
        .route("/query", post(query))
        .fallback_service(static_files)
        .with_state(state)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` once the service is serving.
    pub status: &'static str,
    /// Number of corpus records available for retrieval.
    pub hadiths_loaded: usize,
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        hadiths_loaded: state.pipeline.corpus_size(),
    })
}

/// Query request.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    #[serde(default)]
    pub query: Option<String>,
    /// `"concise"` (default) or anything else, `null` included, for a
    /// detailed answer. `None` only when the field is absent.
    #[serde(default, deserialize_with = "present_value")]
    pub mode: Option<Value>,
}

// Keeps an explicit `null` distinct from an absent field.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Query response.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// LLM answer rendered as HTML.
    pub response: String,
    /// Records the answer was grounded on, nearest first.
    pub hadiths: Vec<HadithDto>,
    /// Mode the answer was produced in.
    pub mode: AnswerMode,
}

/// A retrieved record in the corpus' own column names.
#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
pub struct HadithDto {
    /// Chapter identifier.
    pub Chapter_Number: String,
    /// Hadith number within the chapter; `null` when the corpus left it blank.
    pub Hadith_number: Option<i64>,
    /// Full English text.
    pub English_Hadith: String,
    /// Arabic text.
    pub Arabic_Hadith: String,
    /// Chain of narration.
    pub English_Isnad: String,
    /// Body of the narration.
    pub English_Matn: String,
    /// Authenticity grade.
    pub English_Grade: String,
    /// Squared L2 distance to the query.
    pub Distance: f32,
}

impl From<&QueryResult> for HadithDto {
    fn from(result: &QueryResult) -> Self {
        let record = &result.record;
        Self {
            Chapter_Number: record.chapter_number.clone(),
            Hadith_number: record.sequence_number,
            English_Hadith: record.primary_text.clone(),
            Arabic_Hadith: record.source_text.clone(),
            English_Isnad: record.attribution.clone(),
            English_Matn: record.body.clone(),
            English_Grade: record.reliability_grade.clone(),
            Distance: result.distance,
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable failure.
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Answer a question from the corpus.
async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("rejected query body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(text) = request.query.filter(|q| !q.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Query is required");
    };
    let mode = AnswerMode::from_request(request.mode.as_ref());

    let span = tracing::info_span!("query", request_id = %Uuid::new_v4(), %mode);
    async move {
        tracing::info!(query_chars = text.len(), "query received");
        match state.pipeline.answer(&text, mode).await {
            Ok(answer) => Json(QueryResponse {
                response: answer.html,
                hadiths: answer.hadiths.iter().map(HadithDto::from).collect(),
                mode: answer.mode,
            })
            .into_response(),
            Err(e) => {
                tracing::error!("query failed: {e}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::answer::AnswerModel;
    use crate::answer::pipeline::tests::CannedModel;
    use crate::retrieval::ServiceConfig;
    use crate::retrieval::test_support::{fixture_retriever, kindness_corpus};

    fn test_router(model: CannedModel, static_dir: &std::path::Path) -> Router {
        let mut config = ServiceConfig::default();
        config.retrieval.retrieve_k = 3;
        config.llm.top_k_concise = 2;
        config.llm.top_k_detailed = 3;
        config.server.static_dir = static_dir.to_path_buf();
        let retriever = Arc::new(fixture_retriever(&kindness_corpus()));
        let model: Arc<dyn AnswerModel> = Arc::new(model);
        create_router(AppState::new(retriever, model, &config).unwrap())
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_corpus_size() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(CannedModel::replying("ok"), dir.path());
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["hadiths_loaded"], 3);
    }

    #[tokio::test]
    async fn test_query_returns_answer_and_hadiths() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(CannedModel::replying("**Be kind**\nAlways"), dir.path());

        let (status, body) = send(router, post_query(r#"{"query":"kindness virtue"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "<strong>Be kind</strong><br>Always");
        assert_eq!(body["mode"], "concise");

        let hadiths = body["hadiths"].as_array().unwrap();
        assert_eq!(hadiths.len(), 2);
        let top = &hadiths[0];
        assert_eq!(top["Chapter_Number"], "1");
        assert_eq!(top["Hadith_number"], 1);
        assert_eq!(top["English_Hadith"], "The Prophet said kindness is a virtue");
        assert_eq!(top["Arabic_Hadith"], "نص");
        assert_eq!(top["English_Isnad"], "Narrator 0");
        assert_eq!(top["English_Grade"], "Sahih");
        assert!(top["Distance"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_unknown_mode_is_detailed() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(CannedModel::replying("ok"), dir.path());

        let (status, body) = send(
            router,
            post_query(r#"{"query":"charity","mode":"long"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "detailed");
        assert_eq!(body["hadiths"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_mode_null_or_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (r#"{"query":"charity","mode":null}"#, "detailed"),
            (r#"{"query":"charity"}"#, "concise"),
            (r#"{"query":"charity","mode":"concise"}"#, "concise"),
        ];
        for (payload, expected) in cases {
            let router = test_router(CannedModel::replying("ok"), dir.path());
            let (status, body) = send(router, post_query(payload)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["mode"], expected);
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_query_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for payload in [r#"{"query":""}"#, r#"{"mode":"concise"}"#] {
            let router = test_router(CannedModel::replying("ok"), dir.path());
            let (status, body) = send(router, post_query(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Query is required");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(CannedModel::replying("ok"), dir.path());
        let (status, body) = send(router, post_query("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_llm_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(CannedModel::failing(), dir.path());
        let (status, body) = send(router, post_query(r#"{"query":"kindness"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "answer generation failed: completion returned no text"
        );
    }

    #[tokio::test]
    async fn test_static_index_is_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Hadith QA</h1>").unwrap();
        let router = test_router(CannedModel::replying("ok"), dir.path());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>Hadith QA</h1>");
    }
}
