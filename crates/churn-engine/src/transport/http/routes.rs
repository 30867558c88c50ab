//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;

use crate::codec::{ScoringRequest, ScoringResponse};
use crate::deployment::{Deployment, DeploymentError, DeploymentSummary, SCORING_PATH};
use crate::health::{Health, ModelLoad};
use crate::openapi;
use crate::service::{ScoreError, ScoringService};
use crate::validation::{ValidationError, detail_body};
use crate::version::VersionInfo;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse<'a> {
    pub status: Health,
    pub version: &'a VersionInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a ModelLoad>,
}

#[derive(Debug, Serialize)]
pub struct DeploymentList<'a> {
    pub deployments: Vec<DeploymentSummary<'a>>,
}

fn not_found(err: &DeploymentError) -> ErrorResponse {
    let DeploymentError::NotFound(id) = err;
    tracing::debug!(deployment_id = %id, "Unknown deployment");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": err.to_string() })),
    )
}

fn unprocessable(errors: &[ValidationError]) -> ErrorResponse {
    tracing::debug!(errors = errors.len(), "Rejected scoring request");
    (StatusCode::UNPROCESSABLE_ENTITY, Json(detail_body(errors)))
}

/// Convert an axum body rejection into a pydantic-style validation error.
fn rejection_error(rejection: &JsonRejection) -> ValidationError {
    let error_type = match rejection {
        JsonRejection::JsonDataError(_) => "value_error",
        JsonRejection::JsonSyntaxError(_) => "json_invalid",
        JsonRejection::MissingJsonContentType(_) => "content_type",
        _ => "body_error",
    };
    ValidationError::body(rejection.body_text(), error_type)
}

async fn health_check(State(service): State<Arc<ScoringService>>) -> Json<serde_json::Value> {
    let response = HealthCheckResponse {
        status: Health::Ready,
        version: service.version(),
        model: service.model_load(),
    };
    Json(serde_json::json!(response))
}

async fn openapi_schema() -> Json<serde_json::Value> {
    Json(openapi::document())
}

async fn list_deployments(State(service): State<Arc<ScoringService>>) -> Json<serde_json::Value> {
    let list = DeploymentList {
        deployments: service.deployments().iter().map(Deployment::summary).collect(),
    };
    Json(serde_json::json!(list))
}

async fn get_deployment(
    State(service): State<Arc<ScoringService>>,
    Path(deployment_id): Path<String>,
) -> Result<Json<Deployment>, ErrorResponse> {
    service
        .deployment(&deployment_id)
        .cloned()
        .map(Json)
        .map_err(|e| not_found(&e))
}

async fn score(
    State(service): State<Arc<ScoringService>>,
    Path(deployment_id): Path<String>,
    payload: Result<Json<ScoringRequest>, JsonRejection>,
) -> Result<Json<ScoringResponse>, ErrorResponse> {
    // An unknown deployment wins over any body error.
    service
        .deployment(&deployment_id)
        .map_err(|e| not_found(&e))?;

    let Json(request) = payload.map_err(|rejection| unprocessable(&[rejection_error(&rejection)]))?;

    match service.score(&deployment_id, request).await {
        Ok(response) => Ok(Json(response)),
        Err(ScoreError::NotFound(e)) => Err(not_found(&e)),
        Err(ScoreError::Malformed(errors)) => Err(unprocessable(&errors)),
        Err(ScoreError::Prediction(e)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "detail": e.to_string() })),
        )),
    }
}

pub fn routes(service: Arc<ScoringService>) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/openapi.json", get(openapi_schema))
        .route("/v1/deployments", get(list_deployments))
        .route("/v1/deployments/{id}", get(get_deployment))
        // Scoring payloads are sized by the caller's batch; no body cap.
        .route(SCORING_PATH, post(score).layer(DefaultBodyLimit::disable()))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::codec::Frame;
    use crate::deployment::DeploymentRegistry;
    use crate::model::LogisticModel;
    use crate::predictor::{PredictionError, Predictor};

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Replays the classes and probabilities it was built with.
    struct ScriptedPredictor {
        classes: Vec<usize>,
        probabilities: Vec<Vec<f64>>,
    }

    impl Predictor for ScriptedPredictor {
        fn predict(&self, _frame: &Frame) -> Result<Vec<usize>, PredictionError> {
            Ok(self.classes.clone())
        }

        fn predict_proba(&self, _frame: &Frame) -> Result<Vec<Vec<f64>>, PredictionError> {
            Ok(self.probabilities.clone())
        }
    }

    /// Predicts "No" with probability 0.6 for every row it is given.
    struct UniformPredictor;

    impl Predictor for UniformPredictor {
        fn predict(&self, frame: &Frame) -> Result<Vec<usize>, PredictionError> {
            Ok(vec![0; frame.len()])
        }

        fn predict_proba(&self, frame: &Frame) -> Result<Vec<Vec<f64>>, PredictionError> {
            Ok(vec![vec![0.6, 0.4]; frame.len()])
        }
    }

    async fn response_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn app_with(predictor: Arc<dyn Predictor>) -> Router {
        let service = ScoringService::new(DeploymentRegistry::default(), predictor)
            .with_model_load(ModelLoad::starting("models/churn_model.json").completed(None));
        routes(Arc::new(service))
    }

    fn app() -> Router {
        app_with(Arc::new(ScriptedPredictor {
            classes: vec![1, 0],
            probabilities: vec![vec![0.2, 0.8], vec![0.9, 0.1]],
        }))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const EXAMPLE_BODY: &str =
        r#"{"input_data":[{"fields":["age","tenure"],"values":[[34,5],[50,1]]}]}"#;

    #[tokio::test]
    async fn list_deployments_returns_single_entry() {
        let response = app()
            .oneshot(Request::get("/v1/deployments").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        insta::assert_json_snapshot!(json, @r#"
        {
          "deployments": [
            {
              "id": "churn-classifier",
              "name": "Churn Classifier",
              "scoring_endpoint": "/v1/deployments/churn-classifier/online"
            }
          ]
        }
        "#);
    }

    #[tokio::test]
    async fn advertised_scoring_endpoint_is_routable() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::get("/v1/deployments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = response_json(response).await;
        let endpoint = json["deployments"][0]["scoring_endpoint"].as_str().unwrap();

        let response = app.oneshot(post_json(endpoint, EXAMPLE_BODY)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_deployment_returns_detail() {
        let response = app()
            .oneshot(
                Request::get("/v1/deployments/churn-classifier")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["id"], "churn-classifier");
        assert_eq!(json["description"], "Customer churn prediction model");
        assert_eq!(json["model_type"], "binary-classification");
        assert_eq!(
            json["scoring_endpoint"],
            "/v1/deployments/churn-classifier/online"
        );
    }

    #[tokio::test]
    async fn get_unknown_deployment_is_404() {
        let response = app()
            .oneshot(Request::get("/v1/deployments/other").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json, serde_json::json!({"detail": "Deployment not found"}));
    }

    #[tokio::test]
    async fn score_returns_documented_example() {
        let response = app()
            .oneshot(post_json("/v1/deployments/churn-classifier/online", EXAMPLE_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(
            json,
            serde_json::json!({
                "predictions": [{
                    "fields": ["age", "tenure", "prediction", "probability"],
                    "labels": ["No", "Yes"],
                    "values": [[34, 5, "Yes", [0.2, 0.8]], [50, 1, "No", [0.9, 0.1]]]
                }]
            })
        );
    }

    #[tokio::test]
    async fn score_unknown_deployment_wins_over_body_errors() {
        let response = app()
            .oneshot(post_json("/v1/deployments/other/online", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["detail"], "Deployment not found");
    }

    #[tokio::test]
    async fn score_invalid_json_is_422() {
        let response = app()
            .oneshot(post_json("/v1/deployments/churn-classifier/online", "{"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = response_json(response).await;
        assert_eq!(json["detail"][0]["type"], "json_invalid");
        assert_eq!(json["detail"][0]["loc"], serde_json::json!(["body"]));
    }

    #[tokio::test]
    async fn score_schema_mismatch_is_422() {
        for body in [
            r#"{"input_data":[{"fields":"age","values":[]}]}"#,
            r#"{"inputs":[]}"#,
            r#"{"input_data":[{"fields":["a"],"values":[[{"nested":1}]]}]}"#,
        ] {
            let response = app()
                .oneshot(post_json("/v1/deployments/churn-classifier/online", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
            let json = response_json(response).await;
            assert_eq!(json["detail"][0]["type"], "value_error");
        }
    }

    #[tokio::test]
    async fn score_missing_content_type_is_422() {
        let response = app()
            .oneshot(
                Request::post("/v1/deployments/churn-classifier/online")
                    .body(Body::from(EXAMPLE_BODY))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = response_json(response).await;
        assert_eq!(json["detail"][0]["type"], "content_type");
    }

    #[tokio::test]
    async fn score_empty_input_data_is_422() {
        let response = app()
            .oneshot(post_json(
                "/v1/deployments/churn-classifier/online",
                r#"{"input_data":[]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = response_json(response).await;
        assert_eq!(
            json["detail"][0]["loc"],
            serde_json::json!(["body", "input_data"])
        );
    }

    #[tokio::test]
    async fn score_empty_values_keeps_fields_and_labels() {
        let app = app_with(Arc::new(ScriptedPredictor {
            classes: vec![],
            probabilities: vec![],
        }));
        let response = app
            .oneshot(post_json(
                "/v1/deployments/churn-classifier/online",
                r#"{"input_data":[{"fields":["age","tenure"],"values":[]}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let table = &json["predictions"][0];
        assert_eq!(
            table["fields"],
            serde_json::json!(["age", "tenure", "prediction", "probability"])
        );
        assert_eq!(table["labels"], serde_json::json!(["No", "Yes"]));
        assert_eq!(table["values"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn score_prediction_failure_is_500() {
        let model = LogisticModel::from_json(
            r#"{"intercept": 0.0, "features": [{"kind": "numeric", "name": "MonthlyCharges", "coef": 0.1}]}"#,
        )
        .unwrap();
        let response = app_with(Arc::new(model))
            .oneshot(post_json("/v1/deployments/churn-classifier/online", EXAMPLE_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(
            json["detail"],
            "Column 'MonthlyCharges' is missing from the input"
        );
    }

    #[tokio::test]
    async fn score_with_logistic_model() {
        let model = LogisticModel::from_json(
            r#"{"intercept": 0.0, "features": [{"kind": "numeric", "name": "tenure", "coef": -1.0, "mean": 3.0}]}"#,
        )
        .unwrap();
        let response = app_with(Arc::new(model))
            .oneshot(post_json("/v1/deployments/churn-classifier/online", EXAMPLE_BODY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let values = json["predictions"][0]["values"].as_array().unwrap();
        // tenure 5 is above the mean (lower churn), tenure 1 below it
        assert_eq!(values[0][2], "No");
        assert_eq!(values[1][2], "Yes");
        assert_eq!(values[0][3].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn health_check_reports_ready_and_model() {
        let response = app()
            .oneshot(Request::get("/health-check").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "READY");
        assert!(json["version"]["engine"].is_string());
        assert_eq!(json["model"]["path"], "models/churn_model.json");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = app()
            .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["openapi"], "3.0.2");
        assert!(json["paths"]["/v1/deployments/{id}/online"]["post"].is_object());
    }

    #[tokio::test]
    async fn score_accepts_bodies_over_two_megabytes() {
        let rows = vec![r#"[34,5,"Month-to-month",70.35]"#; 80_000].join(",");
        let body = format!(
            r#"{{"input_data":[{{"fields":["age","tenure","Contract","MonthlyCharges"],"values":[{rows}]}}]}}"#
        );
        assert!(body.len() > 2 * 1024 * 1024);

        let response = app_with(Arc::new(UniformPredictor))
            .oneshot(post_json("/v1/deployments/churn-classifier/online", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let values = json["predictions"][0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 80_000);
        assert_eq!(values[79_999][4], "No");
    }

    #[tokio::test]
    async fn score_echoes_numbers_exactly() {
        let body = r#"{"input_data":[{"fields":["id","ratio"],"values":[[123456789012345678901234,0.1000000000000000055511151231257827]]}]}"#;
        let response = app_with(Arc::new(UniformPredictor))
            .oneshot(post_json("/v1/deployments/churn-classifier/online", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = response_text(response).await;
        assert!(
            text.contains(r#"[[123456789012345678901234,0.1000000000000000055511151231257827,"No",[0.6,0.4]]]"#),
            "{text}"
        );
    }
}
