use anyhow::Result;
use axum::{extract::Json, http::StatusCode, routing::get, routing::post, Router};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::app::index::{index_predictions, RawPrediction};
use crate::pipeline;
use crate::predictor::{checkpoint_names, predict_masked, render_sentence, DEFAULT_CHECKPOINT};
use crate::taxonomy;

/// Fill marker assumed when the request doesn't specify one
pub const DEFAULT_FILL: &str = "_";

/// Process start time, for the status endpoint
static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// A subject substituted into a sentence template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

/// A sentence template and the subjects to query it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceGroup {
    pub template: String,
    pub subjects: Vec<Subject>,
}

/// Represents the request payload for masked-word prediction.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Registered checkpoint name; defaults to [`DEFAULT_CHECKPOINT`]
    pub model: Option<String>,
    /// Candidates per subject; zero or absent returns the full candidate set
    pub top_k: Option<usize>,
    pub fill: Option<String>,
    pub groups: Vec<SentenceGroup>,
}

/// Predictions for one subject's rendered sentence.
#[derive(Debug, Serialize)]
pub struct SubjectPredictions {
    pub subject_id: String,
    pub subject_name: String,
    pub sentence: String,
    pub predictions: Vec<ScoredWord>,
}

/// A predicted word with its synthetic id and probability.
#[derive(Debug, Serialize)]
pub struct ScoredWord {
    pub id: String,
    pub word: String,
    pub probability: f32,
}

/// Represents the response for a prediction request.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub generated_at: String,
    pub groups: Vec<SubjectPredictions>,
    pub subjects_id_key: BTreeMap<String, String>,
    pub predictions_id_key: BTreeMap<String, String>,
    pub predictions_name_key: BTreeMap<String, String>,
    pub prediction_values: BTreeMap<String, BTreeMap<String, f32>>,
    pub clusters: BTreeMap<String, String>,
}

/// Represents the response for a status request.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// Main application loop, setting up and running the Axum-based API server.
pub async fn api_loop(port: u16) -> Result<()> {
    let app = Router::new()
        .route("/status", get(status_check))
        .route("/predict", post(predict));

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Reports that the server is up.
async fn status_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "OK".to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
    })
}

/// Runs masked-word prediction for every subject in every sentence group,
/// then clusters the predicted words into labeled topic groups.
async fn predict(Json(payload): Json<PredictRequest>) -> Result<Json<PredictResponse>, StatusCode> {
    let model = payload
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_CHECKPOINT.to_string());
    // Zero means the full candidate set
    let top_k = payload.top_k.unwrap_or(0);
    let fill = payload
        .fill
        .clone()
        .unwrap_or_else(|| DEFAULT_FILL.to_string());

    info!(
        "predict called: {} groups, model {}, top_k {}",
        payload.groups.len(),
        model,
        top_k
    );

    let available = checkpoint_names().map_err(|e| {
        warn!("predict has no checkpoint registry available: {:#?}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    if !available.contains(&model) {
        warn!(
            "predict called with unknown model {:?} (available: {:?})",
            model, available
        );
        return Err(StatusCode::BAD_REQUEST);
    }

    let taxonomy = taxonomy::taxonomy().map_err(|e| {
        warn!("predict has no taxonomy available: {:#?}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let mut raw = Vec::new();
    let mut groups = Vec::new();
    let mut subjects_id_key = BTreeMap::new();

    for group in &payload.groups {
        for subject in &group.subjects {
            let sentence = render_sentence(&group.template, &subject.name);
            let predictions = predict_masked(&model, &sentence, &fill, top_k)
                .await
                .map_err(|e| {
                    warn!("predict failed for sentence {:?}: {:#?}", sentence, e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?;

            subjects_id_key.insert(subject.id.clone(), subject.name.clone());
            raw.extend(predictions.iter().map(|p| RawPrediction {
                subject_id: subject.id.clone(),
                word: p.word.clone(),
                probability: p.probability,
            }));
            groups.push((subject, sentence, predictions));
        }
    }

    let index = index_predictions(&raw);

    let clusters = pipeline::cluster_predictions(&index.words, &taxonomy).map_err(|e| {
        warn!("predict clustering failed: {:#?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let groups = groups
        .into_iter()
        .map(|(subject, sentence, predictions)| SubjectPredictions {
            subject_id: subject.id.clone(),
            subject_name: subject.name.clone(),
            sentence,
            predictions: predictions
                .into_iter()
                .map(|p| ScoredWord {
                    id: index.id_for_name.get(&p.word).cloned().unwrap_or_default(),
                    word: p.word,
                    probability: p.probability,
                })
                .collect(),
        })
        .collect();

    Ok(Json(PredictResponse {
        generated_at: Utc::now().to_rfc3339(),
        groups,
        subjects_id_key,
        predictions_id_key: index.name_for_id,
        predictions_name_key: index.id_for_name,
        prediction_values: index.values,
        clusters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_deserializes() {
        let request: PredictRequest = serde_json::from_str(
            r#"{
                "model": "scibert",
                "top_k": 5,
                "fill": "_",
                "groups": [{
                    "template": "A [subject] can _.",
                    "subjects": [{"id": "s1", "name": "dog"}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(request.model.as_deref(), Some("scibert"));
        assert_eq!(request.top_k, Some(5));
        assert_eq!(request.groups.len(), 1);
        assert_eq!(request.groups[0].subjects[0].name, "dog");
    }

    #[test]
    fn test_predict_request_defaults_are_optional() {
        let request: PredictRequest = serde_json::from_str(r#"{"groups": []}"#).unwrap();
        assert!(request.model.is_none());
        assert!(request.top_k.is_none());
        assert!(request.fill.is_none());
    }
}
