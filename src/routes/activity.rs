use axum::extract::{Query, State};
use axum::Json;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extractor::AuthAdmin;
use crate::db;
use crate::error::AppError;
use crate::models::ActivityKind;
use crate::state::SharedState;
use crate::validation::Validator;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn recent(
    _auth: AuthAdmin,
    State(state): State<SharedState>,
    WithRejection(Query(q), _): WithRejection<Query<ActivityQuery>, AppError>,
) -> Result<Json<Value>, AppError> {
    let kind = q.kind.as_deref().filter(|s| !s.is_empty());
    let parsed = kind.and_then(|k| k.parse::<ActivityKind>().ok());

    let mut v = Validator::new();
    v.check(kind.is_none() || parsed.is_some(), "type", "Unknown activity type");
    v.finish()?;

    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let activities = db::activities::recent(&state.pool, limit, parsed).await?;

    Ok(Json(json!({
        "message": "Activities fetched successfully",
        "activities": activities,
    })))
}
