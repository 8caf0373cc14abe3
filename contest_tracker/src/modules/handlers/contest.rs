use super::{error_reply, ErrorReply};
use crate::modules::{
    ingestion::{Ingestion, IngestionOutcome},
    solutions::{PlaylistSource, SolutionMatcher},
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, Extension, FromRequestParts, Path},
    http::StatusCode,
    Json,
};
use contest_tracker_libs::{
    contest::Contest,
    page::{ContestPage, ContestReader, DEFAULT_PAGE_SIZE},
    store::ContestStore,
};
use http::request::Parts;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use validator::Validate;

#[derive(Debug, Default, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ListContestsParameter {
    pub offset: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SolutionPayload {
    #[validate(url)]
    pub url: String,
}

/// Query string extractor that rejects unparseable or invalid parameters with 400.
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ErrorReply;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let value: T = serde_urlencoded::from_str(query).map_err(|rejection| {
            tracing::error!("Parsing error: {}", rejection);
            error_reply(
                StatusCode::BAD_REQUEST,
                format!("invalid format query string: [{}]", rejection),
            )
        })?;

        value.validate().map_err(|rejection| {
            tracing::error!("Validation error: {}", rejection);
            error_reply(
                StatusCode::BAD_REQUEST,
                format!("Validation error: [{}]", rejection).replace('\n', ", "),
            )
        })?;

        Ok(ValidatedQuery(value))
    }
}

pub async fn list_contests(
    ValidatedQuery(params): ValidatedQuery<ListContestsParameter>,
    Extension(reader): Extension<Arc<ContestReader>>,
) -> Result<Json<ContestPage>, ErrorReply> {
    let start_process = Instant::now();
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let page = reader.get_page(offset, limit).await.map_err(|e| {
        tracing::error!("request failed cause: {:?}", e);
        error_reply(StatusCode::INTERNAL_SERVER_ERROR, "unexpected error")
    })?;

    let time = Instant::now().duration_since(start_process).as_millis();
    tracing::info!(
        target: "querylog",
        "elapsed_time={} hits={} offset={} limit={}",
        time, page.contests.len(), offset, limit
    );

    Ok(Json(page))
}

pub async fn attach_solution(
    Path(contest_id): Path<String>,
    Extension(store): Extension<Arc<dyn ContestStore>>,
    Extension(reader): Extension<Arc<ContestReader>>,
    payload: Result<Json<SolutionPayload>, JsonRejection>,
) -> Result<Json<Contest>, ErrorReply> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::error!("Parsing error: {}", rejection);
        error_reply(
            StatusCode::BAD_REQUEST,
            format!("invalid request body: [{}]", rejection.body_text()),
        )
    })?;
    payload.validate().map_err(|rejection| {
        tracing::error!("Validation error: {}", rejection);
        error_reply(
            StatusCode::BAD_REQUEST,
            format!("Validation error: [{}]", rejection).replace('\n', ", "),
        )
    })?;

    let contest = match store.set_solution(&contest_id, &payload.url).await {
        Ok(Some(contest)) => contest,
        Ok(None) => {
            return Err(error_reply(
                StatusCode::NOT_FOUND,
                format!("contest {} not found", contest_id),
            ))
        }
        Err(e) => {
            tracing::error!("failed to attach solution to {}: {:?}", contest_id, e);
            return Err(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected error",
            ));
        }
    };
    tracing::info!("solution of {} set to {}", contest_id, payload.url);
    reader.invalidate().await;

    Ok(Json(contest))
}

pub async fn sync_contests(
    Extension(ingestion): Extension<Arc<Ingestion>>,
    Extension(matcher): Extension<Arc<SolutionMatcher>>,
    Extension(playlists): Extension<Arc<dyn PlaylistSource>>,
    Extension(reader): Extension<Arc<ContestReader>>,
) -> Result<Json<Vec<Contest>>, ErrorReply> {
    if ingestion.run().await == IngestionOutcome::Skipped {
        tracing::info!("sync requested while ingestion is running, matching only");
    }

    let playlists = playlists.fetch_all().await;
    let updated = matcher.run(&playlists).await.map_err(|e| {
        tracing::error!("solution matching failed cause: {:?}", e);
        error_reply(StatusCode::INTERNAL_SERVER_ERROR, "unexpected error")
    })?;
    reader.invalidate().await;

    Ok(Json(updated))
}
