use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, info, warn};

use super::{error::ApiError, AppState};
use crate::config::ExtractionMode;
use crate::media::{DownloadRequest, VideoInfo};

/// Look up title, thumbnail and available formats for a media URL.
///
/// A body that is not JSON, or that lacks a non-empty `url`, is a validation
/// failure. In stub mode the extractor is never called.
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<VideoInfo>, ApiError> {
    let url = match payload {
        Ok(Json(request)) => request.url.filter(|url| !url.is_empty()),
        Err(rejection) => {
            debug!("Rejected download body: {}", rejection);
            None
        }
    }
    .ok_or(ApiError::Validation)?;

    match state.mode {
        ExtractionMode::Stub => {
            debug!("Stub mode, skipping extraction for: {}", url);
            Ok(Json(VideoInfo::stub()))
        }
        ExtractionMode::Delegated => {
            info!("Extracting media info with {}: {}", state.extractor.name(), url);

            let raw = state.extractor.extract_info(&url).await.map_err(|e| {
                warn!("Extraction failed for {}: {:#}", url, e);
                ApiError::extraction(e)
            })?;

            let video_info = VideoInfo::from_raw(&raw);
            info!("Extracted {} formats for: {}", video_info.formats.len(), url);
            Ok(Json(video_info))
        }
    }
}
