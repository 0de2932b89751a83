use super::body::{self, BodyWriter};
use super::AppState;
use crate::dataset::{DatasetDecoder, StudyDataset};
use crate::error::{DicomcatError, Result};
use crate::imaging::{package_frames, ConversionReport, ARCHIVE_CONTENT_TYPE, ARCHIVE_FILE_NAME};
use crate::metadata;
use axum::extract::{Multipart, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, info, warn};
use serde::Deserialize;
use std::io::Write;
use tokio::task;

/// Form field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    file: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConversionQuery {
    file: Option<String>,
}

/// Runs blocking file and pixel work off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("Blocking task failed: {}", e);
            DicomcatError::Internal("worker task failed".to_string())
        })?
}

pub async fn healthz() -> impl IntoResponse {
    "ok"
}

/// `POST /upload`: stores the `file` field of a multipart form
pub async fn upload<D>(State(state): State<AppState<D>>, mut multipart: Multipart) -> Result<String>
where
    D: DatasetDecoder + 'static,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DicomcatError::MalformedUpload(format!("{}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| DicomcatError::MissingField("file name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| DicomcatError::MalformedUpload(format!("{}", e)))?;

        let storage = state.storage.clone();
        let name = file_name.clone();
        run_blocking(move || storage.ingest(&name, &data)).await?;
        return Ok(format!("File uploaded successfully: {}.\n", file_name));
    }
    Err(DicomcatError::MissingField(UPLOAD_FIELD.to_string()))
}

/// `GET /metadata?file=<name>&tag=<expr>`
pub async fn get_metadata<D>(
    State(state): State<AppState<D>>,
    Query(query): Query<MetadataQuery>,
) -> Result<Json<serde_json::Value>>
where
    D: DatasetDecoder + 'static,
{
    let file = query
        .file
        .ok_or_else(|| DicomcatError::MissingField("file".to_string()))?;
    let tag = query.tag;
    let answer = run_blocking(move || {
        let bytes = state.storage.read(&file)?;
        let dataset = state.decoder.decode(&bytes)?;
        metadata::query(&dataset, tag.as_deref())
    })
    .await?;
    Ok(Json(answer.to_json()))
}

/// `GET /png/conversion?file=<name>`: zip of one PNG per frame
///
/// The file is decoded and checked for frames before the response starts, so
/// those failures still map to an error status. The archive itself is
/// streamed while frames are converted; skipped frames are listed in the
/// archive comment.
pub async fn convert_to_png<D>(
    State(state): State<AppState<D>>,
    Query(query): Query<ConversionQuery>,
) -> Result<Response>
where
    D: DatasetDecoder + 'static,
{
    let file = query
        .file
        .ok_or_else(|| DicomcatError::MissingField("file".to_string()))?;
    let source = file.clone();
    let dataset = run_blocking(move || {
        let bytes = state.storage.read(&source)?;
        let dataset = state.decoder.decode(&bytes)?;
        dataset.frame_count()?;
        Ok(dataset)
    })
    .await?;

    let (writer, body) = body::channel();
    task::spawn_blocking(move || stream_archive(&dataset, &file, writer));

    let headers = [
        (header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", ARCHIVE_FILE_NAME),
        ),
    ];
    Ok((headers, body).into_response())
}

fn stream_archive<S>(dataset: &S, file: &str, mut writer: BodyWriter)
where
    S: StudyDataset,
{
    let result = package_frames(dataset, file, &mut writer).and_then(|report| {
        if !report.interrupted {
            writer.flush()?;
        }
        Ok(report)
    });

    match result {
        Ok(ConversionReport {
            interrupted: true, ..
        }) => info!("{}: client went away, conversion stopped", file),
        Ok(report) if !report.is_complete() => warn!(
            "{}: {} of {} frame(s) skipped ({})",
            file,
            report.failures.len(),
            report.frame_count,
            report.skipped_frames()
        ),
        Ok(report) => info!("{}: streamed {} frame(s)", file, report.entries.len()),
        Err(e) => {
            error!("{}: archive aborted: {}", file, e);
            writer.abort(e);
        }
    }
}
