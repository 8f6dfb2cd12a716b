//! Request handlers: upload, progress stream, artifact download.

use std::path::{Component, Path};

use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{ProgressEvent, ReceiptImage};

use super::AppState;

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Image extensions accepted for upload, lowercase.
const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET / - liveness probe with the OCR engine's status.
pub async fn liveness(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "receiptsort",
        "status": "ok",
        "ocr": state.engine.availability_hint(),
    }))
}

/// POST /process-receipts - accept a multipart batch of receipt
/// images, register a job, and queue it for processing.
pub async fn process_receipts(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let handle = state.registry.create();
    let job_dir = state.settings.upload_dir.join(handle.id.to_string());
    if let Err(e) = std::fs::create_dir_all(&job_dir) {
        tracing::error!(job = %handle.id, "cannot create upload dir: {}", e);
        state.registry.remove(handle.id);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "cannot store uploads");
    }

    let mut images = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                state.registry.remove(handle.id);
                let _ = std::fs::remove_dir_all(&job_dir);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("malformed multipart body: {}", e),
                );
            }
        };

        // Only the basename of the client-supplied filename is kept.
        let Some(name) = field
            .file_name()
            .and_then(|n| Path::new(n).file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        if !has_accepted_extension(&name) {
            tracing::debug!(file = %name, "skipping non-image upload");
            continue;
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                state.registry.remove(handle.id);
                let _ = std::fs::remove_dir_all(&job_dir);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("upload truncated: {}", e),
                );
            }
        };

        let path = job_dir.join(&name);
        if let Err(e) = std::fs::write(&path, &bytes) {
            tracing::error!(job = %handle.id, file = %name, "cannot save upload: {}", e);
            state.registry.remove(handle.id);
            let _ = std::fs::remove_dir_all(&job_dir);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "cannot store uploads");
        }
        images.push(ReceiptImage::new(name, path));
    }

    if images.is_empty() {
        state.registry.remove(handle.id);
        let _ = std::fs::remove_dir_all(&job_dir);
        return error_response(StatusCode::BAD_REQUEST, "no image files in upload");
    }

    tracing::info!(job = %handle.id, files = images.len(), "job accepted");
    let response = json!({
        "job_id": handle.id,
        "stream_url": format!("/events/{}", handle.id),
        "total_files": images.len(),
    });

    state.registry.spawn(
        handle,
        images,
        job_dir,
        state.settings.clone(),
        state.engine.clone(),
    );

    (StatusCode::ACCEPTED, Json(response)).into_response()
}

fn has_accepted_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// GET /events/:job_id - SSE stream of the job's progress log.
///
/// Replays everything already emitted, then follows live events, and
/// closes after the terminal event. The job is dropped from the
/// registry once its terminal event has been delivered.
pub async fn job_events(
    State(state): State<AppState>,
    AxumPath(job_id): AxumPath<Uuid>,
) -> Response {
    let Some(handle) = state.registry.get(job_id) else {
        return error_response(StatusCode::NOT_FOUND, "unknown job");
    };

    let (snapshot, rx) = handle.subscribe();
    let stream = event_stream(snapshot, rx).map(move |event| {
        if event.is_terminal() {
            state.registry.remove(job_id);
        }
        Event::default().json_data(&event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// Replayed log followed by live broadcast events, ending with the
/// first terminal event.
fn event_stream(
    snapshot: Vec<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
) -> impl Stream<Item = ProgressEvent> {
    let live = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                // A lagged subscriber skips ahead; the job log is the
                // durable record.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    futures::stream::iter(snapshot)
        .chain(live)
        .scan(false, |done, event| {
            if *done {
                return futures::future::ready(None);
            }
            *done = event.is_terminal();
            futures::future::ready(Some(event))
        })
}

/// GET /download/:filename - serve a finished document from the output
/// directory. The filename must be a bare name; anything that would
/// escape the directory is rejected.
pub async fn download_document(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Response {
    let candidate = Path::new(&filename);
    let is_bare_name = candidate.components().count() == 1
        && matches!(candidate.components().next(), Some(Component::Normal(_)));
    if !is_bare_name {
        return error_response(StatusCode::BAD_REQUEST, "invalid filename");
    }

    let path = state.settings.output_dir.join(candidate);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error_response(StatusCode::NOT_FOUND, "document not found")
        }
        Err(e) => {
            tracing::error!(file = %filename, "cannot read document: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "cannot read document")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::server::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(dir: &Path) -> AppState {
        AppState::new(Settings {
            upload_dir: dir.join("uploads"),
            output_dir: dir.join("output"),
            ..Settings::default()
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn liveness_reports_service() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("receiptsort"));
    }

    #[tokio::test]
    async fn upload_without_images_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"notes.txt\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let response = app
            .oneshot(
                Request::post("/process-receipts")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_accepts_png_and_returns_job() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        state.settings.ensure_dirs().unwrap();
        let app = create_router(state.clone());

        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([255, 255, 255]),
        ))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

        let boundary = "X-BOUNDARY";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"r1.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(&png);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let response = app
            .oneshot(
                Request::post("/process-receipts")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let parsed: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(parsed["total_files"], 1);
        let job_id: Uuid = serde_json::from_value(parsed["job_id"].clone()).unwrap();
        assert_eq!(
            parsed["stream_url"],
            format!("/events/{job_id}"),
        );
    }

    #[tokio::test]
    async fn events_for_unknown_job_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::get(format!("/events/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn finished_job_stream_replays_log_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let handle = state.registry.create();
        let job_id = handle.id;
        handle.emit(ProgressEvent::Started { total_images: 1 });
        handle.emit(ProgressEvent::Completed {
            artifact: "sorted_receipts_test.docx".into(),
        });

        let app = create_router(state.clone());
        let response = app
            .oneshot(
                Request::get(format!("/events/{job_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The stream ends at the terminal event, so the body completes.
        let body = body_string(response).await;
        assert!(body.contains("\"event\":\"started\""));
        assert!(body.contains("\"event\":\"completed\""));
        assert!(state.registry.get(job_id).is_none());
    }

    #[tokio::test]
    async fn download_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::get("/download/..%2F..%2Fetc%2Fpasswd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn download_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(dir.path()));

        let response = app
            .oneshot(
                Request::get("/download/sorted_receipts_missing.docx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_serves_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        state.settings.ensure_dirs().unwrap();
        std::fs::write(
            state.settings.output_dir.join("sorted_receipts_x.docx"),
            b"PK fake",
        )
        .unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::get("/download/sorted_receipts_x.docx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            DOCX_CONTENT_TYPE
        );
    }
}
