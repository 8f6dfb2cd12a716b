//! Job registry and worker pool.
//!
//! Each upload batch becomes a job with a unique id, an append-only
//! progress log, and a broadcast channel for live subscribers. A
//! semaphore bounds how many jobs run at once; submissions past the
//! bound queue for a permit instead of being rejected.
//!
//! The log and the channel are updated under one lock, and subscribers
//! snapshot the log under that same lock, so a subscriber sees every
//! event exactly once regardless of when it attaches.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{broadcast, Semaphore};
use uuid::Uuid;

use crate::config::Settings;
use crate::docwriter::{DocumentWriter, DocxWriter};
use crate::layout::{build_page_blocks, CellBox};
use crate::models::{DateDecision, ImageOutcome, JobState, ProgressEvent, ReceiptImage};
use crate::ocr::OcrEngine;
use crate::pipeline::{group_by_label, resolve_date};

const BROADCAST_CAPACITY: usize = 256;

/// One job's identity, state, and progress history.
pub struct JobHandle {
    pub id: Uuid,
    inner: Mutex<JobInner>,
}

struct JobInner {
    state: JobState,
    log: Vec<ProgressEvent>,
    tx: broadcast::Sender<ProgressEvent>,
}

impl JobHandle {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(JobInner {
                state: JobState::Running,
                log: Vec::new(),
                tx,
            }),
        }
    }

    /// Append an event to the log and fan it out to live subscribers.
    /// Terminal events also move the job to its terminal state.
    pub fn emit(&self, event: ProgressEvent) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if inner.state.is_terminal() {
            tracing::warn!(job = %self.id, "event after terminal state dropped");
            return;
        }
        if event.is_terminal() {
            inner.state = match event {
                ProgressEvent::Completed { .. } => JobState::Completed,
                _ => JobState::Failed,
            };
        }
        inner.log.push(event.clone());
        // Send fails only when nobody is listening yet; the log has it.
        let _ = inner.tx.send(event);
    }

    /// Snapshot of everything emitted so far plus a receiver for what
    /// comes next. Taken atomically, so no event is missed or repeated.
    pub fn subscribe(&self) -> (Vec<ProgressEvent>, broadcast::Receiver<ProgressEvent>) {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        (inner.log.clone(), inner.tx.subscribe())
    }

    pub fn state(&self) -> JobState {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).state
    }
}

/// All live jobs plus the shared worker-pool permits.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<JobHandle>>>,
    permits: Arc<Semaphore>,
}

impl JobRegistry {
    pub fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// Register a fresh job handle.
    pub fn create(&self) -> Arc<JobHandle> {
        let handle = Arc::new(JobHandle::new());
        self.jobs
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(handle.id, handle.clone());
        handle
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<JobHandle>> {
        self.jobs
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&id)
            .cloned()
    }

    /// Drop a finished job from the registry. Existing subscribers keep
    /// their handle through the Arc.
    pub fn remove(&self, id: Uuid) {
        self.jobs
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&id);
    }

    /// Queue a job for execution. Returns immediately; the job waits
    /// for a worker permit, then runs its OCR and layout work on the
    /// blocking pool.
    pub fn spawn(
        &self,
        handle: Arc<JobHandle>,
        images: Vec<ReceiptImage>,
        job_dir: PathBuf,
        settings: Arc<Settings>,
        engine: Arc<dyn OcrEngine>,
    ) {
        let permits = self.permits.clone();
        tokio::spawn(async move {
            // The pool closes only at shutdown; a job queued behind it
            // still gets its terminal event and cleanup.
            let _permit = match permits.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = std::fs::remove_dir_all(&job_dir);
                    handle.emit(ProgressEvent::Failed {
                        reason: "worker pool shut down".to_string(),
                    });
                    return;
                }
            };

            let id = handle.id;
            let worker = handle.clone();
            let result = tokio::task::spawn_blocking(move || {
                run_job(&worker, &images, &settings, engine.as_ref())
            })
            .await;

            match result {
                Ok(()) => {}
                Err(e) => {
                    tracing::error!(job = %id, "job task panicked: {}", e);
                    handle.emit(ProgressEvent::Failed {
                        reason: "internal processing error".to_string(),
                    });
                }
            }

            if let Err(e) = std::fs::remove_dir_all(&job_dir) {
                tracing::warn!(job = %id, "cannot remove upload dir: {}", e);
            }
        });
    }
}

/// The full batch pipeline for one job: resolve every image's date,
/// group, lay out pages, and write the document. Emits progress along
/// the way and always ends with a terminal event.
fn run_job(
    handle: &JobHandle,
    images: &[ReceiptImage],
    settings: &Settings,
    engine: &dyn OcrEngine,
) {
    let total = images.len();
    handle.emit(ProgressEvent::Started {
        total_images: total,
    });

    let mut assignments = Vec::with_capacity(total);
    for (idx, receipt) in images.iter().enumerate() {
        let (decision, outcome) = match image::open(&receipt.path) {
            Ok(decoded) => {
                let decision = resolve_date(engine, &decoded, &receipt.name);
                let outcome = ImageOutcome::Assigned {
                    label: decision.label(),
                };
                (decision, outcome)
            }
            Err(e) => {
                tracing::error!(job = %handle.id, image = %receipt.name, "cannot decode: {}", e);
                // Unreadable images still get a slot in the unknown group.
                (
                    DateDecision::Unknown,
                    ImageOutcome::Error {
                        reason: e.to_string(),
                    },
                )
            }
        };

        handle.emit(ProgressEvent::ImageProcessed {
            name: receipt.name.clone(),
            index: idx + 1,
            total,
            fraction: (idx + 1) as f32 / total.max(1) as f32,
            outcome,
        });
        assignments.push((receipt.clone(), decision));
    }

    let groups = group_by_label(assignments);
    handle.emit(ProgressEvent::GeneratingDocument {
        group_count: groups.len(),
    });

    let blocks = build_page_blocks(&groups, CellBox::from_settings(settings));
    let artifact = format!("sorted_receipts_{}.docx", handle.id);
    let output_path = settings.output_dir.join(&artifact);
    let writer = DocxWriter::new(settings.cell_width_px, settings.cell_height_px);

    match writer.write(&blocks, &output_path) {
        Ok(()) => {
            tracing::info!(job = %handle.id, artifact = %artifact, "document written");
            handle.emit(ProgressEvent::Completed { artifact });
        }
        Err(e) => {
            tracing::error!(job = %handle.id, "document write failed: {}", e);
            handle.emit(ProgressEvent::Failed {
                reason: format!("document generation failed: {}", e),
            });
        }
    }
}
