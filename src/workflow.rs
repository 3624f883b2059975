//! The workflow orchestrator: one source image, one set of parameters, at
//! most one submission in flight.
//!
//! ## States
//!
//! ```text
//!          upload            submit              resolve
//!  Idle ──────────▶ Ready ──────────▶ Submitting ──────────▶ ReadyWithResult
//!   ▲                 ▲                                  └─▶ ReadyWithError
//!   └──── reset ──────┴──────────── (any state) ───────────────────┘
//! ```
//!
//! ## Stale responses
//!
//! A remote call cannot be cancelled. If the user resets or uploads a new
//! image while one is running, its eventual outcome must not overwrite the
//! newer state. Two counters guard against that:
//!
//! * the **epoch**, advanced by every successful upload and every reset; a
//!   submission captures it up front and its outcome is applied only if the
//!   epoch is unchanged on return;
//! * the **sequence** of the submission currently in flight; `is_submitting`
//!   is cleared on return only if that submission is still the one in flight
//!   (a reset already cleared it, and a later submission owns it).
//!
//! File uploads take an upload ticket before reading; only the most recent
//! upload is applied, and only if no reset happened during the read.
//!
//! The state lives behind a `std::sync::Mutex` that is never held across an
//! `.await`, so reset and upload stay responsive while a call is pending.

use crate::config::{resolve_enhancer, EnhanceConfig};
use crate::error::{EnhanceError, ErrorKind};
use crate::output::{
    result_file_name, save_result, EnhancedImage, PreviewHandle, DEFAULT_RESULT_SUFFIX,
};
use crate::params::{CreativityLevel, TransformParameters, UpscaleFactor};
use crate::pipeline::encode::{encode_bytes, EncodedImage};
use crate::pipeline::input::read_image_file;
use crate::pipeline::remote::ImageEnhancer;
use crate::progress::{NoopObserver, Observer};
use crate::prompts::compose_instruction;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Where the workflow currently is, derived from [`WorkflowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Ready,
    Submitting,
    ReadyWithResult,
    ReadyWithError,
}

/// Snapshot of everything a presentation layer needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub source_image: Option<EncodedImage>,
    pub source_preview: Option<PreviewHandle>,
    pub result_preview: Option<PreviewHandle>,
    pub result: Option<EnhancedImage>,
    pub parameters: TransformParameters,
    pub is_submitting: bool,
    pub last_error: Option<String>,
    pub last_error_kind: Option<ErrorKind>,
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        if self.is_submitting {
            Phase::Submitting
        } else if self.result_preview.is_some() {
            Phase::ReadyWithResult
        } else if self.last_error.is_some() && self.source_image.is_some() {
            Phase::ReadyWithError
        } else if self.source_image.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.source_image.is_some() && !self.is_submitting
    }

    fn set_error(&mut self, err: &EnhanceError) {
        self.last_error = Some(err.to_string());
        self.last_error_kind = Some(err.kind());
    }

    fn clear_error(&mut self) {
        self.last_error = None;
        self.last_error_kind = None;
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.result_preview = None;
    }
}

/// What happened to a call to [`Workflow::submit`].
///
/// The state snapshot remains the source of truth; this only saves callers
/// from diffing snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result was stored in `result_preview`.
    Completed,
    /// The remote call failed; the message is in `last_error`.
    Failed(ErrorKind),
    /// Nothing was sent (no image uploaded).
    Rejected(ErrorKind),
    /// Another submission was already in flight; nothing happened.
    AlreadySubmitting,
    /// A reset or upload happened meanwhile; the outcome was dropped.
    Discarded,
}

#[derive(Default)]
struct Inner {
    state: WorkflowState,
    epoch: u64,
    last_sequence: u64,
    in_flight: Option<u64>,
    last_upload: u64,
}

/// Owns workflow state and sequences upload → compose → enhance.
pub struct Workflow {
    enhancer: Arc<dyn ImageEnhancer>,
    observer: Observer,
    result_suffix: String,
    inner: Mutex<Inner>,
}

impl Workflow {
    pub fn new(enhancer: Arc<dyn ImageEnhancer>) -> Self {
        Self {
            enhancer,
            observer: Arc::new(NoopObserver),
            result_suffix: DEFAULT_RESULT_SUFFIX.to_string(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Build a workflow from config, failing fast if no enhancer can be made.
    pub fn from_config(config: &EnhanceConfig) -> Result<Self, EnhanceError> {
        let enhancer = resolve_enhancer(config)?;
        info!("Workflow ready (enhancer: {})", enhancer.name());
        Ok(Self::new(enhancer).with_result_suffix(&config.result_suffix))
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_result_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.result_suffix = suffix.into();
        self
    }

    pub fn with_parameters(self, parameters: TransformParameters) -> Self {
        self.lock().state.parameters = parameters;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state snapshot.
    pub fn state(&self) -> WorkflowState {
        self.lock().state.clone()
    }

    // ── Uploads ──────────────────────────────────────────────────────────

    /// Read an image file and make it the new source image.
    ///
    /// On failure the previous source image is kept and `last_error` is set
    /// to `Failed to read the image file.`
    ///
    /// If another upload or a reset is issued while the file is being read,
    /// this one is superseded: its image is dropped and the state is left to
    /// the newer operation.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<(), ErrorKind> {
        let (ticket, epoch) = {
            let mut inner = self.lock();
            inner.state.clear_error();
            inner.last_upload += 1;
            (inner.last_upload, inner.epoch)
        };

        let read = read_image_file(path.as_ref()).await;

        let mut inner = self.lock();
        if inner.last_upload != ticket || inner.epoch != epoch {
            debug!("Upload {} superseded; dropped", ticket);
            return Ok(());
        }
        match read {
            Ok(image) => {
                let uploaded = install_source(&mut inner, image);
                drop(inner);
                self.notify_upload(uploaded);
                Ok(())
            }
            Err(err) => {
                warn!("Upload failed: {}", err);
                inner.state.set_error(&err);
                Err(err.kind())
            }
        }
    }

    /// Make an in-memory buffer the new source image (e.g. a drop event).
    pub fn upload_bytes(&self, bytes: &[u8], media_type: &str, display_name: &str) {
        self.apply_upload(encode_bytes(bytes, media_type, display_name));
    }

    fn apply_upload(&self, image: EncodedImage) {
        let uploaded = install_source(&mut self.lock(), image);
        self.notify_upload(uploaded);
    }

    fn notify_upload(&self, (name, media_type, len): (String, String, usize)) {
        debug!("Source image set: {} ({}, {} bytes base64)", name, media_type, len);
        self.observer.on_upload(&name, &media_type, len);
    }

    // ── Parameters ───────────────────────────────────────────────────────

    pub fn set_instruction(&self, instruction: impl Into<String>) {
        self.lock().state.parameters.instruction = instruction.into();
    }

    pub fn set_upscale_factor(&self, factor: UpscaleFactor) {
        self.lock().state.parameters.upscale_factor = factor;
    }

    pub fn set_creativity_level(&self, level: CreativityLevel) {
        self.lock().state.parameters.creativity_level = level;
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Send the current image and parameters to the enhancer.
    ///
    /// Without a source image this sets `Please upload an image first.` and
    /// never calls the enhancer. While another submission is in flight it is
    /// a no-op.
    pub async fn submit(&self) -> SubmitOutcome {
        let (sequence, epoch, image, instruction) = {
            let mut inner = self.lock();
            if inner.state.is_submitting {
                debug!("Submit ignored: submission {:?} in flight", inner.in_flight);
                return SubmitOutcome::AlreadySubmitting;
            }
            let Some(image) = inner.state.source_image.clone() else {
                let err = EnhanceError::MissingImage;
                inner.state.set_error(&err);
                return SubmitOutcome::Rejected(err.kind());
            };

            inner.last_sequence += 1;
            let sequence = inner.last_sequence;
            inner.in_flight = Some(sequence);
            inner.state.is_submitting = true;
            inner.state.clear_error();
            inner.state.clear_result();

            let p = &inner.state.parameters;
            let instruction =
                compose_instruction(&p.instruction, p.upscale_factor, p.creativity_level);
            (sequence, inner.epoch, image, instruction)
        };

        info!(
            "Submission {}: {} via {}",
            sequence,
            image.display_name,
            self.enhancer.name()
        );
        self.observer.on_submit_start(sequence, &image.display_name);

        let outcome = self.enhancer.enhance(&image, &instruction).await;

        let applied = {
            let mut inner = self.lock();
            let current = inner.in_flight == Some(sequence);
            if current {
                inner.in_flight = None;
                inner.state.is_submitting = false;
            }
            if !current || inner.epoch != epoch {
                None
            } else {
                match &outcome {
                    Ok(result) => {
                        inner.state.result_preview = Some(PreviewHandle::new(result.data_uri()));
                        inner.state.result = Some(result.clone());
                        inner.state.clear_error();
                    }
                    Err(err) => inner.state.set_error(err),
                }
                Some(())
            }
        };

        match (applied, outcome) {
            (None, _) => {
                info!("Submission {} resolved after reset/upload; discarded", sequence);
                self.observer.on_stale_discarded(sequence);
                SubmitOutcome::Discarded
            }
            (Some(()), Ok(result)) => {
                info!("Submission {} complete ({})", sequence, result.media_type);
                self.observer
                    .on_submit_complete(sequence, &result.media_type, result.payload.len());
                SubmitOutcome::Completed
            }
            (Some(()), Err(err)) => {
                warn!("Submission {} failed: {}", sequence, err);
                self.observer.on_submit_error(sequence, &err.to_string());
                SubmitOutcome::Failed(err.kind())
            }
        }
    }

    // ── Reset ────────────────────────────────────────────────────────────

    /// Return to idle. Parameters are kept; any in-flight outcome is dropped.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.in_flight = None;
            let parameters = std::mem::take(&mut inner.state.parameters);
            inner.state = WorkflowState {
                parameters,
                ..WorkflowState::default()
            };
        }
        debug!("Workflow reset");
        self.observer.on_reset();
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// Download name for the current result, derived from the source name.
    pub fn result_file_name(&self) -> Option<String> {
        let inner = self.lock();
        inner
            .state
            .source_image
            .as_ref()
            .map(|img| result_file_name(&img.display_name, &self.result_suffix))
    }

    /// Write the current result to `target`.
    ///
    /// `target` names a directory when it already is one, ends with a path
    /// separator, or has no extension; the directory is created if needed
    /// and the derived file name is used inside it. Otherwise `target` is
    /// the file to write. Returns the path written.
    pub fn save_result(&self, target: impl AsRef<Path>) -> Result<PathBuf, EnhanceError> {
        let (result, name) = {
            let inner = self.lock();
            let result = inner.state.result.clone().ok_or(EnhanceError::NoResult)?;
            let name = inner
                .state
                .source_image
                .as_ref()
                .map(|img| result_file_name(&img.display_name, &self.result_suffix));
            (result, name)
        };

        let target = target.as_ref();
        let path = match name {
            Some(name) if names_directory(target) => {
                std::fs::create_dir_all(target).map_err(|source| {
                    EnhanceError::OutputWriteFailed {
                        path: target.to_path_buf(),
                        source,
                    }
                })?;
                target.join(name)
            }
            _ => target.to_path_buf(),
        };
        save_result(&result, &path)?;
        Ok(path)
    }
}

/// Make `image` the source image. Returns name, media type and payload length.
fn install_source(inner: &mut Inner, image: EncodedImage) -> (String, String, usize) {
    let uploaded = (
        image.display_name.clone(),
        image.media_type.clone(),
        image.payload.len(),
    );
    inner.epoch += 1;
    inner.last_upload += 1;
    inner.state.source_preview = Some(PreviewHandle::new(image.to_data_uri()));
    inner.state.source_image = Some(image);
    inner.state.clear_result();
    inner.state.clear_error();
    uploaded
}

fn names_directory(target: &Path) -> bool {
    target.is_dir()
        || target
            .as_os_str()
            .to_string_lossy()
            .ends_with(std::path::is_separator)
        || target.extension().is_none()
}
