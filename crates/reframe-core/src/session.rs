//! Edit session: threads crop exports and edit results into the next edit.
//!
//! An `EditSession` owns everything that belongs to one editing mode: the
//! crop engine for the loaded image, the edit history, and the cumulative
//! base input. After each accepted edit the result becomes the default base
//! for the next one, so edits stack. Switching modes discards all of it.
//!
//! The edit itself runs elsewhere (`EditCollaborator`). A host with an async
//! collaborator calls `begin_edit`, awaits the call, then hands the outcome
//! to `complete_edit`; `run_edit` does all three for a blocking collaborator.
//! Only one edit may be in flight, and a completion that arrives after a
//! mode switch is dropped.
//!
//! Results the user keeps go to the saved library, which outlives mode
//! switches and is listed per mode.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, CropConfig};
use crate::decode::{decode_encoded, decode_source, EncodedImage, LoadError, SourceImage};
use crate::history::{EditHistory, HistoryEntry};
use crate::transform::{CropEngine, RenderError};

/// The editing surface an edit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditMode {
    #[default]
    Renovation,
    Marketplace,
    MerchantCoin,
    Headshot,
    General,
}

impl EditMode {
    pub const ALL: [EditMode; 5] = [
        EditMode::Renovation,
        EditMode::Marketplace,
        EditMode::MerchantCoin,
        EditMode::Headshot,
        EditMode::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditMode::Renovation => "renovation",
            EditMode::Marketplace => "marketplace",
            EditMode::MerchantCoin => "merchant-coin",
            EditMode::Headshot => "headshot",
            EditMode::General => "general",
        }
    }

    /// Where saved results of this mode are sent.
    pub fn destination(self) -> &'static str {
        match self {
            EditMode::Renovation => "Renovision Pro",
            EditMode::Marketplace => "CDI Marketplace",
            EditMode::MerchantCoin | EditMode::Headshot | EditMode::General => "My Library",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown edit mode: {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for EditMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        EditMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Failures reported by the edit collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditFailure {
    #[error("Generation blocked by safety filters")]
    SafetyBlock,

    #[error("Generation blocked due to copyright/recitation concerns")]
    RecitationBlock,

    #[error("API key is missing")]
    MissingCredential,

    #[error("No image data returned; the model may have refused the request")]
    EmptyResponse,

    #[error("Edit request failed: {0}")]
    NetworkError(String),
}

impl EditFailure {
    /// Stable identifier for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EditFailure::SafetyBlock => "safety",
            EditFailure::RecitationBlock => "recitation",
            EditFailure::MissingCredential => "missing-credential",
            EditFailure::EmptyResponse => "empty-response",
            EditFailure::NetworkError(_) => "network",
        }
    }

    /// Rebuild a failure from its kind. Unknown kinds become `NetworkError`
    /// carrying `message`.
    pub fn from_kind(kind: &str, message: impl Into<String>) -> Self {
        match kind {
            "safety" => EditFailure::SafetyBlock,
            "recitation" => EditFailure::RecitationBlock,
            "missing-credential" => EditFailure::MissingCredential,
            "empty-response" => EditFailure::EmptyResponse,
            _ => EditFailure::NetworkError(message.into()),
        }
    }
}

/// Everything the collaborator needs for one edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub prompt_text: String,
    pub base_image: Option<Arc<EncodedImage>>,
    pub reference_images: Vec<Arc<EncodedImage>>,
    pub model_id: String,
}

/// The generative edit service.
pub trait EditCollaborator {
    fn edit(&self, request: &EditRequest) -> Result<EncodedImage, EditFailure>;
}

impl<F> EditCollaborator for F
where
    F: Fn(&EditRequest) -> Result<EncodedImage, EditFailure>,
{
    fn edit(&self, request: &EditRequest) -> Result<EncodedImage, EditFailure> {
        self(request)
    }
}

/// Ticket ids are unique across sessions.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(0);

/// Handle for one in-flight edit, returned by `EditSession::begin_edit`.
///
/// Completing consumes the ticket, so each edit is recorded at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct EditTicket {
    id: u64,
    epoch: u64,
    mode: EditMode,
    base: Option<Arc<EncodedImage>>,
    references: Vec<Arc<EncodedImage>>,
}

impl EditTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Base image the edit starts from.
    pub fn base(&self) -> Option<&Arc<EncodedImage>> {
        self.base.as_ref()
    }

    pub fn references(&self) -> &[Arc<EncodedImage>] {
        &self.references
    }

    /// Build the collaborator request for this edit.
    pub fn request(
        &self,
        prompt_text: impl Into<String>,
        model_id: impl Into<String>,
    ) -> EditRequest {
        EditRequest {
            prompt_text: prompt_text.into(),
            base_image: self.base.clone(),
            reference_images: self.references.clone(),
            model_id: model_id.into(),
        }
    }
}

/// How a completed edit was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCompletion {
    /// The result was recorded at this history index.
    Applied { index: usize },
    /// The result was dropped: the mode changed while the edit was in
    /// flight, or the ticket is not the session's current edit.
    Stale,
}

/// A result kept in the saved library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub id: u64,
    /// Mode the result was made in.
    pub mode: EditMode,
    pub result: Arc<EncodedImage>,
    /// Input the result was made from.
    pub original: Option<Arc<EncodedImage>>,
}

/// Errors raised by session operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("An edit is already in progress")]
    Busy,

    #[error("No image is loaded")]
    NoImage,

    #[error("No edit result to save")]
    NothingToSave,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Edit(#[from] EditFailure),
}

/// State for one editing mode.
#[derive(Debug)]
pub struct EditSession {
    config: CropConfig,
    mode: EditMode,
    engine: Option<CropEngine>,
    history: EditHistory<Arc<EncodedImage>>,
    base_input: Option<Arc<EncodedImage>>,
    last_failure: Option<EditFailure>,
    epoch: u64,
    in_flight: Option<u64>,
    saved: Vec<SavedImage>,
    next_saved: u64,
}

impl EditSession {
    /// Create a session in the default mode.
    pub fn new(config: CropConfig) -> Result<Self, ConfigError> {
        Self::with_mode(config, EditMode::default())
    }

    pub fn with_mode(config: CropConfig, mode: EditMode) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            mode,
            engine: None,
            history: EditHistory::new(),
            base_input: None,
            last_failure: None,
            epoch: 0,
            in_flight: None,
            saved: Vec::new(),
            next_saved: 0,
        })
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Counter bumped on every mode change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Switch modes, discarding the loaded image, history, base input and
    /// last failure. The saved library is kept. Returns `false` when `mode`
    /// is already active.
    pub fn set_mode(&mut self, mode: EditMode) -> bool {
        if mode == self.mode {
            return false;
        }
        log::debug!("session: mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.engine = None;
        self.history.reset();
        self.base_input = None;
        self.last_failure = None;
        self.epoch += 1;
        true
    }

    /// Decode `bytes` into the crop engine. On error the previous image stays.
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let image = decode_source(bytes, self.config.max_source_pixels)?;
        self.show(image)
    }

    /// Load a previous result or an upload already held as an `EncodedImage`.
    pub fn load_encoded(&mut self, image: &EncodedImage) -> Result<(), SessionError> {
        let image = decode_encoded(image, self.config.max_source_pixels)?;
        self.show(image)
    }

    fn show(&mut self, image: SourceImage) -> Result<(), SessionError> {
        match &mut self.engine {
            Some(engine) => engine.initialize(image),
            None => self.engine = Some(CropEngine::new(image, self.config.clone())?),
        }
        Ok(())
    }

    /// Drop the loaded image.
    pub fn clear_image(&mut self) {
        self.engine = None;
    }

    pub fn engine(&self) -> Option<&CropEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut CropEngine> {
        self.engine.as_mut()
    }

    /// Make a user-supplied image the default input for the next edit.
    pub fn set_base_input(&mut self, image: impl Into<Arc<EncodedImage>>) {
        self.base_input = Some(image.into());
    }

    pub fn clear_base_input(&mut self) {
        self.base_input = None;
    }

    /// Default input for the next edit.
    pub fn base_input(&self) -> Option<&Arc<EncodedImage>> {
        self.base_input.as_ref()
    }

    /// Export the current crop and make it the base input.
    pub fn export_crop(&mut self) -> Result<Arc<EncodedImage>, SessionError> {
        let engine = self.engine.as_ref().ok_or(SessionError::NoImage)?;
        let exported = Arc::new(engine.export_default()?);
        self.base_input = Some(Arc::clone(&exported));
        Ok(exported)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start an edit. `base` overrides the cumulative input when given.
    pub fn begin_edit(
        &mut self,
        base: Option<Arc<EncodedImage>>,
        references: Vec<Arc<EncodedImage>>,
    ) -> Result<EditTicket, SessionError> {
        if self.in_flight.is_some() {
            log::warn!("session: edit rejected, another edit is in flight");
            return Err(SessionError::Busy);
        }

        let id = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(id);
        self.last_failure = None;

        Ok(EditTicket {
            id,
            epoch: self.epoch,
            mode: self.mode,
            base: base.or_else(|| self.base_input.clone()),
            references,
        })
    }

    /// Finish an edit started with `begin_edit`.
    ///
    /// A failure leaves history and input untouched and is returned as is.
    /// Only the in-flight ticket is honored; any other is dropped as stale.
    pub fn complete_edit(
        &mut self,
        ticket: EditTicket,
        outcome: Result<EncodedImage, EditFailure>,
    ) -> Result<EditCompletion, EditFailure> {
        if self.in_flight != Some(ticket.id) {
            log::warn!("session: ignoring completion for edit {}, not in flight", ticket.id);
            return Ok(EditCompletion::Stale);
        }
        self.in_flight = None;

        if ticket.epoch != self.epoch {
            log::debug!(
                "session: dropping edit from {} (epoch {} != {})",
                ticket.mode,
                ticket.epoch,
                self.epoch
            );
            return Ok(EditCompletion::Stale);
        }

        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                let index = self
                    .history
                    .apply_edit(HistoryEntry::new(Arc::clone(&result), ticket.base));
                self.base_input = Some(result);
                self.last_failure = None;
                Ok(EditCompletion::Applied { index })
            }
            Err(failure) => {
                log::warn!("session: edit failed: {failure}");
                self.last_failure = Some(failure.clone());
                Err(failure)
            }
        }
    }

    /// Run a full edit against a blocking collaborator and return the result.
    pub fn run_edit<C: EditCollaborator + ?Sized>(
        &mut self,
        collaborator: &C,
        prompt_text: &str,
        model_id: &str,
        base: Option<Arc<EncodedImage>>,
        references: Vec<Arc<EncodedImage>>,
    ) -> Result<Arc<EncodedImage>, SessionError> {
        let ticket = self.begin_edit(base, references)?;
        let request = ticket.request(prompt_text, model_id);
        let outcome = collaborator.edit(&request);
        self.complete_edit(ticket, outcome)?;
        self.history
            .active_result()
            .cloned()
            .ok_or(SessionError::NoImage)
    }

    /// Step back one edit and restore its input as the base.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo();
        if moved {
            self.sync_base_input();
        }
        moved
    }

    /// Step forward one edit and restore its result as the base.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo();
        if moved {
            self.sync_base_input();
        }
        moved
    }

    fn sync_base_input(&mut self) {
        self.base_input = self
            .history
            .active_result()
            .or_else(|| self.history.active_input())
            .cloned();
    }

    pub fn history(&self) -> &EditHistory<Arc<EncodedImage>> {
        &self.history
    }

    pub fn active_result(&self) -> Option<&Arc<EncodedImage>> {
        self.history.active_result()
    }

    pub fn active_input(&self) -> Option<&Arc<EncodedImage>> {
        self.history.active_input()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn last_failure(&self) -> Option<&EditFailure> {
        self.last_failure.as_ref()
    }

    pub fn clear_failure(&mut self) {
        self.last_failure = None;
    }

    /// Keep the active result, with its input, in the saved library.
    pub fn save_active(&mut self) -> Result<&SavedImage, SessionError> {
        let result = self
            .history
            .active_result()
            .cloned()
            .ok_or(SessionError::NothingToSave)?;
        let original = self.history.active_input().cloned();

        let id = self.next_saved;
        self.next_saved += 1;
        log::info!("session: saved edit {} to {}", id, self.mode.destination());

        self.saved.push(SavedImage {
            id,
            mode: self.mode,
            result,
            original,
        });
        Ok(&self.saved[self.saved.len() - 1])
    }

    /// Saved results of `mode`, newest first.
    pub fn saved(&self, mode: EditMode) -> impl Iterator<Item = &SavedImage> + '_ {
        self.saved.iter().rev().filter(move |saved| saved.mode == mode)
    }
}
