//! The headshot studio: one owner of all view state.
//!
//! ```text
//! Idle ──begin_crop──▶ Cropping ──confirm_crop──▶ Ready ──begin_generation──▶ Generating
//!                        │                                                    │
//!                        └─cancel_crop─▶ (view before the crop)   Complete ◀──┴──▶ Failed
//! ```
//!
//! Generation attempts are identified by a monotonically increasing
//! [`Ticket`]. Only the most recently issued ticket can land its outcome;
//! anything older is dropped, so a slow first request can never overwrite
//! the result of a later one.

use crate::crop::{self, CropSelection};
use crate::encode::{Base64Encoder, ImageEncoder};
use crate::error::{HeadshotError, Result};
use crate::generate::{HeadshotGenerator, HeadshotRequest};
use crate::style::StyleOptions;
use crate::types::{Download, GeneratedHeadshot, RawImage, SourceImage};

/// Identifies one generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// The raw sequence number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Why a generation attempt did not produce a headshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    /// Generate was pressed before any photo was confirmed.
    #[error("Please upload or capture a photo first.")]
    MissingImage,

    /// Generate was pressed while a crop is still open.
    #[error("Finish or cancel cropping before generating.")]
    CropInProgress,

    /// The service answered without an image.
    #[error("Could not generate a headshot from this photo. Please try again with a different photo.")]
    NoImageReturned,

    /// The encoder or the service failed.
    #[error("Failed to generate headshot: {0}")]
    Service(String),
}

impl GenerationFailure {
    /// The text shown to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// What the studio is currently showing.
#[derive(Debug, Clone)]
pub enum Phase {
    /// Nothing uploaded yet.
    Idle,
    /// A crop session is open.
    Cropping {
        /// The photo being cropped.
        raw: RawImage,
        /// Pixel size of `raw`.
        dimensions: (u32, u32),
        /// Current selection.
        selection: CropSelection,
        /// View to return to on cancel.
        previous: Box<Phase>,
    },
    /// A photo is confirmed and waiting for generation.
    Ready,
    /// A generation request is in flight.
    Generating {
        /// The attempt whose outcome will be accepted.
        ticket: Ticket,
    },
    /// The last attempt produced a headshot.
    Complete(GeneratedHeadshot),
    /// The last attempt failed.
    Failed(GenerationFailure),
}

impl Phase {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cropping { .. } => "cropping",
            Self::Ready => "ready",
            Self::Generating { .. } => "generating",
            Self::Complete(_) => "complete",
            Self::Failed(_) => "failed",
        }
    }
}

/// Everything a generation attempt needs, detached from the studio.
///
/// Callers that want the UI to stay responsive can run the job on another
/// task and hand its outcome back through [`Studio::finish_generation`].
#[derive(Debug, Clone)]
#[must_use = "a generation job does nothing until run"]
pub struct GenerationJob {
    ticket: Ticket,
    image: Vec<u8>,
    style: StyleOptions,
}

impl GenerationJob {
    /// The ticket to pass back with the outcome.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// The style read when the job was issued.
    pub fn style(&self) -> StyleOptions {
        self.style
    }

    /// Encodes the photo and calls the generator.
    ///
    /// An empty string from the generator is reported as `None`.
    pub async fn run<G, E>(&self, generator: &G, encoder: &E) -> Result<Option<String>>
    where
        G: HeadshotGenerator + ?Sized,
        E: ImageEncoder + ?Sized,
    {
        let image = encoder.encode(&self.image).await?;
        let request = HeadshotRequest::new(image, self.style);

        tracing::info!(
            ticket = self.ticket.0,
            generator = generator.name(),
            attire = %self.style.attire,
            background = %self.style.background,
            enhanced = self.style.enhanced,
            "requesting headshot"
        );

        let result = generator.generate(&request).await?;
        Ok(result.filter(|b64| !b64.trim().is_empty()))
    }
}

/// Holds the photo, the style and the current phase, and drives the flow.
pub struct Studio<G, E = Base64Encoder> {
    generator: G,
    encoder: E,
    style: StyleOptions,
    source: Option<SourceImage>,
    phase: Phase,
    last_ticket: u64,
}

impl<G: HeadshotGenerator> Studio<G> {
    /// Creates a studio that encodes with standard base64.
    pub fn new(generator: G) -> Self {
        Self::with_encoder(generator, Base64Encoder)
    }
}

impl<G: HeadshotGenerator, E: ImageEncoder> Studio<G, E> {
    /// Creates a studio with a custom encoder.
    pub fn with_encoder(generator: G, encoder: E) -> Self {
        Self {
            generator,
            encoder,
            style: StyleOptions::default(),
            source: None,
            phase: Phase::Idle,
            last_ticket: 0,
        }
    }

    /// The generator in use.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The encoder in use.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current style options.
    pub fn style(&self) -> StyleOptions {
        self.style
    }

    /// Replaces the style options. Read at the next generation.
    pub fn set_style(&mut self, style: StyleOptions) {
        self.style = style;
    }

    /// The confirmed photo, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Preview URL of the confirmed photo.
    pub fn preview_url(&self) -> Option<String> {
        self.source.as_ref().map(SourceImage::preview_url)
    }

    /// True while a request is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Generating { .. })
    }

    /// The headshot on display, if the last attempt succeeded.
    pub fn result(&self) -> Option<&GeneratedHeadshot> {
        match &self.phase {
            Phase::Complete(headshot) => Some(headshot),
            _ => None,
        }
    }

    /// The failure on display, if the last attempt failed.
    pub fn failure(&self) -> Option<&GenerationFailure> {
        match &self.phase {
            Phase::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// The error text on display, if any.
    pub fn error_message(&self) -> Option<String> {
        self.failure().map(GenerationFailure::message)
    }

    /// The downloadable artifact for the headshot on display.
    pub fn download(&self) -> Option<Download> {
        self.result().map(GeneratedHeadshot::download)
    }

    /// Opens a crop session for a freshly acquired photo.
    ///
    /// The selection starts as the largest centred square. If a crop is
    /// already open it is replaced, keeping the view to return to on cancel.
    /// On error nothing changes.
    pub fn begin_crop(&mut self, raw: RawImage) -> Result<()> {
        let (width, height) = crop::dimensions(&raw)?;

        let previous = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Cropping { previous, .. } => previous,
            // The in-flight result will be dropped, so don't come back to a spinner.
            Phase::Generating { .. } => Box::new(Phase::Ready),
            other => Box::new(other),
        };

        tracing::debug!(width, height, origin = ?raw.origin, "crop session opened");
        self.phase = Phase::Cropping {
            raw,
            dimensions: (width, height),
            selection: CropSelection::centered_square(width, height),
            previous,
        };
        Ok(())
    }

    /// Moves the crop rectangle, trimming it to the photo.
    pub fn adjust_crop(&mut self, selection: CropSelection) -> Result<CropSelection> {
        match &mut self.phase {
            Phase::Cropping {
                dimensions: (width, height),
                selection: current,
                ..
            } => {
                *current = selection.clamp_to(*width, *height);
                Ok(*current)
            }
            _ => Err(HeadshotError::InvalidRequest("no crop in progress".into())),
        }
    }

    /// Applies the selection and makes the result the new source photo.
    ///
    /// Any previous photo, headshot or error is discarded. If cropping fails
    /// the session stays open.
    pub fn confirm_crop(&mut self) -> Result<&SourceImage> {
        let Phase::Cropping { raw, selection, .. } = &self.phase else {
            return Err(HeadshotError::InvalidRequest("no crop in progress".into()));
        };

        let cropped = crop::crop(raw, *selection)?;
        tracing::debug!(
            width = cropped.width,
            height = cropped.height,
            bytes = cropped.size(),
            "crop confirmed"
        );

        self.phase = Phase::Ready;
        let source = self.source.insert(cropped);
        Ok(&*source)
    }

    /// Closes the crop session without touching the source photo.
    pub fn cancel_crop(&mut self) {
        if !matches!(self.phase, Phase::Cropping { .. }) {
            return;
        }
        if let Phase::Cropping { previous, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
            self.phase = *previous;
            tracing::debug!(phase = self.phase.name(), "crop cancelled");
        }
    }

    /// Starts a generation attempt.
    ///
    /// Without a confirmed photo this moves to [`Phase::Failed`] and returns
    /// the validation failure; no job is issued. Otherwise any previous
    /// result or error is cleared and a job with a fresh ticket is returned.
    pub fn begin_generation(&mut self) -> std::result::Result<GenerationJob, GenerationFailure> {
        if matches!(self.phase, Phase::Cropping { .. }) {
            return Err(GenerationFailure::CropInProgress);
        }

        let Some(source) = &self.source else {
            tracing::debug!("generation requested without a photo");
            self.phase = Phase::Failed(GenerationFailure::MissingImage);
            return Err(GenerationFailure::MissingImage);
        };

        self.last_ticket += 1;
        let ticket = Ticket(self.last_ticket);
        let job = GenerationJob {
            ticket,
            image: source.data.clone(),
            style: self.style,
        };

        self.phase = Phase::Generating { ticket };
        tracing::debug!(ticket = ticket.0, "generation started");
        Ok(job)
    }

    /// Lands the outcome of a job.
    ///
    /// Returns false, leaving the studio untouched, if `ticket` is not the
    /// attempt currently being waited on.
    pub fn finish_generation(&mut self, ticket: Ticket, outcome: Result<Option<String>>) -> bool {
        match self.phase {
            Phase::Generating { ticket: current } if current == ticket => {}
            _ => {
                tracing::debug!(
                    ticket = ticket.0,
                    phase = self.phase.name(),
                    "dropping stale generation outcome"
                );
                return false;
            }
        }

        self.phase = match outcome {
            Ok(Some(b64)) if !b64.trim().is_empty() => {
                Phase::Complete(GeneratedHeadshot::from_base64(b64))
            }
            Ok(_) => Phase::Failed(GenerationFailure::NoImageReturned),
            Err(e) => {
                tracing::warn!(ticket = ticket.0, "headshot generation failed: {e}");
                Phase::Failed(GenerationFailure::Service(e.to_string()))
            }
        };
        tracing::debug!(ticket = ticket.0, phase = self.phase.name(), "generation finished");
        true
    }

    /// Runs a whole attempt inline: begin, call, land.
    ///
    /// Returns the phase the attempt ended in.
    pub async fn generate(&mut self) -> &Phase {
        let Ok(job) = self.begin_generation() else {
            return &self.phase;
        };
        let outcome = job.run(&self.generator, &self.encoder).await;
        self.finish_generation(job.ticket(), outcome);
        &self.phase
    }
}
