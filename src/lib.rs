#![warn(missing_docs)]
//! Headshot - turn a cropped photo into a professional headshot.
//!
//! The crate is organised around a [`Studio`], which owns the current photo,
//! the chosen [`StyleOptions`] and a single [`Phase`] describing what is on
//! display. Photos come in through [`acquire`], are trimmed with [`crop`],
//! encoded with an [`ImageEncoder`] and sent to a [`HeadshotGenerator`].
//!
//! # Quick Start
//!
//! ```no_run
//! use headshot::{acquire, Attire, Background, GeminiGenerator, Phase, StyleOptions, Studio};
//!
//! #[tokio::main]
//! async fn main() -> headshot::Result<()> {
//!     let generator = GeminiGenerator::builder().build()?;
//!     let mut studio = Studio::new(generator);
//!
//!     studio.begin_crop(acquire::from_path("me.jpg")?)?;
//!     studio.confirm_crop()?;
//!     studio.set_style(StyleOptions::new(Attire::Blazer, Background::StudioGray));
//!
//!     match studio.generate().await {
//!         Phase::Complete(headshot) => {
//!             headshot.download().save(".")?;
//!         }
//!         Phase::Failed(failure) => eprintln!("{failure}"),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini (Google) generator
//! - `cli`: Command-line interface

mod error;
mod style;
mod types;

pub mod acquire;
pub mod crop;
pub mod encode;
pub mod generate;
pub mod studio;

// Re-export error types at crate root
pub use error::{HeadshotError, Result};

pub use acquire::{CaptureDevice, CommandCamera, CommandCameraBuilder};
pub use crop::CropSelection;
pub use encode::{Base64Encoder, ImageEncoder};
pub use generate::{build_prompt, HeadshotGenerator, HeadshotRequest};
pub use studio::{GenerationFailure, GenerationJob, Phase, Studio, Ticket};
pub use style::{Attire, Background, StyleOptions};
pub use types::{
    data_url, Download, GeneratedHeadshot, ImageFormat, ImageOrigin, RawImage, SourceImage,
    DOWNLOAD_FILE_NAME,
};

#[cfg(feature = "gemini")]
pub use generate::providers::{GeminiGenerator, GeminiGeneratorBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{HeadshotError, Result};
    pub use crate::studio::{GenerationFailure, Phase, Studio};
    pub use crate::style::{Attire, Background, StyleOptions};
    pub use crate::{acquire, CropSelection, HeadshotGenerator, ImageEncoder};

    #[cfg(feature = "gemini")]
    pub use crate::generate::providers::GeminiGenerator;
}
