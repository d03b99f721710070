//! Studio session example - crops a photo and generates on a background task.
//!
//! Run with: `cargo run --example studio_session -- <photo.jpg>`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use headshot::{acquire, Attire, Background, GeminiGenerator, Phase, StyleOptions, Studio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> headshot::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: studio_session <photo.jpg>");

    let generator = Arc::new(GeminiGenerator::builder().build()?);
    let mut studio = Studio::new(Arc::clone(&generator));

    studio.begin_crop(acquire::from_path(&input_path)?)?;
    let source = studio.confirm_crop()?;
    println!("Cropped to {}x{}", source.width, source.height);

    studio.set_style(
        StyleOptions::new(Attire::Blazer, Background::StudioGray).with_enhanced(true),
    );

    // The job owns its inputs, so it can run while the studio stays usable.
    let job = studio
        .begin_generation()
        .expect("a photo was just confirmed");
    let ticket = job.ticket();
    let worker = tokio::spawn(async move {
        job.run(generator.as_ref(), &headshot::Base64Encoder).await
    });

    println!("Generating (loading = {})...", studio.is_loading());
    let outcome = worker.await.expect("generation task panicked");
    studio.finish_generation(ticket, outcome);

    match studio.phase() {
        Phase::Complete(headshot) => {
            let path = headshot.download().save(".")?;
            println!("Saved {}", path.display());
        }
        Phase::Failed(failure) => println!("{failure}"),
        other => println!("Unexpected phase: {}", other.name()),
    }

    Ok(())
}
