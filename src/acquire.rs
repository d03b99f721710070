//! Getting a photo in: files, in-memory buffers and cameras.

use crate::error::{HeadshotError, Result};
use crate::types::{ImageOrigin, RawImage};
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Default still-capture command: one frame as JPEG on stdout.
pub const DEFAULT_CAMERA_COMMAND: &str = "fswebcam --no-banner -";

/// Reads a photo from disk.
pub fn from_path(path: impl AsRef<Path>) -> Result<RawImage> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read photo");
    RawImage::new(data, ImageOrigin::File(path.to_path_buf()))
}

/// Wraps an in-memory buffer.
pub fn from_bytes(data: Vec<u8>) -> Result<RawImage> {
    RawImage::new(data, ImageOrigin::Bytes)
}

/// Drains a reader (e.g. stdin) into a photo.
pub fn from_reader(mut reader: impl Read) -> Result<RawImage> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    RawImage::new(data, ImageOrigin::Bytes)
}

/// A device that can take a single still photo.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Captures one frame. The device is released before this returns.
    async fn capture(&self) -> Result<RawImage>;
}

/// Builder for [`CommandCamera`].
#[derive(Debug, Clone, Default)]
pub struct CommandCameraBuilder {
    command: Option<String>,
    timeout: Option<Duration>,
}

impl CommandCameraBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capture command. Falls back to `HEADSHOT_CAMERA_CMD`,
    /// then [`DEFAULT_CAMERA_COMMAND`].
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Sets how long to wait for the frame (default 15s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the camera, splitting the command line into program and args.
    pub fn build(self) -> Result<CommandCamera> {
        let command = self
            .command
            .or_else(|| std::env::var("HEADSHOT_CAMERA_CMD").ok())
            .unwrap_or_else(|| DEFAULT_CAMERA_COMMAND.to_string());

        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| HeadshotError::Capture("camera command is empty".into()))?;

        Ok(CommandCamera {
            program,
            args: words.collect(),
            timeout: self.timeout.unwrap_or(Duration::from_secs(15)),
        })
    }
}

/// Captures a still by running an external program that writes the
/// encoded frame to stdout (`fswebcam`, `libcamera-still -o -`, `imagesnap -`).
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCamera {
    /// Creates a new `CommandCameraBuilder`.
    pub fn builder() -> CommandCameraBuilder {
        CommandCameraBuilder::new()
    }

    /// The program that will be run.
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl CaptureDevice for CommandCamera {
    async fn capture(&self) -> Result<RawImage> {
        tracing::debug!(program = %self.program, args = ?self.args, "capturing still");

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| HeadshotError::Timeout(self.timeout))?
            .map_err(|e| HeadshotError::Capture(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HeadshotError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        RawImage::new(output.stdout, ImageOrigin::Camera)
            .map_err(|e| HeadshotError::Capture(format!("camera returned no usable frame: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::tests::png_fixture;
    use crate::types::ImageFormat;

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("me.png");
        std::fs::write(&path, png_fixture(4, 4, [1, 2, 3])).unwrap();

        let raw = from_path(&path).unwrap();
        assert_eq!(raw.format, ImageFormat::Png);
        assert_eq!(raw.origin, ImageOrigin::File(path));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, HeadshotError::Io(_)));
    }

    #[test]
    fn test_from_reader() {
        let data = png_fixture(2, 2, [9, 9, 9]);
        let raw = from_reader(std::io::Cursor::new(data.clone())).unwrap();
        assert_eq!(raw.data, data);
        assert_eq!(raw.origin, ImageOrigin::Bytes);
    }

    #[test]
    fn test_from_bytes_rejects_text() {
        assert!(matches!(
            from_bytes(b"hello, this is not a photo".to_vec()),
            Err(HeadshotError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_builder_splits_command() {
        let camera = CommandCamera::builder()
            .command("libcamera-still -n -o -")
            .build()
            .unwrap();
        assert_eq!(camera.program(), "libcamera-still");
        assert_eq!(camera.args, vec!["-n", "-o", "-"]);
    }

    #[test]
    fn test_builder_rejects_blank_command() {
        let err = CommandCamera::builder().command("   ").build().unwrap_err();
        assert!(matches!(err, HeadshotError::Capture(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_reads_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, png_fixture(3, 3, [0, 255, 0])).unwrap();

        let camera = CommandCamera::builder()
            .command(format!("cat {}", path.display()))
            .build()
            .unwrap();
        let raw = camera.capture().await.unwrap();
        assert_eq!(raw.origin, ImageOrigin::Camera);
        assert_eq!(raw.format, ImageFormat::Png);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_failure_reports_status() {
        let camera = CommandCamera::builder().command("false").build().unwrap();
        let err = camera.capture().await.unwrap_err();
        assert!(matches!(err, HeadshotError::Capture(_)));
    }
}
