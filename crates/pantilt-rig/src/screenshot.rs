//! JPEG screenshots written to a local directory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

use pantilt_core::{ScreenshotSink, SinkError};
use pantilt_models::Frame;

use crate::error::RigResult;

/// Screenshot sink writing JPEG files into one directory.
#[derive(Debug, Clone)]
pub struct DiskScreenshotSink {
    dir: PathBuf,
}

impl DiskScreenshotSink {
    /// Create the sink, creating `dir` if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> RigResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ScreenshotSink for DiskScreenshotSink {
    async fn persist(&self, frame: Arc<Frame>, file_name: String) -> Result<PathBuf, SinkError> {
        let path = self.dir.join(file_name);
        tokio::task::spawn_blocking(move || -> Result<PathBuf, SinkError> {
            let image = frame_image(&frame)?;
            let mut writer = BufWriter::new(File::create(&path)?);
            image
                .write_to(&mut writer, ImageFormat::Jpeg)
                .map_err(|e| SinkError::encode(e.to_string()))?;
            writer.flush()?;
            Ok(path)
        })
        .await
        .map_err(|e| SinkError::Task(e.to_string()))?
    }
}

/// Frames without pixel data are saved as a black image of the frame size.
fn frame_image(frame: &Frame) -> Result<RgbImage, SinkError> {
    let (width, height) = (frame.size.width, frame.size.height);
    if width == 0 || height == 0 {
        return Err(SinkError::encode(format!(
            "cannot encode a {} frame",
            frame.size
        )));
    }

    match frame.rgb_pixels() {
        Some(pixels) => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| SinkError::encode("Failed to create image buffer")),
        None => Ok(RgbImage::new(width, height)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use pantilt_models::FrameSize;

    #[tokio::test]
    async fn test_persist_creates_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskScreenshotSink::new(dir.path().join("shots")).unwrap();
        assert!(sink.dir().is_dir());

        let frame = Frame::new(1, FrameSize::new(4, 2)).with_pixels(vec![200; 4 * 2 * 3]);
        let path = sink
            .persist(Arc::new(frame), "face_centered_20240101_120000.jpg".to_string())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("shots/face_centered_20240101_120000.jpg"));
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (4, 2));
    }

    #[tokio::test]
    async fn test_persist_without_pixels_writes_blank_frame() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskScreenshotSink::new(dir.path()).unwrap();

        let path = sink
            .persist(Arc::new(Frame::new(1, FrameSize::new(8, 6))), "blank.jpg".to_string())
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_persist_rejects_empty_frame() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskScreenshotSink::new(dir.path()).unwrap();

        let result = sink
            .persist(Arc::new(Frame::new(1, FrameSize::new(0, 0))), "empty.jpg".to_string())
            .await;
        assert!(matches!(result, Err(SinkError::Encode(_))));
    }

    #[tokio::test]
    async fn test_persist_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DiskScreenshotSink::new(dir.path().join("shots")).unwrap();
        std::fs::remove_dir(sink.dir()).unwrap();

        let result = sink
            .persist(Arc::new(Frame::new(1, FrameSize::new(4, 4))), "gone.jpg".to_string())
            .await;
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
