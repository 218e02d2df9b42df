use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to image files with the `image` crate; the format follows
/// the path's extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!(
                "Snapshots need RGB frames, got {} channels",
                frame.channels()
            )
            .into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Frame data does not match its dimensions")?;
        img.save(path)?;
        log::info!("Snapshot saved to {}", path.display());
        Ok(())
    }
}

/// File name for the snapshot of frame `frame_index`, e.g. `facelock_000042.png`.
pub fn snapshot_path(dir: &Path, frame_index: usize) -> PathBuf {
    dir.join(format!("facelock_{frame_index:06}.png"))
}
