use std::path::Path;

use crate::shared::frame::Frame;

/// Saves a single frame (for example an annotated snapshot) to disk.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
