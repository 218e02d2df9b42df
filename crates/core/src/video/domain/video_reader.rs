use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::{VideoMetadata, VideoSource};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0} has no video stream")]
    NoVideoStream(VideoSource),
    #[error("no capture input format '{0}' in this ffmpeg build")]
    NoCaptureFormat(String),
    #[error("frame source read before open")]
    NotOpened,
}

/// Sequential frame stream from a camera or a video file.
///
/// The frame loop only sees [`Frame`] and [`VideoMetadata`]; device and
/// codec handling stay behind this trait.
pub trait VideoReader: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the device or file. Safe to call more than once.
    fn close(&mut self);
}
