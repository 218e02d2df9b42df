use std::fmt;
use std::path::PathBuf;

/// Where frames come from: a live capture device or a video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoSource {
    Camera { device: String },
    File(PathBuf),
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Camera { device } => write!(f, "camera {device}"),
            VideoSource::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Zero for live sources, whose length is unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source: VideoSource,
}

impl VideoMetadata {
    pub fn is_live(&self) -> bool {
        matches!(self.source, VideoSource::Camera { .. })
    }
}
