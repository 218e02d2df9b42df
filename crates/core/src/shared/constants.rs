pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Directory name used under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "FaceLock";

pub const STATUS_DETECTING: &str = "Detecting";
pub const STATUS_TRACKING: &str = "Tracking";
pub const STATUS_TRACKING_FAILED: &str = "Tracking failed!";

/// Label drawn above the tracked target.
pub const TARGET_LABEL: &str = "Target";

/// Default camera device per platform, as understood by the ffmpeg input format.
#[cfg(target_os = "linux")]
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
#[cfg(target_os = "macos")]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
#[cfg(target_os = "windows")]
pub const DEFAULT_CAMERA_DEVICE: &str = "video=Integrated Camera";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_CAMERA_DEVICE: &str = "0";
