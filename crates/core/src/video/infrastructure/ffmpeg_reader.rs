use crate::shared::frame::Frame;
use crate::shared::video_metadata::{VideoMetadata, VideoSource};
use crate::video::domain::video_reader::{SourceError, VideoReader};

/// libavdevice input format used for cameras on this platform.
#[cfg(target_os = "linux")]
const CAPTURE_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAPTURE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAPTURE_FORMAT: &str = "v4l2";

/// Frame rate requested from capture devices that need one to be named.
const CAPTURE_FRAMERATE: &str = "30";

/// Decodes frames from a video file or a capture device via ffmpeg-next.
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`].
pub struct FfmpegReader {
    stream: Option<OpenStream>,
}

/// Everything needed to keep decoding once a source is open.
struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    next_index: usize,
    phase: DecodePhase,
}

/// Where the decoder is in its input: still fed packets, draining after
/// end of input, or exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodePhase {
    Feeding,
    Draining,
    Finished,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &VideoSource) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match source {
            VideoSource::File(path) => ffmpeg_next::format::input(path)?,
            VideoSource::Camera { device } => open_capture_device(device)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::NoVideoStream(source.clone()))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = match source {
            VideoSource::File(_) => stream.frames().max(0) as usize,
            VideoSource::Camera { .. } => 0,
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: source.clone(),
        };

        log::info!(
            "Opened {source}: {width}x{height} @ {fps:.1} fps ({})",
            metadata.codec
        );

        self.stream = Some(OpenStream {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
            next_index: 0,
            phase: DecodePhase::Feeding,
        });

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.stream.as_mut() {
            Some(stream) => Box::new(FfmpegFrameIter { stream }),
            None => Box::new(std::iter::once(Err(SourceError::NotOpened.into()))),
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Frame source closed");
        }
    }
}

/// Opens a camera through the platform's libavdevice input format.
fn open_capture_device(
    device: &str,
) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAPTURE_FORMAT)
        .ok_or_else(|| SourceError::NoCaptureFormat(CAPTURE_FORMAT.to_string()))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("framerate", CAPTURE_FRAMERATE);

    let ctx = ffmpeg_next::format::open_with(&device, &format, options)?;
    Ok(ctx.input())
}

impl OpenStream {
    /// Pulls one decoded picture, if the decoder has one ready, and converts
    /// it to an RGB [`Frame`].
    fn pull(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut picture = ffmpeg_next::util::frame::video::Video::empty();
        self.decoder.receive_frame(&mut picture).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&picture, &mut rgb) {
            return Some(Err(e.into()));
        }
        let frame = Frame::new(
            packed_rgb(&rgb, self.width, self.height),
            self.width,
            self.height,
            3,
            self.next_index,
        );
        self.next_index += 1;
        Some(Ok(frame))
    }

    /// Feeds the next packet of the video stream to the decoder. Returns
    /// `false` once the container has no packets left.
    fn feed(&mut self) -> bool {
        let index = self.video_stream_index;
        let Some(packet) = self
            .ictx
            .packets()
            .find_map(|(stream, packet)| (stream.index() == index).then_some(packet))
        else {
            return false;
        };
        if let Err(e) = self.decoder.send_packet(&packet) {
            log::debug!("Skipping undecodable packet: {e}");
        }
        true
    }
}

/// Decodes on demand, one frame per `next`, so live sources are never
/// buffered ahead of the consumer.
struct FfmpegFrameIter<'a> {
    stream: &'a mut OpenStream,
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let s = &mut *self.stream;
        loop {
            match s.phase {
                DecodePhase::Finished => return None,
                DecodePhase::Draining => {
                    let frame = s.pull();
                    if frame.is_none() {
                        s.phase = DecodePhase::Finished;
                    }
                    return frame;
                }
                DecodePhase::Feeding => {
                    if let Some(frame) = s.pull() {
                        return Some(frame);
                    }
                    if !s.feed() {
                        // End of input: flush what the decoder still holds.
                        let _ = s.decoder.send_eof();
                        s.phase = DecodePhase::Draining;
                    }
                }
            }
        }
    }
}

/// Tightly packed RGB24 bytes of `rgb`, without the per-row padding ffmpeg
/// may add to each line.
fn packed_rgb(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    rgb.data(0)
        .chunks(rgb.stride(0))
        .take(height as usize)
        .flat_map(|line| &line[..row_bytes])
        .copied()
        .collect()
}
