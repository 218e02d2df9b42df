use std::path::PathBuf;
use std::time::Instant;

use crate::rendering::domain::presenter::{Hud, Presenter};
use crate::rendering::infrastructure::overlay_painter::OverlayPainter;
use crate::selection::domain::click_inbox::ClickInbox;
use crate::selection::domain::render_instruction::RenderInstruction;
use crate::selection::domain::selection_controller::SelectionController;
use crate::selection::domain::track_state::Mode;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoSource;
use crate::steering::domain::yaw_controller::{self, SteeringCommand, YawController};
use crate::steering::infrastructure::controller_factory::{create_controller, ControllerKind};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::image_file_writer::snapshot_path;

use super::session_logger::SessionLogger;

/// Counters reported when a session ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: usize,
    /// Frames where the tracker reported the target.
    pub frames_tracked: usize,
    /// Frames spent tracking with the target lost.
    pub frames_lost: usize,
    pub snapshots: usize,
}

impl SessionSummary {
    fn record(&mut self, instruction: &RenderInstruction) {
        self.frames += 1;
        if instruction.mode == Mode::Tracking {
            if instruction.boxes.is_empty() {
                self.frames_lost += 1;
            } else {
                self.frames_tracked += 1;
            }
        }
    }
}

/// Where snapshot requests are saved.
pub struct SnapshotSink {
    pub writer: Box<dyn ImageWriter>,
    pub dir: PathBuf,
}

/// Runs the capture → select/track → present loop until the user quits or
/// the source ends.
///
/// A click reported while frame N is on screen is applied when frame N+1
/// is processed.
pub struct TrackSessionUseCase {
    reader: Box<dyn VideoReader>,
    controller: SelectionController,
    presenter: Box<dyn Presenter>,
    steering: Option<ControllerKind>,
    snapshots: Option<SnapshotSink>,
    logger: Box<dyn SessionLogger>,
    painter: OverlayPainter,
}

impl TrackSessionUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        controller: SelectionController,
        presenter: Box<dyn Presenter>,
        steering: Option<ControllerKind>,
        snapshots: Option<SnapshotSink>,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        Self {
            reader,
            controller,
            presenter,
            steering,
            snapshots,
            logger,
            painter: OverlayPainter::new(),
        }
    }

    pub fn run(&mut self, source: &VideoSource) -> Result<SessionSummary, Box<dyn std::error::Error>> {
        let outcome = self.run_loop(source);
        self.reader.close();
        self.logger.summary();
        outcome
    }

    fn run_loop(&mut self, source: &VideoSource) -> Result<SessionSummary, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(source)?;
        let total = (!metadata.is_live()).then_some(metadata.total_frames);
        let mut yaw = self
            .steering
            .map(|kind| create_controller(kind, metadata.width));
        self.logger.info(&format!(
            "Session started on {source}; click a face to track it"
        ));

        let mut inbox = ClickInbox::new();
        let mut summary = SessionSummary::default();
        let mut fps: Option<f64> = None;
        let mut last_tick: Option<Instant> = None;

        for result in self.reader.frames() {
            let frame = result?;

            let t = Instant::now();
            let instruction = self.controller.process(&frame, inbox.take());
            self.logger.timing("select", elapsed_ms(t));
            summary.record(&instruction);

            let steering = steer_toward_target(&instruction, yaw.as_deref_mut(), frame.width());
            if let Some(cmd) = steering {
                log::debug!(
                    "x_error {:+.1}px -> yaw {:+.4} rad/s",
                    cmd.x_error_px,
                    cmd.yaw_rate
                );
                self.logger.metric("yaw_rate", cmd.yaw_rate);
            }
            let hud = Hud { fps, steering };

            let t = Instant::now();
            let input = self.presenter.present(&frame, &instruction, &hud)?;
            self.logger.timing("present", elapsed_ms(t));

            if let Some(click) = input.click {
                inbox.post(click);
            }
            if input.snapshot {
                if let Some(sink) = &self.snapshots {
                    if save_snapshot(sink, &self.painter, &frame, &instruction, &hud) {
                        summary.snapshots += 1;
                    }
                } else {
                    log::warn!("Snapshot requested but no snapshot directory is configured");
                }
            }
            if input.reset {
                self.controller.reset();
            }

            self.logger.frame_done(frame.index(), total);

            let now = Instant::now();
            if let Some(prev) = last_tick {
                let dt = now.duration_since(prev).as_secs_f64();
                if dt > 0.0 {
                    fps = Some(1.0 / dt);
                }
            }
            last_tick = Some(now);

            if input.quit {
                log::info!("Quit requested");
                break;
            }
        }

        log::info!(
            "Session ended after {} frames ({} tracked, {} lost)",
            summary.frames,
            summary.frames_tracked,
            summary.frames_lost
        );
        Ok(summary)
    }
}

fn steer_toward_target(
    instruction: &RenderInstruction,
    controller: Option<&mut (dyn YawController + 'static)>,
    frame_width: u32,
) -> Option<SteeringCommand> {
    let target = instruction.target()?;
    let controller = controller?;
    Some(yaw_controller::steer(controller, &target.bbox, frame_width))
}

/// Returns whether the snapshot was written; failures are logged, not fatal.
fn save_snapshot(
    sink: &SnapshotSink,
    painter: &OverlayPainter,
    frame: &Frame,
    instruction: &RenderInstruction,
    hud: &Hud,
) -> bool {
    let annotated = painter.paint(frame, instruction, hud);
    let path = snapshot_path(&sink.dir, frame.index());
    match sink.writer.write(&path, &annotated) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to save snapshot {}: {e}", path.display());
            false
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
