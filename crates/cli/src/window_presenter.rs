use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use facelock_core::rendering::domain::presenter::{Hud, Presenter, PresenterInput};
use facelock_core::rendering::infrastructure::overlay_painter::OverlayPainter;
use facelock_core::selection::domain::click_inbox::ClickEvent;
use facelock_core::selection::domain::render_instruction::RenderInstruction;
use facelock_core::shared::frame::Frame;

/// Redraw cap for the preview window.
const TARGET_FPS: usize = 60;

/// Shows annotated frames in a native window and turns mouse and keyboard
/// input into [`PresenterInput`].
///
/// The window is created on the first frame so it matches the source size.
/// Keys: `q`/Escape quit, `r` reset selection, `s` snapshot.
pub struct MinifbPresenter {
    title: String,
    window: Option<Window>,
    size: (usize, usize),
    buffer: Vec<u32>,
    painter: OverlayPainter,
    clicks: ClickEdge,
}

impl MinifbPresenter {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            window: None,
            size: (0, 0),
            buffer: Vec::new(),
            painter: OverlayPainter::new(),
            clicks: ClickEdge::default(),
        }
    }

    /// (Re)creates the window when none is open or the frame size changed.
    fn ensure_window(&mut self, width: usize, height: usize) -> Result<(), minifb::Error> {
        if self.window.is_some() && self.size == (width, height) {
            return Ok(());
        }
        let mut window = Window::new(&self.title, width, height, WindowOptions::default())?;
        window.set_target_fps(TARGET_FPS);
        log::debug!("Opened {width}x{height} window");
        self.window = Some(window);
        self.size = (width, height);
        Ok(())
    }
}

impl Presenter for MinifbPresenter {
    fn present(
        &mut self,
        frame: &Frame,
        instruction: &RenderInstruction,
        hud: &Hud,
    ) -> Result<PresenterInput, Box<dyn std::error::Error>> {
        let painted = self.painter.paint(frame, instruction, hud);
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        rgb_to_argb(painted.data(), &mut self.buffer);

        self.ensure_window(width, height)?;
        let Some(window) = self.window.as_mut() else {
            return Err("preview window unavailable".into());
        };
        window.update_with_buffer(&self.buffer, width, height)?;

        if !window.is_open() {
            return Ok(PresenterInput {
                quit: true,
                ..Default::default()
            });
        }

        let mut input = keys_to_input(&window.get_keys_pressed(KeyRepeat::No));
        let down = window.get_mouse_down(MouseButton::Left);
        let pos = window.get_mouse_pos(MouseMode::Discard);
        input.click = self.clicks.update(down, pos);
        Ok(input)
    }
}

/// Packs RGB24 bytes into minifb's `0RGB` pixels, resizing `out` as needed.
fn rgb_to_argb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgb.chunks_exact(3)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32),
    );
}

fn keys_to_input(keys: &[Key]) -> PresenterInput {
    let mut input = PresenterInput::default();
    for key in keys {
        match key {
            Key::Q | Key::Escape => input.quit = true,
            Key::R => input.reset = true,
            Key::S => input.snapshot = true,
            _ => {}
        }
    }
    input
}

/// Reports a click only on the frame where the left button goes down, so a
/// held button selects once.
#[derive(Debug, Default)]
struct ClickEdge {
    was_down: bool,
}

impl ClickEdge {
    fn update(&mut self, down: bool, pos: Option<(f32, f32)>) -> Option<ClickEvent> {
        let pressed = down && !self.was_down;
        self.was_down = down;
        if !pressed {
            return None;
        }
        pos.map(|(x, y)| ClickEvent::new(x as i32, y as i32))
    }
}
