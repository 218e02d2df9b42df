use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundingBoxError {
    #[error("bounding box must have positive size, got {width}x{height}")]
    Degenerate { width: i32, height: i32 },
}

/// Axis-aligned rectangle in frame pixel coordinates.
///
/// Width and height are always positive; constructors reject anything else,
/// so every `BoundingBox` in circulation is drawable and hit-testable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, BoundingBoxError> {
        if width <= 0 || height <= 0 {
            return Err(BoundingBoxError::Degenerate { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Builds a box from float corner coordinates `(x1, y1, x2, y2)`,
    /// truncating toward the enclosing integer grid.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, BoundingBoxError> {
        let x = x1.floor() as i32;
        let y = y1.floor() as i32;
        let w = x2.ceil() as i32 - x;
        let h = y2.ceil() as i32 - y;
        Self::new(x, y, w, h)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Half-open point-in-rectangle test: the right and bottom edges are
    /// outside the box, so adjacent boxes never both claim a pixel.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        self.x <= px && px < self.right() && self.y <= py && py < self.bottom()
    }

    /// Center marker position, `(x + w/2, y + h/2)` in integer pixels.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Clips the box to `[0, frame_width) × [0, frame_height)`.
    ///
    /// Returns `None` when the box lies entirely outside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<BoundingBox> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.right().min(frame_width as i32);
        let y2 = self.bottom().min(frame_height as i32);
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1).ok()
    }

    pub fn translated(&self, dx: i32, dy: i32) -> BoundingBox {
        BoundingBox {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Corner representation `[x1, y1, x2, y2]` used by IoU and NMS helpers.
    pub fn to_corners(&self) -> [f64; 4] {
        [
            self.x as f64,
            self.y as f64,
            self.right() as f64,
            self.bottom() as f64,
        ]
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() as f64 + other.area() as f64 - inter)
    }
}
