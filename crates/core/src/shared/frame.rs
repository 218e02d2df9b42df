use ndarray::ArrayView3;

/// A single camera/video frame: contiguous RGB bytes in row-major order.
///
/// Frames are produced by the frame source and only borrowed by detectors,
/// trackers and the selection controller. Presenters paint on a clone.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Writes an RGB color at `(x, y)`; coordinates outside the frame are ignored.
    pub fn put_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let channels = self.channels as usize;
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        let n = channels.min(3);
        self.data[offset..offset + n].copy_from_slice(&rgb[..n]);
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.channels as usize;
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        &self.data[offset..offset + channels]
    }

    /// Grayscale plane (ITU-R BT.601 luma, 0.0–255.0), row-major.
    pub fn to_luma(&self) -> Vec<f32> {
        let channels = self.channels as usize;
        if channels < 3 {
            return self.data.iter().step_by(channels.max(1)).map(|&v| v as f32).collect();
        }
        self.data
            .chunks_exact(channels)
            .map(|px| 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
            .collect()
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_put_pixel_writes_rgb() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        frame.put_pixel(1, 1, [10, 20, 30]);
        assert_eq!(frame.pixel(1, 1), &[10, 20, 30]);
        assert_eq!(frame.pixel(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_put_pixel_out_of_bounds_is_ignored() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        frame.put_pixel(-1, 0, [255, 255, 255]);
        frame.put_pixel(2, 0, [255, 255, 255]);
        frame.put_pixel(0, 5, [255, 255, 255]);
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::new(vec![100u8; 12], 2, 2, 3, 0);
        let mut cloned = frame.clone();
        cloned.put_pixel(0, 0, [0, 0, 0]);
        assert_eq!(frame.pixel(0, 0), &[100, 100, 100]);
        assert_eq!(cloned.pixel(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 24], 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_to_luma_weights_channels() {
        let mut data = vec![0u8; 6]; // 2x1
        data[0] = 255; // red pixel
        data[4] = 255; // green pixel
        let frame = Frame::new(data, 2, 1, 3, 0);
        let luma = frame.to_luma();
        assert_eq!(luma.len(), 2);
        assert_relative_eq!(luma[0], 0.299 * 255.0, epsilon = 1e-3);
        assert_relative_eq!(luma[1], 0.587 * 255.0, epsilon = 1e-3);
    }
}
