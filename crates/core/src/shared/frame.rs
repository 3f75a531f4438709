use ndarray::{ArrayView3, ArrayViewMut3};

use super::constants::FRAME_CHANNELS;
use super::region::ImageDimensions;

/// Owned RGBA8 pixels, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * FRAME_CHANNELS as usize
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            byte_len(width, height),
            "RGBA buffer does not match {width}x{height}"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Every byte zero, i.e. fully transparent.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![0; byte_len(width, height)], width, height)
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

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height)
    }

    /// `(row, column, channel)` view.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("buffer length checked at construction")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .expect("buffer length checked at construction")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            FRAME_CHANNELS as usize,
        )
    }
}
