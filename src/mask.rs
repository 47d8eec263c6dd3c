use image::{GrayImage, Luma};

/// Value of a foreground pixel.
pub const FOREGROUND: u8 = 255;

/// A single channel 0/255 raster produced by the edge detector or the thinning stage.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// Creates an all-background mask.
    pub fn new(width: u32, height: u32) -> BinaryMask {
        BinaryMask {
            image: GrayImage::new(width, height),
        }
    }

    /// Builds a mask from a predicate evaluated at every pixel.
    pub fn from_fn<F: FnMut(u32, u32) -> bool>(width: u32, height: u32, mut f: F) -> BinaryMask {
        let image = GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { FOREGROUND } else { 0 }])
        });
        BinaryMask { image }
    }

    /// Binarizes a grayscale image: every non-zero pixel becomes foreground.
    pub fn from_gray(image: &GrayImage) -> BinaryMask {
        BinaryMask::from_fn(image.width(), image.height(), |x, y| {
            image.get_pixel(x, y).0[0] > 0
        })
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether `(x, y)` is foreground. Panics outside the raster.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    /// Like `get`, but treats everything outside the raster as background.
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.get(x as u32, y as u32)
    }

    /// Marks `(x, y)` as foreground or background.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.image
            .put_pixel(x, y, Luma([if value { FOREGROUND } else { 0 }]));
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v != 0).count()
    }

    /// The 0/255 raster as it is persisted.
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Unwraps the 0/255 raster.
    pub fn into_image(self) -> GrayImage {
        self.image
    }
}
