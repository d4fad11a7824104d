use image::{GrayAlphaImage, GrayImage, LumaA, Luma, Rgba, RgbaImage};

/// Largest raster the engine will allocate (matches the canvas sanity limit).
pub const MAX_PIXELS: u64 = 256_000_000;

/// Per-pixel storage format of a [`Raster`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit R, G, B, A.
    Rgb,
    /// 8-bit value + 8-bit alpha.
    Grayscale,
    /// 8-bit index into a [`crate::palette::Palette`].
    Indexed,
}

impl PixelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Rgb => "RGB",
            PixelFormat::Grayscale => "Grayscale",
            PixelFormat::Indexed => "Indexed",
        }
    }
}

/// Mask value of RGB rasters: a fully transparent black pixel never contributes.
pub const RGB_MASK: Rgba<u8> = Rgba([0, 0, 0, 0]);
/// Mask value of grayscale rasters.
pub const GRAY_MASK: LumaA<u8> = LumaA([0, 0]);

/// A 2-D pixel grid in one of the three sprite formats.
///
/// The variant is fixed at construction, so a raster's format can never change.
/// Indexed rasters keep their palette indices in a luma plane; the mask index
/// for them is supplied by the owning sprite (its transparent colour).
#[derive(Clone, Debug, PartialEq)]
pub enum Raster {
    Rgb(RgbaImage),
    Grayscale(GrayAlphaImage),
    Indexed(GrayImage),
}

impl Raster {
    /// Allocate a zero-filled raster, refusing sizes above [`MAX_PIXELS`].
    pub fn try_new(format: PixelFormat, width: u32, height: u32) -> Option<Self> {
        let total = (width as u64) * (height as u64);
        if total > MAX_PIXELS {
            log::error!(
                "refusing to allocate {}x{} {} raster ({} pixels)",
                width,
                height,
                format.name(),
                total
            );
            return None;
        }
        Some(match format {
            PixelFormat::Rgb => Raster::Rgb(RgbaImage::new(width, height)),
            PixelFormat::Grayscale => Raster::Grayscale(GrayAlphaImage::new(width, height)),
            PixelFormat::Indexed => Raster::Indexed(GrayImage::new(width, height)),
        })
    }

    /// Indexed raster from a row-major slice of palette indices.
    pub fn indexed_from_raw(width: u32, height: u32, indices: Vec<u8>) -> Option<Self> {
        GrayImage::from_raw(width, height, indices).map(Raster::Indexed)
    }

    pub fn format(&self) -> PixelFormat {
        match self {
            Raster::Rgb(_) => PixelFormat::Rgb,
            Raster::Grayscale(_) => PixelFormat::Grayscale,
            Raster::Indexed(_) => PixelFormat::Indexed,
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Raster::Rgb(img) => img.width(),
            Raster::Grayscale(img) => img.width(),
            Raster::Indexed(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Raster::Rgb(img) => img.height(),
            Raster::Grayscale(img) => img.height(),
            Raster::Indexed(img) => img.height(),
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbaImage> {
        match self {
            Raster::Rgb(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_gray(&self) -> Option<&GrayAlphaImage> {
        match self {
            Raster::Grayscale(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&GrayImage> {
        match self {
            Raster::Indexed(img) => Some(img),
            _ => None,
        }
    }

    /// Set every pixel of an indexed raster to `index` (no-op for other formats).
    pub fn fill_index(&mut self, index: u8) {
        if let Raster::Indexed(img) = self {
            for p in img.pixels_mut() {
                *p = Luma([index]);
            }
        }
    }
}

/// Fill the inclusive rectangle `(x1, y1)..=(x2, y2)`, clipped to the image.
pub fn fill_rect(image: &mut RgbaImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgba<u8>) {
    let x1 = x1.max(0);
    let y1 = y1.max(0);
    let x2 = x2.min(image.width() as i32 - 1);
    let y2 = y2.min(image.height() as i32 - 1);
    if x1 > x2 || y1 > y2 {
        return;
    }
    for y in y1..=y2 {
        for x in x1..=x2 {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Set every pixel of `image` to `color`.
pub fn clear_image(image: &mut RgbaImage, color: Rgba<u8>) {
    for p in image.pixels_mut() {
        *p = color;
    }
}
