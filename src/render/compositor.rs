use image::{ImageBuffer, Pixel};

use super::blend::{self, BlendMode};
use crate::palette::Palette;
use crate::raster::Raster;

/// Largest zoom level; blocks are at most `2^30` pixels on a side.
pub const MAX_ZOOM: u32 = 30;

/// Blend `src` into `dst` at `(x, y)` replicating every source pixel into a
/// `2^zoom` square block.
///
/// `(x, y)` is in destination pixels, i.e. already multiplied by the zoom
/// factor. The blend is evaluated once per source pixel against the
/// destination pixel under the top-left visible corner of its block, and the
/// result is replicated over the whole (clipped) block. Zoom levels above
/// [`MAX_ZOOM`] are clamped.
pub fn merge_zoomed<D, S, F>(
    dst: &mut ImageBuffer<D, Vec<u8>>,
    src: &ImageBuffer<S, Vec<u8>>,
    x: i64,
    y: i64,
    zoom: u32,
    mut blend: F,
) where
    D: Pixel<Subpixel = u8>,
    S: Pixel<Subpixel = u8>,
    F: FnMut(D, S) -> D,
{
    let zoom = zoom.min(MAX_ZOOM);
    let box_w: i64 = 1 << zoom;
    let box_h: i64 = 1 << zoom;

    let mut src_x: i64 = 0;
    let mut src_y: i64 = 0;
    let mut src_w = src.width() as i64;
    let mut src_h = src.height() as i64;

    let mut dst_x = x;
    let mut dst_y = y;
    let mut dst_w = src_w << zoom;
    let mut dst_h = src_h << zoom;

    // Fully outside; also keeps the clipping below free of overflow.
    if dst_x >= dst.width() as i64 || dst_y >= dst.height() as i64 || dst_x + dst_w <= 0 || dst_y + dst_h <= 0 {
        return;
    }

    // A partially clipped first block on the left/top edge; 0 = not clipped.
    let mut first_box_w: i64 = 0;
    let mut first_box_h: i64 = 0;

    // -- clipping -------------------------------------------------------
    if dst_x < 0 {
        let cut = -dst_x;
        src_x += cut >> zoom;
        src_w -= cut >> zoom;
        dst_w -= cut;
        first_box_w = box_w - (cut % box_w);
        dst_x = 0;
    }
    if dst_y < 0 {
        let cut = -dst_y;
        src_y += cut >> zoom;
        src_h -= cut >> zoom;
        dst_h -= cut;
        first_box_h = box_h - (cut % box_h);
        dst_y = 0;
    }

    let dst_width = dst.width() as i64;
    let dst_height = dst.height() as i64;
    if dst_x + dst_w > dst_width {
        src_w -= (dst_x + dst_w - dst_width) >> zoom;
        dst_w = dst_width - dst_x;
    }
    if dst_y + dst_h > dst_height {
        src_h -= (dst_y + dst_h - dst_height) >> zoom;
        dst_h = dst_height - dst_y;
    }

    if src_w <= 0 || src_h <= 0 || dst_w <= 0 || dst_h <= 0 {
        return;
    }

    let right = dst_x + dst_w; // exclusive
    let bottom = dst_y + dst_h - 1; // inclusive
    let block_w = |sx: i64| if sx == 0 && first_box_w > 0 { first_box_w } else { box_w };

    let mut scanline: Vec<D> = Vec::with_capacity(src_w as usize);
    let mut row = dst_y;

    'rows: for sy in 0..src_h {
        // Blend one source row against the current destination row.
        scanline.clear();
        let mut px = dst_x;
        for sx in 0..src_w {
            let back = *dst.get_pixel(px.min(right - 1) as u32, row as u32);
            let front = *src.get_pixel((src_x + sx) as u32, (src_y + sy) as u32);
            scanline.push(blend(back, front));
            px += block_w(sx);
        }

        let line_h = if sy == 0 && first_box_h > 0 { first_box_h } else { box_h };

        // Replicate the blended row over the block height.
        for _ in 0..line_h {
            let mut px = dst_x;
            for (sx, value) in scanline.iter().enumerate() {
                let end = (px + block_w(sx as i64)).min(right);
                for dx in px..end {
                    dst.put_pixel(dx as u32, row as u32, *value);
                }
                px = end;
                if px >= right {
                    break;
                }
            }

            row += 1;
            if row > bottom {
                break 'rows;
            }
        }
    }
}

/// Composite `src` into `dst` picking the blender for the format pair.
///
/// `mask` is the transparent index for indexed sources; RGB and grayscale
/// sources use their all-zero pixel as mask. Indexed destinations only accept
/// indexed sources.
pub fn composite_zoomed(
    dst: &mut Raster,
    src: &Raster,
    palette: &Palette,
    mask: u8,
    x: i64,
    y: i64,
    opacity: u8,
    mode: BlendMode,
    zoom: u32,
) {
    match (dst, src) {
        (Raster::Rgb(d), Raster::Rgb(s)) => {
            merge_zoomed(d, s, x, y, zoom, |back, front| blend::rgb_from_rgb(back, front, opacity, mode))
        }
        (Raster::Rgb(d), Raster::Grayscale(s)) => {
            merge_zoomed(d, s, x, y, zoom, |back, front| blend::rgb_from_gray(back, front, opacity, mode))
        }
        (Raster::Rgb(d), Raster::Indexed(s)) => merge_zoomed(d, s, x, y, zoom, |back, front| {
            blend::rgb_from_indexed(back, front[0], mask, palette, opacity, mode)
        }),
        (Raster::Grayscale(d), Raster::Grayscale(s)) => {
            merge_zoomed(d, s, x, y, zoom, |back, front| blend::gray_from_gray(back, front, opacity, mode))
        }
        (Raster::Grayscale(d), Raster::Rgb(s)) => {
            merge_zoomed(d, s, x, y, zoom, |back, front| blend::gray_from_rgb(back, front, opacity, mode))
        }
        (Raster::Grayscale(d), Raster::Indexed(s)) => merge_zoomed(d, s, x, y, zoom, |back, front| {
            blend::gray_from_indexed(back, front[0], mask, palette, opacity, mode)
        }),
        (Raster::Indexed(d), Raster::Indexed(s)) => merge_zoomed(d, s, x, y, zoom, |back, front| {
            image::Luma([blend::indexed_from_indexed(back[0], front[0], mask)])
        }),
        (Raster::Indexed(_), other) => {
            debug_assert!(false, "cannot composite {} into an indexed raster", other.format().name());
            log::error!("cannot composite {} into an indexed raster", other.format().name());
        }
    }
}
