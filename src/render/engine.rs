use image::{Rgba, RgbaImage};

use super::blend::{self, mul_un8, BlendMode};
use super::checkerboard::{self, render_checkerboard, CheckerboardConfig};
use super::compositor::{composite_zoomed, merge_zoomed, MAX_ZOOM};
use crate::document::Document;
use crate::palette::Palette;
use crate::raster::{clear_image, PixelFormat, Raster};
use crate::sprite::{FrameNumber, Layer, LayerId, LayerKind};

/// Which layer categories a walker pass draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPass {
    pub background: bool,
    pub transparent: bool,
}

impl LayerPass {
    pub const ALL: Self = Self { background: true, transparent: true };
    pub const BACKGROUND: Self = Self { background: true, transparent: false };
    pub const TRANSPARENT: Self = Self { background: false, transparent: true };

    fn accepts(self, layer: &Layer) -> bool {
        if layer.is_background() { self.background } else { self.transparent }
    }
}

/// Image drawn in place of a layer's cel while the user is editing it.
#[derive(Clone, Copy, Debug)]
pub struct PreviewImage<'a> {
    pub layer: LayerId,
    pub image: &'a Raster,
}

/// Flattens a document's layer tree into RGB at an integer zoom.
///
/// One engine is built per render request; it only reads the document.
#[derive(Clone, Debug)]
pub struct RenderEngine<'a> {
    document: &'a Document,
    current_layer: Option<LayerId>,
    current_frame: FrameNumber,
    preview: Option<PreviewImage<'a>>,
    checkerboard: CheckerboardConfig,
}

impl<'a> RenderEngine<'a> {
    /// The checkerboard appearance is snapshotted from the process-wide config.
    pub fn new(document: &'a Document, current_layer: Option<LayerId>, current_frame: FrameNumber) -> Self {
        Self {
            document,
            current_layer,
            current_frame,
            preview: None,
            checkerboard: checkerboard::config(),
        }
    }

    /// Substitute `image` for `layer`'s cel on the current frame; `None` clears.
    pub fn with_preview(mut self, layer: LayerId, image: Option<&'a Raster>) -> Self {
        self.set_preview_image(layer, image);
        self
    }

    pub fn set_preview_image(&mut self, layer: LayerId, image: Option<&'a Raster>) {
        self.preview = image.map(|image| PreviewImage { layer, image });
    }

    pub fn with_checkerboard(mut self, config: CheckerboardConfig) -> Self {
        self.checkerboard = config;
        self
    }

    pub fn current_frame(&self) -> FrameNumber {
        self.current_frame
    }

    /// Render `frame` into a new `width` x `height` RGB image.
    ///
    /// `source_x`, `source_y`, `width` and `height` are in destination
    /// pixels (zoom already applied). Zoom levels above [`MAX_ZOOM`] are
    /// clamped. Returns `None` if the image cannot be allocated.
    pub fn render_sprite(
        &self,
        source_x: i32,
        source_y: i32,
        width: u32,
        height: u32,
        frame: FrameNumber,
        zoom: u32,
        draw_tiled_bg: bool,
    ) -> Option<RgbaImage> {
        let zoom = zoom.min(MAX_ZOOM);
        let sprite = &self.document.sprite;
        let need_checked_bg = sprite.background_layer().map_or(true, |bg| !bg.is_readable());

        let bg_color = match sprite.pixel_format() {
            PixelFormat::Indexed if !need_checked_bg => sprite.palette(frame).entry(sprite.transparent_index()),
            _ => Rgba([0, 0, 0, 0]),
        };

        let Some(Raster::Rgb(mut image)) = Raster::try_new(PixelFormat::Rgb, width, height) else {
            return None;
        };

        if need_checked_bg && draw_tiled_bg {
            render_checkerboard(&mut image, source_x, source_y, zoom, &self.checkerboard);
        } else {
            clear_image(&mut image, bg_color);
        }

        let mut image = Raster::Rgb(image);
        let root = sprite.root();
        let onion = &self.document.onion_skin;

        if onion.enabled {
            // Background of the current frame, drawn once at full opacity.
            self.render_layer(root, &mut image, source_x, source_y, frame, zoom, LayerPass::BACKGROUND, 255);

            // Ghosts of the neighbouring frames.
            let first = frame as i64 - onion.prev_frames as i64;
            let last = frame as i64 + onion.next_frames as i64;
            for f in first..=last {
                if f == frame as i64 || f < 0 || f > sprite.last_frame() as i64 {
                    continue;
                }
                let distance = (f - frame as i64).unsigned_abs() as u32;
                let Some(opacity) = onion.opacity_at(distance) else {
                    continue;
                };
                self.render_layer(root, &mut image, source_x, source_y, f as FrameNumber, zoom, LayerPass::TRANSPARENT, opacity);
            }

            // Current frame on top of its ghosts.
            self.render_layer(root, &mut image, source_x, source_y, frame, zoom, LayerPass::TRANSPARENT, 255);
        } else {
            self.render_layer(root, &mut image, source_x, source_y, frame, zoom, LayerPass::ALL, 255);
        }

        match image {
            Raster::Rgb(image) => Some(image),
            _ => None,
        }
    }

    /// Draw one image at `(x, y)` (destination pixels) with no layer logic.
    pub fn render_image(rgb_image: &mut RgbaImage, src_image: &Raster, palette: &Palette, mask: u8, x: i32, y: i32, zoom: u32) {
        let (x, y) = (x as i64, y as i64);
        match src_image {
            Raster::Rgb(src) => merge_zoomed(rgb_image, src, x, y, zoom, |back, front| {
                blend::rgb_from_rgb(back, front, 255, BlendMode::Normal)
            }),
            Raster::Grayscale(src) => merge_zoomed(rgb_image, src, x, y, zoom, |back, front| {
                blend::rgb_from_gray(back, front, 255, BlendMode::Normal)
            }),
            Raster::Indexed(src) => merge_zoomed(rgb_image, src, x, y, zoom, |back, front| {
                blend::rgb_from_indexed(back, front[0], mask, palette, 255, BlendMode::Normal)
            }),
        }
    }

    /// Recursively composite `layer` for `frame` into `image`.
    ///
    /// `opacity` multiplies every cel's own opacity (onion-skin falloff).
    pub fn render_layer(
        &self,
        layer: &Layer,
        image: &mut Raster,
        source_x: i32,
        source_y: i32,
        frame: FrameNumber,
        zoom: u32,
        pass: LayerPass,
        opacity: u8,
    ) {
        if !layer.is_readable() {
            return;
        }

        let zoom = zoom.min(MAX_ZOOM);
        let sprite = &self.document.sprite;

        match &layer.kind {
            LayerKind::Image(image_layer) => {
                if pass.accepts(layer) {
                    if let Some(cel) = image_layer.cel(frame) {
                        if let Some(src) = self.cel_image(layer.id, frame, cel.image) {
                            let cel_opacity = mul_un8(cel.opacity as u32, opacity as u32) as u8;
                            composite_zoomed(
                                image,
                                src,
                                sprite.palette(frame),
                                sprite.transparent_index(),
                                dest_coord(cel.x, zoom, source_x),
                                dest_coord(cel.y, zoom, source_y),
                                cel_opacity,
                                image_layer.blend_mode,
                                zoom,
                            );
                        }
                    }
                }
            }
            LayerKind::Folder(children) => {
                for child in children {
                    self.render_layer(child, image, source_x, source_y, frame, zoom, pass, opacity);
                }
            }
        }

        // Extras
        if self.current_layer == Some(layer.id) {
            if let Some(extra) = &self.document.extra_cel {
                if extra.cel.opacity > 0 {
                    composite_zoomed(
                        image,
                        &extra.image,
                        sprite.palette(frame),
                        sprite.transparent_index(),
                        dest_coord(extra.cel.x, zoom, source_x),
                        dest_coord(extra.cel.y, zoom, source_y),
                        extra.cel.opacity,
                        BlendMode::Normal,
                        zoom,
                    );
                }
            }
        }
    }

    /// The image a cel draws: the preview when it targets this layer on the
    /// current frame, otherwise the stock image.
    fn cel_image(&self, layer: LayerId, frame: FrameNumber, stock_index: usize) -> Option<&'a Raster> {
        if let Some(preview) = self.preview {
            if preview.layer == layer && frame == self.current_frame {
                return Some(preview.image);
            }
        }
        let image = self.document.sprite.stock_image(stock_index);
        if image.is_none() {
            log::debug!("cel on layer {:?} frame {} references missing stock image {}", layer, frame, stock_index);
        }
        image
    }
}

/// Sprite coordinate to destination pixels. Fits in `i64` for any `i32`
/// input up to [`MAX_ZOOM`].
#[inline]
fn dest_coord(v: i32, zoom: u32, source: i32) -> i64 {
    ((v as i64) << zoom) - source as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::OnionSkin;
    use crate::render::checkerboard::CheckerboardType;
    use crate::sprite::{Cel, Sprite};
    use image::GrayImage;
    use pretty_assertions::assert_eq;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const C1: Rgba<u8> = Rgba([128, 128, 128, 255]);
    const C2: Rgba<u8> = Rgba([192, 192, 192, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn checker_2x2() -> CheckerboardConfig {
        CheckerboardConfig { kind: CheckerboardType::Tile2x2, zoom: false, color1: C1, color2: C2 }
    }

    fn solid(w: u32, h: u32, c: Rgba<u8>) -> Raster {
        Raster::Rgb(RgbaImage::from_pixel(w, h, c))
    }

    fn render(doc: &Document, frame: FrameNumber, w: u32, h: u32, zoom: u32, tiled: bool) -> RgbaImage {
        RenderEngine::new(doc, None, frame)
            .with_checkerboard(checker_2x2())
            .render_sprite(0, 0, w, h, frame, zoom, tiled)
            .unwrap()
    }

    #[test]
    fn indexed_sprite_over_checkerboard() {
        let mut sprite = Sprite::new(PixelFormat::Indexed, 2, 2);
        sprite.set_palette(0, Palette::new(vec![CLEAR, RED]));
        let layer = sprite.add_image_layer(None, "Layer 1").unwrap();
        let img = sprite.add_image(Raster::Indexed(GrayImage::from_pixel(2, 2, image::Luma([1]))));
        sprite.set_cel(layer, 0, Cel::new(img).at(1, 1));
        let doc = Document::new(sprite);

        let out = render(&doc, 0, 4, 4, 0, true);
        for y in 0..4u32 {
            for x in 0..4u32 {
                let expected = if (1..3).contains(&x) && (1..3).contains(&y) {
                    RED
                } else if ((x / 2) + (y / 2)) % 2 == 1 {
                    C1
                } else {
                    C2
                };
                assert_eq!(*out.get_pixel(x, y), expected, "({x},{y})");
            }
        }
    }

    #[test]
    fn without_tiled_bg_clears_to_transparent() {
        let sprite = Sprite::new(PixelFormat::Rgb, 2, 2);
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 3, 3, 0, false);
        assert!(out.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn indexed_background_clears_to_transparent_entry() {
        let mut sprite = Sprite::new(PixelFormat::Indexed, 2, 2);
        sprite.set_palette(0, Palette::new(vec![GREEN, RED]));
        sprite.add_background_layer();
        let doc = Document::new(sprite);
        // background layer has no cel: the clear colour shows through
        let out = render(&doc, 0, 2, 2, 0, true);
        assert!(out.pixels().all(|p| *p == GREEN));
    }

    #[test]
    fn hidden_background_still_gets_checkerboard() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 2);
        let bg = sprite.add_background_layer();
        let img = sprite.add_image(solid(2, 2, BLUE));
        sprite.set_cel(bg, 0, Cel::new(img));
        sprite.layer_mut(bg).unwrap().visible = false;
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 2, 2, 0, true);
        assert!(out.pixels().all(|p| *p == C2));
    }

    #[test]
    fn later_layers_draw_on_top() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 2);
        let bottom = sprite.add_image_layer(None, "bottom").unwrap();
        let top = sprite.add_image_layer(None, "top").unwrap();
        let red = sprite.add_image(solid(2, 2, RED));
        let blue = sprite.add_image(solid(1, 1, BLUE));
        sprite.set_cel(bottom, 0, Cel::new(red));
        sprite.set_cel(top, 0, Cel::new(blue).at(1, 0));
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 2, 2, 0, false);
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 0), BLUE);
        assert_eq!(*out.get_pixel(1, 1), RED);
    }

    #[test]
    fn hidden_folder_hides_its_subtree() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 2);
        let folder = sprite.add_folder(None, "group").unwrap();
        let inner = sprite.add_image_layer(Some(folder), "inner").unwrap();
        let red = sprite.add_image(solid(2, 2, RED));
        sprite.set_cel(inner, 0, Cel::new(red));
        sprite.layer_mut(folder).unwrap().visible = false;
        let doc = Document::new(sprite);

        let engine = RenderEngine::new(&doc, None, 0);
        for pass in [LayerPass::ALL, LayerPass::BACKGROUND, LayerPass::TRANSPARENT] {
            let mut image = solid(2, 2, GREEN);
            engine.render_layer(doc.sprite.root(), &mut image, 0, 0, 0, 0, pass, 255);
            assert_eq!(image, solid(2, 2, GREEN));
        }
    }

    #[test]
    fn pass_filters_background_and_transparent() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 1, 1);
        let bg = sprite.add_background_layer();
        let layer = sprite.add_image_layer(None, "top").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        let blue = sprite.add_image(Raster::Rgb(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 128]))));
        sprite.set_cel(bg, 0, Cel::new(red));
        sprite.set_cel(layer, 0, Cel::new(blue));
        let doc = Document::new(sprite);
        let engine = RenderEngine::new(&doc, None, 0);
        let root = doc.sprite.root();

        let mut only_bg = solid(1, 1, GREEN);
        engine.render_layer(root, &mut only_bg, 0, 0, 0, 0, LayerPass::BACKGROUND, 255);
        assert_eq!(only_bg, solid(1, 1, RED));

        let mut only_top = solid(1, 1, GREEN);
        engine.render_layer(root, &mut only_top, 0, 0, 0, 0, LayerPass::TRANSPARENT, 255);
        assert_ne!(only_top.as_rgb().unwrap().get_pixel(0, 0)[2], 0);
        assert_ne!(only_top.as_rgb().unwrap().get_pixel(0, 0)[1], 0);
        assert_eq!(only_top.as_rgb().unwrap().get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn missing_stock_image_is_skipped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 1);
        let broken = sprite.add_image_layer(None, "broken").unwrap();
        let fine = sprite.add_image_layer(None, "fine").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(broken, 0, Cel::new(42));
        sprite.set_cel(fine, 0, Cel::new(red).at(1, 0));
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 2, 1, 0, false);
        assert_eq!(*out.get_pixel(0, 0), CLEAR);
        assert_eq!(*out.get_pixel(1, 0), RED);
    }

    #[test]
    fn cel_opacity_is_applied() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 1, 1);
        let bg = sprite.add_background_layer();
        let layer = sprite.add_image_layer(None, "top").unwrap();
        let black = sprite.add_image(solid(1, 1, Rgba([0, 0, 0, 255])));
        let white = sprite.add_image(solid(1, 1, Rgba([255, 255, 255, 255])));
        sprite.set_cel(bg, 0, Cel::new(black));
        sprite.set_cel(layer, 0, Cel::new(white).with_opacity(128));
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 1, 1, 0, true);
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn zero_opacity_cel_leaves_clear_background() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 1, 1);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red).with_opacity(0));
        let doc = Document::new(sprite);
        let out = render(&doc, 0, 1, 1, 0, false);
        assert_eq!(*out.get_pixel(0, 0), CLEAR);
    }

    #[test]
    fn extreme_scroll_does_not_overflow() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 1, 1);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red).at(-2, 0));
        let doc = Document::new(sprite);
        let engine = RenderEngine::new(&doc, None, 0).with_checkerboard(checker_2x2());
        for (sx, sy) in [(i32::MAX, 0), (i32::MIN, 0), (0, i32::MAX), (i32::MIN, i32::MIN)] {
            let out = engine.render_sprite(sx, sy, 4, 4, 0, 0, false).unwrap();
            assert!(out.pixels().all(|p| *p == CLEAR), "scroll ({sx},{sy})");
        }
        let out = engine.render_sprite(i32::MAX, i32::MAX, 4, 4, 0, MAX_ZOOM, true).unwrap();
        assert!(out.pixels().all(|p| *p == C1 || *p == C2));
    }

    #[test]
    fn zoom_beyond_limit_is_clamped() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 1);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red).at(1, 0));
        let doc = Document::new(sprite);
        // at 2^30 scale the cel starts far to the right of the view
        let out = RenderEngine::new(&doc, None, 0).render_sprite(0, 0, 4, 1, 0, 32, false).unwrap();
        assert!(out.pixels().all(|p| *p == CLEAR));
    }

    #[test]
    fn zoom_and_scroll_position_cels() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 4, 4);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red).at(2, 1));
        let doc = Document::new(sprite);
        let out = RenderEngine::new(&doc, None, 0)
            .render_sprite(2, 0, 8, 8, 0, 1, false)
            .unwrap();
        // cel at (2,1) -> (4,2) at zoom 1, minus source_x 2
        for y in 0..8u32 {
            for x in 0..8u32 {
                let inside = (2..4).contains(&x) && (2..4).contains(&y);
                assert_eq!(*out.get_pixel(x, y) == RED, inside, "({x},{y})");
            }
        }
    }

    #[test]
    fn preview_replaces_cel_on_current_frame_only() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 1, 1);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(1, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red));
        sprite.set_cel(layer, 1, Cel::new(red));
        let doc = Document::new(sprite);
        let preview = solid(1, 1, BLUE);

        let engine = RenderEngine::new(&doc, Some(layer), 0).with_preview(layer, Some(&preview));
        assert_eq!(*engine.render_sprite(0, 0, 1, 1, 0, 0, false).unwrap().get_pixel(0, 0), BLUE);
        assert_eq!(*engine.render_sprite(0, 0, 1, 1, 1, 0, false).unwrap().get_pixel(0, 0), RED);

        let cleared = engine.clone().with_preview(layer, None);
        assert_eq!(*cleared.render_sprite(0, 0, 1, 1, 0, 0, false).unwrap().get_pixel(0, 0), RED);

        let other_layer = RenderEngine::new(&doc, None, 0).with_preview(LayerId(999), Some(&preview));
        assert_eq!(*other_layer.render_sprite(0, 0, 1, 1, 0, 0, false).unwrap().get_pixel(0, 0), RED);
    }

    #[test]
    fn extra_cel_draws_on_current_layer() {
        let mut sprite = Sprite::new(PixelFormat::Rgb, 2, 1);
        let layer = sprite.add_image_layer(None, "L").unwrap();
        let red = sprite.add_image(solid(2, 1, RED));
        sprite.set_cel(layer, 0, Cel::new(red));
        let mut doc = Document::new(sprite);
        doc.set_extra_cel(Cel::new(0).at(1, 0), solid(1, 1, GREEN));

        let out = RenderEngine::new(&doc, Some(layer), 0).render_sprite(0, 0, 2, 1, 0, 0, false).unwrap();
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 0), GREEN);

        let not_current = RenderEngine::new(&doc, None, 0).render_sprite(0, 0, 2, 1, 0, 0, false).unwrap();
        assert_eq!(*not_current.get_pixel(1, 0), RED);

        doc.extra_cel.as_mut().unwrap().cel.opacity = 0;
        let invisible = RenderEngine::new(&doc, Some(layer), 0).render_sprite(0, 0, 2, 1, 0, 0, false).unwrap();
        assert_eq!(*invisible.get_pixel(1, 0), RED);
    }

    fn onion_doc(onion: OnionSkin) -> (Document, [usize; 3]) {
        // 3 frames, each a different colour at a different column
        let mut sprite = Sprite::new(PixelFormat::Rgb, 3, 1);
        let bg = sprite.add_background_layer();
        let layer = sprite.add_image_layer(None, "anim").unwrap();
        let black = sprite.add_image(solid(3, 1, Rgba([0, 0, 0, 255])));
        let colors = [RED, GREEN, BLUE].map(|c| sprite.add_image(solid(1, 1, c)));
        for f in 0..3u32 {
            sprite.set_cel(bg, f, Cel::new(black));
            sprite.set_cel(layer, f, Cel::new(colors[f as usize]).at(f as i32, 0));
        }
        let mut doc = Document::new(sprite);
        doc.onion_skin = onion;
        (doc, colors)
    }

    #[test]
    fn onion_skin_ghosts_neighbours() {
        let onion = OnionSkin { enabled: true, prev_frames: 1, next_frames: 1, opacity_base: 128, opacity_step: 0 };
        let (doc, _) = onion_doc(onion);
        let out = render(&doc, 1, 3, 1, 0, true);
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 0), GREEN);
        assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 128, 255]));
    }

    #[test]
    fn onion_skin_skips_exhausted_frames() {
        // distance 2 gives 64 - 64 = 0: frame 0 is not drawn
        let onion = OnionSkin { enabled: true, prev_frames: 2, next_frames: 0, opacity_base: 64, opacity_step: 64 };
        let (doc, _) = onion_doc(onion);
        let out = render(&doc, 2, 3, 1, 0, true);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([0, 64, 0, 255]));
        assert_eq!(*out.get_pixel(2, 0), BLUE);
    }

    #[test]
    fn onion_skin_ignores_out_of_range_frames() {
        let onion = OnionSkin { enabled: true, prev_frames: 5, next_frames: 5, opacity_base: 255, opacity_step: 0 };
        let (doc, _) = onion_doc(onion);
        let out = render(&doc, 0, 3, 1, 0, true);
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(1, 0), GREEN);
        assert_eq!(*out.get_pixel(2, 0), BLUE);
    }

    #[test]
    fn onion_disabled_draws_only_current_frame() {
        let (doc, _) = onion_doc(OnionSkin::default());
        let out = render(&doc, 1, 3, 1, 0, true);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(1, 0), GREEN);
        assert_eq!(*out.get_pixel(2, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn render_image_draws_without_layers() {
        let mut dst = RgbaImage::from_pixel(4, 4, GREEN);
        let pal = Palette::new(vec![CLEAR, RED]);
        let src = Raster::indexed_from_raw(2, 1, vec![0, 1]).unwrap();
        RenderEngine::render_image(&mut dst, &src, &pal, 0, 0, 0, 1);
        assert_eq!(*dst.get_pixel(0, 0), GREEN);
        assert_eq!(*dst.get_pixel(1, 1), GREEN);
        assert_eq!(*dst.get_pixel(2, 0), RED);
        assert_eq!(*dst.get_pixel(3, 1), RED);
        assert_eq!(*dst.get_pixel(2, 2), GREEN);
    }

    #[test]
    fn oversized_request_yields_none() {
        let doc = Document::new(Sprite::new(PixelFormat::Rgb, 1, 1));
        assert!(RenderEngine::new(&doc, None, 0).render_sprite(0, 0, 100_000, 100_000, 0, 0, false).is_none());
    }
}
