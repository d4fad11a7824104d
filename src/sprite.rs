use std::collections::BTreeMap;

use crate::palette::Palette;
use crate::raster::{PixelFormat, Raster};
use crate::render::blend::BlendMode;

pub type FrameNumber = u32;

/// Sprite-unique layer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// Placement of one stock image at one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cel {
    /// Position in unzoomed sprite coordinates.
    pub x: i32,
    pub y: i32,
    pub opacity: u8,
    /// Index into the sprite's image stock.
    pub image: usize,
}

impl Cel {
    pub fn new(image: usize) -> Self {
        Self { x: 0, y: 0, opacity: 255, image }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImageLayer {
    pub blend_mode: BlendMode,
    cels: BTreeMap<FrameNumber, Cel>,
}

impl ImageLayer {
    pub fn cel(&self, frame: FrameNumber) -> Option<&Cel> {
        self.cels.get(&frame)
    }

    pub fn set_cel(&mut self, frame: FrameNumber, cel: Cel) {
        self.cels.insert(frame, cel);
    }

    pub fn remove_cel(&mut self, frame: FrameNumber) -> Option<Cel> {
        self.cels.remove(&frame)
    }

    pub fn cels(&self) -> impl Iterator<Item = (FrameNumber, &Cel)> + '_ {
        self.cels.iter().map(|(f, c)| (*f, c))
    }
}

#[derive(Clone, Debug)]
pub enum LayerKind {
    Image(ImageLayer),
    /// Children in back-to-front order.
    Folder(Vec<Layer>),
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    /// Opaque bottom layer; only meaningful for image layers.
    pub background: bool,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new_image(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            background: false,
            kind: LayerKind::Image(ImageLayer::default()),
        }
    }

    pub fn new_folder(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            background: false,
            kind: LayerKind::Folder(Vec::new()),
        }
    }

    /// Hidden layers (and everything under them) are never read.
    pub fn is_readable(&self) -> bool {
        self.visible
    }

    pub fn is_background(&self) -> bool {
        self.background && matches!(self.kind, LayerKind::Image(_))
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(img) => Some(img),
            LayerKind::Folder(_) => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.kind {
            LayerKind::Image(img) => Some(img),
            LayerKind::Folder(_) => None,
        }
    }

    pub fn children(&self) -> &[Layer] {
        match &self.kind {
            LayerKind::Folder(children) => children,
            LayerKind::Image(_) => &[],
        }
    }

    /// Depth-first search for `id` in this subtree.
    pub fn find(&self, id: LayerId) -> Option<&Layer> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.kind {
            LayerKind::Folder(children) => children.iter_mut().find_map(|child| child.find_mut(id)),
            LayerKind::Image(_) => None,
        }
    }
}

/// A multi-layer, multi-frame image.
#[derive(Clone, Debug)]
pub struct Sprite {
    width: u32,
    height: u32,
    format: PixelFormat,
    frames: u32,
    /// Palette in effect from frame 0.
    palette: Palette,
    /// Later palette changes keyed by the first frame they apply to.
    palette_changes: BTreeMap<FrameNumber, Palette>,
    transparent_index: u8,
    root: Layer,
    stock: Vec<Raster>,
    next_layer_id: u32,
}

impl Sprite {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format,
            frames: 1,
            palette: Palette::default(),
            palette_changes: BTreeMap::new(),
            transparent_index: 0,
            root: Layer::new_folder(LayerId(0), "Root"),
            stock: Vec::new(),
            next_layer_id: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    pub fn set_frame_count(&mut self, frames: u32) {
        self.frames = frames.max(1);
    }

    pub fn last_frame(&self) -> FrameNumber {
        self.frames - 1
    }

    pub fn transparent_index(&self) -> u8 {
        self.transparent_index
    }

    pub fn set_transparent_index(&mut self, index: u8) {
        self.transparent_index = index;
    }

    // ---- palettes -----------------------------------------------------------

    /// Palette in effect at `frame`.
    pub fn palette(&self, frame: FrameNumber) -> &Palette {
        self.palette_changes
            .range(..=frame)
            .next_back()
            .map(|(_, pal)| pal)
            .unwrap_or(&self.palette)
    }

    /// Use `palette` from `frame` until the next palette change.
    pub fn set_palette(&mut self, frame: FrameNumber, palette: Palette) {
        if frame == 0 {
            self.palette = palette;
        } else {
            self.palette_changes.insert(frame, palette);
        }
    }

    // ---- image stock ----------------------------------------------------

    /// Append `image` to the stock and return its index.
    pub fn add_image(&mut self, image: Raster) -> usize {
        if image.format() != self.format {
            log::warn!(
                "stock image is {} but sprite is {}",
                image.format().name(),
                self.format.name()
            );
        }
        self.stock.push(image);
        self.stock.len() - 1
    }

    pub fn stock_image(&self, index: usize) -> Option<&Raster> {
        self.stock.get(index)
    }

    pub fn stock_image_mut(&mut self, index: usize) -> Option<&mut Raster> {
        self.stock.get_mut(index)
    }

    pub fn stock_len(&self) -> usize {
        self.stock.len()
    }

    // ---- layers -----------------------------------------------------------

    /// Root folder of the layer tree.
    pub fn root(&self) -> &Layer {
        &self.root
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.root.find(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.root.find_mut(id)
    }

    /// The opaque bottom layer, if the first top-level layer is one.
    pub fn background_layer(&self) -> Option<&Layer> {
        self.root.children().first().filter(|l| l.is_background())
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }

    fn insert(&mut self, parent: Option<LayerId>, layer: Layer, at_bottom: bool) -> Option<LayerId> {
        let id = layer.id;
        let target = match parent {
            Some(pid) => self.root.find_mut(pid)?,
            None => &mut self.root,
        };
        let LayerKind::Folder(children) = &mut target.kind else {
            log::warn!("layer {:?} is not a folder", target.id);
            return None;
        };
        if at_bottom {
            children.insert(0, layer);
        } else {
            children.push(layer);
        }
        Some(id)
    }

    /// Add an image layer on top of `parent` (the root when `None`).
    pub fn add_image_layer(&mut self, parent: Option<LayerId>, name: &str) -> Option<LayerId> {
        let layer = Layer::new_image(self.allocate_id(), name);
        self.insert(parent, layer, false)
    }

    /// Add a folder layer on top of `parent` (the root when `None`).
    pub fn add_folder(&mut self, parent: Option<LayerId>, name: &str) -> Option<LayerId> {
        let layer = Layer::new_folder(self.allocate_id(), name);
        self.insert(parent, layer, false)
    }

    /// Insert the background layer at the bottom of the root folder.
    /// Returns the existing one if the sprite already has a background.
    pub fn add_background_layer(&mut self) -> LayerId {
        if let Some(bg) = self.background_layer() {
            return bg.id;
        }
        let mut layer = Layer::new_image(self.allocate_id(), "Background");
        layer.background = true;
        if let LayerKind::Image(img) = &mut layer.kind {
            img.blend_mode = BlendMode::Copy;
        }
        let id = layer.id;
        self.insert(None, layer, true);
        id
    }

    /// Place `cel` on image layer `layer` at `frame`, growing the frame count
    /// as needed. Returns false if `layer` is not an image layer.
    pub fn set_cel(&mut self, layer: LayerId, frame: FrameNumber, cel: Cel) -> bool {
        let Some(img) = self.layer_mut(layer).and_then(Layer::as_image_mut) else {
            return false;
        };
        img.set_cel(frame, cel);
        if frame >= self.frames {
            self.frames = frame + 1;
        }
        true
    }
}
