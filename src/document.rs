use crate::raster::Raster;
use crate::sprite::{Cel, Sprite};

/// Onion-skin settings of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OnionSkin {
    pub enabled: bool,
    pub prev_frames: u32,
    pub next_frames: u32,
    pub opacity_base: u8,
    pub opacity_step: u8,
}

impl Default for OnionSkin {
    fn default() -> Self {
        Self {
            enabled: false,
            prev_frames: 1,
            next_frames: 0,
            opacity_base: 68,
            opacity_step: 28,
        }
    }
}

impl OnionSkin {
    /// Ghost opacity of a frame `distance` frames away from the current one,
    /// `None` when it falls to zero or below (the frame is not drawn).
    pub fn opacity_at(&self, distance: u32) -> Option<u8> {
        if distance == 0 {
            return Some(255);
        }
        let falloff = self.opacity_step as i64 * (distance as i64 - 1);
        let opacity = self.opacity_base as i64 - falloff;
        if opacity <= 0 {
            None
        } else {
            Some(opacity.min(255) as u8)
        }
    }
}

/// Transient overlay on the active layer (floating selection, tool feedback).
#[derive(Clone, Debug)]
pub struct ExtraCel {
    pub cel: Cel,
    pub image: Raster,
}

/// A sprite plus the editing state the renderer consults.
#[derive(Clone, Debug)]
pub struct Document {
    pub sprite: Sprite,
    pub extra_cel: Option<ExtraCel>,
    pub onion_skin: OnionSkin,
}

impl Document {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            sprite,
            extra_cel: None,
            onion_skin: OnionSkin::default(),
        }
    }

    pub fn set_extra_cel(&mut self, cel: Cel, image: Raster) {
        self.extra_cel = Some(ExtraCel { cel, image });
    }

    pub fn clear_extra_cel(&mut self) {
        self.extra_cel = None;
    }
}
