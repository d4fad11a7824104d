//! Checkerboard transparency background.
//!
//! The appearance is process-wide: [`load_config`] reads it once from a
//! [`SettingsStore`], the setters update it and write the value through.

use image::{Rgba, RgbaImage};
use parking_lot::RwLock;

use crate::raster::fill_rect;
use crate::settings::SettingsStore;

const SECTION: &str = "Options";
const KEY_TYPE: &str = "CheckedBgType";
const KEY_ZOOM: &str = "CheckedBgZoom";
const KEY_COLOR1: &str = "CheckedBgColor1";
const KEY_COLOR2: &str = "CheckedBgColor2";

/// Tile size preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CheckerboardType {
    #[default]
    Tile16x16,
    Tile8x8,
    Tile4x4,
    Tile2x2,
}

impl CheckerboardType {
    pub fn all() -> &'static [CheckerboardType] {
        &[
            CheckerboardType::Tile16x16,
            CheckerboardType::Tile8x8,
            CheckerboardType::Tile4x4,
            CheckerboardType::Tile2x2,
        ]
    }

    /// Unscaled tile side in pixels.
    pub fn tile_size(self) -> i32 {
        match self {
            CheckerboardType::Tile16x16 => 16,
            CheckerboardType::Tile8x8 => 8,
            CheckerboardType::Tile4x4 => 4,
            CheckerboardType::Tile2x2 => 2,
        }
    }

    /// Preset for a tile side, if there is one.
    pub fn from_tile_size(size: u32) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.tile_size() as u32 == size)
    }

    /// Stable integer for the settings store
    pub fn to_i32(self) -> i32 {
        match self {
            CheckerboardType::Tile16x16 => 0,
            CheckerboardType::Tile8x8 => 1,
            CheckerboardType::Tile4x4 => 2,
            CheckerboardType::Tile2x2 => 3,
        }
    }

    /// Reconstruct from an integer (defaults to 16x16 for unknown values)
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => CheckerboardType::Tile8x8,
            2 => CheckerboardType::Tile4x4,
            3 => CheckerboardType::Tile2x2,
            _ => CheckerboardType::Tile16x16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckerboardConfig {
    pub kind: CheckerboardType,
    /// Scale tiles with the zoom factor.
    pub zoom: bool,
    pub color1: Rgba<u8>,
    pub color2: Rgba<u8>,
}

impl CheckerboardConfig {
    pub const DEFAULT: Self = Self {
        kind: CheckerboardType::Tile16x16,
        zoom: true,
        color1: Rgba([128, 128, 128, 255]),
        color2: Rgba([192, 192, 192, 255]),
    };

    /// Read the four persisted values, falling back to defaults.
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let d = Self::DEFAULT;
        Self {
            kind: CheckerboardType::from_i32(store.get_int(SECTION, KEY_TYPE, d.kind.to_i32())),
            zoom: store.get_bool(SECTION, KEY_ZOOM, d.zoom),
            color1: opaque(store.get_color(SECTION, KEY_COLOR1, d.color1)),
            color2: opaque(store.get_color(SECTION, KEY_COLOR2, d.color2)),
        }
    }

    pub fn save(&self, store: &mut dyn SettingsStore) {
        store.set_int(SECTION, KEY_TYPE, self.kind.to_i32());
        store.set_bool(SECTION, KEY_ZOOM, self.zoom);
        store.set_color(SECTION, KEY_COLOR1, self.color1);
        store.set_color(SECTION, KEY_COLOR2, self.color2);
    }

    /// Tile `(width, height)` in destination pixels at `zoom`, never smaller
    /// than one zoom block.
    pub fn tile_size(&self, zoom: u32) -> (i32, i32) {
        let block = 1i32 << zoom.min(30);
        let mut tile = self.kind.tile_size();
        if self.zoom {
            tile = tile.checked_shl(zoom).filter(|t| *t > 0).unwrap_or(i32::MAX);
        }
        let tile = tile.max(block);
        (tile, tile)
    }
}

impl Default for CheckerboardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn opaque(c: Rgba<u8>) -> Rgba<u8> {
    Rgba([c[0], c[1], c[2], 255])
}

// ============================================================================
// PROCESS-WIDE STATE
// ============================================================================

// Shared by every test thread: code under test that needs a fixed appearance
// passes its own config (`RenderEngine::with_checkerboard`) instead of
// reading this one.
static CONFIG: RwLock<CheckerboardConfig> = parking_lot::const_rwlock(CheckerboardConfig::DEFAULT);

/// Load the process-wide configuration from `store`.
pub fn load_config(store: &dyn SettingsStore) {
    let config = CheckerboardConfig::from_store(store);
    log::debug!("checkerboard config loaded: {:?}", config);
    *CONFIG.write() = config;
}

/// Snapshot of the process-wide configuration.
pub fn config() -> CheckerboardConfig {
    *CONFIG.read()
}

pub fn checkerboard_type() -> CheckerboardType {
    CONFIG.read().kind
}

pub fn set_type(store: &mut dyn SettingsStore, kind: CheckerboardType) {
    CONFIG.write().kind = kind;
    store.set_int(SECTION, KEY_TYPE, kind.to_i32());
}

pub fn zoom() -> bool {
    CONFIG.read().zoom
}

pub fn set_zoom(store: &mut dyn SettingsStore, state: bool) {
    CONFIG.write().zoom = state;
    store.set_bool(SECTION, KEY_ZOOM, state);
}

pub fn color1() -> Rgba<u8> {
    CONFIG.read().color1
}

pub fn set_color1(store: &mut dyn SettingsStore, color: Rgba<u8>) {
    let color = opaque(color);
    CONFIG.write().color1 = color;
    store.set_color(SECTION, KEY_COLOR1, color);
}

pub fn color2() -> Rgba<u8> {
    CONFIG.read().color2
}

pub fn set_color2(store: &mut dyn SettingsStore, color: Rgba<u8>) {
    let color = opaque(color);
    CONFIG.write().color2 = color;
    store.set_color(SECTION, KEY_COLOR2, color);
}

// ============================================================================
// RENDERING
// ============================================================================

/// Fill `image` with the checker pattern for a view scrolled to
/// `(source_x, source_y)` (destination pixels, zoom already applied).
///
/// Tile phase comes from the source position so scrolling by whole tiles
/// leaves the pattern in place.
pub fn render_checkerboard(image: &mut RgbaImage, source_x: i32, source_y: i32, zoom: u32, config: &CheckerboardConfig) {
    let (tile_w, tile_h) = config.tile_size(zoom);

    let u_start = source_x.div_euclid(tile_w);
    let mut v = source_y.div_euclid(tile_h);

    let x_start = -source_x.rem_euclid(tile_w);
    let y_start = -source_y.rem_euclid(tile_h);

    let width = image.width() as i32;
    let height = image.height() as i32;

    let mut y = y_start;
    while y < height {
        let mut u = u_start;
        let mut x = x_start;
        while x < width {
            let color = if (u ^ v) & 1 != 0 { config.color1 } else { config.color2 };
            fill_rect(image, x, y, x.saturating_add(tile_w - 1), y.saturating_add(tile_h - 1), color);
            u += 1;
            x = x.saturating_add(tile_w);
        }
        v += 1;
        y = y.saturating_add(tile_h);
    }
}
