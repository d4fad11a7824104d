use image::{LumaA, Rgba};

use crate::palette::Palette;
use crate::raster::{GRAY_MASK, RGB_MASK};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    /// Write the source pixel verbatim. Background layers use it.
    Copy,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    HardLight,
    Difference,
    Exclusion,
    Additive,
    Subtract,
}

impl BlendMode {
    /// Returns all blend modes in UI order
    pub fn all() -> &'static [BlendMode] {
        &[
            BlendMode::Normal,
            BlendMode::Copy,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::Darken,
            BlendMode::Lighten,
            BlendMode::HardLight,
            BlendMode::Difference,
            BlendMode::Exclusion,
            BlendMode::Additive,
            BlendMode::Subtract,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Copy => "Copy",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::HardLight => "Hard Light",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
            BlendMode::Additive => "Additive",
            BlendMode::Subtract => "Subtract",
        }
    }

    /// Case-insensitive lookup by display name (spaces optional).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        Self::all().iter().copied().find(|mode| {
            let candidate: String = mode.name().chars().filter(|c| !c.is_whitespace()).collect();
            candidate.eq_ignore_ascii_case(&wanted)
        })
    }

    /// Per-channel function for separable modes; `None` for Normal/Copy.
    fn channel_fn(self) -> Option<fn(u8, u8) -> u8> {
        match self {
            BlendMode::Normal | BlendMode::Copy => None,
            BlendMode::Multiply => Some(multiply_channel),
            BlendMode::Screen => Some(screen_channel),
            BlendMode::Overlay => Some(overlay_channel),
            BlendMode::Darken => Some(|b, f| b.min(f)),
            BlendMode::Lighten => Some(|b, f| b.max(f)),
            BlendMode::HardLight => Some(hard_light_channel),
            BlendMode::Difference => Some(|b, f| b.abs_diff(f)),
            BlendMode::Exclusion => Some(exclusion_channel),
            BlendMode::Additive => Some(|b, f| b.saturating_add(f)),
            BlendMode::Subtract => Some(|b, f| b.saturating_sub(f)),
        }
    }
}

/// `a * b / 255` with rounding, exact over the whole 8-bit range.
#[inline]
pub fn mul_un8(a: u32, b: u32) -> u32 {
    let t = a * b + 0x80;
    ((t >> 8) + t) >> 8
}

/// Luma of an RGB colour, the weights used for RGB -> gray conversion.
#[inline]
pub fn rgb_luma(c: Rgba<u8>) -> u8 {
    ((c[0] as u32 * 30 + c[1] as u32 * 59 + c[2] as u32 * 11) / 100) as u8
}

// ============================================================================
// CHANNEL FUNCTIONS
// ============================================================================

fn multiply_channel(b: u8, f: u8) -> u8 {
    mul_un8(b as u32, f as u32) as u8
}

fn screen_channel(b: u8, f: u8) -> u8 {
    (b as u32 + f as u32 - mul_un8(b as u32, f as u32)).min(255) as u8
}

fn hard_light_channel(b: u8, f: u8) -> u8 {
    if f < 128 {
        multiply_channel(b, f << 1)
    } else {
        screen_channel(b, ((f as u32) * 2 - 255) as u8)
    }
}

fn overlay_channel(b: u8, f: u8) -> u8 {
    hard_light_channel(f, b)
}

fn exclusion_channel(b: u8, f: u8) -> u8 {
    let m = mul_un8(b as u32, f as u32);
    (b as u32 + f as u32 - 2 * m) as u8
}

// ============================================================================
// RGB
// ============================================================================

/// Source-over compositing of `front` onto `back` at `opacity`.
pub fn rgba_blend_normal(back: Rgba<u8>, front: Rgba<u8>, opacity: u8) -> Rgba<u8> {
    let [br, bg, bb, ba] = back.0;
    let [fr, fg, fb, fa] = front.0;

    let fa = mul_un8(fa as u32, opacity as u32) as i32;
    if fa == 0 {
        return back;
    }
    if ba == 0 {
        return Rgba([fr, fg, fb, fa as u8]);
    }

    let ba = ba as i32;
    let da = ba + fa - mul_un8(ba as u32, fa as u32) as i32;
    let mix = |b: u8, f: u8| (b as i32 + (f as i32 - b as i32) * fa / da) as u8;

    Rgba([mix(br, fr), mix(bg, fg), mix(bb, fb), da as u8])
}

/// Blend `front` onto `back` with `mode`. The mask is not tested here.
pub fn rgba_blend(mode: BlendMode, back: Rgba<u8>, front: Rgba<u8>, opacity: u8) -> Rgba<u8> {
    if mode == BlendMode::Copy {
        return front;
    }
    match mode.channel_fn() {
        Some(f) if back[3] != 0 => {
            let mixed = Rgba([f(back[0], front[0]), f(back[1], front[1]), f(back[2], front[2]), front[3]]);
            rgba_blend_normal(back, mixed, opacity)
        }
        _ => rgba_blend_normal(back, front, opacity),
    }
}

// ============================================================================
// GRAYSCALE
// ============================================================================

pub fn graya_blend_normal(back: LumaA<u8>, front: LumaA<u8>, opacity: u8) -> LumaA<u8> {
    let [bv, ba] = back.0;
    let [fv, fa] = front.0;

    let fa = mul_un8(fa as u32, opacity as u32) as i32;
    if fa == 0 {
        return back;
    }
    if ba == 0 {
        return LumaA([fv, fa as u8]);
    }

    let ba = ba as i32;
    let da = ba + fa - mul_un8(ba as u32, fa as u32) as i32;
    let dv = bv as i32 + (fv as i32 - bv as i32) * fa / da;

    LumaA([dv as u8, da as u8])
}

pub fn graya_blend(mode: BlendMode, back: LumaA<u8>, front: LumaA<u8>, opacity: u8) -> LumaA<u8> {
    if mode == BlendMode::Copy {
        return front;
    }
    match mode.channel_fn() {
        Some(f) if back[1] != 0 => graya_blend_normal(back, LumaA([f(back[0], front[0]), front[1]]), opacity),
        _ => graya_blend_normal(back, front, opacity),
    }
}

// ============================================================================
// FORMAT-PAIR BLENDERS (destination <- source)
// ============================================================================
//
// Each returns the new destination pixel. A source pixel equal to its
// format's mask leaves the destination untouched.

#[inline]
pub fn rgb_from_rgb(dst: Rgba<u8>, src: Rgba<u8>, opacity: u8, mode: BlendMode) -> Rgba<u8> {
    if src == RGB_MASK {
        return dst;
    }
    rgba_blend(mode, dst, src, opacity)
}

#[inline]
pub fn rgb_from_gray(dst: Rgba<u8>, src: LumaA<u8>, opacity: u8, mode: BlendMode) -> Rgba<u8> {
    if src == GRAY_MASK {
        return dst;
    }
    let [v, a] = src.0;
    rgba_blend(mode, dst, Rgba([v, v, v, a]), opacity)
}

/// Indexed source into RGB. `Copy` bypasses both the mask and alpha blending.
#[inline]
pub fn rgb_from_indexed(
    dst: Rgba<u8>,
    src: u8,
    mask: u8,
    palette: &Palette,
    opacity: u8,
    mode: BlendMode,
) -> Rgba<u8> {
    if mode == BlendMode::Copy {
        return palette.entry(src);
    }
    if src == mask {
        return dst;
    }
    rgba_blend(mode, dst, palette.entry(src), opacity)
}

#[inline]
pub fn gray_from_gray(dst: LumaA<u8>, src: LumaA<u8>, opacity: u8, mode: BlendMode) -> LumaA<u8> {
    if src == GRAY_MASK {
        return dst;
    }
    graya_blend(mode, dst, src, opacity)
}

#[inline]
pub fn gray_from_rgb(dst: LumaA<u8>, src: Rgba<u8>, opacity: u8, mode: BlendMode) -> LumaA<u8> {
    if src == RGB_MASK {
        return dst;
    }
    graya_blend(mode, dst, LumaA([rgb_luma(src), src[3]]), opacity)
}

#[inline]
pub fn gray_from_indexed(
    dst: LumaA<u8>,
    src: u8,
    mask: u8,
    palette: &Palette,
    opacity: u8,
    mode: BlendMode,
) -> LumaA<u8> {
    if src == mask {
        return dst;
    }
    let c = palette.entry(src);
    graya_blend(mode, dst, LumaA([rgb_luma(c), c[3]]), opacity)
}

/// Indexed into indexed: there is no colour math, the index is written.
#[inline]
pub fn indexed_from_indexed(dst: u8, src: u8, mask: u8) -> u8 {
    if src == mask { dst } else { src }
}
