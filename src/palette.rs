use image::Rgba;

/// Maximum number of palette entries.
pub const MAX_COLORS: usize = 256;

/// Ordered colour table used to resolve indexed pixels to RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    entries: Vec<Rgba<u8>>,
}

impl Palette {
    /// Build a palette; entries past [`MAX_COLORS`] are dropped.
    pub fn new(mut entries: Vec<Rgba<u8>>) -> Self {
        if entries.len() > MAX_COLORS {
            log::warn!("palette with {} entries truncated to {}", entries.len(), MAX_COLORS);
            entries.truncate(MAX_COLORS);
        }
        Self { entries }
    }

    /// 256-step opaque gray ramp, the default palette of a new sprite.
    pub fn grayscale() -> Self {
        Self {
            entries: (0..=255u8).map(|v| Rgba([v, v, v, 255])).collect(),
        }
    }

    /// Build from 6-bit-per-channel (VGA style) triplets.
    pub fn from_rgb_6bit(triplets: &[[u8; 3]]) -> Self {
        let entries = triplets
            .iter()
            .map(|[r, g, b]| Rgba([scale_6bits_to_8bits(*r), scale_6bits_to_8bits(*g), scale_6bits_to_8bits(*b), 255]))
            .collect();
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Colour of `index`; indices past the end resolve to transparent black.
    #[inline]
    pub fn entry(&self, index: u8) -> Rgba<u8> {
        self.entries
            .get(index as usize)
            .copied()
            .unwrap_or(Rgba([0, 0, 0, 0]))
    }

    pub fn set_entry(&mut self, index: u8, color: Rgba<u8>) {
        let i = index as usize;
        if i >= self.entries.len() {
            self.entries.resize(i + 1, Rgba([0, 0, 0, 255]));
        }
        self.entries[i] = color;
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

/// Expand a 6-bit channel to 8 bits with the classic rounding table.
pub fn scale_6bits_to_8bits(channel: u8) -> u8 {
    debug_assert!(channel < 64, "6-bit channel out of range: {channel}");
    const SCALE: [u8; 64] = [
        0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 60, 65, 69, 73, 77, 81, 85, 89,
        93, 97, 101, 105, 109, 113, 117, 121, 125, 130, 134, 138, 142, 146, 150, 154, 158, 162,
        166, 170, 174, 178, 182, 186, 190, 195, 199, 203, 207, 211, 215, 219, 223, 227, 231, 235,
        239, 243, 247, 251, 255,
    ];
    SCALE[(channel & 63) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_entry_is_transparent() {
        let pal = Palette::new(vec![Rgba([255, 0, 0, 255])]);
        assert_eq!(pal.entry(0), Rgba([255, 0, 0, 255]));
        assert_eq!(pal.entry(9), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn oversized_palette_is_truncated() {
        let pal = Palette::new(vec![Rgba([1, 1, 1, 255]); 300]);
        assert_eq!(pal.len(), MAX_COLORS);
    }

    #[test]
    fn six_bit_palette_scales_extremes() {
        let pal = Palette::from_rgb_6bit(&[[0, 63, 32]]);
        assert_eq!(pal.entry(0), Rgba([0, 255, 130, 255]));
    }

    #[test]
    fn set_entry_grows_palette() {
        let mut pal = Palette::new(Vec::new());
        pal.set_entry(3, Rgba([9, 9, 9, 255]));
        assert_eq!(pal.len(), 4);
        assert_eq!(pal.entry(3), Rgba([9, 9, 9, 255]));
    }
}
