//! Layer compositing and zoomed rendering.

pub mod blend;
pub mod checkerboard;
pub mod compositor;
pub mod engine;

pub use blend::BlendMode;
pub use checkerboard::{CheckerboardConfig, CheckerboardType};
pub use compositor::{composite_zoomed, merge_zoomed, MAX_ZOOM};
pub use engine::{LayerPass, PreviewImage, RenderEngine};
