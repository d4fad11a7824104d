#![allow(clippy::too_many_arguments)]

pub mod cli;
pub mod document;
pub mod logger;
pub mod palette;
pub mod raster;
pub mod render;
pub mod settings;
pub mod sprite;

pub use document::{Document, ExtraCel, OnionSkin};
pub use palette::Palette;
pub use raster::{PixelFormat, Raster};
pub use render::{BlendMode, LayerPass, RenderEngine};
pub use sprite::{Cel, FrameNumber, Layer, LayerId, LayerKind, Sprite};
