pub mod skeleton;

pub use skeleton::{overlay_colors, OverlayColors, SKELETON_CONNECTIONS};
