// Utility modules

pub mod color;
pub mod image_ops;

pub use color::sample_border;
