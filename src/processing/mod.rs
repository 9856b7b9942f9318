pub mod downsampling;
pub mod transform;
