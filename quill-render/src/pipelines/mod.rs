//! wgpu render pipelines.

pub mod atlas;

pub use atlas::AtlasPipeline;
