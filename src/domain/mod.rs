// Domain layer - Core business models
pub mod color_scale;
pub mod map_document;
pub mod telemetry;
pub mod viewport;
