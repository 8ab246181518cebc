pub mod frame_json;
pub mod render;
pub mod span;
pub mod style;
