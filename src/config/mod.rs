//! Configuration module

mod editor;

pub use editor::{EditorConfig, GitConfig, PreviewConfig, CONFIG_FILE};
