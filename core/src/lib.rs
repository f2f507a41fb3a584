// Library exports for lawmark-core

pub mod config;
pub mod error;
pub mod highlight;
pub mod law;
pub mod popup;
pub mod render;
pub mod selection;
pub mod span;
pub mod text_run;

pub use config::{Config, config_file_path};
pub use error::{ConfigError, HighlightError, LoadError};
pub use highlight::{apply_highlight, remove_highlight};
pub use law::{Article, LawDocument, LawFile};
pub use popup::{PopupController, PopupState};
pub use render::{MarkupRenderer, Renderer};
pub use selection::{
    NativeSelection, Rect, Resolution, ResolvedSelection, SelectionBuffer, SelectionSurface,
    resolve,
};
pub use span::{BoundaryPoint, Span};
pub use text_run::{Container, ContainerId, RunId, TextRun};
