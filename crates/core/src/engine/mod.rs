mod collapser;
mod manager;
mod renderer;
mod scanner;

pub use collapser::FoldCollapser;
pub use manager::{FoldEvent, FoldManager, Selection};
pub use renderer::{render_file, render_file_ansi, Renderer};
pub use scanner::{FoldScanner, FoldedDocument, ScanError};
