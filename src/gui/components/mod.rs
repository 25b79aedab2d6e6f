pub mod canvas;
pub mod info_panel;
pub mod part_library;

pub use canvas::CanvasAction;
pub use part_library::{LibraryAction, PartDrag, PartLibrary};
