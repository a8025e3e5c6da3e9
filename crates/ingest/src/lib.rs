pub mod discover;
pub mod docx;
pub mod reader;

pub use discover::discover;
pub use reader::{FileReader, prepare_text};
