mod browser;
mod source;

pub use browser::BrowserSource;
pub use source::{DocumentSource, FileSource, HttpSource};
