pub mod analyzer;
pub mod ast;
pub mod error;
pub mod layout;
pub mod parser;
pub mod report;
pub mod resolve;
pub mod sizing;
pub mod source_location;
pub mod svg;
pub mod tokenizer;
pub mod types;

pub use analyzer::{analyze_structs, Analyzer, Options};
pub use error::{Error, ErrorKind};
pub use layout::{FieldDescriptor, Layout, LayoutResult, TypeLayout};
pub use sizing::SizingModel;
