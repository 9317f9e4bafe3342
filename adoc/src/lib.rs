pub mod attribute;
pub mod directive;
pub mod parser;
pub mod region;

pub use attribute::Attributes;
pub use directive::Directive;
pub use parser::{ParseError, ParseErrorKind, Parser};
pub use region::Extraction;
