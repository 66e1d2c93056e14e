pub mod locator;
pub mod matcher;
pub mod templates;

pub use locator::{Locator, DEFAULT_TRIES};
pub use matcher::{MatchMethod, MatchResult, Template, TemplateMatcher};
pub use templates::{Category, TemplateStore};
