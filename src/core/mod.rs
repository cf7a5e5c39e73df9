pub mod analysis;
pub mod columns;
pub mod engine;
pub mod filters;
pub mod headings;
pub mod pipeline;
pub mod style;
pub mod title;

pub use crate::domain::model::TransformResult;
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
