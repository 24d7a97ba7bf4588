pub mod catalog;
pub mod normalize;

pub use crate::domain::model::{Entity, Record, Submission};
pub use crate::domain::ports::{ConfigProvider, DocumentStore};
pub use crate::utils::error::Result;
