mod reference;
mod resource_path;
mod timestamp;

pub use reference::{CollectionRef, DocumentRef};
pub use resource_path::{PathError, ResourcePath};
pub use timestamp::Timestamp;
