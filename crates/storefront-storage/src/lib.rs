pub mod client;
pub mod error;
pub mod path;
mod retry;

pub use client::{RemoteImage, StorageClient};
pub use error::StorageError;
pub use path::{extension_for, object_name};
