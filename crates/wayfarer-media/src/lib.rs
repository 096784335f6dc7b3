pub mod storage;

pub use storage::{LoadedFile, MediaError, MediaStore};
