//! File storage for uploads.

mod uploads;

pub use uploads::{StoredUpload, UploadStorage};
