pub mod handlers;
pub mod services;

pub use services::UploadItem;
