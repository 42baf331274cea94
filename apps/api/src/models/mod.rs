pub mod comment;
pub mod event;
pub mod note;
pub mod video;
