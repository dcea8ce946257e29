pub mod repository;
pub mod source;
