pub mod output;
pub mod summary;
