pub mod batch;
pub mod detect;
pub mod discover;
