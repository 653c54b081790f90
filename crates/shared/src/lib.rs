pub mod domain;
pub mod error;
pub mod metadata;
pub mod protocol;
