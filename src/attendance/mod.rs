pub mod error;
pub mod machine;
pub mod policy;
pub mod repository;
pub mod service;
pub mod summary;
pub mod time;
