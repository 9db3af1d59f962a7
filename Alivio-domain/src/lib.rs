// Alivio Domain
// This crate contains the analytics, backup and calendar logic of the journal

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Re-export the storage layer for convenience
pub use alivio_data::database;
pub use alivio_data::repository;
