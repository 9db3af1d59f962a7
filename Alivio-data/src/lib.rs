// Alivio Data
// This crate handles record storage and persistence

// Key-value store backends
pub mod database;

// Repository implementations for data access
pub mod repository;

// Stored record models
pub mod models;
