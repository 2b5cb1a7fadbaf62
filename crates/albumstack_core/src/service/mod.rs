//! Use-case services.
//!
//! # Responsibility
//! - Offer typed album operations to in-process callers.
//! - Keep callers decoupled from route paths and public JSON shapes.

pub mod album_service;
