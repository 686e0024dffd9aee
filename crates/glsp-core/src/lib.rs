//! glsp-core — reactive building blocks for the GLSP client.
//!
//! This crate provides the disposal-tracking and event-emitter primitives
//! used by every other crate in the workspace. It has no opinion about the
//! protocol itself.
pub mod disposable;
pub mod event;

// Re-export key types for convenience.
pub use disposable::{Disposable, DisposableCollection};
pub use event::{Emitter, Subscription};
