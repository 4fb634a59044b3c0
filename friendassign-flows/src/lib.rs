//! Headless view-models for FriendAssign.
//!
//! Each screen is a struct that owns its state and exposes one async method per user action.
//! Actions never return errors; they return an [`notice::Outcome`] saying what to show and where
//! to go next.

pub mod board;
pub mod debounce;
pub mod detail;
pub mod editor;
pub mod gate;
pub mod grading;
pub mod listing;
pub mod notice;
pub mod validation;
