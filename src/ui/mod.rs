//! # UI Module
//!
//! This module provides the terminal user interface components for
//! makescope.
//!
//! ## Components
//!
//! - [`App`] - Application state management (selection, focus, search,
//!   pending confirmations)
//! - [`mod@render`] - Rendering functions for drawing the TUI
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    Header                        │
//! ├─────────────────────┬───────────────────────────┤
//! │                     │                           │
//! │   Target List       │      Details Panel        │
//! │   (danger markers,  │   (description, order,    │
//! │    critical stars)  │    safety findings)       │
//! │                     │    (or, with `t`, the)    │
//! │                     │      Dependency Tree      │
//! │                     │                           │
//! ├─────────────────────┴───────────────────────────┤
//! │                    Footer                        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - Search across target names and descriptions
//! - Toggleable dependency-tree view with order/critical/parallel markers
//! - Confirmation modal blocking execution of Critical targets
//! - Footer status line with the last run's outcome

pub mod app;
pub mod render;

pub use app::App;
pub use render::render;
