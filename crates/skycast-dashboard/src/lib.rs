//! Interactive weather dashboard: state, async request plumbing and text rendering.

pub mod error_mapping;
pub mod model;
pub mod render;
pub mod services;

pub use model::{ApplyPolicy, Dashboard, DashboardView};
pub use render::{render, Mood, Theme};
pub use services::{spawn_auto_refresh, DashboardMessage, DashboardServices, Notice};
