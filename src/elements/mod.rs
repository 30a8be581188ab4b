//! Built-in and general-purpose map elements.
//!
//! Collision and cover are the derivation passes the builder runs after
//! every user element; fill, rect, and scatter are the reusable placement
//! generators concrete maps compose.

pub mod collision;
pub mod cover;
pub mod fill;
pub mod rect;
pub mod scatter;

pub use collision::CollisionElement;
pub use cover::CoverElement;
pub use fill::FillElement;
pub use rect::RectElement;
pub use scatter::{ScatterElement, ScatterMask, ScatterNoise};
