//! Domain types with no OS dependencies.

pub mod buttons;
pub mod geometry;
pub mod image;
pub mod session;
pub mod window;
