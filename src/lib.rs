//! Scene interaction engine for the level preview.
//!
//! The crate turns placed scene objects into renderable proxies, casts
//! rays from the viewport into the scene, and moves objects around with
//! the mouse. Windowing lives in the binary; everything here is driven
//! through [`session::PreviewSession`].

pub mod animation;
pub mod assets;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod render;
pub mod scene;
pub mod session;

pub use config::PreviewSettings;
pub use session::PreviewSession;
