//! # Card Engine
//!
//! A parametric composer for printable plaques ("cards") written in Rust.
//!
//! ## Features
//!
//! - **Solid Builder**: Rectangular base and optional four-segment frame
//! - **Labels**: Embossed or engraved extruded text with picking proxies
//! - **Fragment Arena**: Every mesh and material released exactly once
//! - **Picking**: Ray hit-testing and drag across the card face
//! - **Export**: Binary STL, ASCII STL and Wavefront OBJ
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use card_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let config = ForgeConfig::default();
//!     let mut engine = CardEngine::new(&config, BlockGlyphOutliner::new())?;
//!     pollster::block_on(engine.apply_catalog())?;
//!
//!     let bytes = engine.export(ExportFormat::StlBinary)?;
//!     std::fs::write(engine.export_file_name(ExportFormat::StlBinary), bytes)
//!         .expect("write export");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod events;
pub mod render;
pub mod physics;
pub mod scene;
pub mod input;
pub mod export;

mod engine;

pub use engine::{CardEngine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        CardEngine, EngineError,
        config::{Config, ConfigError},
        core::config::{ForgeConfig, LayoutConstants},
        events::{Event, EventArg, EventHandler, EventSystem, EventType},
        export::{ExportError, ExportFormat, MeshExporter},
        foundation::math::{Mat4, Transform, Vec3},
        input::Picker,
        physics::collision::{screen_to_ndc, Ray},
        render::text::{BlockGlyphOutliner, GlyphOutliner, LabelBuilder, LabelSpec, PlacementMode},
        scene::{CardAssembly, CardParameters, FragmentId, SceneError},
    };
}

#[cfg(test)]
mod tests;
