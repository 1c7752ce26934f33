//! Mesh export
//!
//! Provides writers for the interchange formats a slicer accepts:
//! - **STL**: Binary triangle soup from the merged world geometry
//! - **STL (ASCII)**: The same data in text form
//! - **OBJ**: Wavefront text with one group per fragment
//!
//! Merged buffers are locals of each export call and are dropped on every
//! return path, including errors.

pub mod merge;
pub mod stl;
pub mod obj;

pub use merge::{merge_world_geometry, CombinedMesh, MeshGroup};
pub use stl::{write_ascii_stl, write_binary_stl};
pub use obj::write_obj;

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use thiserror::Error;

use crate::render::primitives::Mesh;
use crate::scene::CardAssembly;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// The assembly has no visible geometry
    #[error("Nothing to export")]
    EmptyExport,

    /// Format keyword not recognized
    #[error("Unknown export format '{0}' (expected stl, stl-ascii or obj)")]
    UnknownFormat(String),

    /// Writing the output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Binary STL (`stl`)
    StlBinary,
    /// ASCII STL (`stl-ascii`)
    StlAscii,
    /// Wavefront OBJ (`obj`)
    Obj,
}

impl ExportFormat {
    /// Keyword used to request the format
    pub fn keyword(self) -> &'static str {
        match self {
            Self::StlBinary => "stl",
            Self::StlAscii => "stl-ascii",
            Self::Obj => "obj",
        }
    }

    /// Conventional file extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::StlBinary | Self::StlAscii => "stl",
            Self::Obj => "obj",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stl" => Ok(Self::StlBinary),
            "stl-ascii" => Ok(Self::StlAscii),
            "obj" => Ok(Self::Obj),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// File name for an export: `base` plus the format's extension
pub fn export_file_name(base: &str, format: ExportFormat) -> String {
    format!("{base}.{}", format.extension())
}

/// Serializes card assemblies
#[derive(Debug, Clone)]
pub struct MeshExporter {
    solid_name: String,
}

impl Default for MeshExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshExporter {
    /// Create an exporter
    pub fn new() -> Self {
        Self {
            solid_name: "cardforge".to_string(),
        }
    }

    /// Set the solid name written into ASCII STL
    pub fn with_solid_name(mut self, name: impl Into<String>) -> Self {
        self.solid_name = name.into();
        self
    }

    /// Merge all visible fragments into one world-space mesh
    pub fn merge_world_geometry(&self, assembly: &CardAssembly) -> Option<CombinedMesh> {
        merge_world_geometry(assembly)
    }

    fn merged(&self, assembly: &CardAssembly) -> Result<CombinedMesh, ExportError> {
        self.merge_world_geometry(assembly).ok_or_else(|| {
            log::warn!("Export requested but the card has no geometry");
            ExportError::EmptyExport
        })
    }

    /// Binary STL of the merged assembly
    pub fn export_binary(&self, assembly: &CardAssembly) -> Result<Vec<u8>, ExportError> {
        self.binary_from(&self.merged(assembly)?)
    }

    /// Binary STL of an already merged mesh
    pub fn binary_from(&self, combined: &CombinedMesh) -> Result<Vec<u8>, ExportError> {
        if combined.mesh.is_empty() {
            return Err(ExportError::EmptyExport);
        }
        let mut buffer = Vec::with_capacity(
            stl::HEADER_LEN + 4 + combined.triangle_count() * stl::TRIANGLE_RECORD_LEN,
        );
        write_binary_stl(&combined.mesh, &mut buffer)?;
        log::info!("Binary STL: {} triangles, {} bytes", combined.triangle_count(), buffer.len());
        Ok(buffer)
    }

    /// ASCII STL of the merged assembly
    pub fn export_ascii(&self, assembly: &CardAssembly) -> Result<String, ExportError> {
        let combined = self.merged(assembly)?;
        let mut buffer = Vec::new();
        write_ascii_stl(&combined.mesh, &self.solid_name, &mut buffer)?;
        log::info!("ASCII STL: {} triangles, {} bytes", combined.triangle_count(), buffer.len());
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// OBJ text with one group per fragment, straight from the fragment list
    pub fn export_text(&self, assembly: &CardAssembly) -> Result<String, ExportError> {
        let groups: Vec<(String, Mesh)> = merge::exportable_fragments(assembly)
            .into_iter()
            .filter_map(|id| {
                let name = assembly.graph().node(id)?.name.clone();
                Some((name, merge::world_mesh(assembly, id)?))
            })
            .collect();
        self.text_from(&groups)
    }

    /// OBJ text of named world-space meshes
    pub fn text_from(&self, groups: &[(String, Mesh)]) -> Result<String, ExportError> {
        if groups.iter().all(|(_, mesh)| mesh.is_empty()) {
            log::warn!("Export requested but the card has no geometry");
            return Err(ExportError::EmptyExport);
        }
        let mut buffer = Vec::new();
        write_obj(groups.iter().map(|(name, mesh)| (name.as_str(), mesh)), &mut buffer)?;
        log::info!("OBJ: {} groups, {} bytes", groups.len(), buffer.len());
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Serialize in the requested format
    pub fn export(&self, assembly: &CardAssembly, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match format {
            ExportFormat::StlBinary => self.export_binary(assembly),
            ExportFormat::StlAscii => self.export_ascii(assembly).map(String::into_bytes),
            ExportFormat::Obj => self.export_text(assembly).map(String::into_bytes),
        }
    }

    /// Serialize into `writer`; returns the number of bytes written
    pub fn write_to<W: Write>(
        &self,
        assembly: &CardAssembly,
        format: ExportFormat,
        writer: &mut W,
    ) -> Result<usize, ExportError> {
        let bytes = self.export(assembly, format)?;
        writer.write_all(&bytes)?;
        Ok(bytes.len())
    }
}
