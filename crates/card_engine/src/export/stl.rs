//! STL export.
//!
//! Binary: an 80-byte header, a little-endian `u32` triangle count, then
//! 50 bytes per triangle (facet normal, three vertices, zero attribute).
//! ASCII: the `solid`/`facet`/`endsolid` text form of the same data.
//! Facet normals are recomputed from the vertex positions.

use std::io::{self, Write};

use crate::foundation::math::Vec3;
use crate::render::primitives::Mesh;

/// Size of the binary header
pub const HEADER_LEN: usize = 80;

/// Bytes per binary triangle record
pub const TRIANGLE_RECORD_LEN: usize = 50;

const HEADER_TEXT: &[u8] = b"Binary STL exported by cardforge";

/// Unit normal of a triangle, +Z for degenerate triangles
pub fn facet_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a)
        .cross(&(c - a))
        .try_normalize(1e-12)
        .unwrap_or_else(Vec3::z)
}

/// Write `mesh` as binary STL.
pub fn write_binary_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    let mut header = [0u8; HEADER_LEN];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    writer.write_all(&header)?;

    let count = u32::try_from(mesh.triangle_count())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many triangles for STL"))?;
    writer.write_all(&count.to_le_bytes())?;

    for triangle in mesh.triangles() {
        write_vec3(writer, facet_normal(triangle))?;
        for vertex in triangle {
            write_vec3(writer, vertex)?;
        }
        // Attribute byte count (unused)
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

/// Write `mesh` as ASCII STL under the solid name `name`.
pub fn write_ascii_stl<W: Write>(mesh: &Mesh, name: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "solid {name}")?;
    for triangle in mesh.triangles() {
        let n = facet_normal(triangle);
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in triangle {
            writeln!(writer, "      vertex {:e} {:e} {:e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}

fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> io::Result<()> {
    for component in [v.x, v.y, v.z] {
        writer.write_all(&component.to_le_bytes())?;
    }
    Ok(())
}
