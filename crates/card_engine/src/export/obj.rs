//! Wavefront OBJ export.
//!
//! One `o` group per fragment, named after the fragment. Positions and
//! normals are world-space; face indices are 1-based and run across all
//! groups, referencing both position and normal (`f a//a b//b c//c`).

use std::io::{self, Write};

use crate::render::primitives::Mesh;

/// Write named meshes as Wavefront OBJ text.
pub fn write_obj<'a, W, I>(groups: I, writer: &mut W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a Mesh)>,
{
    writeln!(writer, "# cardforge OBJ export")?;

    let mut offset = 1u32;
    for (name, mesh) in groups {
        writeln!(writer, "o {name}")?;

        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            writeln!(writer, "v {x:.6} {y:.6} {z:.6}")?;
        }
        for v in &mesh.vertices {
            let [x, y, z] = v.normal;
            writeln!(writer, "vn {x:.6} {y:.6} {z:.6}")?;
        }

        for tri in mesh.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] + offset, tri[1] + offset, tri[2] + offset);
            writeln!(writer, "f {i0}//{i0} {i1}//{i1} {i2}//{i2}")?;
        }

        offset += mesh.vertices.len() as u32;
    }

    Ok(())
}
