//! JSON dump of a colored mesh.
//!
//! The document is the serde form of [`ColoredMesh`]: `vertices` as `[x, y, z]`
//! triples, `colors` as `[r, g, b]` and `faces` as vertex index triples.

use depthify_core::{ColoredMesh, Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

fn json_error(e: serde_json::Error) -> Error {
    Error::InvalidData(format!("mesh JSON: {}", e))
}

/// Serialize a mesh as pretty-printed JSON
pub fn write_mesh_json<W: Write>(mesh: &ColoredMesh, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, mesh).map_err(json_error)?;
    writer.flush()?;
    Ok(())
}

/// Parse a mesh and check that colours and faces agree with the vertices
pub fn read_mesh_json<R: Read>(reader: R) -> Result<ColoredMesh> {
    let mesh: ColoredMesh = serde_json::from_reader(reader).map_err(json_error)?;
    if !mesh.is_consistent() {
        return Err(Error::InvalidData(format!(
            "inconsistent mesh: {} vertices, {} colours, faces must index existing vertices",
            mesh.vertex_count(),
            mesh.colors.len()
        )));
    }
    Ok(mesh)
}

pub fn write_mesh_json_file<P: AsRef<Path>>(mesh: &ColoredMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    write_mesh_json(mesh, BufWriter::new(File::create(path)?))?;
    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Wrote mesh"
    );
    Ok(())
}

pub fn read_mesh_json_file<P: AsRef<Path>>(path: P) -> Result<ColoredMesh> {
    read_mesh_json(BufReader::new(File::open(path)?))
}
