// export.rs - dump merged navmesh input for external tooling
//
// Writes the merged geometry as Wavefront OBJ (for viewing) and as JSON
// together with the generator config (for replaying a build elsewhere).

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builder::{NavmeshBuildAdapter, NavmeshConfig};

/// Write triangles as OBJ: `v x y z` lines, then 1-based `f a b c` lines
pub fn write_obj<W: Write>(
    writer: &mut W,
    vertices: &[[f32; 3]],
    indices: &[u32],
) -> std::io::Result<()> {
    writeln!(
        writer,
        "# navmerge: {} vertices, {} triangles",
        vertices.len(),
        indices.len() / 3
    )?;
    for v in vertices {
        writeln!(writer, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for tri in indices.chunks_exact(3) {
        writeln!(writer, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1)?;
    }
    Ok(())
}

/// Same as [`write_obj`], with one `vn` per vertex
pub fn write_obj_with_normals<W: Write>(
    writer: &mut W,
    vertices: &[[f32; 3]],
    normals: &[[f32; 3]],
    indices: &[u32],
) -> std::io::Result<()> {
    writeln!(
        writer,
        "# navmerge: {} vertices, {} triangles",
        vertices.len(),
        indices.len() / 3
    )?;
    for v in vertices {
        writeln!(writer, "v {} {} {}", v[0], v[1], v[2])?;
    }
    for n in normals {
        writeln!(writer, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}

/// Merged geometry plus the config it was meant to be built with
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedMeshFile {
    pub config: NavmeshConfig,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Files written for one navmesh
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedMesh {
    pub obj_path: PathBuf,
    pub json_path: PathBuf,
}

/// Stands in for a navmesh generator by writing its input to disk
pub struct ExportAdapter {
    output_dir: PathBuf,
    written: usize,
}

impl ExportAdapter {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            written: 0,
        }
    }
}

impl NavmeshBuildAdapter for ExportAdapter {
    type Root = ExportedMesh;

    fn build(
        &mut self,
        config: &NavmeshConfig,
        vertices: &[[f32; 3]],
        indices: &[u32],
    ) -> anyhow::Result<ExportedMesh> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;

        let stem = format!("navmesh_{}", self.written);
        let obj_path = self.output_dir.join(format!("{}.obj", stem));
        let json_path = self.output_dir.join(format!("{}.json", stem));

        let file = fs::File::create(&obj_path)
            .with_context(|| format!("Failed to create {}", obj_path.display()))?;
        let mut writer = BufWriter::new(file);
        write_obj(&mut writer, vertices, indices)?;
        writer.flush()?;

        let dump = MergedMeshFile {
            config: config.clone(),
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        };
        let file = fs::File::create(&json_path)
            .with_context(|| format!("Failed to create {}", json_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &dump)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        writer.flush()?;

        info!(
            "Wrote {} ({} vertices, {} triangles)",
            obj_path.display(),
            vertices.len(),
            indices.len() / 3
        );

        self.written += 1;
        Ok(ExportedMesh { obj_path, json_path })
    }
}
