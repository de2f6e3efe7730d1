// src/rendering/export.rs

use super::primitives::TriMesh;
use crate::config::StlFormat;
use crate::error::{Cif2StlError, Result};
use crate::utils::geometry::face_normal;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Binary STL attribute word: VisCAM layout, bit 15 marks a valid color,
/// then 5 bits each of red, green, blue (blue in the low bits).
fn facet_color(rgba: [u8; 4]) -> u16 {
    let r = (rgba[0] >> 3) as u16;
    let g = (rgba[1] >> 3) as u16;
    let b = (rgba[2] >> 3) as u16;
    0x8000 | (r << 10) | (g << 5) | b
}

fn triangle(mesh: &TriMesh, face: &[u32; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let v = [
        mesh.vertices[face[0] as usize],
        mesh.vertices[face[1] as usize],
        mesh.vertices[face[2] as usize],
    ];
    (face_normal(v[0], v[1], v[2]), v)
}

/// Binary STL: 80-byte header, u32 facet count, 50 bytes per facet
pub fn write_binary<W: Write>(mesh: &TriMesh, writer: &mut W, title: &str) -> io::Result<()> {
    let mut header = [b' '; 80];
    let text = format!("cif2stl {} - {} triangles", title, mesh.face_count());
    let n = text.len().min(80);
    header[..n].copy_from_slice(&text.as_bytes()[..n]);
    writer.write_all(&header)?;
    writer.write_all(&(mesh.face_count() as u32).to_le_bytes())?;

    for face in &mesh.faces {
        let (normal, verts) = triangle(mesh, face);
        for c in normal {
            writer.write_all(&(c as f32).to_le_bytes())?;
        }
        for v in verts {
            for c in v {
                writer.write_all(&(c as f32).to_le_bytes())?;
            }
        }
        let attribute = match &mesh.colors {
            Some(colors) => facet_color(colors[face[0] as usize]),
            None => 0,
        };
        writer.write_all(&attribute.to_le_bytes())?;
    }
    Ok(())
}

pub fn write_ascii<W: Write>(mesh: &TriMesh, writer: &mut W, title: &str) -> io::Result<()> {
    writeln!(writer, "solid {}", title)?;
    for face in &mesh.faces {
        let (n, verts) = triangle(mesh, face);
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n[0], n[1], n[2])?;
        writeln!(writer, "    outer loop")?;
        for v in verts {
            writeln!(writer, "      vertex {:.6e} {:.6e} {:.6e}", v[0], v[1], v[2])?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {}", title)?;
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes the mesh to `path`.
///
/// Data goes to `<path>.part` first and is renamed into place once fully
/// flushed, so `path` only ever appears complete.
pub fn export_stl(mesh: &TriMesh, path: &Path, format: StlFormat) -> Result<()> {
    let tmp = part_path(path);
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();

    let written = (|| -> io::Result<()> {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        match format {
            StlFormat::Binary => write_binary(mesh, &mut writer, &title)?,
            StlFormat::Ascii => write_ascii(mesh, &mut writer, &title)?,
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(Cif2StlError::io(path, e));
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        Cif2StlError::io(path, e)
    })?;

    log::info!(
        "Wrote {} triangles to {:?} ({:?})",
        mesh.face_count(),
        path,
        format
    );
    Ok(())
}
