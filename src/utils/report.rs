// src/utils/report.rs

use crate::model::ExpandedAtom;
use crate::rendering::TriMesh;
use std::collections::HashMap;

/// Text table printed after a generation: formula of the expanded set,
/// the first 20 atoms, then mesh statistics.
pub fn generation_summary(source: &str, atoms: &[ExpandedAtom], bonds: usize, mesh: &TriMesh) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for atom in atoms {
        *counts.entry(atom.element.clone()).or_insert(0) += 1;
    }

    let mut parts: Vec<_> = counts.into_iter().collect();
    parts.sort_by(|a, b| a.0.cmp(&b.0));

    let formula_str: String = parts
        .iter()
        .map(|(el, count)| format!("{}{}", el, count))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::new();
    out.push_str(&format!("File: {}\n", source));
    out.push_str(&format!("Atoms: {}\n", formula_str));
    out.push_str("------------------------------------------------------------------\n");
    out.push_str(&format!(
        "{:<8} {:<8} {:<6} {:<10} {:<10} {:<10} {:<6}\n",
        "Index", "Element", "Site", "X", "Y", "Z", "Bonds"
    ));
    out.push_str("------------------------------------------------------------------\n");

    for atom in atoms.iter().take(20) {
        out.push_str(&format!(
            "{:<8} {:<8} {:<6} {:<10.4} {:<10.4} {:<10.4} {:<6}\n",
            atom.id,
            atom.element,
            atom.site_index,
            atom.position[0],
            atom.position[1],
            atom.position[2],
            atom.bonds.len()
        ));
    }

    if atoms.len() > 20 {
        out.push_str(&format!("... and {} more atoms.\n", atoms.len() - 20));
    }

    let spins = atoms.iter().filter(|a| a.has_spin()).count();
    out.push_str("------------------------------------------------------------------\n");
    out.push_str(&format!("Bonds: {}   Spins: {}\n", bonds, spins));
    out.push_str(&format!(
        "Mesh: {} vertices, {} triangles\n",
        mesh.vertex_count(),
        mesh.face_count()
    ));
    if let Some((min, max)) = mesh.bounds() {
        out.push_str(&format!(
            "Size: {:.2} x {:.2} x {:.2}\n",
            max[0] - min[0],
            max[1] - min[1],
            max[2] - min[2]
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::primitives::cuboid;

    #[test]
    fn test_summary_truncates() {
        let atoms: Vec<ExpandedAtom> = (0..25)
            .map(|i| ExpandedAtom {
                id: i,
                element: if i % 2 == 0 { "Fe" } else { "O" }.to_string(),
                oxidation: None,
                position: [i as f64, 0.0, 0.0],
                frac: [0.0; 3],
                cell: [0; 3],
                site_index: i % 2,
                spin: [0.0; 3],
                bonds: Vec::new(),
            })
            .collect();
        let text = generation_summary("x.cif", &atoms, 0, &cuboid([0.0; 3], [2.0, 1.0, 1.0]));
        assert!(text.contains("Atoms: Fe13 O12"));
        assert!(text.contains("... and 5 more atoms."));
        assert!(text.contains("12 triangles"));
        assert!(text.contains("Size: 2.00 x 1.00 x 1.00"));
    }
}
