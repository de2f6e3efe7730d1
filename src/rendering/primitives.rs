// src/rendering/primitives.rs

use crate::utils::geometry::{self, Point3};
use nalgebra::{Rotation3, Unit, Vector3};
use std::collections::HashMap;
use std::f64::consts::PI;

/// Dot-product margin under which two unit vectors count as (anti)parallel
const PARALLEL_EPS: f64 = 1e-9;

/// Triangle soup with optional per-vertex RGBA colors.
///
/// Faces index into `vertices`, wound counter-clockwise seen from outside.
#[derive(Clone, Debug, Default)]
pub struct TriMesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<[u32; 3]>,
    pub colors: Option<Vec<[u8; 4]>>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Point3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            colors: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Paints every vertex with `color`
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.colors = Some(vec![color; self.vertices.len()]);
        self
    }

    /// Concatenates `other`, shifting its indices. No vertex welding.
    pub fn append(&mut self, other: &TriMesh) {
        let offset = self.vertices.len() as u32;

        // Uncolored parts are painted white so the color list stays per-vertex
        self.colors = match (self.colors.take(), &other.colors) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (Some(mut mine), None) => {
                mine.extend(std::iter::repeat([255u8; 4]).take(other.vertices.len()));
                Some(mine)
            }
            (None, Some(theirs)) => {
                let mut colors = vec![[255u8; 4]; self.vertices.len()];
                colors.extend_from_slice(theirs);
                Some(colors)
            }
            (None, None) => None,
        };

        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
    }

    /// Axis-aligned bounds (min, max); `None` when empty
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices[1..] {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        Some((min, max))
    }

    /// Applies `rotation`, then moves by `offset`
    pub fn transform(&mut self, rotation: &Rotation3<f64>, offset: Point3) {
        for v in self.vertices.iter_mut() {
            let p = rotation * Vector3::from(*v);
            *v = [p.x + offset[0], p.y + offset[1], p.z + offset[2]];
        }
    }

    pub fn translate(&mut self, offset: Point3) {
        for v in self.vertices.iter_mut() {
            *v = geometry::add(*v, offset);
        }
    }
}

/// Rotation taking one direction onto another, with the degenerate
/// cases spelled out instead of falling out of a zero cross product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    /// Directions already coincide (or the target is the zero vector)
    Identity,
    /// Directions are opposite: half turn about an axis perpendicular to `from`
    HalfTurn { axis: Point3 },
    /// General case: `angle` radians about the unit `axis`
    Rotate { axis: Point3, angle: f64 },
}

impl Alignment {
    pub fn between(from: Point3, to: Point3) -> Self {
        let from = geometry::normalize(from);
        let to = geometry::normalize(to);
        if geometry::len(from) == 0.0 || geometry::len(to) == 0.0 {
            return Alignment::Identity;
        }

        let cos = geometry::dot(from, to).clamp(-1.0, 1.0);
        if cos > 1.0 - PARALLEL_EPS {
            Alignment::Identity
        } else if cos < -1.0 + PARALLEL_EPS {
            // Any axis perpendicular to `from` works; pick a stable one
            let helper = if from[0].abs() < 0.9 { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
            Alignment::HalfTurn {
                axis: geometry::normalize(geometry::cross(from, helper)),
            }
        } else {
            Alignment::Rotate {
                axis: geometry::normalize(geometry::cross(from, to)),
                angle: cos.acos(),
            }
        }
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        match *self {
            Alignment::Identity => Rotation3::identity(),
            Alignment::HalfTurn { axis } => {
                Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::from(axis)), PI)
            }
            Alignment::Rotate { axis, angle } => {
                Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::from(axis)), angle)
            }
        }
    }
}

/// Alignment of the +z reference axis onto `direction`
pub fn align_z_to(direction: Point3) -> Alignment {
    Alignment::between([0.0, 0.0, 1.0], direction)
}

/// Unit-radius icosahedron subdivided `subdivisions` times, then scaled.
/// Gives 10 * 4^n + 2 vertices and 20 * 4^n faces.
pub fn icosphere(radius: f64, subdivisions: u32, center: Point3) -> TriMesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut vertices: Vec<Point3> = [
        [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
        [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
        [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|v| geometry::normalize(*v))
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut cache: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Point3>| -> u32 {
            let key = if a < b { (a, b) } else { (b, a) };
            *cache.entry(key).or_insert_with(|| {
                let m = geometry::midpoint(vertices[a as usize], vertices[b as usize]);
                vertices.push(geometry::normalize(m));
                (vertices.len() - 1) as u32
            })
        };

        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    let vertices = vertices
        .into_iter()
        .map(|v| geometry::add(geometry::scale(v, radius), center))
        .collect();
    TriMesh::new(vertices, faces)
}

/// Capped cylinder along +z, centered on the origin (z in [-h/2, h/2]).
/// 2s + 2 vertices, 4s faces.
pub fn cylinder(radius: f64, height: f64, sections: u32) -> TriMesh {
    let s = sections.max(3);
    let half = height / 2.0;
    let mut vertices = Vec::with_capacity(2 * s as usize + 2);

    for z in [-half, half] {
        for i in 0..s {
            let theta = 2.0 * PI * i as f64 / s as f64;
            vertices.push([radius * theta.cos(), radius * theta.sin(), z]);
        }
    }
    vertices.push([0.0, 0.0, -half]);
    vertices.push([0.0, 0.0, half]);

    let (bottom, top) = (2 * s, 2 * s + 1);
    let mut faces = Vec::with_capacity(4 * s as usize);
    for i in 0..s {
        let j = (i + 1) % s;
        faces.push([i, j, s + j]);
        faces.push([i, s + j, s + i]);
        faces.push([bottom, j, i]);
        faces.push([top, s + i, s + j]);
    }
    TriMesh::new(vertices, faces)
}

/// Capped cone with its base disc at z = 0 and apex at z = height.
/// s + 2 vertices, 2s faces.
pub fn cone(radius: f64, height: f64, sections: u32) -> TriMesh {
    let s = sections.max(3);
    let mut vertices: Vec<Point3> = (0..s)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / s as f64;
            [radius * theta.cos(), radius * theta.sin(), 0.0]
        })
        .collect();
    vertices.push([0.0, 0.0, 0.0]);
    vertices.push([0.0, 0.0, height]);

    let (base, apex) = (s, s + 1);
    let mut faces = Vec::with_capacity(2 * s as usize);
    for i in 0..s {
        let j = (i + 1) % s;
        faces.push([i, j, apex]);
        faces.push([base, j, i]);
    }
    TriMesh::new(vertices, faces)
}

/// Axis-aligned box between two corners. 8 vertices, 12 faces.
pub fn cuboid(min: Point3, max: Point3) -> TriMesh {
    let vertices = (0..8)
        .map(|i| {
            [
                if i & 1 != 0 { max[0] } else { min[0] },
                if i & 2 != 0 { max[1] } else { min[1] },
                if i & 4 != 0 { max[2] } else { min[2] },
            ]
        })
        .collect();
    let faces = vec![
        [0, 2, 1], [1, 2, 3], // -z
        [4, 5, 6], [5, 7, 6], // +z
        [0, 1, 5], [0, 5, 4], // -y
        [2, 6, 7], [2, 7, 3], // +y
        [0, 4, 6], [0, 6, 2], // -x
        [1, 3, 7], [1, 7, 5], // +x
    ];
    TriMesh::new(vertices, faces)
}

/// Cylinder spanning `start` to `end`; `None` when the points coincide
pub fn cylinder_between(start: Point3, end: Point3, radius: f64, sections: u32) -> Option<TriMesh> {
    let axis = geometry::sub(end, start);
    let length = geometry::len(axis);
    if length < 1e-12 {
        return None;
    }
    let mut mesh = cylinder(radius, length, sections);
    mesh.transform(&align_z_to(axis).rotation(), geometry::midpoint(start, end));
    Some(mesh)
}

/// Dimensions of a spin arrow in model units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowShape {
    pub length: f64,
    pub shaft_radius: f64,
    pub tip_radius: f64,
    pub tip_length: f64,
}

/// Shaft from the anchor out to `length`, cone tip past 90 % of the shaft,
/// pointed along `direction`. `None` for a zero direction.
pub fn arrow(anchor: Point3, direction: Point3, shape: &ArrowShape, sections: u32) -> Option<TriMesh> {
    if geometry::len(direction) == 0.0 {
        return None;
    }

    // 1. Shaft along +z, z in [0, L]
    let mut mesh = cylinder(shape.shaft_radius, shape.length, sections);
    mesh.translate([0.0, 0.0, shape.length / 2.0]);

    // 2. Tip
    let mut tip = cone(shape.tip_radius, shape.tip_length, sections);
    tip.translate([0.0, 0.0, shape.length * 0.9 + shape.tip_length / 2.0]);
    mesh.append(&tip);

    // 3. Orient and anchor
    mesh.transform(&align_z_to(direction).rotation(), anchor);
    Some(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point3, b: Point3, eps: f64) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < eps)
    }

    #[test]
    fn test_icosphere_counts() {
        for n in 0..4 {
            let m = icosphere(1.0, n, [0.0; 3]);
            assert_eq!(m.vertex_count(), 10 * 4usize.pow(n) + 2);
            assert_eq!(m.face_count(), 20 * 4usize.pow(n));
        }
    }

    #[test]
    fn test_icosphere_radius_and_winding() {
        let c = [1.0, -2.0, 0.5];
        let m = icosphere(0.7, 2, c);
        for v in &m.vertices {
            assert!((geometry::distance(*v, c) - 0.7).abs() < 1e-12);
        }
        for f in &m.faces {
            let (a, b, cc) = (m.vertices[f[0] as usize], m.vertices[f[1] as usize], m.vertices[f[2] as usize]);
            let n = geometry::face_normal(a, b, cc);
            let centroid = geometry::scale(geometry::add(geometry::add(a, b), cc), 1.0 / 3.0);
            assert!(geometry::dot(n, geometry::sub(centroid, c)) > 0.0);
        }
    }

    #[test]
    fn test_cylinder_and_cone_counts() {
        let cyl = cylinder(0.25, 2.0, 32);
        assert_eq!(cyl.vertex_count(), 66);
        assert_eq!(cyl.face_count(), 128);
        let (min, max) = cyl.bounds().unwrap();
        assert!((min[2] + 1.0).abs() < 1e-12 && (max[2] - 1.0).abs() < 1e-12);

        let tip = cone(0.3, 0.5, 32);
        assert_eq!(tip.vertex_count(), 34);
        assert_eq!(tip.face_count(), 64);
        assert_eq!(cuboid([0.0; 3], [1.0; 3]).face_count(), 12);
    }

    #[test]
    fn test_append_is_concatenation() {
        let mut a = icosphere(1.0, 1, [0.0; 3]).with_color([255, 0, 0, 255]);
        let b = cylinder(0.2, 1.0, 8);
        let (va, fa) = (a.vertex_count(), a.face_count());
        a.append(&b);
        assert_eq!(a.vertex_count(), va + b.vertex_count());
        assert_eq!(a.face_count(), fa + b.face_count());
        assert_eq!(a.colors.as_ref().unwrap().len(), a.vertex_count());
        assert_eq!(a.faces[fa], [b.faces[0][0] + va as u32, b.faces[0][1] + va as u32, b.faces[0][2] + va as u32]);
    }

    #[test]
    fn test_alignment_cases() {
        assert_eq!(align_z_to([0.0, 0.0, 3.0]), Alignment::Identity);
        assert_eq!(align_z_to([0.0, 0.0, 0.0]), Alignment::Identity);
        assert!(matches!(align_z_to([0.0, 0.0, -1.0]), Alignment::HalfTurn { .. }));
        assert!(matches!(align_z_to([1.0, 0.0, 0.0]), Alignment::Rotate { .. }));

        for dir in [[0.0, 0.0, -2.0], [1.0, 0.0, 0.0], [1.0, -2.0, 0.5], [0.0, 0.0, 1.0]] {
            let r = align_z_to(dir).rotation();
            let v = r * Vector3::new(0.0, 0.0, 1.0);
            assert!(close([v.x, v.y, v.z], geometry::normalize(dir), 1e-9), "{:?}", dir);
        }
    }

    #[test]
    fn test_vertical_bond_cylinder() {
        // Antiparallel to the reference axis
        let m = cylinder_between([0.0, 0.0, 2.0], [0.0, 0.0, 0.0], 0.25, 16).unwrap();
        let (min, max) = m.bounds().unwrap();
        assert!((min[2]).abs() < 1e-9 && (max[2] - 2.0).abs() < 1e-9);
        assert!(cylinder_between([1.0; 3], [1.0; 3], 0.25, 16).is_none());
    }

    #[test]
    fn test_arrow_points_along_spin() {
        let shape = ArrowShape {
            length: 1.5,
            shaft_radius: 0.15,
            tip_radius: 0.3,
            tip_length: 0.3,
        };
        let down = arrow([0.0; 3], [0.0, 0.0, -1.0], &shape, 16).unwrap();
        let (min, max) = down.bounds().unwrap();
        let apex = -(1.5 * 0.9 + 0.15 + 0.3);
        assert!((min[2] - apex).abs() < 1e-9);
        assert!(max[2].abs() < 1e-9);

        let m = arrow([1.0, 1.0, 1.0], [1.0, 0.0, 0.0], &shape, 16).unwrap();
        let (_, max) = m.bounds().unwrap();
        assert!((max[0] - (1.0 - apex)).abs() < 1e-9);
        assert_eq!(m.face_count(), 4 * 16 + 2 * 16);
        assert!(arrow([0.0; 3], [0.0; 3], &shape, 16).is_none());
    }
}
