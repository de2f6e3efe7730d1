// src/utils/geometry.rs

pub type Point3 = [f64; 3];

/// Calculates distance between two points
pub fn distance(p1: Point3, p2: Point3) -> f64 {
    len(sub(p1, p2))
}

pub fn midpoint(p1: Point3, p2: Point3) -> Point3 {
    [
        (p1[0] + p2[0]) * 0.5,
        (p1[1] + p2[1]) * 0.5,
        (p1[2] + p2[2]) * 0.5,
    ]
}

pub fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn add(a: Point3, b: Point3) -> Point3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn scale(a: Point3, s: f64) -> Point3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn len(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

/// Zero vectors stay zero
pub fn normalize(a: Point3) -> Point3 {
    let l = len(a);
    if l == 0.0 { [0.0, 0.0, 0.0] } else { [a[0] / l, a[1] / l, a[2] / l] }
}

/// Unit normal of triangle (a, b, c), counter-clockwise winding
pub fn face_normal(a: Point3, b: Point3, c: Point3) -> Point3 {
    normalize(cross(sub(b, a), sub(c, a)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert!((distance([0.0, 0.0, 0.0], [0.0, 0.0, 2.0]) - 2.0).abs() < 1e-12);
        assert!((distance([1.0, 2.0, 3.0], [4.0, 6.0, 3.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_face_normal_ccw() {
        let n = face_normal([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((n[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize([0.0; 3]), [0.0; 3]);
    }
}
