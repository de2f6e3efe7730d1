use std::collections::HashMap;

/// Returns (covalent_radius_in_angstroms, (r, g, b))
/// Radii are based on covalent radii. Colors are standard CPK.
pub fn get_atom_properties(element: &str) -> (f64, (f64, f64, f64)) {
    match element {
        // --- Period 1 ---
        "H"  => (0.37, (1.00, 1.00, 1.00)), // White
        "He" => (0.32, (0.85, 1.00, 1.00)), // Cyan-White

        // --- Period 2 ---
        "Li" => (1.34, (0.80, 0.50, 1.00)), // Violet
        "Be" => (0.90, (0.76, 1.00, 0.00)), // Yellow-Green
        "B"  => (0.82, (1.00, 0.70, 0.70)), // Pink-Salmon
        "C"  => (0.77, (0.20, 0.20, 0.20)), // Dark Grey
        "N"  => (0.75, (0.19, 0.31, 0.97)), // Blue
        "O"  => (0.73, (1.00, 0.05, 0.05)), // Red
        "F"  => (0.71, (0.56, 0.88, 0.31)), // Green
        "Ne" => (0.69, (0.70, 0.89, 0.96)), // Light Cyan

        // --- Period 3 ---
        "Na" => (1.54, (0.67, 0.36, 0.95)), // Violet
        "Mg" => (1.30, (0.54, 1.00, 0.00)), // Forest Green
        "Al" => (1.18, (0.75, 0.65, 0.65)), // Silver-Grey
        "Si" => (1.11, (0.94, 0.78, 0.63)), // Tan
        "P"  => (1.06, (1.00, 0.50, 0.00)), // Orange
        "S"  => (1.02, (1.00, 1.00, 0.19)), // Yellow
        "Cl" => (0.99, (0.12, 0.94, 0.12)), // Bright Green
        "Ar" => (0.97, (0.50, 0.82, 0.89)), // Cyan

        // --- Period 4 (Selected Common Metals) ---
        "K"  => (1.96, (0.56, 0.25, 0.83)), // Purple
        "Ca" => (1.74, (0.24, 1.00, 0.00)), // Dark Green
        "Ti" => (1.36, (0.75, 0.76, 0.78)), // Silver
        "V"  => (1.25, (0.65, 0.65, 0.67)), // Grey
        "Cr" => (1.27, (0.54, 0.60, 0.78)), // Blue-Grey
        "Mn" => (1.39, (0.61, 0.48, 0.78)), // Purple-Grey
        "Fe" => (1.25, (0.88, 0.40, 0.20)), // Rust / Orange
        "Co" => (1.26, (0.94, 0.56, 0.63)), // Pink-ish
        "Ni" => (1.21, (0.31, 0.82, 0.31)), // Green
        "Cu" => (1.38, (0.78, 0.50, 0.20)), // Copper
        "Zn" => (1.31, (0.49, 0.50, 0.69)), // Slate
        "Ga" => (1.26, (0.76, 0.56, 0.56)), // Dark Pink
        "Ge" => (1.22, (0.40, 0.56, 0.56)), // Grey-Teal
        "As" => (1.19, (0.74, 0.50, 0.89)), // Violet
        "Se" => (1.16, (1.00, 0.63, 0.00)), // Orange
        "Br" => (1.14, (0.65, 0.16, 0.16)), // Brown
        "Kr" => (1.10, (0.36, 0.72, 0.82)), // Blue-Green

        // --- Period 5/6 (Selected) ---
        "Sr" => (1.92, (0.00, 1.00, 0.00)), // Green
        "Y"  => (1.62, (0.58, 1.00, 1.00)), // Pale Cyan
        "Ag" => (1.53, (0.75, 0.75, 0.75)), // Silver
        "Ba" => (1.98, (0.00, 0.79, 0.00)), // Green
        "La" => (1.69, (0.44, 0.83, 1.00)), // Sky Blue
        "Gd" => (1.61, (0.27, 1.00, 0.78)), // Sea Green
        "Yb" => (1.70, (0.00, 0.75, 0.22)), // Emerald
        "Au" => (1.44, (1.00, 0.82, 0.14)), // Gold

        // --- Catch-All (Unknown) ---
        _    => (1.00, (1.00, 0.08, 0.58)), // Hot Pink for errors
    }
}

/// Covalent radius (Å) used by the cutoff bond criterion
pub fn get_atom_cov(element: &str) -> f64 {
    get_atom_properties(element).0
}

/// CPK color as RGBA bytes for per-vertex mesh colors
pub fn get_atom_color(element: &str) -> [u8; 4] {
    let (_, (r, g, b)) = get_atom_properties(element);
    [to_byte(r), to_byte(g), to_byte(b), 255]
}

fn to_byte(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Table key that resolves unknown elements
pub const FALLBACK_KEY: &str = "";

/// Atomic radii in picometres. `None` marks elements without a tabulated
/// value; those resolve to the fallback entry.
const ATOMIC_RADII_PM: &[(&str, Option<f64>)] = &[
    ("H", Some(53.0)), ("He", Some(31.0)), ("Li", Some(167.0)), ("Be", Some(112.0)), ("B", Some(87.0)),
    ("C", Some(67.0)), ("N", Some(56.0)), ("O", Some(48.0)), ("F", Some(42.0)), ("Ne", Some(38.0)),
    ("Na", Some(190.0)), ("Mg", Some(145.0)), ("Al", Some(118.0)), ("Si", Some(111.0)), ("P", Some(98.0)),
    ("S", Some(87.0)), ("Cl", Some(79.0)), ("Ar", Some(71.0)), ("K", Some(243.0)), ("Ca", Some(194.0)),
    ("Sc", Some(184.0)), ("Ti", Some(176.0)), ("V", Some(171.0)), ("Cr", Some(166.0)), ("Mn", Some(161.0)),
    ("Fe", Some(156.0)), ("Co", Some(152.0)), ("Ni", Some(149.0)), ("Cu", Some(145.0)), ("Zn", Some(142.0)),
    ("Ga", Some(136.0)), ("Ge", Some(125.0)), ("As", Some(114.0)), ("Se", Some(103.0)), ("Br", Some(94.0)),
    ("Kr", Some(87.0)), ("Rb", Some(265.0)), ("Sr", Some(219.0)), ("Y", Some(212.0)), ("Zr", Some(206.0)),
    ("Nb", Some(198.0)), ("Mo", Some(190.0)), ("Tc", Some(183.0)), ("Ru", Some(178.0)), ("Rh", Some(173.0)),
    ("Pd", Some(169.0)), ("Ag", Some(165.0)), ("Cd", Some(161.0)), ("In", Some(156.0)), ("Sn", Some(145.0)),
    ("Sb", Some(133.0)), ("Te", Some(123.0)), ("I", Some(115.0)), ("Xe", Some(108.0)), ("Cs", Some(298.0)),
    ("Ba", Some(253.0)), ("La", None), ("Ce", None), ("Pr", Some(247.0)), ("Nd", Some(206.0)),
    ("Pm", Some(205.0)), ("Sm", Some(238.0)), ("Eu", Some(231.0)), ("Gd", Some(233.0)), ("Tb", Some(225.0)),
    ("Dy", Some(228.0)), ("Ho", Some(226.0)), ("Er", Some(226.0)), ("Tm", Some(222.0)), ("Yb", Some(222.0)),
    ("Lu", Some(217.0)), ("Hf", Some(208.0)), ("Ta", Some(200.0)), ("W", Some(193.0)), ("Re", Some(188.0)),
    ("Os", Some(185.0)), ("Ir", Some(180.0)), ("Pt", Some(177.0)), ("Au", Some(174.0)), ("Hg", Some(171.0)),
    ("Tl", Some(156.0)), ("Pb", Some(154.0)), ("Bi", Some(143.0)), ("Po", Some(135.0)), ("At", Some(127.0)),
    ("Rn", Some(120.0)), ("Fr", None), ("Ra", None), ("Ac", None), ("Th", None),
    ("Pa", None), ("U", None), ("Np", None), ("Pu", None), ("Am", None),
    (FALLBACK_KEY, Some(70.0)),
];

/// Immutable element -> sphere radius lookup.
///
/// Raw radii are rescaled linearly from [global min, global max] of the
/// table onto `target` (the same range for every element).
#[derive(Clone, Debug)]
pub struct RadiusTable {
    raw: HashMap<String, f64>,
    raw_min: f64,
    raw_max: f64,
    target: (f64, f64),
}

impl RadiusTable {
    /// Builds the table from the built-in radii, with `overrides` (pm) layered on top
    pub fn new(target: (f64, f64), overrides: &HashMap<String, f64>) -> Self {
        let mut raw: HashMap<String, f64> = ATOMIC_RADII_PM
            .iter()
            .filter_map(|(el, r)| r.map(|r| (el.to_string(), r)))
            .collect();
        for (el, r) in overrides {
            raw.insert(el.clone(), *r);
        }

        let raw_min = raw.values().cloned().fold(f64::INFINITY, f64::min);
        let raw_max = raw.values().cloned().fold(f64::NEG_INFINITY, f64::max);

        Self {
            raw,
            raw_min,
            raw_max,
            target,
        }
    }

    /// Raw table value; unknown labels resolve to the fallback entry
    pub fn raw_radius(&self, element: &str) -> f64 {
        self.raw
            .get(element)
            .or_else(|| self.raw.get(FALLBACK_KEY))
            .cloned()
            .unwrap_or(self.raw_min)
    }

    /// Rescaled sphere radius in model units
    pub fn radius(&self, element: &str) -> f64 {
        let (new_min, new_max) = self.target;
        let span = self.raw_max - self.raw_min;
        if span <= 0.0 {
            return new_min;
        }
        new_min + (new_max - new_min) * (self.raw_radius(element) - self.raw_min) / span
    }
}

impl Default for RadiusTable {
    fn default() -> Self {
        Self::new((0.3, 1.5), &HashMap::new())
    }
}
