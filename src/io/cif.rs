use crate::error::{Cif2StlError, Result};
use crate::model::{LatticeStructure, Site};
use crate::utils::linalg::wrap_unit;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

/// Duplicate tolerance in fractional units when expanding symmetry
const DUPLICATE_EPS: f64 = 0.001;

pub fn parse(path: &Path) -> Result<LatticeStructure> {
    let file = File::open(path)
        .map_err(|e| Cif2StlError::parse(format!("cannot open {}: {}", path.display(), e)))?;
    parse_reader(io::BufReader::new(file))
        .map_err(|e| match e {
            Cif2StlError::Parse(msg) => Cif2StlError::parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
}

pub fn parse_reader<R: BufRead>(reader: R) -> Result<LatticeStructure> {
    let mut cell = [None::<f64>; 3];
    let mut alpha = 90.0;
    let mut beta = 90.0;
    let mut gamma = 90.0;

    let mut symmetry_ops: Vec<String> = Vec::new();
    let mut base_sites: Vec<Site> = Vec::new();

    let mut in_loop = false;
    let mut loop_has_rows = false;
    let mut current_loop_headers: Vec<String> = Vec::new();

    for line_res in reader.lines() {
        let line = line_res.map_err(|e| Cif2StlError::parse(format!("read failed: {}", e)))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // 1. Loop Detection
        if trimmed.starts_with("loop_") {
            in_loop = true;
            loop_has_rows = false;
            current_loop_headers.clear();
            continue;
        }
        if trimmed.starts_with("data_") {
            in_loop = false;
            continue;
        }

        // 2. Header Parsing (a tag after data rows closes the loop)
        if trimmed.starts_with('_') {
            if in_loop && !loop_has_rows {
                current_loop_headers.push(trimmed.to_string());
                continue;
            }
            in_loop = false;

            // 3. Cell Parameters
            let tag = trimmed.split_whitespace().next().unwrap_or("");
            match tag {
                "_cell_length_a" => cell[0] = Some(parse_cif_val(trimmed)?),
                "_cell_length_b" => cell[1] = Some(parse_cif_val(trimmed)?),
                "_cell_length_c" => cell[2] = Some(parse_cif_val(trimmed)?),
                "_cell_angle_alpha" => alpha = parse_cif_val(trimmed)?,
                "_cell_angle_beta" => beta = parse_cif_val(trimmed)?,
                "_cell_angle_gamma" => gamma = parse_cif_val(trimmed)?,
                _ => {}
            }
            continue;
        }

        // 4. Data Parsing
        if !in_loop {
            continue;
        }
        loop_has_rows = true;

        let is_sym_loop = current_loop_headers.iter().any(|h| {
            h.contains("_symmetry_equiv_pos_as_xyz") || h.contains("_space_group_symop_operation_xyz")
        });
        let is_atom_loop = current_loop_headers.iter().any(|h| h.contains("_atom_site_fract_x"));

        if is_sym_loop {
            let parts = split_cif_tokens(trimmed);
            let col = current_loop_headers.iter().position(|h| {
                h.contains("_symmetry_equiv_pos_as_xyz") || h.contains("_space_group_symop_operation_xyz")
            });
            // Unquoted ops like "1 x, y, z" spread over several tokens
            let op = if parts.len() == current_loop_headers.len() {
                col.and_then(|c| parts.get(c)).cloned()
            } else {
                Some(trimmed.trim_start_matches(|c: char| c.is_ascii_digit() || c.is_whitespace()).to_string())
            };
            if let Some(op) = op {
                symmetry_ops.push(op.replace(['\'', '"'], ""));
            }
        } else if is_atom_loop {
            if let Some(site) = parse_atom_row(&current_loop_headers, trimmed)? {
                base_sites.push(site);
            }
        }
    }

    let (a, b, c) = match cell {
        [Some(a), Some(b), Some(c)] => (a, b, c),
        _ => return Err(Cif2StlError::parse("missing _cell_length_a/b/c")),
    };
    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return Err(Cif2StlError::parse("cell lengths must be positive"));
    }
    if base_sites.is_empty() {
        return Err(Cif2StlError::parse("no _atom_site_fract_x/y/z rows found"));
    }

    if symmetry_ops.is_empty() {
        symmetry_ops.push("x,y,z".to_string());
    }

    // 5. Expand Symmetry
    let mut final_sites: Vec<Site> = Vec::new();

    for site in &base_sites {
        for op in &symmetry_ops {
            let new_pos = apply_symmetry(site.frac, op);

            // Wrap to [0,1)
            let w = [
                wrap_unit(new_pos[0]),
                wrap_unit(new_pos[1]),
                wrap_unit(new_pos[2]),
            ];

            // Check for duplicates
            let is_duplicate = final_sites.iter().any(|existing| {
                (0..3).all(|k| {
                    let d = (existing.frac[k] - w[k]).abs();
                    d < DUPLICATE_EPS || (1.0 - d) < DUPLICATE_EPS
                })
            });

            if !is_duplicate {
                final_sites.push(Site {
                    frac: w,
                    species: site.species.clone(),
                    oxidation: site.oxidation.clone(),
                });
            }
        }
    }

    let lattice = lattice_from_parameters(a, b, c, alpha, beta, gamma)?;
    log::debug!(
        "CIF: {} base sites, {} symmetry ops -> {} sites",
        base_sites.len(),
        symmetry_ops.len(),
        final_sites.len()
    );

    Ok(LatticeStructure::new(lattice, final_sites))
}

/// Lattice with a along x and b in the xy plane
pub fn lattice_from_parameters(
    a: f64,
    b: f64,
    c: f64,
    alpha: f64,
    beta: f64,
    gamma: f64,
) -> Result<[[f64; 3]; 3]> {
    let alpha_r = alpha.to_radians();
    let beta_r = beta.to_radians();
    let gamma_r = gamma.to_radians();
    let v2 = 1.0 - alpha_r.cos().powi(2) - beta_r.cos().powi(2) - gamma_r.cos().powi(2)
        + 2.0 * alpha_r.cos() * beta_r.cos() * gamma_r.cos();
    if v2 <= 0.0 || gamma_r.sin().abs() < 1e-12 {
        return Err(Cif2StlError::parse(format!(
            "cell angles ({}, {}, {}) do not describe a valid cell",
            alpha, beta, gamma
        )));
    }
    let v = v2.sqrt();

    Ok([
        [a, 0.0, 0.0],
        [b * gamma_r.cos(), b * gamma_r.sin(), 0.0],
        [
            c * beta_r.cos(),
            c * (alpha_r.cos() - beta_r.cos() * gamma_r.cos()) / gamma_r.sin(),
            c * v / gamma_r.sin(),
        ],
    ])
}

fn parse_atom_row(headers: &[String], row: &str) -> Result<Option<Site>> {
    let parts = split_cif_tokens(row);
    if parts.len() < headers.len() {
        log::warn!("Skipping short _atom_site row: {}", row);
        return Ok(None);
    }

    let mut label: Option<String> = None;
    let mut type_symbol: Option<String> = None;
    let mut frac = [None::<f64>; 3];

    for (header, val) in headers.iter().zip(parts.iter()) {
        let h = header.as_str();
        if h.starts_with("_atom_site_type_symbol") {
            type_symbol = Some(val.clone());
        } else if h.starts_with("_atom_site_label") {
            label = Some(val.clone());
        } else if h.starts_with("_atom_site_fract_x") {
            frac[0] = Some(parse_cif_float(val)?);
        } else if h.starts_with("_atom_site_fract_y") {
            frac[1] = Some(parse_cif_float(val)?);
        } else if h.starts_with("_atom_site_fract_z") {
            frac[2] = Some(parse_cif_float(val)?);
        }
    }

    let frac = match frac {
        [Some(x), Some(y), Some(z)] => [x, y, z],
        _ => return Err(Cif2StlError::parse(format!("incomplete coordinates in row '{}'", row))),
    };

    let raw = type_symbol
        .clone()
        .or(label)
        .ok_or_else(|| Cif2StlError::parse(format!("row '{}' has no label or type symbol", row)))?;
    let species = element_symbol(&raw);
    if species.is_empty() {
        return Err(Cif2StlError::parse(format!("cannot read element from '{}'", raw)));
    }

    // "Yb3+" carries a charge, "Yb1" is just a site label
    let oxidation = type_symbol.filter(|t| t.ends_with('+') || t.ends_with('-'));

    Ok(Some(Site {
        frac,
        species,
        oxidation,
    }))
}

/// Leading alphabetic run, capped at two letters ("Yb3+" -> "Yb", "O1" -> "O")
fn element_symbol(raw: &str) -> String {
    raw.chars().take_while(|c| c.is_ascii_alphabetic()).take(2).collect()
}

/// Whitespace split that keeps 'quoted strings' together
fn split_cif_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => {
                tokens.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if (c == '\'' || c == '"') && current.is_empty() => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn apply_symmetry(p: [f64; 3], op: &str) -> [f64; 3] {
    let parts: Vec<&str> = op.split(',').collect();
    if parts.len() != 3 {
        log::warn!("Ignoring malformed symmetry operation '{}'", op);
        return p;
    }

    [
        evaluate_expr(parts[0], p),
        evaluate_expr(parts[1], p),
        evaluate_expr(parts[2], p),
    ]
}

fn evaluate_expr(expr: &str, p: [f64; 3]) -> f64 {
    let s = expr.replace(' ', "").to_lowercase();
    let mut val = 0.0;

    let mut current_term = String::new();

    // Split by + or - but keep the delimiter
    for c in s.chars() {
        if (c == '+' || c == '-') && !current_term.is_empty() {
            val += evaluate_term(&current_term, p);
            current_term.clear();
        }
        current_term.push(c);
    }
    if !current_term.is_empty() {
        val += evaluate_term(&current_term, p);
    }

    val
}

fn evaluate_term(term: &str, p: [f64; 3]) -> f64 {
    let mut t = term;

    // 1. Extract Sign
    let mut sign = 1.0;
    if let Some(rest) = t.strip_prefix('-') {
        sign = -1.0;
        t = rest;
    } else if let Some(rest) = t.strip_prefix('+') {
        t = rest;
    }

    // 2. Identify Variable
    if t.contains('x') {
        return sign * p[0];
    } else if t.contains('y') {
        return sign * p[1];
    } else if t.contains('z') {
        return sign * p[2];
    }

    // 3. Identify Fraction or Number
    if let Some(idx) = t.find('/') {
        let num: f64 = t[..idx].parse().unwrap_or(0.0);
        let den: f64 = t[idx + 1..].parse().unwrap_or(1.0);
        sign * (num / den)
    } else {
        sign * t.parse::<f64>().unwrap_or(0.0)
    }
}

fn parse_cif_val(line: &str) -> Result<f64> {
    match line.find(char::is_whitespace) {
        Some(idx) => parse_cif_float(line[idx..].trim()),
        None => Err(Cif2StlError::parse(format!("tag without value: '{}'", line))),
    }
}

/// "5.4309(2)" -> 5.4309
fn parse_cif_float(s: &str) -> Result<f64> {
    let clean: String = s.chars().take_while(|c| *c != '(').collect();
    clean
        .parse()
        .map_err(|_| Cif2StlError::parse(format!("invalid number '{}'", s)))
}
