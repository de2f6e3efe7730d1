// src/io/params.rs
//
// Text inputs coming from the command line (or a form): element lists,
// spin assignments and x,y,z triples.

use crate::error::{Cif2StlError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// "Yb, Si" -> {"Si", "Yb"}. Empty input means "no filter".
pub fn parse_target_atoms(text: &str) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = text
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if set.is_empty() { None } else { Some(set) }
}

/// "0:[0,0,1],2:[1,0,0]" -> {0: [0,0,1], 2: [1,0,0]}
pub fn parse_site_spins(text: &str) -> Result<BTreeMap<usize, [f64; 3]>> {
    let mut out = BTreeMap::new();
    for (key, vec, fragment) in split_assignments(text)? {
        let index: usize = key
            .parse()
            .map_err(|_| Cif2StlError::spin(&fragment, format!("'{}' is not a site index", key)))?;
        out.insert(index, vec);
    }
    Ok(out)
}

/// "Yb:[0,0,1],Fe:[0,0,-1]" -> {"Fe": [0,0,-1], "Yb": [0,0,1]}
pub fn parse_element_spins(text: &str) -> Result<BTreeMap<String, [f64; 3]>> {
    let mut out = BTreeMap::new();
    for (key, vec, fragment) in split_assignments(text)? {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Cif2StlError::spin(&fragment, format!("'{}' is not an element label", key)));
        }
        out.insert(key, vec);
    }
    Ok(out)
}

/// "1.5,1,2" -> [1.5, 1.0, 2.0]
pub fn parse_triple(text: &str) -> std::result::Result<[f64; 3], String> {
    let parts: Vec<&str> = text.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{}'", text));
    }
    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(out)
}

/// Splits "key:[x,y,z],key:[x,y,z]" on the commas between brackets.
fn split_assignments(text: &str) -> Result<Vec<(String, [f64; 3], String)>> {
    let mut out = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        let close = rest
            .find(']')
            .ok_or_else(|| Cif2StlError::spin(rest, "missing closing ']'"))?;
        let fragment = rest[..=close].trim().to_string();
        out.push(parse_assignment(&fragment)?);

        rest = rest[close + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
            if rest.is_empty() {
                return Err(Cif2StlError::spin(text, "trailing ','"));
            }
        } else if !rest.is_empty() {
            return Err(Cif2StlError::spin(rest, "expected ',' between assignments"));
        }
    }
    Ok(out)
}

fn parse_assignment(fragment: &str) -> Result<(String, [f64; 3], String)> {
    let (key, value) = fragment
        .split_once(':')
        .ok_or_else(|| Cif2StlError::spin(fragment, "expected 'key:[x,y,z]'"))?;
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| Cif2StlError::spin(fragment, "vector must be written as [x,y,z]"))?;

    let comps: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    if comps.len() != 3 {
        return Err(Cif2StlError::spin(
            fragment,
            format!("expected 3 components, found {}", comps.len()),
        ));
    }
    let mut vec = [0.0; 3];
    for (slot, c) in vec.iter_mut().zip(comps) {
        *slot = c
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Cif2StlError::spin(fragment, format!("'{}' is not a number", c)))?;
    }
    Ok((key.trim().to_string(), vec, fragment.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_spins() {
        let m = parse_site_spins("0:[0,0,1], 3:[1, 0, -0.5]").unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m[&0], [0.0, 0.0, 1.0]);
        assert_eq!(m[&3], [1.0, 0.0, -0.5]);
    }

    #[test]
    fn test_site_spins_empty() {
        assert!(parse_site_spins("  ").unwrap().is_empty());
    }

    #[test]
    fn test_bad_spin_strings() {
        for bad in ["0:[0,0]", "a:[0,0,1]", "0:0,0,1", "0:[0,0,1],", "0:[0,0,1] 1:[0,0,1]", "0:[x,0,1]", "0:[0,0,1"] {
            let err = parse_site_spins(bad).unwrap_err();
            assert!(matches!(err, Cif2StlError::SpinFormat { .. }), "accepted '{}'", bad);
        }
    }

    #[test]
    fn test_element_spins() {
        let m = parse_element_spins("Yb:[0,0,1]").unwrap();
        assert_eq!(m["Yb"], [0.0, 0.0, 1.0]);
        assert!(parse_element_spins("3:[0,0,1]").is_err());
    }

    #[test]
    fn test_targets() {
        let t = parse_target_atoms(" Yb , Si,").unwrap();
        assert!(t.contains("Yb") && t.contains("Si"));
        assert_eq!(t.len(), 2);
        assert!(parse_target_atoms("").is_none());
    }

    #[test]
    fn test_triple() {
        assert_eq!(parse_triple("1.5, 1, 2").unwrap(), [1.5, 1.0, 2.0]);
        assert!(parse_triple("1,2").is_err());
    }
}
