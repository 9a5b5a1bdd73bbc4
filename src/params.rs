//! Angle expressions: `1.57`, `pi`, `-pi/2`, `3*pi/4`, `2pi`.

use regex::Regex;
use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::error::{GridError, GridResult};

static PI_EXPR_REGEX: OnceLock<Regex> = OnceLock::new();

fn pi_expr_re() -> &'static Regex {
    PI_EXPR_REGEX.get_or_init(|| {
        Regex::new(r"^(-?)(\d*\.?\d*)\s*\*?\s*pi(?:\s*/\s*(\d+\.?\d*))?$")
            .expect("pi expression pattern is valid")
    })
}

/// Parse one angle, in radians.
pub fn parse_angle(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(val) = s.parse::<f64>() {
        return val.is_finite().then_some(val);
    }

    let s = s.to_lowercase();
    let caps = pi_expr_re().captures(&s)?;

    let coeff = match &caps[2] {
        "" => 1.0,
        digits => digits.parse::<f64>().ok()?,
    };
    let mut result = coeff * PI;

    if let Some(denom) = caps.get(3) {
        let denom = denom.as_str().parse::<f64>().ok()?;
        if denom == 0.0 {
            return None;
        }
        result /= denom;
    }

    if &caps[1] == "-" {
        result = -result;
    }
    Some(result)
}

/// Parse a comma-separated angle list (`theta[,phi[,lambda]]`).
pub fn parse_angles(input: &str) -> GridResult<Vec<f64>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_angle(part).ok_or_else(|| GridError::InvalidParameter(part.to_string())))
        .collect()
}

/// Render an angle as a small pi fraction when it is one.
pub fn format_angle(val: f64) -> String {
    const DENOMS: [u32; 6] = [1, 2, 3, 4, 6, 8];

    for denom in DENOMS {
        let k = val * f64::from(denom) / PI;
        let whole = k.round();
        if whole != 0.0 && (k - whole).abs() < 1e-9 {
            return pi_fraction(whole as i64, denom);
        }
    }
    val.to_string()
}

fn pi_fraction(k: i64, denom: u32) -> String {
    let sign = if k < 0 { "-" } else { "" };
    let numer = match k.unsigned_abs() {
        1 => "pi".to_string(),
        n => format!("{n}*pi"),
    };
    if denom == 1 {
        format!("{sign}{numer}")
    } else {
        format!("{sign}{numer}/{denom}")
    }
}
