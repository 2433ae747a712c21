use std::collections::HashMap;

use crate::error::{WcsError, WcsResult};
use crate::header::KeywordProvider;

const MAX_SIP_ORDER: u32 = 9;

/// Forward Simple Imaging Polynomial distortion (Shupe et al. 2005).
///
/// Pixel offsets `u = x - CRPIX1`, `v = y - CRPIX2` are corrected by
/// `f(u, v) = sum A_p_q u^p v^q` and `g(u, v) = sum B_p_q u^p v^q` before
/// the linear transform.
#[derive(Debug, Clone)]
pub struct SipDistortion {
    crpix: [f64; 2],
    a_order: u32,
    b_order: u32,
    a_coeffs: HashMap<(u32, u32), f64>,
    b_coeffs: HashMap<(u32, u32), f64>,
}

impl SipDistortion {
    pub fn new(crpix: [f64; 2], a_order: u32, b_order: u32) -> Self {
        Self {
            crpix,
            a_order,
            b_order,
            a_coeffs: HashMap::new(),
            b_coeffs: HashMap::new(),
        }
    }

    pub fn from_header(header: &impl KeywordProvider, crpix: [f64; 2]) -> WcsResult<Self> {
        let a_order = read_order(header, "A_ORDER")?;
        let b_order = read_order(header, "B_ORDER")?;
        let mut sip = Self::new(crpix, a_order, b_order);

        for p in 0..=a_order {
            for q in 0..=(a_order - p) {
                if let Some(value) = header.get_float(&format!("A_{}_{}", p, q)) {
                    sip.set_a(p, q, value);
                }
            }
        }
        for p in 0..=b_order {
            for q in 0..=(b_order - p) {
                if let Some(value) = header.get_float(&format!("B_{}_{}", p, q)) {
                    sip.set_b(p, q, value);
                }
            }
        }

        Ok(sip)
    }

    pub fn set_a(&mut self, p: u32, q: u32, value: f64) {
        if p + q <= self.a_order && value != 0.0 {
            self.a_coeffs.insert((p, q), value);
        }
    }

    pub fn set_b(&mut self, p: u32, q: u32, value: f64) {
        if p + q <= self.b_order && value != 0.0 {
            self.b_coeffs.insert((p, q), value);
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let u = x - self.crpix[0];
        let v = y - self.crpix[1];

        let f = eval_poly(&self.a_coeffs, u, v);
        let g = eval_poly(&self.b_coeffs, u, v);

        (x + f, y + g)
    }
}

fn read_order(header: &impl KeywordProvider, key: &str) -> WcsResult<u32> {
    let order = header
        .get_int(key)
        .ok_or_else(|| WcsError::missing_keyword(key))?;
    if !(0..=MAX_SIP_ORDER as i64).contains(&order) {
        return Err(WcsError::invalid_keyword(
            key,
            format!("order {} outside 0..={}", order, MAX_SIP_ORDER),
        ));
    }
    Ok(order as u32)
}

fn eval_poly(coeffs: &HashMap<(u32, u32), f64>, u: f64, v: f64) -> f64 {
    coeffs
        .iter()
        .map(|(&(p, q), &coeff)| coeff * libm::pow(u, p as f64) * libm::pow(v, q as f64))
        .sum()
}
