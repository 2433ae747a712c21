use std::f64::consts::FRAC_PI_2;

use crate::coordinate::{CelestialCoord, NativeCoord};

/// Native to celestial rotation for projections whose reference point is
/// the native pole (theta_0 = 90 deg). The celestial pole of the native
/// system then sits at (alpha_p, delta_p) = CRVAL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalRotation {
    alpha_p: f64,
    phi_p: f64,
    sin_delta_p: f64,
    cos_delta_p: f64,
}

impl SphericalRotation {
    pub fn new(alpha_p_deg: f64, delta_p_deg: f64, phi_p_deg: f64) -> Self {
        let (sin_delta_p, cos_delta_p) = delta_p_deg.to_radians().sin_cos();
        Self {
            alpha_p: alpha_p_deg.to_radians(),
            phi_p: phi_p_deg.to_radians(),
            sin_delta_p,
            cos_delta_p,
        }
    }

    /// Rotation for a zenithal projection with reference value `crval`.
    ///
    /// LONPOLE defaults to 180 deg unless the reference point is the
    /// celestial pole itself.
    pub fn zenithal(crval_deg: [f64; 2], lonpole_deg: Option<f64>) -> Self {
        let phi_p = lonpole_deg.unwrap_or(if crval_deg[1] >= 90.0 { 0.0 } else { 180.0 });
        Self::new(crval_deg[0], crval_deg[1], phi_p)
    }

    pub fn native_to_celestial(&self, native: NativeCoord) -> CelestialCoord {
        let (sin_theta, cos_theta) = native.theta().sin_cos();
        let d_phi = native.phi() - self.phi_p;
        let (sin_d_phi, cos_d_phi) = d_phi.sin_cos();

        let sin_delta = sin_theta * self.sin_delta_p + cos_theta * self.cos_delta_p * cos_d_phi;
        let delta = sin_delta.clamp(-1.0, 1.0).asin();

        let x = -cos_theta * sin_d_phi;
        let y = sin_theta * self.cos_delta_p - cos_theta * self.sin_delta_p * cos_d_phi;
        let alpha = self.alpha_p + x.atan2(y);

        CelestialCoord::new(
            normalize_longitude(alpha.to_degrees()),
            delta.clamp(-FRAC_PI_2, FRAC_PI_2).to_degrees(),
        )
    }

    #[inline]
    pub fn phi_p_degrees(&self) -> f64 {
        self.phi_p.to_degrees()
    }
}

fn normalize_longitude(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
