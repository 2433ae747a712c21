//! Zenithal projections (FITS WCS Paper II, section 5.1).
//!
//! Only the deprojection direction is needed to go from pixels to the sky.
//! All zenithal projections share the native reference point
//! (phi_0, theta_0) = (0, 90 deg).

use std::f64::consts::FRAC_PI_2;

use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Tan,
    Sin,
    Arc,
    Stg,
    Zea,
}

impl Projection {
    pub fn from_code(code: &str) -> WcsResult<Self> {
        match code {
            "TAN" => Ok(Self::Tan),
            "SIN" => Ok(Self::Sin),
            "ARC" => Ok(Self::Arc),
            "STG" => Ok(Self::Stg),
            "ZEA" => Ok(Self::Zea),
            _ => Err(WcsError::unsupported_projection(code)),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Tan => "TAN",
            Self::Sin => "SIN",
            Self::Arc => "ARC",
            Self::Stg => "STG",
            Self::Zea => "ZEA",
        }
    }

    /// Native latitude of the reference point, in degrees.
    pub fn theta_0(&self) -> f64 {
        90.0
    }

    pub fn deproject(&self, inter: IntermediateCoord) -> WcsResult<NativeCoord> {
        let x = inter.x_rad();
        let y = inter.y_rad();
        let r = (x * x + y * y).sqrt();

        if r == 0.0 {
            return Ok(NativeCoord::new(0.0, FRAC_PI_2));
        }

        let phi = x.atan2(-y);
        let theta = match self {
            Self::Tan => 1.0_f64.atan2(r),
            Self::Sin => {
                if r > 1.0 {
                    return Err(WcsError::out_of_bounds(format!(
                        "SIN radius {} exceeds unit sphere",
                        r
                    )));
                }
                r.acos()
            }
            Self::Arc => FRAC_PI_2 - r,
            Self::Stg => FRAC_PI_2 - 2.0 * (r / 2.0).atan(),
            Self::Zea => {
                if r > 2.0 {
                    return Err(WcsError::out_of_bounds(format!(
                        "ZEA radius {} exceeds 2",
                        r
                    )));
                }
                FRAC_PI_2 - 2.0 * (r / 2.0).asin()
            }
        };

        Ok(NativeCoord::new(phi, theta))
    }
}
