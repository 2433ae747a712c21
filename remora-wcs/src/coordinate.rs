/// Pixel position in the FITS convention: the centre of the first pixel
/// is (1, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    x: f64,
    y: f64,
}

impl PixelCoord {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Builds a FITS pixel coordinate from a position counted from `origin`.
    #[inline]
    pub fn from_origin(x: f64, y: f64, origin: u8) -> Self {
        let shift = 1.0 - origin as f64;
        Self {
            x: x + shift,
            y: y + shift,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateCoord {
    x: f64,
    y: f64,
}

impl IntermediateCoord {
    #[inline]
    pub fn new(x_deg: f64, y_deg: f64) -> Self {
        Self { x: x_deg, y: y_deg }
    }

    #[inline]
    pub fn x_deg(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y_deg(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn x_rad(&self) -> f64 {
        self.x.to_radians()
    }

    #[inline]
    pub fn y_rad(&self) -> f64 {
        self.y.to_radians()
    }
}

/// Native spherical coordinates (phi, theta), in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeCoord {
    phi: f64,
    theta: f64,
}

impl NativeCoord {
    #[inline]
    pub fn new(phi_rad: f64, theta_rad: f64) -> Self {
        Self {
            phi: phi_rad,
            theta: theta_rad,
        }
    }

    #[inline]
    pub fn phi(&self) -> f64 {
        self.phi
    }

    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

/// Equatorial position in degrees, right ascension in [0, 360).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialCoord {
    ra: f64,
    dec: f64,
}

impl CelestialCoord {
    #[inline]
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra: ra_deg,
            dec: dec_deg,
        }
    }

    #[inline]
    pub fn ra(&self) -> f64 {
        self.ra
    }

    #[inline]
    pub fn dec(&self) -> f64 {
        self.dec
    }
}
