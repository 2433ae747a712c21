use crate::coordinate::{IntermediateCoord, PixelCoord};
use crate::error::{WcsError, WcsResult};

const DETERMINANT_THRESHOLD: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    crpix: [f64; 2],
    cd: [[f64; 2]; 2],
    determinant: f64,
}

impl LinearTransform {
    pub fn from_cd(crpix: [f64; 2], cd: [[f64; 2]; 2]) -> WcsResult<Self> {
        let determinant = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if determinant.abs() < DETERMINANT_THRESHOLD {
            return Err(WcsError::non_invertible_matrix(determinant));
        }
        Ok(Self {
            crpix,
            cd,
            determinant,
        })
    }

    pub fn from_pc_cdelt(crpix: [f64; 2], pc: [[f64; 2]; 2], cdelt: [f64; 2]) -> WcsResult<Self> {
        let cd = [
            [cdelt[0] * pc[0][0], cdelt[0] * pc[0][1]],
            [cdelt[1] * pc[1][0], cdelt[1] * pc[1][1]],
        ];
        Self::from_cd(crpix, cd)
    }

    pub fn pixel_to_intermediate(&self, pixel: PixelCoord) -> IntermediateCoord {
        // Paper I Eq. 1: q[i] = sum over j of m[i][j] * (p[j] - r[j])
        let d0 = pixel.x() - self.crpix[0];
        let d1 = pixel.y() - self.crpix[1];
        let x = self.cd[0][0] * d0 + self.cd[0][1] * d1;
        let y = self.cd[1][0] * d0 + self.cd[1][1] * d1;
        IntermediateCoord::new(x, y)
    }

    #[inline]
    pub fn crpix(&self) -> [f64; 2] {
        self.crpix
    }

    #[inline]
    pub fn cd_matrix(&self) -> [[f64; 2]; 2] {
        self.cd
    }

    /// Degrees per pixel, from the area scale of the CD matrix.
    #[inline]
    pub fn pixel_scale(&self) -> f64 {
        libm::sqrt(self.determinant.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let crpix = [512.0, 512.0];
        let cd = [[0.001, 0.0], [0.0, 0.001]];
        let transform = LinearTransform::from_cd(crpix, cd).unwrap();

        let inter = transform.pixel_to_intermediate(PixelCoord::new(256.0, 256.0));

        assert_eq!(inter.x_deg(), -0.256);
        assert_eq!(inter.y_deg(), -0.256);
    }

    #[test]
    fn test_reference_pixel_maps_to_origin() {
        let transform =
            LinearTransform::from_cd([2100.5, 2200.5], [[-1.4e-5, 0.0], [0.0, 1.4e-5]]).unwrap();
        let inter = transform.pixel_to_intermediate(PixelCoord::new(2100.5, 2200.5));
        assert_eq!(inter.x_deg(), 0.0);
        assert_eq!(inter.y_deg(), 0.0);
    }

    #[test]
    fn test_pc_cdelt_equivalence() {
        let crpix = [100.0, 100.0];
        let cd = [[0.002, 0.001], [-0.001, 0.002]];
        let transform_cd = LinearTransform::from_cd(crpix, cd).unwrap();

        let cdelt = [0.002, 0.002];
        let pc = [[1.0, 0.5], [-0.5, 1.0]];
        let transform_pc = LinearTransform::from_pc_cdelt(crpix, pc, cdelt).unwrap();

        assert_eq!(transform_cd.cd_matrix(), transform_pc.cd_matrix());

        let pixel = PixelCoord::new(150.0, 175.0);
        assert_eq!(
            transform_cd.pixel_to_intermediate(pixel),
            transform_pc.pixel_to_intermediate(pixel)
        );
    }

    #[test]
    fn test_non_invertible_matrix() {
        let result = LinearTransform::from_cd([512.0, 512.0], [[1.0, 2.0], [2.0, 4.0]]);

        match result {
            Err(WcsError::NonInvertibleMatrix { determinant }) => {
                assert_eq!(determinant, 0.0);
            }
            _ => panic!("Expected NonInvertibleMatrix error"),
        }
    }

    #[test]
    fn test_pixel_scale() {
        let transform =
            LinearTransform::from_cd([512.0, 512.0], [[0.001, 0.0], [0.0, 0.001]]).unwrap();
        assert_eq!(transform.pixel_scale(), 0.001);
    }

    #[test]
    fn test_crpix_accessor() {
        let crpix = [123.456, 789.012];
        let transform = LinearTransform::from_cd(crpix, [[0.001, 0.0], [0.0, 0.001]]).unwrap();
        assert_eq!(transform.crpix(), crpix);
    }
}
