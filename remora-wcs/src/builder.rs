use crate::coordinate::{CelestialCoord, PixelCoord};
use crate::error::{WcsError, WcsResult};
use crate::header::KeywordProvider;
use crate::linear::LinearTransform;
use crate::projection::Projection;
use crate::rotation::SphericalRotation;
use crate::sip::SipDistortion;

const SIP_SUFFIX: &str = "-SIP";

/// A celestial WCS for one image: optional SIP distortion, the linear
/// stage, a zenithal projection and the rotation to equatorial coordinates.
#[derive(Debug, Clone)]
pub struct Wcs {
    linear: LinearTransform,
    projection: Projection,
    rotation: SphericalRotation,
    crval_deg: (f64, f64),
    sip: Option<SipDistortion>,
}

impl Wcs {
    pub fn new(
        linear: LinearTransform,
        projection: Projection,
        rotation: SphericalRotation,
        crval_deg: (f64, f64),
        sip: Option<SipDistortion>,
    ) -> Self {
        Self {
            linear,
            projection,
            rotation,
            crval_deg,
            sip,
        }
    }

    pub fn from_header(header: &impl KeywordProvider) -> WcsResult<Self> {
        WcsBuilder::from_header(header)?.build()
    }

    pub fn pixel_to_celestial(&self, pixel: PixelCoord) -> WcsResult<CelestialCoord> {
        let pixel = match &self.sip {
            Some(sip) => {
                let (x, y) = sip.apply(pixel.x(), pixel.y());
                PixelCoord::new(x, y)
            }
            None => pixel,
        };
        self.core_to_celestial(pixel)
    }

    fn core_to_celestial(&self, pixel: PixelCoord) -> WcsResult<CelestialCoord> {
        let intermediate = self.linear.pixel_to_intermediate(pixel);
        let native = self.projection.deproject(intermediate)?;
        Ok(self.rotation.native_to_celestial(native))
    }

    /// Full transform of a 1-based FITS pixel position to (RA, Dec) degrees.
    pub fn pix2world(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let celestial = self.pixel_to_celestial(PixelCoord::new(x, y))?;
        Ok((celestial.ra(), celestial.dec()))
    }

    /// Like [`Wcs::pix2world`] but without the SIP distortion step.
    pub fn pix2world_core(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let celestial = self.core_to_celestial(PixelCoord::new(x, y))?;
        Ok((celestial.ra(), celestial.dec()))
    }

    #[inline]
    pub fn crpix(&self) -> [f64; 2] {
        self.linear.crpix()
    }

    #[inline]
    pub fn crval(&self) -> (f64, f64) {
        self.crval_deg
    }

    #[inline]
    pub fn pixel_scale(&self) -> f64 {
        self.linear.pixel_scale()
    }

    #[inline]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    #[inline]
    pub fn has_distortion(&self) -> bool {
        self.sip.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum MatrixKeywords {
    #[default]
    None,
    Cd([[f64; 2]; 2]),
    PcCdelt {
        pc: [[f64; 2]; 2],
        cdelt: [f64; 2],
    },
}

#[derive(Debug, Clone, Default)]
pub struct WcsBuilder {
    crpix: Option<[f64; 2]>,
    crval: Option<[f64; 2]>,
    matrix: MatrixKeywords,
    projection: Option<Projection>,
    lonpole: Option<f64>,
    sip: Option<SipDistortion>,
}

impl WcsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crpix(mut self, x: f64, y: f64) -> Self {
        self.crpix = Some([x, y]);
        self
    }

    pub fn crval(mut self, lon: f64, lat: f64) -> Self {
        self.crval = Some([lon, lat]);
        self
    }

    pub fn cd_matrix(mut self, cd: [[f64; 2]; 2]) -> Self {
        self.matrix = MatrixKeywords::Cd(cd);
        self
    }

    pub fn pc_cdelt(mut self, pc: [[f64; 2]; 2], cdelt: [f64; 2]) -> Self {
        self.matrix = MatrixKeywords::PcCdelt { pc, cdelt };
        self
    }

    pub fn projection(mut self, proj: Projection) -> Self {
        self.projection = Some(proj);
        self
    }

    pub fn lonpole(mut self, lonpole: f64) -> Self {
        self.lonpole = Some(lonpole);
        self
    }

    pub fn sip(mut self, sip: SipDistortion) -> Self {
        self.sip = Some(sip);
        self
    }

    pub fn from_header(header: &impl KeywordProvider) -> WcsResult<Self> {
        let ctype1 = header.require_string("CTYPE1")?;
        let ctype2 = header.require_string("CTYPE2")?;

        let (proj_code1, sip1) = parse_ctype(&ctype1)?;
        let (proj_code2, _) = parse_ctype(&ctype2)?;

        if proj_code1 != proj_code2 {
            return Err(WcsError::invalid_keyword(
                "CTYPE1/CTYPE2",
                format!(
                    "Mismatched projection codes: '{}' vs '{}'",
                    proj_code1, proj_code2
                ),
            ));
        }
        let projection = Projection::from_code(proj_code1)?;

        let crpix1 = header.require_float("CRPIX1")?;
        let crpix2 = header.require_float("CRPIX2")?;
        let crval1 = header.require_float("CRVAL1")?;
        let crval2 = header.require_float("CRVAL2")?;

        let mut builder = Self::new()
            .crpix(crpix1, crpix2)
            .crval(crval1, crval2)
            .projection(projection);
        builder.matrix = parse_matrix(header)?;

        if let Some(lp) = header.get_float("LONPOLE") {
            builder = builder.lonpole(lp);
        }
        if sip1 {
            builder = builder.sip(SipDistortion::from_header(header, [crpix1, crpix2])?);
        }

        Ok(builder)
    }

    pub fn build(self) -> WcsResult<Wcs> {
        let crpix = self.crpix.ok_or_else(|| WcsError::missing_keyword("CRPIX"))?;
        let crval = self.crval.ok_or_else(|| WcsError::missing_keyword("CRVAL"))?;
        let projection = self
            .projection
            .ok_or_else(|| WcsError::missing_keyword("CTYPE"))?;

        let linear = match self.matrix {
            MatrixKeywords::Cd(cd) => LinearTransform::from_cd(crpix, cd)?,
            MatrixKeywords::PcCdelt { pc, cdelt } => LinearTransform::from_pc_cdelt(crpix, pc, cdelt)?,
            MatrixKeywords::None => {
                return Err(WcsError::missing_keyword(
                    "CD1_1 or CDELT1 (no transformation matrix found)",
                ))
            }
        };

        let rotation = SphericalRotation::zenithal(crval, self.lonpole);

        Ok(Wcs::new(
            linear,
            projection,
            rotation,
            (crval[0], crval[1]),
            self.sip,
        ))
    }
}

/// Splits `RA---TAN-SIP` into the projection code and whether SIP applies.
fn parse_ctype(ctype: &str) -> WcsResult<(&str, bool)> {
    let trimmed = ctype.trim();
    let (body, sip) = match trimmed.strip_suffix(SIP_SUFFIX) {
        Some(body) => (body, true),
        None => (trimmed, false),
    };

    match body.rfind('-') {
        Some(0) | None => Err(WcsError::invalid_keyword(
            "CTYPE",
            format!("Invalid CTYPE format: '{}'", ctype),
        )),
        Some(dash_pos) => {
            let proj_part = &body[dash_pos + 1..];
            if proj_part.is_empty() {
                return Err(WcsError::invalid_keyword(
                    "CTYPE",
                    format!("Missing projection code in CTYPE: '{}'", ctype),
                ));
            }
            Ok((proj_part, sip))
        }
    }
}

fn parse_matrix(header: &impl KeywordProvider) -> WcsResult<MatrixKeywords> {
    let cd11 = header.get_float("CD1_1");
    let cd12 = header.get_float("CD1_2");
    let cd21 = header.get_float("CD2_1");
    let cd22 = header.get_float("CD2_2");

    if cd11.is_some() || cd12.is_some() || cd21.is_some() || cd22.is_some() {
        let cd = [
            [cd11.unwrap_or(0.0), cd12.unwrap_or(0.0)],
            [cd21.unwrap_or(0.0), cd22.unwrap_or(0.0)],
        ];
        return Ok(MatrixKeywords::Cd(cd));
    }

    if let (Some(c1), Some(c2)) = (header.get_float("CDELT1"), header.get_float("CDELT2")) {
        let pc = [
            [
                header.get_float("PC1_1").unwrap_or(1.0),
                header.get_float("PC1_2").unwrap_or(0.0),
            ],
            [
                header.get_float("PC2_1").unwrap_or(0.0),
                header.get_float("PC2_2").unwrap_or(1.0),
            ],
        ];
        return Ok(MatrixKeywords::PcCdelt {
            pc,
            cdelt: [c1, c2],
        });
    }

    Ok(MatrixKeywords::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{KeywordMap, TextHeader};

    fn tan_header() -> KeywordMap {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN")
            .set_float("CRPIX1", 512.0)
            .set_float("CRPIX2", 512.0)
            .set_float("CRVAL1", 180.0)
            .set_float("CRVAL2", 45.0)
            .set_float("CD1_1", -0.001)
            .set_float("CD1_2", 0.0)
            .set_float("CD2_1", 0.0)
            .set_float("CD2_2", 0.001);
        header
    }

    #[test]
    fn test_parse_ctype() {
        assert_eq!(parse_ctype("RA---TAN").unwrap(), ("TAN", false));
        assert_eq!(parse_ctype("DEC--TAN-SIP").unwrap(), ("TAN", true));
        assert_eq!(parse_ctype("  RA---SIN  ").unwrap(), ("SIN", false));
        assert!(parse_ctype("RATAN").is_err());
        assert!(parse_ctype("RA---").is_err());
    }

    #[test]
    fn test_reference_pixel_maps_to_crval() {
        let wcs = Wcs::from_header(&tan_header()).unwrap();
        let (ra, dec) = wcs.pix2world(512.0, 512.0).unwrap();

        assert!((ra - 180.0).abs() < 1e-12);
        assert!((dec - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_north_is_up_east_is_left() {
        let wcs = Wcs::from_header(&tan_header()).unwrap();

        let (_, dec_up) = wcs.pix2world(512.0, 612.0).unwrap();
        assert!((dec_up - 45.1).abs() < 1e-5);

        let (ra_left, dec_left) = wcs.pix2world(412.0, 512.0).unwrap();
        assert!(ra_left > 180.0);
        assert!(dec_left < 45.0);
    }

    #[test]
    fn test_pc_cdelt_header() {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN")
            .set_float("CRPIX1", 512.0)
            .set_float("CRPIX2", 512.0)
            .set_float("CRVAL1", 180.0)
            .set_float("CRVAL2", 45.0)
            .set_float("CDELT1", -0.001)
            .set_float("CDELT2", 0.001);

        let from_pc = Wcs::from_header(&header).unwrap();
        let from_cd = Wcs::from_header(&tan_header()).unwrap();

        assert_eq!(
            from_pc.pix2world(700.0, 300.0).unwrap(),
            from_cd.pix2world(700.0, 300.0).unwrap()
        );
    }

    #[test]
    fn test_mismatched_projection_codes() {
        let mut header = tan_header();
        header.set_string("CTYPE2", "DEC--SIN");
        let err = WcsBuilder::from_header(&header).unwrap_err();
        assert!(err.to_string().contains("Mismatched"));
    }

    #[test]
    fn test_unsupported_projection() {
        let mut header = tan_header();
        header
            .set_string("CTYPE1", "RA---AIT")
            .set_string("CTYPE2", "DEC--AIT");
        assert!(matches!(
            WcsBuilder::from_header(&header),
            Err(WcsError::UnsupportedProjection { .. })
        ));
    }

    #[test]
    fn test_missing_matrix() {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN")
            .set_float("CRPIX1", 1.0)
            .set_float("CRPIX2", 1.0)
            .set_float("CRVAL1", 0.0)
            .set_float("CRVAL2", 0.0);

        let err = Wcs::from_header(&header).unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { .. }));
    }

    #[test]
    fn test_missing_crval() {
        let mut header = KeywordMap::new();
        header
            .set_string("CTYPE1", "RA---TAN")
            .set_string("CTYPE2", "DEC--TAN")
            .set_float("CRPIX1", 1.0)
            .set_float("CRPIX2", 1.0);

        let err = Wcs::from_header(&header).unwrap_err();
        assert!(err.to_string().contains("CRVAL1"));
    }

    #[test]
    fn test_builder_without_header() {
        let wcs = WcsBuilder::new()
            .crpix(100.0, 100.0)
            .crval(10.0, -30.0)
            .cd_matrix([[-0.0001, 0.0], [0.0, 0.0001]])
            .projection(Projection::Tan)
            .build()
            .unwrap();

        assert_eq!(wcs.crval(), (10.0, -30.0));
        assert_eq!(wcs.crpix(), [100.0, 100.0]);
        assert!(!wcs.has_distortion());
    }

    #[test]
    fn test_builder_requires_projection() {
        let result = WcsBuilder::new()
            .crpix(100.0, 100.0)
            .crval(10.0, -30.0)
            .cd_matrix([[-0.0001, 0.0], [0.0, 0.0001]])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_sip_changes_only_full_transform() {
        let mut header = tan_header();
        header
            .set_string("CTYPE1", "RA---TAN-SIP")
            .set_string("CTYPE2", "DEC--TAN-SIP")
            .set_int("A_ORDER", 2)
            .set_int("B_ORDER", 2)
            .set_float("A_2_0", 1e-5)
            .set_float("B_0_2", 1e-5);

        let wcs = Wcs::from_header(&header).unwrap();
        assert!(wcs.has_distortion());

        let plain = Wcs::from_header(&tan_header()).unwrap();

        assert_eq!(
            wcs.pix2world_core(700.0, 800.0).unwrap(),
            plain.pix2world(700.0, 800.0).unwrap()
        );
        assert_ne!(
            wcs.pix2world(700.0, 800.0).unwrap(),
            plain.pix2world(700.0, 800.0).unwrap()
        );
        // distortion vanishes at the reference pixel
        assert_eq!(
            wcs.pix2world(512.0, 512.0).unwrap(),
            plain.pix2world(512.0, 512.0).unwrap()
        );
    }

    #[test]
    fn test_from_text_header() {
        let text = [
            "WCSAXES =                    2 / Number of coordinate axes",
            "CRPIX1  =               2100.0 / Pixel coordinate of reference point",
            "CRPIX2  =               2200.0 / Pixel coordinate of reference point",
            "CD1_1   = -1.3888888888889E-05 / Coordinate transformation matrix element",
            "CD2_2   =  1.3888888888889E-05 / Coordinate transformation matrix element",
            "CTYPE1  = 'RA---TAN'           / Right ascension, gnomonic projection",
            "CTYPE2  = 'DEC--TAN'           / Declination, gnomonic projection",
            "CRVAL1  =          23.46212500 / [deg] Coordinate value at reference point",
            "CRVAL2  =          30.66027778 / [deg] Coordinate value at reference point",
            "END",
        ]
        .join("\n");

        let header = TextHeader::parse(&text).unwrap();
        let wcs = Wcs::from_header(&header).unwrap();
        let (ra, dec) = wcs.pix2world(2100.0, 2200.0).unwrap();

        assert!((ra - 23.462125).abs() < 1e-10);
        assert!((dec - 30.66027778).abs() < 1e-10);
        assert!((wcs.pixel_scale() - 1.3888888888889E-05).abs() < 1e-15);
    }
}
