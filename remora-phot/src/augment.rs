use std::fs;
use std::path::Path;

use remora_wcs::{PixelCoord, TextHeader, Wcs};
use tracing::debug;

use crate::error::{PhotError, Result};
use crate::table::PhotTable;

/// DOLPHOT positions are 1-based, like FITS pixels.
pub const PIXEL_ORIGIN: u8 = 1;

pub const LEADING_COLUMNS: [&str; 4] = ["RA", "DEC", "X", "Y"];

/// Reads a text FITS header (one card per line) and builds its WCS.
pub fn load_wcs(path: impl AsRef<Path>) -> Result<Wcs> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| PhotError::io(path, e))?;
    let header = TextHeader::parse(&text)?;
    let wcs = Wcs::from_header(&header)?;
    debug!(
        "WCS from {:?}: {} projection, CRVAL = {:?}, {:.4} arcsec/pixel",
        path,
        wcs.projection().code(),
        wcs.crval(),
        wcs.pixel_scale() * 3600.0
    );
    Ok(wcs)
}

/// Replaces `RA`/`DEC` with positions computed from `X`/`Y` and moves the
/// four to the front of the table.
pub fn add_wcs(mut table: PhotTable, wcs: &Wcs) -> Result<PhotTable> {
    table.drop_column("RA");
    table.drop_column("DEC");

    let (ra, dec) = {
        let xs = table.require_column("X")?;
        let ys = table.require_column("Y")?;

        let mut ra = Vec::with_capacity(xs.len());
        let mut dec = Vec::with_capacity(xs.len());
        for (&x, &y) in xs.iter().zip(ys) {
            match (x, y) {
                (Some(x), Some(y)) => {
                    let sky = wcs.pixel_to_celestial(PixelCoord::from_origin(x, y, PIXEL_ORIGIN))?;
                    ra.push(Some(sky.ra()));
                    dec.push(Some(sky.dec()));
                }
                _ => {
                    ra.push(None);
                    dec.push(None);
                }
            }
        }
        (ra, dec)
    };

    table.add_column("RA", ra)?;
    table.add_column("DEC", dec)?;
    table.reorder(&LEADING_COLUMNS)?;
    Ok(table)
}
