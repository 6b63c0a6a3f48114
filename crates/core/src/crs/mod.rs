//! Coordinate Reference System handling
//!
//! HydroSHEDS products ship their reference system as ESRI `.prj` WKT next to
//! each data file. Loading several levels together requires them all to agree,
//! which is what [`CRS::is_equivalent`] decides.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation, as read from a `.prj` file
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let epsg = epsg_for_wkt(&wkt);
        Self {
            wkt: Some(wkt),
            epsg,
        }
    }

    /// Read the WKT stored in an ESRI `.prj` sidecar file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn from_prj_file(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let wkt = std::fs::read_to_string(path)?;
        Ok(Some(Self::from_wkt(wkt.trim())))
    }

    /// WGS84 geographic CRS (EPSG:4326), the system of all HydroSHEDS data
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent.
    ///
    /// EPSG codes win when both sides know one; otherwise WKT strings are
    /// compared ignoring whitespace and case.
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return normalize_wkt(a) == normalize_wkt(b);
        }
        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let name = wkt_name(wkt).unwrap_or(wkt);
            return format!("WKT:{}", name.chars().take(50).collect::<String>());
        }
        "Unknown".to_string()
    }
}

fn normalize_wkt(wkt: &str) -> String {
    wkt.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// The quoted name of the outermost WKT node, e.g. `GCS_WGS_1984`.
fn wkt_name(wkt: &str) -> Option<&str> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}

/// Recognise the geographic WGS84 definitions found in HydroSHEDS `.prj` files.
fn epsg_for_wkt(wkt: &str) -> Option<u32> {
    if let Some(pos) = wkt.rfind("AUTHORITY[\"EPSG\",\"") {
        let rest = &wkt[pos + 18..];
        let end = rest.find('"')?;
        return rest[..end].parse().ok();
    }
    match wkt_name(wkt)? {
        "GCS_WGS_1984" | "WGS 84" | "WGS84" => Some(4326),
        _ => None,
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESRI_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), Some(4326));
        assert_eq!(crs.identifier(), "EPSG:4326");
    }

    #[test]
    fn test_esri_wkt_is_wgs84() {
        let crs = CRS::from_wkt(ESRI_WGS84);
        assert_eq!(crs.epsg(), Some(4326));
        assert!(crs.is_equivalent(&CRS::wgs84()));
    }

    #[test]
    fn test_identifier_truncates_on_char_boundary() {
        let name = format!("{}é{}", "a".repeat(49), "b".repeat(10));
        let crs = CRS::from_wkt(format!(r#"PROJCS["{}"]"#, name));
        let id = crs.identifier();
        assert_eq!(id, format!("WKT:{}é", "a".repeat(49)));
    }

    #[test]
    fn test_wkt_authority_code() {
        let crs = CRS::from_wkt(r#"PROJCS["WGS 84 / UTM zone 33N",AUTHORITY["EPSG","32633"]]"#);
        assert_eq!(crs.epsg(), Some(32633));
        assert!(!crs.is_equivalent(&CRS::wgs84()));
    }

    #[test]
    fn test_unknown_wkt_compared_textually() {
        let a = CRS::from_wkt(r#"PROJCS["Custom", PARAMETER["x", 1]]"#);
        let b = CRS::from_wkt(r#"PROJCS["Custom",PARAMETER["x",1]]"#);
        let c = CRS::from_wkt(r#"PROJCS["Other",PARAMETER["x",1]]"#);
        assert_eq!(a.epsg(), None);
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }

    #[test]
    fn test_prj_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hybas.prj");
        assert!(CRS::from_prj_file(&path).unwrap().is_none());

        std::fs::write(&path, format!("{}\n", ESRI_WGS84)).unwrap();
        let crs = CRS::from_prj_file(&path).unwrap().unwrap();
        assert_eq!(crs.wkt(), Some(ESRI_WGS84));
    }
}
