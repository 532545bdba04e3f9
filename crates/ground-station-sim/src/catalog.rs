//! TLE catalog ingestion
//!
//! Accepts the usual CelesTrak layout: groups of a name line followed by the
//! two element lines, or bare two-line pairs. Blank lines are ignored.
//!
//! Catalog entries have no orbital plane, so they are numbered in pages of
//! 256: `plane` is the page and `slot` the position within it.

use crate::{Result, SimError};
use orbital_mechanics::{OrbitalElements, OrbitalError, Satellite, SatelliteStatus};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub fn load_tle_catalog(path: &Path) -> Result<Vec<Satellite>> {
    info!("Loading TLE catalog from {:?}", path);
    let text = fs::read_to_string(path)?;
    let satellites = parse_tle_catalog(&text)?;
    info!("Loaded {} satellites", satellites.len());
    Ok(satellites)
}

pub fn parse_tle_catalog(text: &str) -> Result<Vec<Satellite>> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end())
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut satellites = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (name, line1, line2) = if is_element_line(lines[i], '1') {
            (None, lines[i], lines.get(i + 1).copied())
        } else {
            let name = lines[i].trim().trim_start_matches("0 ").to_string();
            i += 1;
            match lines.get(i) {
                Some(l) => (Some(name), *l, lines.get(i + 1).copied()),
                None => {
                    return Err(SimError::from(OrbitalError::InvalidTle(format!(
                        "name line {:?} has no element lines",
                        name
                    ))))
                }
            }
        };
        let line2 = match line2 {
            Some(l) if is_element_line(l, '2') => l,
            _ => {
                return Err(SimError::from(OrbitalError::InvalidTle(format!(
                    "line 1 {:?} is not followed by line 2",
                    line1
                ))))
            }
        };

        let norad_id = line1
            .get(2..7)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| OrbitalError::InvalidTle(format!("no catalog number in {:?}", line1)))?;
        let elements = OrbitalElements::from_tle(name.clone(), line1, line2)?;
        let index = satellites.len();
        let (plane, slot) = match (u8::try_from(index / 256), u8::try_from(index % 256)) {
            (Ok(plane), Ok(slot)) => (plane, slot),
            _ => {
                return Err(SimError::from(OrbitalError::InvalidTle(format!(
                    "catalog holds more than {} entries",
                    256 * 256
                ))))
            }
        };
        let id = format!("NORAD-{}", norad_id);
        debug!(%id, "parsed element set");

        satellites.push(Satellite {
            name: name.unwrap_or_else(|| id.clone()),
            id,
            norad_id,
            plane,
            slot,
            status: SatelliteStatus::Operational,
            elements,
        });
        i += 2;
    }
    Ok(satellites)
}

fn is_element_line(line: &str, number: char) -> bool {
    let mut chars = line.chars();
    chars.next() == Some(number) && chars.next() == Some(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS: &str = "ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

    #[test]
    fn test_three_line_catalog() {
        let sats = parse_tle_catalog(ISS).unwrap();
        assert_eq!(sats.len(), 1);
        assert_eq!(sats[0].name, "ISS (ZARYA)");
        assert_eq!(sats[0].norad_id, 25544);
        assert_eq!(sats[0].id, "NORAD-25544");
        assert!((sats[0].elements.mean_motion() - 15.72125391).abs() < 1e-6);
    }

    #[test]
    fn test_two_line_catalog_with_blanks() {
        let bare: String = ISS.lines().skip(1).collect::<Vec<_>>().join("\n");
        let text = format!("{}\n\n{}\n", bare, bare);
        let sats = parse_tle_catalog(&text).unwrap();
        assert_eq!(sats.len(), 2);
        assert_eq!(sats[0].name, "NORAD-25544");
        assert_eq!(sats[1].slot, 1);
    }

    #[test]
    fn test_truncated_catalog_is_rejected() {
        let first_two: String = ISS.lines().take(2).collect::<Vec<_>>().join("\n");
        assert!(parse_tle_catalog(&first_two).is_err());
        assert!(parse_tle_catalog("LONELY NAME").is_err());
        assert!(parse_tle_catalog("").unwrap().is_empty());
    }

    #[test]
    fn test_large_catalog_pages_slots() {
        let text = ISS.repeat(300);
        let sats = parse_tle_catalog(&text).unwrap();
        assert_eq!(sats.len(), 300);
        assert_eq!((sats[255].plane, sats[255].slot), (0, 255));
        assert_eq!((sats[256].plane, sats[256].slot), (1, 0));
        assert_eq!((sats[299].plane, sats[299].slot), (1, 43));
    }
}
