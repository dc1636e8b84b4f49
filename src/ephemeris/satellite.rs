use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use sgp4::{Constants, Elements};

use super::{BodyPositionSample, BodySampler, ElementSetMeta, EphemerisError};
use crate::geo::{gmst_at, CartesianVector};

/// Identity of one cataloged satellite.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct SatelliteInfo {
    pub name: String,
    pub norad_id: u32,
    pub tle_source: String,
}

/// One parsed element set plus its propagation constants. Entries are
/// immutable once built; a reload replaces whole `Arc`s, never mutates.
pub struct SatelliteEntry {
    pub info: SatelliteInfo,
    pub elements: Elements,
    pub constants: Constants,
    pub fetched_at: DateTime<Utc>,
}

impl SatelliteEntry {
    pub fn epoch(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_naive_utc_and_offset(self.elements.datetime, Utc)
    }
}

/// TLE catalog backed by a folder of `.tle`/`.txt` files.
///
/// The map is only locked for lookups and for the wholesale swap a reload
/// performs; computations hold `Arc` clones of entries, so a reload can
/// never change an element set mid-calculation.
pub struct SatelliteCatalog {
    tle_dir: PathBuf,
    max_age: Duration,
    entries: RwLock<HashMap<u32, Arc<SatelliteEntry>>>,
}

impl SatelliteCatalog {
    pub fn new(tle_dir: PathBuf, max_age: Duration) -> Self {
        Self {
            tle_dir,
            max_age,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Parse every TLE file in the folder and swap the catalog to the new
    /// set. A file that fails to parse is skipped with a warning.
    pub fn load_all(&self) -> Result<usize, EphemerisError> {
        if !self.tle_dir.exists() {
            return Err(EphemerisError::TleDirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        let mut fresh: HashMap<u32, Arc<SatelliteEntry>> = HashMap::new();
        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            match path.extension().and_then(|e| e.to_str()) {
                Some("tle") | Some("txt") => {}
                _ => continue,
            }
            match parse_tle_file(&path) {
                Ok(parsed) => {
                    for sat in parsed {
                        fresh.insert(sat.info.norad_id, Arc::new(sat));
                    }
                }
                Err(e) => {
                    log::warn!("skipping TLE file {}: {}", path.display(), e);
                }
            }
        }

        let count = fresh.len();
        *self.entries.write().expect("catalog lock poisoned") = fresh;
        log::info!("TLE catalog loaded: {} satellites", count);
        Ok(count)
    }

    pub fn is_stale(&self, entry: &SatelliteEntry) -> bool {
        Utc::now() - entry.fetched_at > self.max_age
    }

    /// Immutable snapshot of one satellite for the duration of a
    /// computation.
    pub fn snapshot(&self, norad_id: u32) -> Result<SatelliteSampler, EphemerisError> {
        let entry = self
            .entries
            .read()
            .expect("catalog lock poisoned")
            .get(&norad_id)
            .cloned()
            .ok_or_else(|| EphemerisError::UnknownBody(format!("satellite {norad_id}")))?;
        let meta = ElementSetMeta {
            norad_id,
            epoch: entry.epoch(),
            fetched_at: entry.fetched_at,
            stale: self.is_stale(&entry),
        };
        Ok(SatelliteSampler { entry, meta })
    }

    /// All cataloged entries, unordered.
    pub fn list(&self) -> Vec<Arc<SatelliteEntry>> {
        self.entries
            .read()
            .expect("catalog lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

/// SGP4-backed sampler over one frozen element set.
pub struct SatelliteSampler {
    entry: Arc<SatelliteEntry>,
    meta: ElementSetMeta,
}

impl SatelliteSampler {
    pub fn info(&self) -> &SatelliteInfo {
        &self.entry.info
    }

    pub fn meta(&self) -> &ElementSetMeta {
        &self.meta
    }
}

impl BodySampler for SatelliteSampler {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<BodyPositionSample, EphemerisError> {
        let minutes = self
            .entry
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .map_err(|e| EphemerisError::Propagation(e.to_string()))?;
        let prediction = self
            .entry
            .constants
            .propagate(minutes)
            .map_err(|e| EphemerisError::Propagation(e.to_string()))?;

        let gmst = gmst_at(instant);
        let teme = CartesianVector::eci(
            prediction.position[0],
            prediction.position[1],
            prediction.position[2],
        );
        Ok(BodyPositionSample {
            instant,
            vector: crate::geo::eci_to_ecef(&teme, gmst),
        })
    }

    fn element_set(&self) -> Option<&ElementSetMeta> {
        Some(&self.meta)
    }
}

fn parse_tle_file(path: &Path) -> Result<Vec<SatelliteEntry>, EphemerisError> {
    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let fetched_at = file_fetched_at(path);

    let mut results = Vec::new();
    for (name, line1, line2) in split_tle_sets(&content) {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()).map_err(
            |e| EphemerisError::InvalidTle {
                file: filename.clone(),
                message: e.to_string(),
            },
        )?;
        let constants =
            Constants::from_elements(&elements).map_err(|e| EphemerisError::InvalidTle {
                file: filename.clone(),
                message: e.to_string(),
            })?;

        let name = elements
            .object_name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", elements.norad_id));
        results.push(SatelliteEntry {
            info: SatelliteInfo {
                name,
                norad_id: elements.norad_id as u32,
                tle_source: filename.clone(),
            },
            elements,
            constants,
            fetched_at,
        });
    }
    Ok(results)
}

/// File modification time stands in for the download timestamp; falls back
/// to now when the filesystem does not report one.
fn file_fetched_at(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// Split multi-satellite TLE text into (name, line1, line2) triples. Handles
/// both 2-line and named 3-line sets and skips stray lines.
fn split_tle_sets(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut sets = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            sets.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            sets.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_TLE: &str = "\
ISS (ZARYA)
1 25544U 98067A   24030.50000000  .00016717  00000-0  29862-3 0  9008
2 25544  51.6438 247.4627 0006703 130.5360 325.0288 15.54179828432192
";

    fn iss_entry() -> SatelliteEntry {
        let sets = split_tle_sets(ISS_TLE);
        let (name, l1, l2) = sets[0].clone();
        let elements = Elements::from_tle(name, l1.as_bytes(), l2.as_bytes()).unwrap();
        let constants = Constants::from_elements(&elements).unwrap();
        SatelliteEntry {
            info: SatelliteInfo {
                name: "ISS (ZARYA)".into(),
                norad_id: 25544,
                tle_source: "test".into(),
            },
            elements,
            constants,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn splits_named_and_bare_sets() {
        let bare = "\
1 25544U 98067A   24030.50000000  .00016717  00000-0  29862-3 0  9005
2 25544  51.6438 247.4627 0006703 130.5360 325.0288 15.54179828432190
";
        assert_eq!(split_tle_sets(ISS_TLE).len(), 1);
        assert!(split_tle_sets(ISS_TLE)[0].0.is_some());
        assert_eq!(split_tle_sets(bare).len(), 1);
        assert!(split_tle_sets(bare)[0].0.is_none());
        assert!(split_tle_sets("garbage\nlines\n").is_empty());
    }

    #[test]
    fn sampler_produces_leo_altitude() {
        let entry = iss_entry();
        let epoch = entry.epoch();
        let sampler = SatelliteSampler {
            meta: ElementSetMeta {
                norad_id: 25544,
                epoch,
                fetched_at: entry.fetched_at,
                stale: false,
            },
            entry: Arc::new(entry),
        };
        let sample = sampler.position_at(epoch).unwrap();
        let radius = sample.vector.norm();
        // ISS orbits roughly 420 km up.
        assert!(radius > 6700.0 && radius < 6900.0, "radius {radius}");
    }

    #[test]
    fn snapshot_of_unknown_body_fails() {
        let catalog = SatelliteCatalog::new(PathBuf::from("/nonexistent"), Duration::hours(24));
        assert!(matches!(
            catalog.snapshot(99999),
            Err(EphemerisError::UnknownBody(_))
        ));
    }
}
