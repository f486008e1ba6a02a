use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use super::transponder::Transponder;
use super::types::Mode;

const MAIN_PATTERNS: &[&str] = &[
    "FM VOICE",
    "FM TRANSCEIVER",
    "VOICE REPEATER",
    "LINEAR",
    "TRANSPONDER",
];
const SKIP_PATTERNS: &[&str] = &["PE0SAT", "L/V"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no transponder file for NORAD {0}")]
    NotFound(u32),
    #[error("transponder file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("invalid transponder file for NORAD {norad_id}: {message}")]
    Invalid { norad_id: u32, message: String },
    #[error("no usable transponder for NORAD {0}")]
    NoMainTransponder(u32),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    main: Option<String>,
    #[serde(default)]
    rit: f64,
    #[serde(default)]
    xit: f64,
    /// Sections in file order.
    transponders: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct TransponderRecord {
    down_low: f64,
    #[serde(default)]
    down_high: Option<f64>,
    #[serde(default)]
    up_low: Option<f64>,
    #[serde(default)]
    up_high: Option<f64>,
    mode: Mode,
    #[serde(default)]
    invert: BoolLike,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum BoolLike {
    #[default]
    Unset,
    Bool(bool),
    Text(String),
}

impl BoolLike {
    fn is_true(&self) -> bool {
        match self {
            BoolLike::Unset => false,
            BoolLike::Bool(b) => *b,
            BoolLike::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        }
    }
}

/// Transponders known for one satellite, plus the operator's stored
/// fine-tuning offsets for it.
#[derive(Debug, Clone)]
pub struct SatelliteTransponders {
    pub norad_id: u32,
    pub main: Transponder,
    pub all: Vec<Transponder>,
    pub rit: f64,
    pub xit: f64,
}

/// Directory of `<norad_id>.yaml` transponder files.
pub struct TransponderCatalog {
    folder: PathBuf,
}

impl TransponderCatalog {
    pub fn new(folder: PathBuf) -> Self {
        Self { folder }
    }

    pub fn load(&self, norad_id: u32) -> Result<SatelliteTransponders, CatalogError> {
        let path = self.folder.join(format!("{}.yaml", norad_id));
        if !path.exists() {
            return Err(CatalogError::NotFound(norad_id));
        }
        let content = fs::read_to_string(&path)?;
        parse_catalog(norad_id, &content)
    }
}

pub fn parse_catalog(norad_id: u32, yaml: &str) -> Result<SatelliteTransponders, CatalogError> {
    let file: CatalogFile = serde_yaml::from_str(yaml).map_err(|e| CatalogError::Invalid {
        norad_id,
        message: e.to_string(),
    })?;

    let mut all = Vec::new();
    for (key, value) in file.transponders {
        let name = match key {
            serde_yaml::Value::String(name) => name,
            other => {
                log::warn!("Skipping transponder of NORAD {} with name {:?}", norad_id, other);
                continue;
            }
        };
        let record: TransponderRecord =
            serde_yaml::from_value(value).map_err(|e| CatalogError::Invalid {
                norad_id,
                message: format!("{}: {}", name, e),
            })?;
        let down_high = record.down_high.unwrap_or(record.down_low);
        let up_low = record.up_low.unwrap_or(0.0);
        let up_high = record.up_high.unwrap_or(up_low);

        match Transponder::new(
            name.clone(),
            (record.down_low, down_high),
            (up_low, up_high),
            record.mode,
            record.invert.is_true(),
        ) {
            Ok(t) => all.push(t),
            Err(e) => log::warn!("Skipping transponder of NORAD {}: {}", norad_id, e),
        }
    }

    let main = pick_main(file.main.as_deref(), &all).ok_or(CatalogError::NoMainTransponder(norad_id))?;
    log::debug!("NORAD {} main transponder: {}", norad_id, main.name);

    Ok(SatelliteTransponders {
        norad_id,
        main,
        all,
        rit: file.rit,
        xit: file.xit,
    })
}

fn pick_main(explicit: Option<&str>, all: &[Transponder]) -> Option<Transponder> {
    if let Some(name) = explicit {
        return all.iter().find(|t| t.name == name).cloned();
    }

    let candidates: Vec<&Transponder> = all
        .iter()
        .filter(|t| {
            let upper = t.name.to_uppercase();
            !SKIP_PATTERNS.iter().any(|p| upper.contains(p))
                && MAIN_PATTERNS.iter().any(|p| upper.contains(p))
        })
        .collect();

    if candidates.len() > 1 {
        log::warn!(
            "Several transponders look like the main one, using {}",
            candidates[0].name
        );
    }

    match candidates.first() {
        Some(t) => Some((*t).clone()),
        None if all.len() == 1 => all.first().cloned(),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AO91: &str = r#"
rit: 100
transponders:
  Telemetry beacon:
    down_low: 145960000
    mode: FM
  FM Voice:
    down_low: 145960000
    up_low: 435250000
    mode: FM
"#;

    const RS44: &str = r#"
main: Linear
transponders:
  Linear:
    down_low: 435610000
    down_high: 435670000
    up_low: 145935000
    up_high: 145995000
    mode: USB
    invert: "True"
  CW beacon:
    down_low: 435605000
    mode: CW
"#;

    #[test]
    fn picks_voice_transponder_by_name() {
        let sat = parse_catalog(43017, AO91).unwrap();
        assert_eq!(sat.main.name, "FM Voice");
        assert_eq!(sat.main.uplink_high, 435250000.0);
        assert_eq!(sat.main.downlink_high, sat.main.downlink_low);
        assert_eq!(sat.rit, 100.0);
        assert_eq!(sat.xit, 0.0);
        assert_eq!(sat.all.len(), 2);
    }

    #[test]
    fn explicit_main_and_text_invert_flag() {
        let sat = parse_catalog(44909, RS44).unwrap();
        assert_eq!(sat.main.name, "Linear");
        assert!(sat.main.inverting);
        assert_eq!(sat.main.mode, Mode::Usb);
        let beacon = sat.all.iter().find(|t| t.name == "CW beacon").unwrap();
        assert!(!beacon.has_uplink());
        assert!(!beacon.inverting);
    }

    #[test]
    fn reversed_bands_are_skipped() {
        let yaml = r#"
transponders:
  Broken transponder:
    down_low: 435100000
    down_high: 435000000
    mode: USB
"#;
        assert!(matches!(
            parse_catalog(1, yaml),
            Err(CatalogError::NoMainTransponder(1))
        ));
    }

    #[test]
    fn skips_beacon_style_sections() {
        let yaml = r#"
transponders:
  PE0SAT transponder list:
    down_low: 435000000
    mode: CW
  Mode V/U FM transponder:
    down_low: 435300000
    up_low: 145850000
    mode: FM
"#;
        let sat = parse_catalog(2, yaml).unwrap();
        assert_eq!(sat.main.name, "Mode V/U FM transponder");
    }

    #[test]
    fn first_matching_section_in_file_order_is_main() {
        let yaml = r#"
transponders:
  Transponder B:
    down_low: 435500000
    up_low: 145900000
    mode: USB
  FM Voice:
    down_low: 435300000
    up_low: 145850000
    mode: FM
"#;
        let sat = parse_catalog(3, yaml).unwrap();
        assert_eq!(sat.main.name, "Transponder B");
        let names: Vec<&str> = sat.all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Transponder B", "FM Voice"]);
    }

    #[test]
    fn missing_file_is_reported() {
        let catalog = TransponderCatalog::new(std::env::temp_dir().join("no-such-catalog-dir"));
        assert!(matches!(catalog.load(99999), Err(CatalogError::NotFound(99999))));
    }
}
