//! FAA code tables used to label stored code columns.
//!
//! Codes are stored verbatim as text; these enums only translate them into
//! readable labels for lookups.

use anyhow::{Result, anyhow};
use std::fmt;
use std::str::FromStr;

/// Type of aircraft (`TYPE-ACFT` / `TYPE AIRCRAFT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AircraftType {
    Glider,
    Balloon,
    BlimpDirigible,
    FixedWingSingleEngine,
    FixedWingMultiEngine,
    Rotorcraft,
    WeightShiftControl,
    PoweredParachute,
    Gyroplane,
    HybridLift,
    Other,
}

impl AircraftType {
    pub fn label(&self) -> &'static str {
        match self {
            AircraftType::Glider => "Glider",
            AircraftType::Balloon => "Balloon",
            AircraftType::BlimpDirigible => "Blimp/Dirigible",
            AircraftType::FixedWingSingleEngine => "Fixed-Wing Single-Engine",
            AircraftType::FixedWingMultiEngine => "Fixed-Wing Multi-Engine",
            AircraftType::Rotorcraft => "Rotorcraft",
            AircraftType::WeightShiftControl => "Weight-Shift-Control",
            AircraftType::PoweredParachute => "Powered Parachute",
            AircraftType::Gyroplane => "Gyroplane",
            AircraftType::HybridLift => "Hybrid Lift",
            AircraftType::Other => "Other",
        }
    }
}

impl FromStr for AircraftType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(AircraftType::Glider),
            "2" => Ok(AircraftType::Balloon),
            "3" => Ok(AircraftType::BlimpDirigible),
            "4" => Ok(AircraftType::FixedWingSingleEngine),
            "5" => Ok(AircraftType::FixedWingMultiEngine),
            "6" => Ok(AircraftType::Rotorcraft),
            "7" => Ok(AircraftType::WeightShiftControl),
            "8" => Ok(AircraftType::PoweredParachute),
            "9" => Ok(AircraftType::Gyroplane),
            "H" => Ok(AircraftType::HybridLift),
            "O" => Ok(AircraftType::Other),
            _ => Err(anyhow!("Invalid aircraft type code: {}", s)),
        }
    }
}

impl fmt::Display for AircraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Type of engine (`TYPE-ENG` / `TYPE ENGINE` / engine file `TYPE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EngineType {
    None,
    Reciprocating,
    TurboProp,
    TurboShaft,
    TurboJet,
    TurboFan,
    Ramjet,
    TwoCycle,
    FourCycle,
    Unknown,
    Electric,
    Rotary,
}

impl EngineType {
    pub fn label(&self) -> &'static str {
        match self {
            EngineType::None => "None",
            EngineType::Reciprocating => "Reciprocating",
            EngineType::TurboProp => "Turbo-Prop",
            EngineType::TurboShaft => "Turbo-Shaft",
            EngineType::TurboJet => "Turbo-Jet",
            EngineType::TurboFan => "Turbo-Fan",
            EngineType::Ramjet => "Ramjet",
            EngineType::TwoCycle => "2-Cycle",
            EngineType::FourCycle => "4-Cycle",
            EngineType::Unknown => "Unknown",
            EngineType::Electric => "Electric",
            EngineType::Rotary => "Rotary",
        }
    }
}

impl FromStr for EngineType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        // Codes arrive zero-padded ("01") in some files and bare ("1") in others
        let code: u8 = s
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid engine type code: {}", s))?;
        match code {
            0 => Ok(EngineType::None),
            1 => Ok(EngineType::Reciprocating),
            2 => Ok(EngineType::TurboProp),
            3 => Ok(EngineType::TurboShaft),
            4 => Ok(EngineType::TurboJet),
            5 => Ok(EngineType::TurboFan),
            6 => Ok(EngineType::Ramjet),
            7 => Ok(EngineType::TwoCycle),
            8 => Ok(EngineType::FourCycle),
            9 => Ok(EngineType::Unknown),
            10 => Ok(EngineType::Electric),
            11 => Ok(EngineType::Rotary),
            _ => Err(anyhow!("Invalid engine type code: {}", s)),
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aircraft category (`AC-CAT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AircraftCategory {
    Land,
    Sea,
    Amphibian,
}

impl FromStr for AircraftCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(AircraftCategory::Land),
            "2" => Ok(AircraftCategory::Sea),
            "3" => Ok(AircraftCategory::Amphibian),
            _ => Err(anyhow!("Invalid aircraft category code: {}", s)),
        }
    }
}

impl fmt::Display for AircraftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AircraftCategory::Land => "Land",
            AircraftCategory::Sea => "Sea",
            AircraftCategory::Amphibian => "Amphibian",
        })
    }
}

/// Builder certification (`BUILD-CERT-IND`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BuilderCertification {
    TypeCertificated,
    NotTypeCertificated,
    LightSport,
}

impl FromStr for BuilderCertification {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" => Ok(BuilderCertification::TypeCertificated),
            "1" => Ok(BuilderCertification::NotTypeCertificated),
            "2" => Ok(BuilderCertification::LightSport),
            _ => Err(anyhow!("Invalid builder certification code: {}", s)),
        }
    }
}

impl fmt::Display for BuilderCertification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuilderCertification::TypeCertificated => "Type Certificated",
            BuilderCertification::NotTypeCertificated => "Not Type Certificated",
            BuilderCertification::LightSport => "Light Sport",
        })
    }
}

/// Weight class (`AC-WEIGHT`), e.g. `CLASS 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WeightClass {
    UpTo12499,
    From12500To19999,
    From20000AndOver,
    UavUpTo55,
}

impl FromStr for WeightClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let code = trimmed.strip_prefix("CLASS ").unwrap_or(trimmed).trim();
        match code {
            "1" => Ok(WeightClass::UpTo12499),
            "2" => Ok(WeightClass::From12500To19999),
            "3" => Ok(WeightClass::From20000AndOver),
            "4" => Ok(WeightClass::UavUpTo55),
            _ => Err(anyhow!("Invalid weight class code: {}", s)),
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeightClass::UpTo12499 => "Up to 12,499 lbs",
            WeightClass::From12500To19999 => "12,500 to 19,999 lbs",
            WeightClass::From20000AndOver => "20,000 lbs and over",
            WeightClass::UavUpTo55 => "UAV up to 55 lbs",
        })
    }
}

/// Type of registrant (`TYPE REGISTRANT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RegistrantType {
    Individual,
    Partnership,
    Corporation,
    CoOwned,
    Government,
    Llc,
    NonCitizenCorporation,
    NonCitizenCoOwned,
    Unknown,
}

impl From<&str> for RegistrantType {
    fn from(code: &str) -> Self {
        match code.trim() {
            "1" => RegistrantType::Individual,
            "2" => RegistrantType::Partnership,
            "3" => RegistrantType::Corporation,
            "4" => RegistrantType::CoOwned,
            "5" => RegistrantType::Government,
            "7" => RegistrantType::Llc,
            "8" => RegistrantType::NonCitizenCorporation,
            "9" => RegistrantType::NonCitizenCoOwned,
            _ => RegistrantType::Unknown,
        }
    }
}

impl fmt::Display for RegistrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegistrantType::Individual => "Individual",
            RegistrantType::Partnership => "Partnership",
            RegistrantType::Corporation => "Corporation",
            RegistrantType::CoOwned => "Co-Owned",
            RegistrantType::Government => "Government",
            RegistrantType::Llc => "LLC",
            RegistrantType::NonCitizenCorporation => "Non-Citizen Corporation",
            RegistrantType::NonCitizenCoOwned => "Non-Citizen Co-Owned",
            RegistrantType::Unknown => "Unknown",
        })
    }
}

/// Label for a stored aircraft-type code, if it is a known code.
pub fn aircraft_type_label(code: Option<&str>) -> Option<String> {
    code.and_then(|c| c.parse::<AircraftType>().ok())
        .map(|t| t.to_string())
}

pub fn engine_type_label(code: Option<&str>) -> Option<String> {
    code.and_then(|c| c.parse::<EngineType>().ok())
        .map(|t| t.to_string())
}

pub fn registrant_type_label(code: Option<&str>) -> Option<String> {
    code.map(|c| RegistrantType::from(c).to_string())
}
