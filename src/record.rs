//! Raw EPA certification test records and architecture bucketing.

use serde::Deserialize;

/// Column headers the loader requires in every raw EPA file.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Model Year",
    "Test Veh Displacement (L)",
    "Equivalent Test Weight (lbs.)",
    "Test Fuel Type Description",
    "Tested Transmission Type",
    "Drive System Code",
    "Test Category",
    "CO2 (g/mi)",
];

/// One EPA dynamometer test result, as published in the certification data.
/// Immutable once deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTestRecord {
    #[serde(rename = "Model Year")]
    pub model_year: u16,
    #[serde(rename = "Test Veh Displacement (L)")]
    pub displacement_l: f64,
    #[serde(rename = "Equivalent Test Weight (lbs.)")]
    pub test_weight_lbs: f64,
    #[serde(rename = "Test Fuel Type Description")]
    pub fuel_type: String,
    #[serde(rename = "Tested Transmission Type")]
    pub transmission_type: String,
    #[serde(rename = "Drive System Code")]
    pub drive_code: String,
    #[serde(rename = "Test Category")]
    pub test_category: String,
    #[serde(rename = "CO2 (g/mi)")]
    pub co2_gpm: f64,
}

/// The two regulatory test cycles the pipeline models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// FTP city driving cycle.
    City,
    /// HWY highway driving cycle.
    Hwy,
}

impl RawTestRecord {
    /// Maps the EPA test category to a modeled cycle. Other categories
    /// (US06, SC03, cold FTP variants, ...) are out of scope and yield `None`.
    pub fn cycle(&self) -> Option<Cycle> {
        match self.test_category.trim() {
            "FTP" => Some(Cycle::City),
            "HWY" => Some(Cycle::Hwy),
            _ => None,
        }
    }

    /// Gasoline ICE scope filter. EPA fuel descriptions vary by year;
    /// certification gasoline shows up as "gasoline", "Cold CO ...", or
    /// "Indolene" blends. Anything electrified or alt-fuel is excluded.
    pub fn is_gasoline_ice(&self) -> bool {
        let fuel = self.fuel_type.to_lowercase();

        let included = fuel.contains("gasoline") || fuel.contains("cold co") || fuel.contains("indolene");

        let excluded = fuel.contains("electric")
            || fuel.contains("diesel")
            || fuel.contains("e85")
            || fuel.contains("ethanol")
            || fuel.contains("cng")
            || fuel.contains("lpg")
            || fuel.contains("hydrogen");

        included && !excluded
    }

    /// Architecture transmission bucket for this record.
    pub fn transmission_bucket(&self) -> &'static str {
        bucket_transmission(&self.transmission_type)
    }

    /// Architecture drive bucket for this record.
    pub fn drive_bucket(&self) -> &'static str {
        bucket_drive(&self.drive_code)
    }
}

/// Maps an EPA transmission description to an architecture bucket.
///
/// "Automated Manual" gearboxes behave like automatics from an
/// architecture standpoint, so only true manuals map to `MT`.
pub fn bucket_transmission(raw: &str) -> &'static str {
    let t = raw.to_lowercase();

    if t.contains("manual") && !t.contains("automated") {
        return "MT";
    }
    if t.contains("cvt") || t.contains("variable") {
        return "CVT";
    }
    "AT"
}

/// Maps an EPA drive system code to an architecture bucket.
/// Part-time and full-time four-wheel-drive codes all fold into `AWD`.
pub fn bucket_drive(raw: &str) -> &'static str {
    match raw.trim().to_uppercase().as_str() {
        "F" | "FRONT" => "FWD",
        "R" | "REAR" => "RWD",
        _ => "AWD",
    }
}
