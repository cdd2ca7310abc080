use serde::{Deserialize, Serialize};

/// Device families exposed by the RAPT API.
///
/// Each category has exactly one list endpoint that returns every device
/// of that family on the account, which is what keeps a poll cycle to one
/// request per category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr
)]
#[strum(ascii_case_insensitive)]
pub enum DeviceCategory {
    /// Temperature controller.
    Controller,
    /// RAPT Pill hydrometer.
    Hydrometer,
    /// Fermentation chamber.
    Chamber,
    BrewZilla,
}

impl DeviceCategory {
    /// Poll order. Fixed so request spacing and logs are deterministic.
    pub const ALL: [Self; 4] = [
        Self::Controller,
        Self::Hydrometer,
        Self::Chamber,
        Self::BrewZilla,
    ];

    /// List endpoint path, relative to the API base URL.
    pub fn list_path(self) -> &'static str {
        match self {
            Self::Controller => "TemperatureControllers/GetTemperatureControllers",
            Self::Hydrometer => "Hydrometers/GetHydrometers",
            Self::Chamber => "FermentationChambers/GetFermentationChambers",
            Self::BrewZilla => "BrewZillas/GetBrewZillas",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            "hydrometer".parse::<DeviceCategory>().ok(),
            Some(DeviceCategory::Hydrometer)
        );
        assert_eq!(
            "BREWZILLA".parse::<DeviceCategory>().ok(),
            Some(DeviceCategory::BrewZilla)
        );
    }

    #[test]
    fn every_category_has_a_distinct_endpoint() {
        let mut paths: Vec<_> = DeviceCategory::ALL.iter().map(|c| c.list_path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), DeviceCategory::ALL.len());
    }
}
