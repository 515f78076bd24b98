pub mod fmi_observation;
pub mod met_forecast;
pub mod met_sunrise;
pub mod yr_legacy;

use crate::domain::conversions::fahrenheit_to_celsius;
use tracing::warn;

/// Convert a provider temperature to Celsius. Unknown units pass through.
pub(crate) fn celsius(value: f64, unit: &str, provider: &str) -> f64 {
    match unit {
        "celsius" => value,
        "fahrenheit" => fahrenheit_to_celsius(value),
        other => {
            warn!("{} reported unknown temperature unit '{}'", provider, other);
            value
        }
    }
}

/// Like [`celsius`], rounded to whole degrees only after a known conversion.
pub(crate) fn rounded_celsius(value: f64, unit: &str, provider: &str) -> f64 {
    let converted = celsius(value, unit, provider);
    match unit {
        "celsius" | "fahrenheit" => converted.round(),
        _ => converted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(21.5, "celsius", 21.5)]
    #[case(212.0, "fahrenheit", 100.0)]
    #[case(300.0, "kelvin", 300.0)]
    fn test_celsius(#[case] value: f64, #[case] unit: &str, #[case] expected: f64) {
        assert_eq!(celsius(value, unit, "test"), expected);
    }

    #[rstest]
    #[case(21.5, "celsius", 22.0)]
    #[case(50.5, "fahrenheit", 10.0)]
    #[case(273.65, "kelvin", 273.65)]
    fn test_rounded_celsius(#[case] value: f64, #[case] unit: &str, #[case] expected: f64) {
        assert_eq!(rounded_celsius(value, unit, "test"), expected);
    }
}
