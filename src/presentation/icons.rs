// Icon lookup tables for the dashboard (weather-icons and FontAwesome names)

/// Legacy Yr numeric symbol (`symbol@var`) to weather-icons class.
const LEGACY_WEATHER_SYMBOLS: &[(&str, &str)] = &[
    ("01d", "day-sunny"),
    ("01n", "night-clear"),
    ("01m", "night-clear"),
    ("02d", "day-sunny-overcast"),
    ("02n", "night-partly-cloudy"),
    ("02m", "night-partly-cloudy"),
    ("03d", "day-cloudy"),
    ("03n", "night-cloudy"),
    ("03m", "night-cloudy"),
    ("04", "cloudy"),
    ("40d", "day-sprinkle"),
    ("40n", "night-sprinkle"),
    ("05d", "day-showers"),
    ("05n", "night-showers"),
    ("41d", "day-rain-wind"),
    ("41n", "night-rain-wind"),
    ("24d", "day-lightning"),
    ("24n", "night-lightning"),
    ("06d", "day-storm-showers"),
    ("06n", "night-storm-showers"),
    ("25d", "day-thunderstorm"),
    ("25n", "night-thunderstorm"),
    ("42d", "day-sleet"),
    ("42n", "night-sleet"),
    ("07d", "day-sleet"),
    ("07n", "night-sleet"),
    ("43d", "day-rain-mix"),
    ("43n", "night-rain-mix"),
    ("26d", "day-sleet-storm"),
    ("26n", "night-sleet-storm"),
    ("20d", "day-sleet-storm"),
    ("20n", "night-sleet-storm"),
    ("27d", "day-sleet-storm"),
    ("27n", "night-sleet-storm"),
    ("44d", "day-snow"),
    ("44n", "night-snow"),
    ("08d", "day-snow"),
    ("08n", "night-snow"),
    ("45d", "day-snow-wind"),
    ("45n", "night-snow-wind"),
    ("28d", "day-snow-thunderstorm"),
    ("28n", "night-snow-thunderstorm"),
    ("21d", "day-snow-thunderstorm"),
    ("21n", "night-snow-thunderstorm"),
    ("29d", "day-snow-thunderstorm"),
    ("29n", "night-snow-thunderstorm"),
    ("46", "sprinkle"),
    ("09", "showers"),
    ("10", "rain"),
    ("30", "storm-showers"),
    ("22", "thunderstorm"),
    ("11", "thunderstorm"),
    ("47", "sleet"),
    ("12", "sleet"),
    ("48", "rain-mix"),
    ("31", "storm-showers"),
    ("23", "storm-showers"),
    ("32", "storm-showers"),
    ("49", "snow"),
    ("13", "snow"),
    ("50", "snow-wind"),
    ("33", "storm-showers"),
    ("14", "storm-showers"),
    ("34", "storm-showers"),
    ("15", "fog"),
];

/// MET Norway 2.0 `symbol_code` to weather-icons class.
const WEATHER_SYMBOLS: &[(&str, &str)] = &[
    ("clearsky_day", "day-sunny"),
    ("clearsky_night", "night-clear"),
    ("fair_day", "day-sunny-overcast"),
    ("fair_night", "night-partly-cloudy"),
    ("partlycloudy_day", "day-cloudy"),
    ("partlycloudy_night", "night-cloudy"),
    ("lightrainshowers_day", "day-sprinkle"),
    ("lightrainshowers_night", "night-sprinkle"),
    ("rainshowers_day", "day-showers"),
    ("rainshowers_night", "night-showers"),
    ("heavyrainshowers_day", "day-rain-wind"),
    ("heavyrainshowers_night", "night-rain-wind"),
    ("lightrainshowersandthunder_day", "day-lightning"),
    ("lightrainshowersandthunder_night", "night-lightning"),
    ("rainshowersandthunder_day", "day-storm-showers"),
    ("rainshowersandthunder_night", "night-storm-showers"),
    ("heavyrainshowersandthunder_day", "day-thunderstorm"),
    ("heavyrainshowersandthunder_night", "night-thunderstorm"),
    ("lightsleetshowers_day", "day-sleet"),
    ("lightsleetshowers_night", "night-sleet"),
    ("sleetshowers_day", "day-sleet"),
    ("sleetshowers_night", "night-sleet"),
    ("heavysleetshowers_day", "day-rain-mix"),
    ("heavysleetshowers_night", "night-rain-mix"),
    ("lightssleetshowersandthunder_day", "day-sleet-storm"),
    ("lightssleetshowersandthunder_night", "night-sleet-storm"),
    ("sleetshowersandthunder_day", "day-sleet-storm"),
    ("sleetshowersandthunder_night", "night-sleet-storm"),
    ("heavysleetshowersandthunder_day", "day-sleet-storm"),
    ("heavysleetshowersandthunder_night", "night-sleet-storm"),
    ("lightsnowshowers_day", "day-snow"),
    ("lightsnowshowers_night", "night-snow"),
    ("snowshowers_day", "day-snow"),
    ("snowshowers_night", "night-snow"),
    ("heavysnowshowers_day", "day-snow-wind"),
    ("heavysnowshowers_night", "night-snow-wind"),
    ("lightssnowshowersandthunder_day", "day-snow-thunderstorm"),
    ("lightssnowshowersandthunder_night", "night-snow-thunderstorm"),
    ("snowshowersandthunder_day", "day-snow-thunderstorm"),
    ("snowshowersandthunder_night", "night-snow-thunderstorm"),
    ("heavysnowshowersandthunder_day", "day-snow-thunderstorm"),
    ("heavysnowshowersandthunder_night", "night-snow-thunderstorm"),
    ("cloudy", "cloudy"),
    ("lightrain", "sprinkle"),
    ("rain", "showers"),
    ("heavyrain", "rain"),
    ("lightrainandthunder", "storm-showers"),
    ("rainandthunder", "thunderstorm"),
    ("heavyrainandthunder", "thunderstorm"),
    ("lightsleet", "sleet"),
    ("sleet", "sleet"),
    ("heavysleet", "rain-mix"),
    ("lightsleetandthunder", "storm-showers"),
    ("sleetandthunder", "storm-showers"),
    ("heavysleetandthunder", "storm-showers"),
    ("lightsnow", "snow"),
    ("snow", "snow"),
    ("heavysnow", "snow-wind"),
    ("lightsnowandthunder", "storm-showers"),
    ("snowandthunder", "storm-showers"),
    ("heavysnowandthunder", "storm-showers"),
    ("fog", "fog"),
];

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, icon)| *icon)
}

/// Unknown codes fall back to the code itself.
pub fn legacy_weather_icon(code: &str) -> String {
    lookup(LEGACY_WEATHER_SYMBOLS, code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// No polar twilight icons exist, so `xx_polartwilight` uses `xx_night`.
pub fn weather_icon(code: &str) -> String {
    let icon = match code.split_once('_') {
        Some((base, "polartwilight")) => lookup(WEATHER_SYMBOLS, &format!("{base}_night")),
        _ => lookup(WEATHER_SYMBOLS, code),
    };
    icon.map(str::to_string).unwrap_or_else(|| code.to_string())
}

pub fn transit_mode_icon(mode: Option<&str>) -> &'static str {
    match mode {
        Some("BUS") => "bus",
        Some("TRAM") | Some("RAIL") => "train",
        Some("SUBWAY") => "subway",
        Some("FERRY") => "ship",
        _ => "car",
    }
}

pub fn alert_effect_icon(effect: Option<&str>) -> &'static str {
    match effect {
        Some("NO_SERVICE") => "ban",
        Some("REDUCED_SERVICE") | Some("MODIFIED_SERVICE") => "exclamation-triangle",
        Some("SIGNIFICANT_DELAYS") => "clock",
        Some("DETOUR") => "directions",
        Some("STOP_MOVED") => "map-marker-alt",
        Some("ADDITIONAL_SERVICE") => "plus-circle",
        _ => "info-circle",
    }
}
