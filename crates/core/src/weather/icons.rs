//! WMO weather interpretation codes, as returned by Open-Meteo.

pub const FALLBACK_ICON: &str = "wi-na";

/// Maps a condition code to a weather-icons class name.
pub fn icon_for_code(code: i32) -> &'static str {
    match code {
        0 => "wi-day-sunny",
        1 => "wi-day-sunny-overcast",
        2 => "wi-day-cloudy",
        3 => "wi-cloudy",
        45 | 48 => "wi-fog",
        51 | 53 | 55 | 56 | 57 => "wi-showers",
        61 => "wi-raindrops",
        63 => "wi-rain",
        65 => "wi-rain-wind",
        66 | 67 => "wi-sleet",
        71 | 73 => "wi-snow",
        75 => "wi-snow-wind",
        77 => "wi-snowflake-cold",
        80 => "wi-showers",
        81 => "wi-rain",
        82 => "wi-rain-wind",
        95 | 96 | 99 => "wi-thunderstorm",
        _ => FALLBACK_ICON,
    }
}

/// Short English description, used in the prompt.
pub fn condition_label(code: i32) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 53 | 55 => "drizzle",
        56 | 57 => "freezing drizzle",
        61 => "light rain",
        63 => "rain",
        65 => "heavy rain",
        66 | 67 => "freezing rain",
        71 | 73 => "snow",
        75 => "heavy snow",
        77 => "snow grains",
        80 | 81 => "rain showers",
        82 => "violent rain showers",
        95 => "thunderstorm",
        96 | 99 => "thunderstorm with hail",
        _ => "unknown conditions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_icons() {
        let table = [
            (0, "wi-day-sunny"),
            (1, "wi-day-sunny-overcast"),
            (2, "wi-day-cloudy"),
            (3, "wi-cloudy"),
            (45, "wi-fog"),
            (48, "wi-fog"),
            (51, "wi-showers"),
            (57, "wi-showers"),
            (61, "wi-raindrops"),
            (63, "wi-rain"),
            (65, "wi-rain-wind"),
            (66, "wi-sleet"),
            (71, "wi-snow"),
            (75, "wi-snow-wind"),
            (77, "wi-snowflake-cold"),
            (80, "wi-showers"),
            (81, "wi-rain"),
            (82, "wi-rain-wind"),
            (95, "wi-thunderstorm"),
            (96, "wi-thunderstorm"),
            (99, "wi-thunderstorm"),
        ];
        for (code, icon) in table {
            assert_eq!(icon_for_code(code), icon, "code {code}");
        }
    }

    #[test]
    fn unknown_codes_fall_back() {
        for code in [4, 50, 62, 100, 9999, -1] {
            assert_eq!(icon_for_code(code), FALLBACK_ICON, "code {code}");
            assert_eq!(condition_label(code), "unknown conditions");
        }
    }
}
