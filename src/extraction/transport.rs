//! Keyword override for the mode of transport.
//!
//! Runs after the reducer. The raw message text is scanned case-insensitively
//! and the first matching rule replaces whatever the tagger produced.

/// Keyword rules in priority order.
const MODE_RULES: &[(&[&str], &str)] = &[
    (&["AIRPORT", "AIR"], "Air"),
    (&["OCEAN", "SEA", "CONTAINER"], "Sea"),
    (&["TRUCK", "ROAD"], "Road"),
];

/// Pick the final mode of transport for a message.
pub fn override_mode(raw_text: &str, reduced_mode: &str) -> String {
    let upper = raw_text.to_uppercase();
    MODE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| upper.contains(k)))
        .map(|(_, mode)| (*mode).to_string())
        .unwrap_or_else(|| reduced_mode.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_beats_everything() {
        assert_eq!(override_mode("please air freight this", ""), "Air");
        assert_eq!(override_mode("Airport pickup, then by sea", "Sea"), "Air");
        assert_eq!(override_mode("truck to the AIRPORT", "truck"), "Air");
    }

    #[test]
    fn sea_keywords() {
        assert_eq!(override_mode("Ocean freight quote", ""), "Sea");
        assert_eq!(override_mode("two containers to Hamburg", "road"), "Sea");
        assert_eq!(override_mode("by sea please", ""), "Sea");
    }

    #[test]
    fn road_keywords() {
        assert_eq!(override_mode("Truck load from Lyon", ""), "Road");
        assert_eq!(override_mode("via road", "ocean"), "Road");
    }

    #[test]
    fn substring_matches_count() {
        // "chair" contains "air"; the scan is substring-based, not word-based.
        assert_eq!(override_mode("ship one chair", "ocean"), "Air");
        // "research" contains "sea".
        assert_eq!(override_mode("research samples", ""), "Sea");
    }

    #[test]
    fn no_keyword_keeps_reducer_value() {
        assert_eq!(override_mode("rail to Milan", "rail"), "rail");
        assert_eq!(override_mode("", ""), "");
    }
}
