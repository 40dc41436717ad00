//! Industry percentile band for a carbon intensity.

/// (maximum kg CO2-e/m², label), lowest intensity first
pub const PERCENTILE_BANDS: [(f64, &str); 4] = [
    (250.0, "Top 10%"),
    (400.0, "Top 25%"),
    (550.0, "Top 50%"),
    (750.0, "Bottom 50%"),
];

pub const LOWEST_BAND: &str = "Bottom 25%";

pub fn industry_percentile(intensity: f64) -> &'static str {
    PERCENTILE_BANDS
        .iter()
        .find(|(max, _)| intensity <= *max)
        .map(|(_, label)| *label)
        .unwrap_or(LOWEST_BAND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(industry_percentile(0.0), "Top 10%");
        assert_eq!(industry_percentile(250.0), "Top 10%");
        assert_eq!(industry_percentile(251.0), "Top 25%");
        assert_eq!(industry_percentile(550.0), "Top 50%");
        assert_eq!(industry_percentile(750.0), "Bottom 50%");
        assert_eq!(industry_percentile(750.5), LOWEST_BAND);
    }
}
