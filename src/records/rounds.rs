use super::types::ScoreRecord;

/// Progression rank of a round name for chronological display.
///
/// "Round N" ranks as N; quarter, semi and grand finals rank after every
/// numbered round. Unrecognised names rank 0.
pub fn round_order(round_name: &str) -> u32 {
    let lower = round_name.to_lowercase();

    if lower.contains("final") {
        if lower.contains("quarter") {
            return 900;
        }
        if lower.contains("semi") {
            return 950;
        }
        if lower == "final" || lower == "finals" {
            return 1000;
        }
    }

    if let Some(pos) = lower.find("round") {
        let digits: String = lower[pos + "round".len()..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(n) = digits.parse::<u32>() {
            return n;
        }
    }

    0
}

/// Stable sort of records by round progression
pub fn sort_by_round_progression(records: &mut [ScoreRecord]) {
    records.sort_by_key(|r| round_order(&r.round_name));
}
