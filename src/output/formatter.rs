use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::filter::{FilterOptionIndex, FilterTuple};
use crate::records::{sort_by_round_progression, ScoreKind, ScoreRecord};
use crate::source::{ComparisonStat, EventSummary, HeadToHead, HeadToHeadAthlete, Side};
use crate::stats::{CategorySeries, Holder, Summary, SummaryCard};

pub const NO_DATA: &str = "no data";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Two decimals, or "no data". Rounding happens here and nowhere earlier.
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => NO_DATA.to_string(),
    }
}

/// TSV variant: empty field for missing values
fn tsv_score(score: Option<f64>) -> String {
    score.map(|s| format!("{:.2}", s)).unwrap_or_default()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate to fit available width, accounting for Unicode
pub fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Holder text for a card: the holder, or "Multiple (n tied)"
fn card_holder(card: &SummaryCard) -> String {
    match &card.best {
        Some(best) if best.has_multiple_tied() => format!("Multiple ({} tied)", best.tied_count()),
        Some(best) => best.holder().describe(),
        None => String::new(),
    }
}

/// Format summary cards, one block per kind
///
/// ```text
/// Best Heat    7.00  Multiple (2 tied)
///                      A (Round 1, Heat 3)
///                      B (Round 1, Heat 3)
///   average    6.83
/// ```
pub fn format_summary(summary: &Summary, show_ties: bool, use_colors: bool) -> String {
    let mut lines = Vec::new();

    for card in &summary.cards {
        let label = format!("Best {:<6}", card.kind.label());
        let best = format!("{:>7}", format_score(card.best.as_ref().map(|b| b.score())));
        let holder = card_holder(card);

        if use_colors {
            let best = if card.best.is_some() {
                best.bold().to_string()
            } else {
                best.dimmed().to_string()
            };
            lines.push(format!("{} {}  {}", label.cyan(), best, holder));
        } else {
            lines.push(format!("{} {}  {}", label, best, holder));
        }

        if let (true, Some(best)) = (show_ties, card.best.as_ref()) {
            if best.has_multiple_tied() {
                for tie in best.tied_lines() {
                    lines.push(format!("{:21}{}", "", tie));
                }
            }
        }

        lines.push(format!("{:>10}   {:>7}", "average", format_score(card.average)));
    }

    lines.join("\n")
}

/// Format the move-type table: best, average, fleet average, best by
pub fn format_move_types(series: &[CategorySeries], use_colors: bool) -> String {
    if series.is_empty() {
        return "No move types recorded.".to_string();
    }

    let name_width = series
        .iter()
        .map(|s| s.move_type.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(9, 24);

    let header = format!(
        "{:<name_width$}  {:>7}  {:>7}  {:>7}  {}",
        "Move type", "Best", "Average", "Fleet", "Best by",
        name_width = name_width
    );

    let fixed_width = name_width + 3 * 9 + 2;
    let holder_width = get_terminal_width()
        .filter(|w| *w > fixed_width + 10)
        .map(|w| w - fixed_width);

    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for s in series {
        let best_by = s.best_by.as_ref().map(Holder::describe).unwrap_or_default();
        let best_by = match holder_width {
            Some(width) => truncate_label(&best_by, width),
            None => best_by,
        };
        lines.push(format!(
            "{:<name_width$}  {:>7}  {:>7}  {:>7}  {}",
            truncate_label(&s.move_type, name_width),
            format_score(s.best),
            format_score(s.average),
            format_score(s.fleet_average),
            best_by,
            name_width = name_width
        ));
    }

    lines.join("\n")
}

/// Format the summary as tab-separated values for scripting
/// Card rows: kind, best, average, valid count, tied count, holder
/// Move rows: "move", move type, best, average, fleet average
/// Missing values are empty fields (no headers, no colors)
pub fn format_tsv(summary: &Summary) -> String {
    let cards = summary.cards.iter().map(|card| {
        let holder = card
            .best
            .as_ref()
            .map(|b| b.holder().describe())
            .unwrap_or_default();
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            card.kind.label().to_lowercase(),
            tsv_score(card.best.as_ref().map(|b| b.score())),
            tsv_score(card.average),
            card.valid_count,
            card.best.as_ref().map(|b| b.tied_count()).unwrap_or(0),
            holder
        )
    });

    let moves = summary.series.iter().map(|s| {
        format!(
            "move\t{}\t{}\t{}\t{}",
            s.move_type,
            tsv_score(s.best),
            tsv_score(s.average),
            tsv_score(s.fleet_average)
        )
    });

    cards.chain(moves).collect::<Vec<_>>().join("\n")
}

/// Heat scores in round-progression order
pub fn format_heat_scores(records: &[ScoreRecord], use_colors: bool) -> String {
    let mut heats: Vec<ScoreRecord> = records
        .iter()
        .filter(|r| r.kind == ScoreKind::Heat)
        .cloned()
        .collect();
    if heats.is_empty() {
        return "No heat scores.".to_string();
    }
    sort_by_round_progression(&mut heats);

    heats
        .iter()
        .map(|r| {
            let score = format!("{:>7}", format_score(r.valid_score()));
            let place = format!("{:<16} Heat {:<5} {}", r.round_name, r.heat_number, r.elimination_str());
            if use_colors {
                format!("{}  {}", score.bold(), place.trim_end())
            } else {
                format!("{}  {}", score, place.trim_end())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cascading options as a tree, marking the active selection with '*'
///
/// ```text
/// Single
///   Round 1: 1, 2, 3
/// ```
pub fn format_options_tree(index: &FilterOptionIndex, tuple: &FilterTuple) -> String {
    if index.is_empty() {
        return "No filter options (no records).".to_string();
    }

    let mark = |selected: bool| if selected { "*" } else { "" };
    let mut lines = Vec::new();

    let mut branches: Vec<&str> = index.elimination_types().iter().map(String::as_str).collect();
    if branches.is_empty() {
        // Records without elimination types still have rounds
        branches.push("");
    }

    for elimination in branches {
        let header = if elimination.is_empty() { "(any)" } else { elimination };
        lines.push(format!("{}{}", header, mark(!elimination.is_empty() && elimination == tuple.elimination)));

        for round in index.rounds_for(elimination) {
            let heats = index
                .heats_for(round)
                .iter()
                .map(|h| format!("{}{}", h, mark(*h == tuple.heat && *round == tuple.round)))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("  {}{}: {}", round, mark(*round == tuple.round), heats));
        }
    }

    lines.join("\n")
}

/// Event calendar: id, name, date, stars
pub fn format_events(events: &[EventSummary], use_colors: bool) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }

    let name_width = events
        .iter()
        .map(|e| e.event_name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(5, 40);

    let header = format!("{:>6}  {:<name_width$}  {}", "ID", "Event", "Date", name_width = name_width);
    let mut lines = vec![if use_colors { header.bold().to_string() } else { header }];

    for event in events {
        let stars = event.stars.map(|n| "*".repeat(n as usize)).unwrap_or_default();
        let line = format!(
            "{:>6}  {:<name_width$}  {:<18} {}",
            event.id,
            truncate_label(&event.event_name, name_width),
            event.date(),
            stars,
            name_width = name_width
        );
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Event rows as id, name, date, stars
pub fn format_events_tsv(events: &[EventSummary]) -> String {
    events
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}\t{}",
                e.id,
                e.event_name,
                e.date(),
                e.stars.map(|n| n.to_string()).unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// "Jane (ESP, 1st)"
fn h2h_name(athlete: &HeadToHeadAthlete) -> String {
    let details: Vec<String> = athlete
        .nationality
        .iter()
        .filter(|n| !n.is_empty())
        .cloned()
        .chain(athlete.place.map(ordinal))
        .collect();
    if details.is_empty() {
        athlete.name.clone()
    } else {
        format!("{} ({})", athlete.name, details.join(", "))
    }
}

/// Counts render as integers, scores with two decimals
fn h2h_value(value: Option<f64>, is_count: bool) -> String {
    match value {
        Some(v) if is_count => format!("{:.0}", v),
        other => format_score(other),
    }
}

fn h2h_verdict(stat: &ComparisonStat, h2h: &HeadToHead, is_count: bool) -> String {
    let leader = match stat.leader() {
        Some(Side::Athlete1) => &h2h.athlete1.name,
        Some(Side::Athlete2) => &h2h.athlete2.name,
        Some(Side::Tie) => return "tie".to_string(),
        None => return String::new(),
    };
    match stat.margin().filter(|m| *m > 0.0) {
        Some(m) if is_count => format!("{} +{:.0}", leader, m),
        Some(m) => format!("{} +{:.2}", leader, m),
        None => leader.clone(),
    }
}

/// Side-by-side comparison of two athletes at one event
///
/// ```text
/// Jane (ESP, 1st)  vs  Kim (3rd)
///
///                     Jane        Kim
/// Heat wins              3          1  Jane +2
/// Best heat          15.30      16.00  Kim +0.70
/// ```
pub fn format_head_to_head(h2h: &HeadToHead, use_colors: bool) -> String {
    let title = format!("{}  vs  {}", h2h_name(&h2h.athlete1), h2h_name(&h2h.athlete2));
    let mut lines = vec![if use_colors { title.bold().to_string() } else { title }, String::new()];

    lines.push(format!(
        "{:<14} {:>10} {:>10}",
        "",
        truncate_label(&h2h.athlete1.name, 10),
        truncate_label(&h2h.athlete2.name, 10)
    ));

    for (i, (label, stat)) in h2h.comparison.rows().into_iter().enumerate() {
        let is_count = i == 0;
        let verdict = h2h_verdict(stat, h2h, is_count);
        let row = format!(
            "{:<14} {:>10} {:>10}  {}",
            label,
            h2h_value(stat.athlete1_value, is_count),
            h2h_value(stat.athlete2_value, is_count),
            verdict
        );
        let row = row.trim_end().to_string();
        if use_colors && stat.leader().is_none() {
            lines.push(row.dimmed().to_string());
        } else {
            lines.push(row);
        }
    }

    lines.join("\n")
}

/// Comparison rows as metric, athlete 1 value, athlete 2 value, winner, margin
pub fn format_head_to_head_tsv(h2h: &HeadToHead) -> String {
    h2h.comparison
        .rows()
        .into_iter()
        .map(|(label, stat)| {
            let winner = match stat.leader() {
                Some(Side::Athlete1) => "athlete1",
                Some(Side::Athlete2) => "athlete2",
                Some(Side::Tie) => "tie",
                None => "",
            };
            format!(
                "{}\t{}\t{}\t{}\t{}",
                label.to_lowercase().replace(' ', "_"),
                tsv_score(stat.athlete1_value),
                tsv_score(stat.athlete2_value),
                winner,
                tsv_score(stat.margin())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::EliminationType;
    use crate::stats::{aggregate, project, FleetBaselines, ProjectionMode};

    fn record(athlete: &str, score: Option<f64>, round: &str, heat: &str) -> ScoreRecord {
        ScoreRecord {
            kind: ScoreKind::Heat,
            athlete_id: athlete.to_string(),
            athlete_name: athlete.to_string(),
            score,
            round_name: round.to_string(),
            heat_number: heat.to_string(),
            elimination: Some(EliminationType::Single),
            category: None,
            counting: true,
        }
    }

    fn scenario() -> Vec<ScoreRecord> {
        vec![
            record("A", Some(7.0), "Round 1", "3"),
            record("B", Some(7.0), "Round 1", "3"),
            record("C", Some(6.5), "Round 1", "3"),
        ]
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(6.833333)), "6.83");
        assert_eq!(format_score(Some(0.0)), "0.00");
        assert_eq!(format_score(None), "no data");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("Forward Loop", 20), "Forward Loop");
        assert_eq!(truncate_label("Double Forward Loop", 10), "Double ...");
        assert_eq!(truncate_label("Backloop", 3), "Bac");
    }

    #[test]
    fn test_format_summary_with_ties() {
        let summary = project(&aggregate(&scenario()), ProjectionMode::Event);
        let out = format_summary(&summary, true, false);

        assert!(out.contains("Best Heat      7.00  Multiple (2 tied)"));
        assert!(out.contains("A (Round 1, Heat 3)"));
        assert!(out.contains("B (Round 1, Heat 3)"));
        assert!(out.contains("6.83"));
        assert!(out.contains("Best Jump   no data"));
        assert!(!out.contains("0.00"));
    }

    #[test]
    fn test_format_summary_hides_ties() {
        let summary = project(&aggregate(&scenario()), ProjectionMode::Event);
        let out = format_summary(&summary, false, false);
        assert!(!out.contains("B (Round 1, Heat 3)"));
    }

    #[test]
    fn test_format_tsv_empty_fields() {
        let summary = project(&aggregate(&scenario()), ProjectionMode::Event);
        let tsv = format_tsv(&summary);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "heat\t7.00\t6.83\t3\t2\tA (Round 1, Heat 3)");
        assert_eq!(lines[1], "jump\t\t\t0\t0\t");
    }

    #[test]
    fn test_format_move_types_no_data() {
        let mut baselines = FleetBaselines::new();
        baselines.insert("Backloop", 5.5);
        let summary = project(&aggregate(&[]), ProjectionMode::Athlete).with_fleet_baselines(&baselines);
        let out = format_move_types(&summary.series, false);
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("Backloop"));
        assert!(row.contains("no data"));
        assert!(row.contains("5.50"));
    }

    #[test]
    fn test_format_heat_scores_progression() {
        let records = vec![
            record("A", Some(9.0), "Final", "1"),
            record("A", None, "Round 2", "7"),
            record("A", Some(5.0), "Round 1", "3"),
        ];
        let out = format_heat_scores(&records, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Round 1") && lines[0].contains("5.00"));
        assert!(lines[1].contains("Round 2") && lines[1].contains("no data"));
        assert!(lines[2].contains("Final") && lines[2].ends_with("Single"));
    }

    #[test]
    fn test_format_options_tree() {
        let records = vec![
            record("A", Some(1.0), "Round 1", "3"),
            record("A", Some(1.0), "Round 1", "4"),
            record("A", Some(1.0), "Round 2", "7"),
        ];
        let index = FilterOptionIndex::build(&records);
        let tuple = FilterTuple::new("Single", "Round 1", "4");
        let out = format_options_tree(&index, &tuple);
        assert_eq!(out, "Single*\n  Round 1*: 3, 4*\n  Round 2: 7");
    }

    fn stat(a: Option<f64>, b: Option<f64>, winner: Option<Side>) -> ComparisonStat {
        ComparisonStat {
            athlete1_value: a,
            athlete2_value: b,
            winner,
            difference: None,
        }
    }

    fn head_to_head() -> HeadToHead {
        let mut h2h = HeadToHead::default();
        h2h.athlete1 = HeadToHeadAthlete {
            athlete_id: "10".to_string(),
            name: "Jane".to_string(),
            nationality: Some("ESP".to_string()),
            place: Some(1),
        };
        h2h.athlete2 = HeadToHeadAthlete {
            athlete_id: "20".to_string(),
            name: "Kim".to_string(),
            nationality: None,
            place: Some(3),
        };
        h2h.comparison.heat_wins = stat(Some(3.0), Some(1.0), Some(Side::Athlete1));
        h2h.comparison.heat_scores_best = stat(Some(15.3), Some(16.0), None);
        h2h.comparison.jumps_best = stat(Some(6.5), Some(6.5), Some(Side::Tie));
        h2h
    }

    #[test]
    fn test_format_head_to_head() {
        let out = format_head_to_head(&head_to_head(), false);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Jane (ESP, 1st)  vs  Kim (3rd)");
        assert!(lines[3].starts_with("Heat wins"));
        assert!(lines[3].contains("  3 "));
        assert!(lines[3].ends_with("Jane +2"));
        assert!(lines[4].ends_with("Kim +0.70"));
        assert!(lines[6].ends_with("tie"));
        // No values on either side: no verdict, never 0.00
        assert!(lines[9].contains(NO_DATA));
        assert!(!out.contains("0.00"));
    }

    #[test]
    fn test_format_head_to_head_tsv() {
        let out = format_head_to_head_tsv(&head_to_head());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "heat_wins\t3.00\t1.00\tathlete1\t2.00");
        assert_eq!(lines[1], "best_heat\t15.30\t16.00\tathlete2\t0.70");
        assert_eq!(lines[6], "average_wave\t\t\t\t");
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(23), "23rd");
    }

    #[test]
    fn test_format_events() {
        let events = vec![
            EventSummary {
                id: "412".to_string(),
                event_name: "Chile World Cup".to_string(),
                event_date: Some("Apr 1 - 9, 2025".to_string()),
                stars: Some(5),
                ..EventSummary::default()
            },
            EventSummary {
                id: "7".to_string(),
                event_name: "Sylt".to_string(),
                ..EventSummary::default()
            },
        ];
        let out = format_events(&events, false);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[0].contains("ID") && lines[0].contains("Event"));
        assert!(lines[1].starts_with("   412  Chile World Cup"));
        assert!(lines[1].ends_with("*****"));
        assert_eq!(lines[2].trim_end(), "     7  Sylt");
        assert_eq!(format_events_tsv(&events), "412\tChile World Cup\tApr 1 - 9, 2025\t5\n7\tSylt\t\t");
        assert_eq!(format_events(&[], false), "No events found.");
    }
}
