//! Color palette and styles for the dashboard

use ratatui::prelude::*;

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Score colors relative to the best on screen
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,

    // Move-type bars
    pub bar_best: Color,
    pub bar_average: Color,
    pub bar_fleet: Color,
    pub bar_empty: Color,

    pub row_alt_bg: Color,
    pub header_style: Style,
    pub row_selected: Style,

    pub muted: Color,
    pub title_color: Color,
    pub no_data: Style,

    // Filter bar
    pub filter_focused: Style,
    pub filter_label: Color,
    pub filter_value: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Cards and popups
    pub card_border: Color,
    pub tie_color: Color,
    pub popup_border: Color,
    pub popup_title: Style,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            score_high: Color::Green,
            score_mid: Color::Yellow,
            score_low: Color::Red,
            bar_best: Color::Cyan,
            bar_average: Color::Blue,
            bar_fleet: Color::Magenta,
            bar_empty: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            no_data: Style::new().fg(Color::DarkGray).italic(),
            filter_focused: Style::new().fg(Color::Black).bg(Color::Cyan).bold(),
            filter_label: Color::Gray,
            filter_value: Color::White,
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            card_border: Color::Indexed(240),
            tie_color: Color::Yellow,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
        }
    }

    /// Color for a score by its share of the best score shown
    pub fn score_color(&self, score: f64, max_score: f64) -> Color {
        let percentage = if max_score > 0.0 {
            (score / max_score) * 100.0
        } else {
            0.0
        };

        if percentage >= 85.0 {
            self.score_high
        } else if percentage >= 60.0 {
            self.score_mid
        } else {
            self.score_low
        }
    }
}
