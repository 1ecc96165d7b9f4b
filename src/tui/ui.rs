use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::filter::FilterLevel;
use crate::output::{format_score, truncate_label, NO_DATA};
use crate::stats::{CategoryBest, CategorySeries, Holder, SummaryCard};
use crate::tui::app::{App, InputMode};
use crate::tui::theme::ThemeColors;

const BAR_WIDTH: usize = 8;
const MAX_TIE_LINES: usize = 8;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 12 || area.width < 60 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1),                  // Title bar
        Constraint::Length(3),                  // Filter bar
        Constraint::Length(card_height(app)),   // Summary cards
        Constraint::Fill(1),                    // Move-type table
        Constraint::Length(1),                  // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_filter_bar(frame, chunks[1], app);

    if !app.state.is_loaded() {
        if let Some(err) = app.state.error() {
            render_error_panel(frame, chunks[2].union(chunks[3]), &err.message, &app.colors);
        }
    } else {
        render_cards(frame, chunks[2], app);
        render_move_table(frame, chunks[3], app);
    }
    render_status_bar(frame, chunks[4], app);

    if app.input_mode == InputMode::Help {
        render_help_popup(frame, &app.colors);
    }

    // Full overlay only for the first load; refreshes show a spinner in the title
    if app.is_loading() && !app.state.is_loaded() && app.state.error().is_none() {
        render_loading_overlay(frame, app);
    }
}

fn spinner(frame: usize) -> &'static str {
    const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    SPINNER[frame % SPINNER.len()]
}

fn card_height(app: &App) -> u16 {
    let ties = if app.show_ties {
        app.state
            .summary()
            .cards
            .iter()
            .filter_map(|c| c.best.as_ref())
            .filter(|b| b.has_multiple_tied())
            .map(|b| b.tied_count().min(MAX_TIE_LINES))
            .max()
            .unwrap_or(0)
    } else {
        0
    };
    // Border (2) + score, holder, detail, average
    6 + ties as u16
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let mut subject = app.subject.describe();
    if let Some(athlete) = app.state.athlete().filter(|a| !a.name.is_empty()) {
        subject = match athlete.overall_position {
            Some(pos) => format!("{}  {} (#{})", subject, athlete.name, pos),
            None => format!("{}  {}", subject, athlete.name),
        };
    }

    let mut spans = vec![
        Span::styled("heatsheet", Style::default().fg(colors.title_color).bold()),
        Span::raw("  "),
        Span::raw(subject),
    ];
    if app.is_loading() && app.state.is_loaded() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} refreshing", spinner(app.spinner_frame)),
            Style::default().fg(colors.muted),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_filter_bar(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let tuple = app.state.tuple();
    let mut spans = Vec::new();

    for (i, level) in FilterLevel::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  >  ", Style::default().fg(colors.muted)));
        }
        let value = tuple.get(*level);
        let value = if value.is_empty() { "All" } else { value };
        let choices = app.options_for(*level).len().saturating_sub(1);

        spans.push(Span::styled(
            format!("{}: ", level.label()),
            Style::default().fg(colors.filter_label),
        ));
        let value_style = if *level == app.focus {
            colors.filter_focused
        } else {
            Style::default().fg(colors.filter_value)
        };
        spans.push(Span::styled(format!(" {} ", value), value_style));
        spans.push(Span::styled(format!(" ({})", choices), Style::default().fg(colors.muted)));
    }

    if let Some(key) = app.state.key().filter(|k| k.is_athlete()) {
        let scope = if key.server_filters.is_unconstrained() {
            "fleet: all heats"
        } else {
            "fleet: filtered"
        };
        spans.push(Span::styled(format!("    {}", scope), Style::default().fg(colors.muted)));
    }

    let block = Block::bordered()
        .title(" Filters ")
        .border_style(Style::default().fg(colors.card_border));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_cards(frame: &mut Frame, area: Rect, app: &App) {
    let summary = app.state.summary();
    let columns = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let max_score = summary
        .cards
        .iter()
        .filter_map(|c| c.best.as_ref().map(|b| b.score()))
        .fold(0.0_f64, f64::max);

    for (card, column) in summary.cards.iter().zip(columns.iter()) {
        render_card(frame, *column, card, max_score, app.show_ties, &app.colors);
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &SummaryCard, max_score: f64, show_ties: bool, colors: &ThemeColors) {
    let block = Block::bordered()
        .title(format!(" Best {} ", card.kind))
        .border_style(Style::default().fg(colors.card_border));
    let width = block.inner(area).width as usize;

    let mut lines = Vec::new();
    match &card.best {
        None => {
            lines.push(Line::from(Span::styled(NO_DATA, colors.no_data)));
        }
        Some(best) => {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:.2}", best.score()),
                    Style::default().fg(colors.score_color(best.score(), max_score)).bold(),
                ),
                Span::styled(" pts", Style::default().fg(colors.muted)),
            ]));

            if best.has_multiple_tied() {
                lines.push(Line::from(Span::styled(
                    format!("Multiple ({} tied)", best.tied_count()),
                    Style::default().fg(colors.tie_color),
                )));
            } else {
                lines.push(Line::from(truncate_label(&best.holder().describe(), width)));
            }

            if let CategoryBest::Jump(jump) = best {
                if !best.has_multiple_tied() {
                    lines.push(Line::from(Span::styled(
                        jump.move_type.clone(),
                        Style::default().fg(colors.title_color),
                    )));
                }
            }
        }
    }

    while lines.len() < 3 {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::styled("avg ", Style::default().fg(colors.muted)),
        average_span(card.average, colors),
    ]));

    if let (true, Some(best)) = (show_ties, card.best.as_ref()) {
        if best.has_multiple_tied() {
            let ties = best.tied_lines();
            let hidden = ties.len().saturating_sub(MAX_TIE_LINES);
            let shown = if hidden > 0 { MAX_TIE_LINES - 1 } else { ties.len() };
            for tie in ties.iter().take(shown) {
                lines.push(Line::from(Span::styled(
                    truncate_label(&format!("- {}", tie), width),
                    Style::default().fg(colors.tie_color),
                )));
            }
            if hidden > 0 {
                lines.push(Line::from(Span::styled(
                    format!("  and {} more", ties.len() - shown),
                    Style::default().fg(colors.muted),
                )));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn average_span(average: Option<f64>, colors: &ThemeColors) -> Span<'static> {
    match average {
        Some(_) => Span::raw(format_score(average)),
        None => Span::styled(NO_DATA, colors.no_data),
    }
}

fn render_move_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let colors = app.colors.clone();
    let series = &app.state.summary().series;

    if series.is_empty() {
        let msg = Paragraph::new("No move types in this selection")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.muted))
            .block(Block::default());
        frame.render_widget(msg, area);
        return;
    }

    // One scale for every bar so best, average and fleet compare directly
    let max_value = series
        .iter()
        .flat_map(|s| [s.best, s.average, s.fleet_average])
        .flatten()
        .fold(0.0_f64, f64::max);

    let rows: Vec<Row> = series
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let row_style = if idx % 2 == 1 {
                Style::default().bg(colors.row_alt_bg)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(truncate_label(&s.move_type, 24)),
                Cell::from(value_with_bar(s.best, max_value, colors.bar_best, &colors)),
                Cell::from(value_with_bar(s.average, max_value, colors.bar_average, &colors)),
                Cell::from(value_with_bar(s.fleet_average, max_value, colors.bar_fleet, &colors)),
                Cell::from(best_by(s)),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Length(24),  // Move type
        Constraint::Length(16),  // "  6.83 ████░░░░"
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Fill(1),     // Best by
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Move type", "Best", "Average", "Fleet avg", "Best by"])
                .style(colors.header_style)
                .bottom_margin(1),
        )
        .row_highlight_style(colors.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn best_by(series: &CategorySeries) -> String {
    series.best_by.as_ref().map(Holder::describe).unwrap_or_default()
}

fn value_with_bar(value: Option<f64>, max_value: f64, bar_color: Color, colors: &ThemeColors) -> Line<'static> {
    let Some(v) = value else {
        return Line::from(Span::styled(format!("{:>7}", NO_DATA), colors.no_data));
    };

    let mut spans = vec![Span::raw(format!("{:>6.2} ", v))];
    spans.extend(score_bar(v, max_value, BAR_WIDTH, bar_color, colors.bar_empty).spans);
    Line::from(spans)
}

fn score_bar(score: f64, max_score: f64, width: usize, filled_color: Color, empty_color: Color) -> Line<'static> {
    let ratio = if max_score > 0.0 {
        (score / max_score).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(filled_color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(empty_color)));
    }

    Line::from(spans)
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let colors = &app.colors;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Error") {
            colors.flash_error
        } else {
            colors.flash_success
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let count = format!(
            "{}/{} records",
            app.state.filtered().len(),
            app.state.records().len()
        );

        let refresh_time = match app.last_refresh {
            Some(at) if at.elapsed().as_secs() < 60 => format!("refreshed {}s ago", at.elapsed().as_secs()),
            Some(at) => format!("refreshed {}m ago", at.elapsed().as_secs() / 60),
            None => "not loaded".to_string(),
        };

        let hints = [
            ("Tab", ":level "),
            ("j/k", ":option "),
            ("c", ":clear "),
            ("t", ":ties "),
            ("d", ":division "),
            ("[/]", ":athlete "),
            ("r", ":refresh "),
            ("?", ":help "),
            ("q", ":quit"),
        ];

        let mut spans = vec![
            Span::styled(count, Style::default().fg(colors.muted)),
            Span::raw(" "),
            Span::styled(refresh_time, Style::default().fg(colors.muted)),
            Span::raw("  "),
        ];
        if let Some(err) = app.state.error() {
            spans.push(Span::styled(format!("{}  ", err.message), Style::default().fg(colors.flash_error)));
        }
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(colors.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(colors.status_bar_bg)),
        area,
    );
}

fn render_error_panel(frame: &mut Frame, area: Rect, message: &str, colors: &ThemeColors) {
    let block = Block::bordered()
        .title(" No data available ")
        .border_style(Style::default().fg(colors.flash_error));
    let text = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(colors.flash_error))),
        Line::from(""),
        Line::from(Span::styled("Press r to retry", Style::default().fg(colors.muted))),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn render_help_popup(frame: &mut Frame, colors: &ThemeColors) {
    let popup_area = centered_rect_fixed(54, 17, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(" Keyboard Shortcuts ")
        .title_style(colors.popup_title)
        .border_style(Style::default().fg(colors.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let entries = [
        ("Tab / Right", "Next filter level"),
        ("S-Tab / Left", "Previous filter level"),
        ("j / Down", "Next option for the level"),
        ("k / Up", "Previous option for the level"),
        ("c", "Clear all filters"),
        ("t", "Show/hide tied scores"),
        ("n / p", "Select move type row"),
        ("d", "Toggle division"),
        ("] / [", "Next/previous athlete"),
        ("e", "Back to event view"),
        ("r", "Refresh"),
        ("?", "Show/hide this help"),
        ("q / Ctrl-c", "Quit"),
    ];

    let mut help_lines: Vec<Line> = entries
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:<14}", key), Style::default().fg(colors.status_key_color).bold()),
                Span::raw(*action),
            ])
        })
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(colors.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(34, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let text = format!("{} Loading {}...", spinner(app.spinner_frame), app.subject.describe());
    let loading_text = Paragraph::new(truncate_label(&text, inner.width as usize))
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.colors.title_color));

    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar_widths() {
        let bar = score_bar(5.0, 10.0, 8, Color::Cyan, Color::DarkGray);
        let text: String = bar.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "████░░░░");

        let empty = score_bar(0.0, 0.0, 8, Color::Cyan, Color::DarkGray);
        let text: String = empty.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "░░░░░░░░");
    }

    #[test]
    fn test_value_with_bar_no_data() {
        let colors = ThemeColors::dark();
        let line = value_with_bar(None, 10.0, colors.bar_best, &colors);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "no data");
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(40, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 20, 4));
    }
}
