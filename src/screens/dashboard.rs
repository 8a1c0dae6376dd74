/// Main dashboard screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use crate::core::{DashboardSnapshot, HistoryBuffer};
use crate::utils::{
    format_card_value, format_metric_value, truncate_string, HISTORY_CAPACITY, SUMMARY_CARDS,
    TREND_SERIES,
};

const SERIES_COLORS: &[Color] = &[Color::Magenta, Color::Green, Color::Yellow];

pub struct Dashboard {
    title: String,
    endpoint: String,
    snapshot: DashboardSnapshot,
}

impl Dashboard {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            title: "Monitoring Dashboard".to_string(),
            endpoint: endpoint.into(),
            snapshot: DashboardSnapshot::default(),
        }
    }

    pub fn update_snapshot(&mut self, snapshot: DashboardSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn render(&self, frame: &mut Frame, status_message: Option<&str>, show_help: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title + poll status
                Constraint::Length(5), // Summary cards
                Constraint::Min(8),    // Trend chart
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        frame.render_widget(self.render_header(), chunks[0]);
        self.render_cards(frame, chunks[1]);
        self.render_trend(frame, chunks[2]);

        let footer_text = match status_message {
            Some(status) => status.to_string(),
            None => "[?] Help | [q]uit".to_string(),
        };
        let footer = Paragraph::new(footer_text)
            .alignment(Alignment::Center)
            .style(if status_message.is_some() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);

        if show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self) -> Paragraph<'_> {
        let stats = &self.snapshot.stats;

        let title_line = Line::from(vec![
            Span::styled(
                &self.title,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(&self.endpoint, Style::default().fg(Color::DarkGray)),
        ]);

        let last_update = stats
            .last_success_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "waiting...".to_string());

        let mut status_spans = vec![
            Span::styled("Polls: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", stats.ticks), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled("OK: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", stats.successes), Style::default().fg(Color::Green)),
            Span::raw(" | "),
            Span::styled("Failed: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", stats.failures), Style::default().fg(Color::Red)),
            Span::raw(" | "),
            Span::styled("Last update: ", Style::default().fg(Color::Gray)),
            Span::styled(last_update, Style::default().fg(Color::White)),
        ];

        if let Some(status) = stats.last_status.filter(|s| !(200..300).contains(s)) {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                format!("HTTP {}", status),
                Style::default().fg(Color::Yellow),
            ));
        }

        if let Some(ref error) = stats.last_error {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                truncate_string(error, 60),
                Style::default().fg(Color::Red),
            ));
        }

        Paragraph::new(vec![title_line, Line::from(status_spans)])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }

    fn render_cards(&self, frame: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = SUMMARY_CARDS
            .iter()
            .map(|_| Constraint::Ratio(1, SUMMARY_CARDS.len() as u32))
            .collect();

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (card, column) in SUMMARY_CARDS.iter().zip(columns.iter()) {
            let value = format_card_value(card, &self.snapshot.latest);

            let widget = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    value,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(card.label)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );

            frame.render_widget(widget, *column);
        }
    }

    fn render_trend(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Live Metrics Trend (Last {} polls)", HISTORY_CAPACITY));

        let history = &self.snapshot.history;
        if history.is_empty() {
            let waiting = Paragraph::new("Waiting for first sample...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(waiting, area);
            return;
        }

        let points: Vec<Vec<(f64, f64)>> = TREND_SERIES
            .iter()
            .map(|series| history.series(series.metric))
            .collect();

        let datasets: Vec<Dataset> = TREND_SERIES
            .iter()
            .zip(points.iter())
            .zip(SERIES_COLORS.iter().cycle())
            .map(|((series, data), color)| {
                Dataset::default()
                    .name(series.name)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(*color))
                    .data(data)
            })
            .collect();

        let metrics: Vec<&str> = TREND_SERIES.iter().map(|s| s.metric).collect();
        let y_max = y_axis_max(history, &metrics);

        let chart = Chart::new(datasets)
            .block(block)
            .hidden_legend_constraints((Constraint::Ratio(1, 3), Constraint::Ratio(1, 2)))
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, (HISTORY_CAPACITY - 1) as f64])
                    .labels(time_labels(history)),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, y_max])
                    .labels(vec![
                        Span::raw("0"),
                        Span::raw(format_metric_value((y_max / 2.0).round())),
                        Span::raw(format_metric_value(y_max.round())),
                    ]),
            );

        frame.render_widget(chart, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = frame.size();
        let popup_width = area.width.min(60);
        let popup_height = area.height.min(14);
        let popup_area = Rect {
            x: area.width.saturating_sub(popup_width) / 2,
            y: area.height.saturating_sub(popup_height) / 2,
            width: popup_width,
            height: popup_height,
        };

        let help_text = vec![
            Line::from(Span::styled(
                "Monitoring Dashboard - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("  [?] / [F1]     Toggle this help screen"),
            Line::from("  [q] / [Esc]    Quit"),
            Line::from(""),
            Line::from(Span::styled("Polling:", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
            Line::from("  Metrics are fetched on start and every 10 seconds."),
            Line::from(format!("  The chart keeps the last {} samples.", HISTORY_CAPACITY)),
            Line::from("  Failed polls keep the previous values on screen."),
        ];

        let help = Paragraph::new(help_text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Help"));

        frame.render_widget(Clear, popup_area);
        frame.render_widget(help, popup_area);
    }
}

/// Upper bound for the y axis with some headroom; never zero
fn y_axis_max(history: &HistoryBuffer, metrics: &[&str]) -> f64 {
    let max = history.max_value(metrics);
    if max <= 0.0 {
        1.0
    } else {
        (max * 1.1).ceil()
    }
}

/// Oldest and newest capture times for the x axis
fn time_labels(history: &HistoryBuffer) -> Vec<Span<'static>> {
    match (history.oldest(), history.latest()) {
        (Some(oldest), Some(latest)) if history.len() > 1 => {
            vec![Span::raw(oldest.time.clone()), Span::raw(latest.time.clone())]
        }
        (_, Some(latest)) => vec![Span::raw(latest.time.clone())],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HistoryEntry, MetricSample};
    use crate::utils::{CPU_USAGE, LATENCY_MS, MEMORY_USAGE_MB, REQUEST_COUNT};
    use chrono::Local;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn draw(dashboard: &Dashboard, status: Option<&str>, help: bool) -> String {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| dashboard.render(f, status, help)).unwrap();
        buffer_text(&terminal)
    }

    fn snapshot_with(samples: &[f64]) -> DashboardSnapshot {
        let mut snapshot = DashboardSnapshot::default();
        for cpu in samples {
            let sample = MetricSample::new()
                .with(CPU_USAGE, *cpu)
                .with(LATENCY_MS, 120.0)
                .with(MEMORY_USAGE_MB, 2048.0)
                .with(REQUEST_COUNT, 9.0);
            snapshot.history.push(HistoryEntry::new(sample.clone(), Local::now()));
            snapshot.latest = sample;
            snapshot.stats.ticks += 1;
            snapshot.stats.successes += 1;
        }
        snapshot
    }

    #[test]
    fn test_empty_dashboard_shows_zero_cards() {
        let dashboard = Dashboard::new("http://localhost:5000/metrics");
        let text = draw(&dashboard, None, false);

        assert!(text.contains("CPU Usage"));
        assert!(text.contains("Request Count"));
        assert!(text.contains("0 %"));
        assert!(text.contains("0 ms"));
        assert!(text.contains("Waiting for first sample"));
        assert!(text.contains("waiting..."));
    }

    #[test]
    fn test_cards_show_latest_sample() {
        let mut dashboard = Dashboard::new("http://localhost:5000/metrics");
        dashboard.update_snapshot(snapshot_with(&[10.0, 20.0, 30.0]));
        let text = draw(&dashboard, None, false);

        assert!(text.contains("30 %"));
        assert!(text.contains("120 ms"));
        assert!(text.contains("2048 MB"));
        assert!(text.contains("Live Metrics Trend (Last 20 polls)"));
        assert!(text.contains("CPU (%)"));
        assert!(!text.contains("Waiting for first sample"));
    }

    #[test]
    fn test_last_error_in_header() {
        let mut snapshot = snapshot_with(&[5.0]);
        snapshot.stats.failures = 1;
        snapshot.stats.last_error = Some("request failed: connection refused".to_string());

        let mut dashboard = Dashboard::new("http://localhost:5000/metrics");
        dashboard.update_snapshot(snapshot);
        let text = draw(&dashboard, None, false);

        assert!(text.contains("connection refused"));
        assert!(text.contains("Failed: 1"));
    }

    #[test]
    fn test_status_message_and_help_overlay() {
        let dashboard = Dashboard::new("http://localhost:5000/metrics");
        let text = draw(&dashboard, Some("Stopping..."), true);

        assert!(text.contains("Stopping..."));
        assert!(text.contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_y_axis_max_has_headroom() {
        let snapshot = snapshot_with(&[50.0]);
        let metrics = [CPU_USAGE, LATENCY_MS];
        let max = y_axis_max(&snapshot.history, &metrics);
        assert!(max > 120.0 && max <= 133.0, "unexpected bound {}", max);
        assert_eq!(y_axis_max(&HistoryBuffer::new(), &metrics), 1.0);
    }
}
