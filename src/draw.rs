use log::error;
use serde_json::Value;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, LineGauge, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::game_card::{CARD_HEIGHT, GameCard};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::view_state::ViewState;
use crate::ui::layout::LayoutAreas;
use crate::ui::time_display::format_short_date;
use seatduty_api::{AssignmentRecord, AssignmentStatus, UserRecord};

static TABS: &[&str; 3] = &["Games", "Assignments", "Users"];

const LOG_PANE_HEIGHT: u16 = 10;
const USER_ROW_HEIGHT: u16 = 3;
const ASSIGNMENT_ROW_HEIGHT: u16 = 3;

const HELP_TEXT: &str = "1=Games  2=Assignments  3=Users  r=refresh  j/k=scroll  f=full screen  \"=logs  Esc=back  q=quit";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs, LOG_PANE_HEIGHT);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Games => draw_games(f, layout.main, app),
            MenuItem::Assignments => draw_assignments(f, layout.main, app),
            MenuItem::Users => draw_users(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });

    if let Err(e) = result {
        error!("failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Games => 0,
        MenuItem::Assignments => 1,
        MenuItem::Users => 2,
        MenuItem::Help => match app.state.previous_tab {
            MenuItem::Assignments => 1,
            MenuItem::Users => 2,
            _ => 0,
        },
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// Draws the non-success states of a screen. Returns the loaded items when
/// there is something for the caller to render.
fn draw_view_state<'a, T>(f: &mut Frame, area: Rect, state: &'a ViewState<Vec<T>>) -> Option<&'a [T]> {
    match state {
        ViewState::Idle => {
            draw_message(f, area, "Press r to load", Color::DarkGray);
            None
        }
        ViewState::Loading => {
            draw_message(f, area, "Loading ...", Color::Gray);
            None
        }
        ViewState::Failure(report) => {
            f.render_widget(
                Paragraph::new(pretty_report(report))
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: false }),
                area,
            );
            None
        }
        ViewState::Success(items) => Some(items.as_slice()),
    }
}

fn draw_games(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Games ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(games) = draw_view_state(f, inner, app.state.games.screen.state()) else {
        return;
    };
    if games.is_empty() {
        draw_message(f, inner, "No games", Color::DarkGray);
        return;
    }

    let offset = app.state.games.scroll_offset as usize;
    let visible = (inner.height / CARD_HEIGHT).max(1) as usize;
    for (row, game) in games.iter().skip(offset).take(visible).enumerate() {
        let y = inner.y + row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min(inner.bottom().saturating_sub(y));
        f.render_widget(
            GameCard {
                game,
                now: app.state.now,
                timezone: app.settings.timezone,
                selected: row == 0,
            },
            Rect::new(inner.x, y, inner.width, height),
        );
    }
}

fn draw_assignments(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Assignments ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(assignments) = draw_view_state(f, inner, app.state.assignments.screen.state()) else {
        return;
    };
    if assignments.is_empty() {
        draw_message(f, inner, "No Assignments Found", Color::DarkGray);
        return;
    }

    let visible = (inner.height / ASSIGNMENT_ROW_HEIGHT) as usize;
    let lines: Vec<Line> = assignments
        .iter()
        .skip(app.state.assignments.scroll_offset as usize)
        .take(visible.max(1))
        .flat_map(|a| assignment_lines(a, app.settings.timezone))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn assignment_lines(a: &AssignmentRecord, tz: chrono_tz::Tz) -> [Line<'static>; 3] {
    let kind = a.status_kind();
    let dim = Style::default().fg(Color::DarkGray);
    [
        Line::from(vec![
            Span::styled(
                format!("{} {:<10}", kind.icon(), a.status),
                Style::default().fg(status_color(kind)),
            ),
            Span::styled(
                format!(" {} vs {}", a.away_competitor_name, a.home_competitor_name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  #{}", a.game_id), dim),
        ]),
        Line::from(vec![
            Span::raw(format!("   {}", a.user_name)),
            Span::styled("  start ", dim),
            Span::raw(format_short_date(&a.start_time, tz)),
            Span::styled("  assigned ", dim),
            Span::raw(format_short_date(&a.assigned_at, tz)),
        ]),
        Line::from(Span::styled(format!("   {}", a.game_url()), dim)),
    ]
}

fn status_color(kind: AssignmentStatus) -> Color {
    match kind {
        AssignmentStatus::Assigned => Color::Yellow,
        AssignmentStatus::Completed => Color::Green,
        AssignmentStatus::Cancelled => Color::Red,
        AssignmentStatus::Other => Color::Gray,
    }
}

fn draw_users(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Users ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(users) = draw_view_state(f, inner, app.state.users.screen.state()) else {
        return;
    };
    if users.is_empty() {
        draw_message(f, inner, "No users", Color::DarkGray);
        return;
    }

    let visible = (inner.height / USER_ROW_HEIGHT) as usize;
    for (row, user) in users
        .iter()
        .skip(app.state.users.scroll_offset as usize)
        .take(visible)
        .enumerate()
    {
        let y = inner.y + row as u16 * USER_ROW_HEIGHT;
        let [text, gauge] = Layout::vertical([Constraint::Length(2), Constraint::Length(1)])
            .areas(Rect::new(inner.x, y, inner.width, USER_ROW_HEIGHT));
        f.render_widget(Paragraph::new(user_lines(user, app.settings.timezone).to_vec()), text);
        f.render_widget(
            LineGauge::default()
                .ratio(user.completion_ratio())
                .label(format!("{:>3}%", user.completion_percent()))
                .filled_style(Style::default().fg(Color::Green)),
            gauge,
        );
    }
}

fn user_lines(user: &UserRecord, tz: chrono_tz::Tz) -> [Line<'static>; 2] {
    let dim = Style::default().fg(Color::DarkGray);
    let badge = if user.is_active {
        Span::styled(" Active ", Style::default().fg(Color::Black).bg(Color::Green))
    } else {
        Span::styled(" Inactive ", Style::default().fg(Color::White).bg(Color::DarkGray))
    };
    let last_assigned = user
        .last_assigned_at
        .as_deref()
        .map(|ts| format_short_date(ts, tz))
        .unwrap_or_else(|| "Never".to_string());

    [
        Line::from(vec![
            Span::styled(format!("[{}] ", user.initial()), Style::default().fg(Color::Cyan)),
            Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!(" <{}> ", user.email), dim),
            badge,
        ]),
        Line::from(vec![
            Span::styled("    assigned ", dim),
            Span::raw(user.total_games_assigned.to_string()),
            Span::styled("  completed ", dim),
            Span::raw(user.total_games_completed.to_string()),
            Span::styled("  last ", dim),
            Span::raw(last_assigned),
        ]),
    ]
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .output_target(false);
    f.render_widget(logs, area);
}

fn draw_message(f: &mut Frame, area: Rect, msg: &str, color: Color) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    draw_message(f, inner, msg, Color::DarkGray);
}

/// Failure payloads are shown exactly as received, indented.
fn pretty_report(report: &Value) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| report.to_string())
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_is_pretty_printed_verbatim() {
        let report = json!({ "error": "Failed to fetch users", "status": 503 });
        let text = pretty_report(&report);
        assert!(text.contains("\n  \"error\": \"Failed to fetch users\""));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), report);
    }

    #[test]
    fn assignment_rows_are_colored_by_status() {
        assert_eq!(status_color(AssignmentStatus::Assigned), Color::Yellow);
        assert_eq!(status_color(AssignmentStatus::Completed), Color::Green);
        assert_eq!(status_color(AssignmentStatus::Cancelled), Color::Red);
        assert_eq!(status_color(AssignmentStatus::Other), Color::Gray);
    }

    #[test]
    fn assignment_row_links_to_its_match() {
        let a = AssignmentRecord { game_id: 4452, status: "assigned".into(), ..Default::default() };
        let [first, _, link] = assignment_lines(&a, chrono_tz::Asia::Jerusalem);
        assert!(first.to_string().contains("#4452"));
        assert!(link.to_string().trim().ends_with("/match/4452"));
    }

    #[test]
    fn user_without_assignments_reads_never() {
        let user = UserRecord { name: "noa".to_string(), ..Default::default() };
        let [_, stats] = user_lines(&user, chrono_tz::Asia::Jerusalem);
        assert!(stats.to_string().ends_with("last Never"));
    }
}
