use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use seatduty_api::GameRecord;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Widget};

use crate::ui::time_display::{STARTED_LABEL, format_localized_date, time_until_match};

/// Rows per card, borders included.
pub const CARD_HEIGHT: u16 = 10;

/// One game: header with countdown, score line, odds, kick-off date, status,
/// assignees, the match page and the league standings links.
pub struct GameCard<'a> {
    pub game: &'a GameRecord,
    pub now: DateTime<Utc>,
    pub timezone: Tz,
    pub selected: bool,
}

impl GameCard<'_> {
    fn countdown(&self) -> String {
        match self.game.starts_at() {
            Some(ts) => time_until_match(self.now, ts),
            None => "-".to_string(),
        }
    }

    fn kickoff(&self) -> String {
        self.game
            .starts_at()
            .map(|ts| format_localized_date(ts, self.timezone))
            .unwrap_or_else(|| self.game.start_time.clone())
    }

    fn odds(&self) -> String {
        let rates = self
            .game
            .odds
            .as_ref()
            .map(|o| o.headline_rates())
            .unwrap_or_default();
        if rates.is_empty() { "-".to_string() } else { rates.join("  ") }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        let countdown = self.countdown();
        let countdown_style = if countdown == STARTED_LABEL {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let away = &self.game.away_competitor;
        let home = &self.game.home_competitor;

        vec![
            Line::from(vec![
                Span::styled(self.game.competition_display_name.clone(), label),
                Span::raw("  "),
                Span::styled(countdown, countdown_style),
            ]),
            Line::from(vec![
                Span::styled(away.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {}  vs  {} ", away.score_label(), home.score_label())),
                Span::styled(home.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![Span::styled("Odds: ", label), Span::raw(self.odds())]),
            Line::from(self.kickoff()),
            Line::from(vec![
                Span::styled("Status: ", label),
                Span::raw(self.game.status_text.clone().unwrap_or_else(|| "-".to_string())),
            ]),
            Line::from(vec![
                Span::styled("Assigned: ", label),
                Span::styled(self.game.assigned_label(), Style::default().fg(Color::Cyan)),
            ]),
            Line::from(Span::styled(self.game.match_page_url(), label)),
            Line::from(Span::styled(self.game.standings_url(), label)),
        ]
    }
}

impl Widget for GameCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height < 3 {
            return;
        }

        let border = if self.selected { Color::White } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(format!(" #{} ", self.game.id));

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use seatduty_api::{Competitor, Odds, OddsOption, Rate};

    fn game() -> GameRecord {
        GameRecord {
            id: 4452,
            competition_id: 7,
            competition_display_name: "Premier League".to_string(),
            home_competitor: Competitor {
                id: 104,
                name: "Arsenal".to_string(),
                score: 2.0,
                name_for_url: "arsenal".to_string(),
            },
            away_competitor: Competitor {
                id: 110,
                name: "Chelsea".to_string(),
                name_for_url: "chelsea".to_string(),
                ..Default::default()
            },
            start_time: "2025-08-23T16:00:00Z".to_string(),
            odds: Some(Odds {
                options: [1.85, 3.4, 4.2]
                    .into_iter()
                    .map(|decimal| OddsOption { name: None, rate: Some(Rate { decimal }) })
                    .collect(),
            }),
            assigned_user_names: vec!["Dana".to_string(), "Noa".to_string()],
            ..Default::default()
        }
    }

    fn render(card: GameCard) -> String {
        let area = Rect::new(0, 0, 120, CARD_HEIGHT);
        let mut buf = Buffer::empty(area);
        card.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn card_shows_scores_odds_and_assignees() {
        let now = Utc.with_ymd_and_hms(2025, 8, 23, 14, 0, 0).unwrap();
        let text = render(GameCard {
            game: &game(),
            now,
            timezone: chrono_tz::Asia::Jerusalem,
            selected: false,
        });
        assert!(text.contains("Chelsea - "));
        assert!(text.contains(" 2 Arsenal"));
        assert!(text.contains("4.20  3.40  1.85"));
        assert!(text.contains("Dana, Noa"));
        assert!(text.contains("#4452"));
        assert!(text.contains("premier-league-7/standings"));
    }

    #[test]
    fn countdown_follows_injected_now() {
        let card = GameCard {
            game: &game(),
            now: Utc.with_ymd_and_hms(2025, 8, 23, 14, 0, 0).unwrap(),
            timezone: chrono_tz::Asia::Jerusalem,
            selected: false,
        };
        assert_eq!(card.countdown(), "2 שעות 0 דקות");

        let later = GameCard { now: Utc.with_ymd_and_hms(2025, 8, 23, 17, 0, 0).unwrap(), ..card };
        assert_eq!(later.countdown(), STARTED_LABEL);
    }

    #[test]
    fn missing_odds_and_bad_start_time_degrade() {
        let mut g = game();
        g.odds = None;
        g.start_time = "soon".to_string();
        let card = GameCard {
            game: &g,
            now: Utc::now(),
            timezone: chrono_tz::Asia::Jerusalem,
            selected: true,
        };
        assert_eq!(card.odds(), "-");
        assert_eq!(card.countdown(), "-");
        assert_eq!(card.kickoff(), "soon");
    }
}
