//! UI rendering for the vocabulary quiz.

use crate::app::{App, MessageType, View};
use crate::models::{RankFilter, MAX_LEVEL};
use crate::session::Phase;
use crate::stats::rank_stats;
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    draw_nav(f, app, chunks[0]);

    match app.view {
        View::Home => draw_home(f, app, chunks[1]),
        View::Quiz => draw_quiz(f, app, chunks[1]),
        View::Results => draw_results(f, app, chunks[1]),
        View::Stats => draw_stats(f, app, chunks[1]),
        View::History => draw_history(f, app, chunks[1]),
        View::WordList => draw_word_list(f, app, chunks[1]),
    }

    draw_footer(f, app, chunks[2]);

    if app.show_help {
        draw_help(f);
    }

    if let Some(dialog) = &app.confirm_dialog {
        draw_confirm(f, &dialog.title, &dialog.message);
    }

    if let Some((msg, kind)) = &app.message {
        draw_message(f, msg, *kind);
    }
}

/// Three dots, filled up to `level`.
pub fn memory_dots(level: u8) -> String {
    (0..MAX_LEVEL).map(|i| if i < level { '●' } else { '○' }).collect()
}

fn draw_nav(f: &mut Frame, app: &App, area: Rect) {
    let active = match app.view {
        View::Stats => 1,
        View::History => 2,
        _ => 0,
    };

    let mut spans = vec![Span::styled(
        "TOEFL Vocabulary  ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for (i, label) in ["Quiz", "Stats", "History"].iter().enumerate() {
        let style = if i == active {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }

    let nav = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(nav, area);
}

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    if let Some(err) = &app.catalog_error {
        let msg = Paragraph::new(vec![
            Line::from(Span::styled(
                "Error loading data",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(err.as_str()),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Courses "));
        f.render_widget(msg, area);
        return;
    }

    let catalog = app.quiz.catalog();
    let memory = app.quiz.memory();
    let items: Vec<ListItem> = RankFilter::choices()
        .into_iter()
        .enumerate()
        .map(|(i, filter)| {
            let words = catalog.filter(filter);
            let mastered = words.iter().filter(|e| memory.is_mastered(&e.word)).count();

            let style = if i == app.selected_rank {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let spans = vec![
                Span::styled(format!("{:<10}", filter.label()), style),
                Span::raw(" - "),
                Span::styled(format!("{} words", words.len()), Style::default().fg(Color::Blue)),
                Span::raw(", "),
                Span::styled(format!("{} mastered", mastered), Style::default().fg(Color::Green)),
            ];
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Courses "));
    f.render_widget(list, area);
}

fn draw_quiz(f: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.quiz.session() else { return };
    let Some(question) = session.current_question() else { return };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Length(5), // Word
            Constraint::Min(0),    // Options
            Constraint::Length(3), // Feedback
        ])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Question: {} / {}  Score: {} ",
            session.questions_answered(),
            session.total_questions(),
            session.score()
        )))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(session.progress().clamp(0.0, 1.0));
    f.render_widget(gauge, chunks[0]);

    let level = app.quiz.memory().get(&question.entry.word);
    let meter = if session.rank_filter().is_all() {
        Line::from("")
    } else {
        Line::from(Span::styled(memory_dots(level), Style::default().fg(Color::Yellow)))
    };
    let word = Paragraph::new(vec![
        Line::from(Span::styled(
            question.entry.word.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        meter,
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(format!(" {} ", session.rank_filter().label())));
    f.render_widget(word, chunks[1]);

    let answered = session.last_answer();
    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = match answered {
                Some(_) if option.same_word(&question.entry) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                Some(outcome) if option.word == outcome.chosen => Style::default().fg(Color::Red),
                None if i == app.selected_option => Style::default().bg(Color::DarkGray),
                _ => Style::default(),
            };
            ListItem::new(format!("{}. {}", i + 1, option.meaning)).style(style)
        })
        .collect();
    let options = List::new(items).block(Block::default().borders(Borders::ALL).title(" Meaning "));
    f.render_widget(options, chunks[2]);

    let feedback = match answered {
        Some(outcome) if outcome.correct => {
            Line::from(Span::styled("Correct!", Style::default().fg(Color::Green)))
        }
        Some(outcome) => Line::from(Span::styled(
            format!("Wrong! It means: {}", outcome.answer.meaning),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(""),
    };
    let feedback = Paragraph::new(feedback)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(feedback, chunks[3]);
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.quiz.session() else { return };

    let mut lines = vec![
        Line::from(Span::styled(
            "Session Complete!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "Final Score: {} / {}",
            session.score(),
            session.total_questions()
        )),
        Line::from(""),
    ];

    if session.wrong_answers().is_empty() {
        lines.push(Line::from(Span::styled(
            "Perfect Score! No mistakes.",
            Style::default().fg(Color::Green),
        )));
    } else {
        for wrong in session.wrong_answers() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<16}", wrong.word), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(wrong.meaning.as_str()),
                Span::styled("  [Review]", Style::default().fg(Color::Yellow)),
            ]));
        }
    }

    let results = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Results "));
    f.render_widget(results, area);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = rank_stats(app.quiz.catalog(), app.quiz.memory());
    let constraints: Vec<Constraint> = stats.iter().map(|_| Constraint::Length(3)).chain([Constraint::Min(0)]).collect();

    let block = Block::default().borders(Borders::ALL).title(" Mastered (3 dots) ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (stat, row) in stats.iter().zip(rows.iter()) {
        let gauge = Gauge::default()
            .block(Block::default().title(format!(
                "Rank {}  {}% ({}/{})",
                stat.rank, stat.percentage, stat.mastered, stat.total
            )))
            .gauge_style(Style::default().fg(Color::Green))
            .percent(stat.percentage.min(100) as u16);
        f.render_widget(gauge, *row);
    }
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let history = app.quiz.history().all();
    let block = Block::default().borders(Borders::ALL).title(" History ");

    if history.is_empty() {
        let msg = Paragraph::new("No history yet.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = history
        .iter()
        .map(|result| {
            let date = result.date.with_timezone(&Local).format("%Y-%m-%d %H:%M");
            let score_style = if result.is_perfect() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<10}", result.rank.label()), Style::default().fg(Color::Cyan)),
                Span::styled(format!("{}  ", date), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{}/{}", result.score, result.total), score_style),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_word_list(f: &mut Frame, app: &App, area: Rect) {
    let words = app.quiz.catalog().filter(app.list_filter);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} Words ", app.list_filter.label()));

    if words.is_empty() {
        let msg = Paragraph::new("No words found.").alignment(Alignment::Center).block(block);
        f.render_widget(msg, area);
        return;
    }

    let memory = app.quiz.memory();
    let items: Vec<ListItem> = words
        .iter()
        .skip(app.list_offset)
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<16}", entry.word), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("{} ", memory_dots(memory.get(&entry.word))), Style::default().fg(Color::Yellow)),
                Span::raw(entry.meaning.as_str()),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.view {
        View::Home => "j/k:Select  Enter:Start  l:Word list  Tab:Switch view  ?:Help  q:Quit".to_string(),
        View::Quiz => match app.quiz.phase() {
            Phase::AwaitingNext => {
                let label = if app.quiz.session().is_some_and(|s| s.is_last_question()) {
                    "Finish"
                } else {
                    "Next Word"
                };
                format!("Enter:{}  p:Speak  Esc:Quit", label)
            }
            _ => "1-4:Answer  j/k+Enter:Select  p:Speak  Esc:Quit".to_string(),
        },
        View::Results => "r:Once Again  b:Back to Courses".to_string(),
        View::Stats => "Tab:Switch view  b:Back".to_string(),
        View::History => "e:Export CSV  c:Clear  Tab:Switch view  b:Back".to_string(),
        View::WordList => "j/k:Scroll  b:Back".to_string(),
    };

    let footer = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help = r#"
TOEFL Vocabulary Keybindings

Courses:
  j/k, Up/Down    Select rank
  Enter, Space    Start quiz
  l               Word list for rank
  s / h           Stats / History
  q               Quit

Quiz:
  1-4             Pick an answer
  Enter           Pick highlighted / next word
  p               Speak the word
  Esc             Quit session

History:
  e               Export to CSV
  c               Clear history

General:
  Tab             Switch view
  ?               Show this help

Press any key to close
"#;

    let popup = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(popup, area);
}

fn draw_confirm(f: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let dialog = Paragraph::new(message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
    f.render_widget(dialog, area);
}

fn draw_message(f: &mut Frame, msg: &str, kind: MessageType) {
    let area = Rect::new(
        f.area().x + 2,
        f.area().height.saturating_sub(5),
        f.area().width.saturating_sub(4),
        3,
    );
    f.render_widget(Clear, area);

    let color = match kind {
        MessageType::Info => Color::Cyan,
        MessageType::Success => Color::Green,
        MessageType::Warning => Color::Yellow,
        MessageType::Error => Color::Red,
    };
    let message = Paragraph::new(msg)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Config;
    use crate::models::VocabularyEntry;
    use crate::random::SystemRandom;
    use crate::speech::CommandSpeaker;
    use crate::storage::MemoryKv;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::rc::Rc;

    fn test_app(catalog: Catalog) -> App {
        App::with_parts(
            Config::default(),
            catalog,
            Rc::new(MemoryKv::new()),
            Box::new(SystemRandom::seeded(2)),
            Box::new(CommandSpeaker::disabled()),
        )
    }

    fn pets() -> Catalog {
        Catalog::new(vec![
            VocabularyEntry::new("dog", "a domestic animal", 1),
            VocabularyEntry::new("cat", "a small pet", 1),
            VocabularyEntry::new("sun", "a star", 2),
            VocabularyEntry::new("moon", "a satellite", 2),
        ])
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let area = buffer.area;
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                if let Some(cell) = buffer.cell((x, y)) {
                    text.push_str(cell.symbol());
                }
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_memory_dots() {
        assert_eq!(memory_dots(0), "○○○");
        assert_eq!(memory_dots(2), "●●○");
        assert_eq!(memory_dots(3), "●●●");
    }

    #[test]
    fn test_render_home() {
        let mut app = test_app(pets());
        let screen = render(&mut app);
        assert!(screen.contains("All Ranks"));
        assert!(screen.contains("Rank 4"));
        assert!(screen.contains("4 words"));
    }

    #[test]
    fn test_render_catalog_error() {
        let mut app = test_app(Catalog::default());
        app.catalog_error = Some("missing file".to_string());
        let screen = render(&mut app);
        assert!(screen.contains("Error loading data"));
    }

    #[test]
    fn test_render_quiz_and_feedback() {
        let mut app = test_app(pets());
        app.start_session(RankFilter::Rank(1));
        let word = app.quiz.current_question().unwrap().entry.word.clone();

        let screen = render(&mut app);
        assert!(screen.contains(&word));
        assert!(screen.contains("Question: 1 / 2"));
        assert!(screen.contains("○○○"));

        let answer = app.quiz.current_question().unwrap().answer_index().unwrap();
        app.answer((answer + 1) % 4);
        let screen = render(&mut app);
        assert!(screen.contains("Wrong! It means:"));
        assert!(screen.contains("Enter:Next Word"));
    }

    #[test]
    fn test_render_results_review_list() {
        let mut app = test_app(pets());
        app.start_session(RankFilter::Rank(2));
        while app.quiz.is_active() {
            let answer = app.quiz.current_question().unwrap().answer_index().unwrap();
            app.answer((answer + 1) % 4);
            app.advance();
        }
        let screen = render(&mut app);
        assert!(screen.contains("Final Score: 0 / 2"));
        assert!(screen.contains("[Review]"));
    }

    #[test]
    fn test_render_empty_history_and_stats() {
        let mut app = test_app(pets());
        app.view = View::History;
        assert!(render(&mut app).contains("No history yet."));

        app.view = View::Stats;
        let screen = render(&mut app);
        assert!(screen.contains("Rank 1  0% (0/2)"));
        assert!(screen.contains("Rank 3  0% (0/0)"));
    }

    #[test]
    fn test_render_empty_word_list() {
        let mut app = test_app(pets());
        app.show_word_list(RankFilter::Rank(3));
        assert!(render(&mut app).contains("No words found."));
    }
}
