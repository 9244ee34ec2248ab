pub mod components;
mod format;
mod header;
mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Task list
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let (open, done) = app.counts();
  header::draw_header(
    frame,
    chunks[0],
    open,
    done,
    app.filter(),
    app.connectivity(),
  );

  views::tasks::draw_task_list(frame, chunks[1], app.visible_tasks(), app.selected(), app.filter());

  draw_status_bar(frame, chunks[2], app);

  // Overlay last so it sits on top of the list
  app.form().render_overlay(frame, chunks[1]);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.status() {
    Some(message) => (message.to_string(), Style::default().fg(Color::Red)),
    None => {
      let hint =
        " a:add  e:edit  Space:toggle  d:delete  f:filter  j/k:nav  r:probe  q:quit";
      (hint.to_string(), Style::default().fg(Color::DarkGray))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}
