use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Connectivity;
use crate::store::StatusFilter;

/// Draw the header bar with logo, task stats, filter and connectivity
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  open: usize,
  done: usize,
  filter: StatusFilter,
  connectivity: Connectivity,
) {
  let (dot_color, conn_label) = match connectivity {
    Connectivity::Online => (Color::Green, "online"),
    Connectivity::Offline => (Color::Red, "offline"),
    Connectivity::Local => (Color::DarkGray, "local"),
  };

  let header = Line::from(vec![
    Span::styled(" offtask ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} open · {} done ", open, done),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", filter.label()),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(" ● ", Style::default().fg(dot_color)),
    Span::styled(conn_label, Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
