use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::store::{StatusFilter, Task};
use crate::ui::format::{due_label, priority_color, time_ago, truncate, DueState};

/// Draw the task list with a detail strip for the selected task
pub fn draw_task_list(
  frame: &mut Frame,
  area: Rect,
  tasks: &[Task],
  selected: usize,
  filter: StatusFilter,
) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),    // List
      Constraint::Length(4), // Detail strip
    ])
    .split(area);

  draw_list(frame, chunks[0], tasks, selected, filter);
  draw_detail(frame, chunks[1], tasks.get(selected));
}

fn draw_list(frame: &mut Frame, area: Rect, tasks: &[Task], selected: usize, filter: StatusFilter) {
  let title = format!(" Tasks [{}] ({}) ", filter.label(), tasks.len());

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if tasks.is_empty() {
    let content = match filter {
      StatusFilter::All => "No tasks yet. Press 'a' to add one.",
      StatusFilter::Active => "No active tasks.",
      StatusFilter::Completed => "No completed tasks.",
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let now = Utc::now().timestamp_millis();
  let items: Vec<ListItem> = tasks.iter().map(|task| ListItem::new(row(task, now))).collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected));

  frame.render_stateful_widget(list, area, &mut state);
}

fn row(task: &Task, now: i64) -> Line<'static> {
  let checkbox = if task.completed { "[x]" } else { "[ ]" };
  let title_style = if task.completed {
    Style::default()
      .fg(Color::DarkGray)
      .add_modifier(Modifier::CROSSED_OUT)
  } else {
    Style::default()
  };

  let mut spans = vec![
    Span::styled(checkbox.to_string(), Style::default().fg(Color::DarkGray)),
    Span::raw(" "),
    Span::styled("●", Style::default().fg(priority_color(task.priority))),
    Span::raw(" "),
    Span::styled(format!("{:<40}", truncate(&task.title, 40)), title_style),
    Span::raw(" "),
  ];

  if let Some(due) = task.due_date {
    let (label, state) = due_label(due, now);
    let style = match state {
      DueState::Overdue if !task.completed => Style::default().fg(Color::Red).bold(),
      DueState::Today => Style::default().fg(Color::Yellow).bold(),
      _ => Style::default().fg(Color::DarkGray),
    };
    spans.push(Span::styled(format!("due {:<10}", label), style));
  } else {
    spans.push(Span::raw(" ".repeat(14)));
  }

  spans.push(Span::styled(
    format!(" {}", time_ago(task.created_at, now)),
    Style::default().fg(Color::DarkGray),
  ));

  Line::from(spans)
}

fn draw_detail(frame: &mut Frame, area: Rect, task: Option<&Task>) {
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let Some(task) = task else {
    frame.render_widget(block, area);
    return;
  };

  let now = Utc::now().timestamp_millis();
  let description = if task.description.is_empty() {
    "(no description)".to_string()
  } else {
    task.description.clone()
  };

  let mut meta = vec![
    Span::styled(
      format!("{} priority", task.priority.label()),
      Style::default().fg(priority_color(task.priority)),
    ),
    Span::styled(
      format!("  ·  created {} ago", time_ago(task.created_at, now)),
      Style::default().fg(Color::DarkGray),
    ),
  ];
  if let Some(due) = task.due_date {
    let (label, _) = due_label(due, now);
    meta.push(Span::styled(
      format!("  ·  due {}", label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let lines = vec![Line::raw(description), Line::from(meta)];

  frame.render_widget(Paragraph::new(lines).block(block), area);
}
