use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::input::TextInput;
use super::key_result::KeyResult;
use crate::store::{Priority, Task};

/// Events emitted by the form that the app needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Form submitted with valid values
  Submitted(TaskDraft),
  /// Form dismissed without saving
  Cancelled,
}

/// Validated form values. `id` is set when editing an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
  pub id: Option<String>,
  pub title: String,
  pub description: String,
  pub priority: Priority,
  pub due_date: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Description,
  DueDate,
  Priority,
}

impl Field {
  fn next(self) -> Self {
    match self {
      Field::Title => Field::Description,
      Field::Description => Field::DueDate,
      Field::DueDate => Field::Priority,
      Field::Priority => Field::Title,
    }
  }

  fn prev(self) -> Self {
    match self {
      Field::Title => Field::Priority,
      Field::Description => Field::Title,
      Field::DueDate => Field::Description,
      Field::Priority => Field::DueDate,
    }
  }
}

/// Overlay form for adding or editing a task.
#[derive(Debug, Clone)]
pub struct TaskForm {
  active: bool,
  field: Field,
  title: TextInput,
  description: TextInput,
  due: TextInput,
  priority: Priority,
  editing: Option<String>,
  error: Option<String>,
}

impl Default for TaskForm {
  fn default() -> Self {
    Self {
      active: false,
      field: Field::Title,
      title: TextInput::new(),
      description: TextInput::new(),
      due: TextInput::new(),
      priority: Priority::default(),
      editing: None,
      error: None,
    }
  }
}

impl TaskForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the form empty, for a new task
  pub fn open_add(&mut self) {
    *self = Self::default();
    self.active = true;
  }

  /// Open the form pre-filled with an existing task
  pub fn open_edit(&mut self, task: &Task) {
    *self = Self::default();
    self.active = true;
    self.editing = Some(task.id.clone());
    self.title.set(&task.title);
    self.description.set(&task.description);
    self.priority = task.priority;

    if let Some(due) = task.due_date.and_then(DateTime::<Utc>::from_timestamp_millis) {
      self.due.set(&due.date_naive().format("%Y-%m-%d").to_string());
    }
  }

  fn hide(&mut self) {
    self.active = false;
  }

  /// Handle a key event while the form is open
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.hide();
        KeyResult::Event(FormEvent::Cancelled)
      }
      KeyCode::Enter => self.submit(),
      KeyCode::Tab | KeyCode::Down => {
        self.field = self.field.next();
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.field = self.field.prev();
        KeyResult::Handled
      }
      KeyCode::Left if self.field == Field::Priority => {
        self.priority = self.priority.prev();
        KeyResult::Handled
      }
      KeyCode::Right if self.field == Field::Priority => {
        self.priority = self.priority.next();
        KeyResult::Handled
      }
      _ => {
        let input = match self.field {
          Field::Title => &mut self.title,
          Field::Description => &mut self.description,
          Field::DueDate => &mut self.due,
          Field::Priority => return KeyResult::Handled,
        };
        input.handle_key(key);
        KeyResult::Handled
      }
    }
  }

  /// Validate and emit the draft. Invalid input keeps the form open with an
  /// inline error.
  fn submit(&mut self) -> KeyResult<FormEvent> {
    let title = self.title.value().trim().to_string();
    if title.is_empty() {
      self.error = Some("Title cannot be empty".to_string());
      return KeyResult::Handled;
    }

    let due_date = match parse_due(&self.due.value()) {
      Ok(due) => due,
      Err(e) => {
        self.error = Some(e);
        return KeyResult::Handled;
      }
    };

    let draft = TaskDraft {
      id: self.editing.clone(),
      title,
      description: self.description.value(),
      priority: self.priority,
      due_date,
    };

    self.hide();
    KeyResult::Event(FormEvent::Submitted(draft))
  }

  /// Render the form overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = 56.min(area.width.saturating_sub(4)).max(30);
    let height = 9.min(area.height.saturating_sub(2)).max(7);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let title = if self.editing.is_some() {
      " Edit Task "
    } else {
      " Add Task "
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title);

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let prefix = |label: &str, field: Field| {
      let marker = if self.field == field { "▸ " } else { "  " };
      let label_style = if self.field == field {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      vec![
        Span::raw(marker.to_string()),
        Span::styled(format!("{:<12}", label), label_style),
      ]
    };

    // Text fields show a block cursor while focused
    let text_line = |label: &str, input: &TextInput, field: Field| {
      let mut spans = prefix(label, field);
      let value = input.value();
      if self.field == field {
        let chars: Vec<char> = value.chars().collect();
        let cursor = input.cursor();
        spans.push(Span::raw(chars[..cursor].iter().collect::<String>()));
        let at = chars.get(cursor).map_or(" ".to_string(), |c| c.to_string());
        spans.push(Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)));
        if cursor < chars.len() {
          spans.push(Span::raw(chars[cursor + 1..].iter().collect::<String>()));
        }
      } else {
        spans.push(Span::raw(value));
      }
      Line::from(spans)
    };

    let mut priority_spans = prefix("Priority", Field::Priority);
    priority_spans.push(Span::raw(format!("◂ {} ▸", self.priority.label())));

    let mut lines = vec![
      text_line("Title", &self.title, Field::Title),
      text_line("Description", &self.description, Field::Description),
      text_line("Due date", &self.due, Field::DueDate),
      Line::from(priority_spans),
      Line::raw(""),
    ];

    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        format!("  {}", error),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        "  Tab:next field  Enter:save  Esc:cancel",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

/// Parse a `YYYY-MM-DD` due date into milliseconds at UTC midnight. Blank
/// means "no due date".
fn parse_due(input: &str) -> Result<Option<i64>, String> {
  let input = input.trim();
  if input.is_empty() {
    return Ok(None);
  }

  NaiveDate::parse_from_str(input, "%Y-%m-%d")
    .map(|date| Some(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()))
    .map_err(|_| "Due date must be YYYY-MM-DD".to_string())
}
