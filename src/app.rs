use crate::event::{Event, EventHandler};
use crate::gateway::{FetchRequest, GatewayHandle, ServedFrom};
use crate::store::{sort_for_display, FileSlot, StatusFilter, Task, TaskPatch, TaskStore};
use crate::ui;
use crate::ui::components::{FormEvent, KeyResult, TaskDraft, TaskForm};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

/// Connectivity state shown in the header, derived from gateway traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
  /// Last probe was answered from the network
  Online,
  /// Last probe fell back to cache or a synthesized response
  Offline,
  /// No remote configured, nothing to probe
  Local,
}

/// Ticks between connectivity probes (250ms tick rate, so every 20s)
const PROBE_INTERVAL_TICKS: u32 = 80;

/// Main application state
pub struct App {
  /// Task store and its durable mirror
  store: TaskStore<FileSlot>,

  /// Current status filter
  filter: StatusFilter,

  /// Filtered, display-sorted snapshot the list renders from
  visible: Vec<Task>,

  /// Selection index into `visible`
  selected: usize,

  /// Add/edit overlay
  form: TaskForm,

  /// Gateway handle and the URL probed for connectivity, when a remote
  /// is configured
  gateway: Option<(GatewayHandle, Url)>,

  connectivity: Connectivity,

  /// Last store error or action notice for the status line
  status: Option<String>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  ticks_since_probe: u32,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(store: TaskStore<FileSlot>, gateway: Option<(GatewayHandle, Url)>) -> Result<Self> {
    let (tx, _rx) = mpsc::unbounded_channel();

    let connectivity = if gateway.is_some() {
      Connectivity::Offline
    } else {
      Connectivity::Local
    };

    let mut app = Self {
      store,
      filter: StatusFilter::All,
      visible: Vec::new(),
      selected: 0,
      form: TaskForm::new(),
      gateway,
      connectivity,
      status: None,
      event_tx: tx,
      ticks_since_probe: 0,
      should_quit: false,
    };
    app.refresh_visible();

    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // First connectivity probe
    self.spawn_probe();

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        self.ticks_since_probe += 1;
        if self.ticks_since_probe >= PROBE_INTERVAL_TICKS {
          self.spawn_probe();
        }
      }
      Event::Probe { online } => {
        self.connectivity = if online {
          Connectivity::Online
        } else {
          Connectivity::Offline
        };
      }
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The form owns the keyboard while open
    if self.form.is_active() {
      match self.form.handle_key(key) {
        KeyResult::Event(FormEvent::Submitted(draft)) => self.apply_draft(draft),
        KeyResult::Event(FormEvent::Cancelled) => {}
        _ => {}
      }
      return;
    }

    self.status = None;

    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),

      // Mutations
      KeyCode::Char(' ') => {
        if let Some(id) = self.selected_id() {
          if let Err(e) = self.store.toggle(&id) {
            self.status = Some(e.to_string());
          }
          self.refresh_visible();
        }
      }
      KeyCode::Char('d') => {
        if let Some(id) = self.selected_id() {
          if let Err(e) = self.store.remove(&id) {
            self.status = Some(e.to_string());
          }
          self.refresh_visible();
        }
      }
      KeyCode::Char('a') => self.form.open_add(),
      KeyCode::Char('e') => {
        if let Some(task) = self.visible.get(self.selected) {
          let task = task.clone();
          self.form.open_edit(&task);
        }
      }

      // Filter and probing
      KeyCode::Char('f') => {
        self.filter = self.filter.cycle();
        self.refresh_visible();
      }
      KeyCode::Char('r') => self.spawn_probe(),

      _ => {}
    }
  }

  fn apply_draft(&mut self, draft: TaskDraft) {
    let result = match &draft.id {
      Some(id) => self.store.update(
        id,
        TaskPatch {
          title: Some(draft.title),
          description: Some(draft.description),
          priority: Some(draft.priority),
          due_date: Some(draft.due_date),
        },
      ),
      None => self
        .store
        .add(&draft.title, &draft.description, draft.priority, draft.due_date)
        .map(|_| ()),
    };

    if let Err(e) = result {
      self.status = Some(e.to_string());
    }
    self.refresh_visible();
  }

  /// Rebuild the filtered, display-sorted snapshot and clamp the selection.
  fn refresh_visible(&mut self) {
    self.visible = self
      .store
      .filter(self.filter)
      .into_iter()
      .cloned()
      .collect();
    sort_for_display(&mut self.visible);

    if self.selected >= self.visible.len() {
      self.selected = self.visible.len().saturating_sub(1);
    }
  }

  fn selected_id(&self) -> Option<String> {
    self.visible.get(self.selected).map(|t| t.id.clone())
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  /// Probe the remote through the gateway. The probe URL is classified
  /// network-first, so a `Network` tag means the remote is reachable.
  fn spawn_probe(&mut self) {
    self.ticks_since_probe = 0;

    let Some((gateway, base)) = &self.gateway else {
      return;
    };
    let Ok(url) = base.join("manifest.json") else {
      return;
    };
    let gateway = gateway.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      debug!("Probing {}", url);
      let online = match gateway.fetch(FetchRequest::get(url)).await {
        Ok(response) => response.served_from == ServedFrom::Network,
        Err(_) => false,
      };
      let _ = tx.send(Event::Probe { online });
    });
  }

  // Accessors for UI rendering
  pub fn visible_tasks(&self) -> &[Task] {
    &self.visible
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn filter(&self) -> StatusFilter {
    self.filter
  }

  pub fn connectivity(&self) -> Connectivity {
    self.connectivity
  }

  pub fn counts(&self) -> (usize, usize) {
    self.store.counts()
  }

  pub fn form(&self) -> &TaskForm {
    &self.form
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }
}
