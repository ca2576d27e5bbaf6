use crate::task::TaskStatus;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Console styles. Plain when stdout is not a terminal.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    pub assigned: Style,
    pub accepted: Style,
    pub rejected: Style,
    pub completed: Style,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
            assigned: Style::new().blue(),
            accepted: Style::new().yellow(),
            rejected: Style::new().red(),
            completed: Style::new().green(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            muted: Style::new(),
            assigned: Style::new(),
            accepted: Style::new(),
            rejected: Style::new(),
            completed: Style::new(),
        }
    }

    pub fn status(&self, status: TaskStatus) -> Style {
        match status {
            TaskStatus::Assigned => self.assigned.clone(),
            TaskStatus::Accepted => self.accepted.clone(),
            TaskStatus::Rejected => self.rejected.clone(),
            TaskStatus::Completed => self.completed.clone(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
