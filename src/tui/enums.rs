//! Enumerations for TUI state management.

/// The three dashboard views.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tab {
    #[default]
    Kanban,
    Burndown,
    Timeline,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Kanban, Tab::Burndown, Tab::Timeline];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Kanban => "Kanban",
            Tab::Burndown => "Burndown",
            Tab::Timeline => "Timeline",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Kanban => 0,
            Tab::Burndown => 1,
            Tab::Timeline => 2,
        }
    }

    pub fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}
