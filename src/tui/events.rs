/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for polling, notification TTLs, etc.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper or views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusHome,
    FocusWorkspaces,
    FocusUploads,
    FocusOverview,
    FocusChat,
    FocusQuiz,
    FocusFaq,
    TabNext,
    TabPrev,

    /// Make `id` the active workspace and show its uploads page.
    SelectWorkspace(String),
    /// Make `id` the active workspace and show its study guide.
    OpenOverview(String),

    // Sidebar
    ToggleSidebar,

    // Modals
    ShowHelp,
    CloseHelp,

    // Application
    Quit,
}

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaFocus {
    Sidebar,
    #[default]
    Main,
}

/// Which top-level view has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Home,
    Workspaces,
    Uploads,
    Overview,
    Chat,
    Quiz,
    Faq,
}

impl Focus {
    pub const ALL: [Focus; 7] = [
        Focus::Home,
        Focus::Workspaces,
        Focus::Uploads,
        Focus::Overview,
        Focus::Chat,
        Focus::Quiz,
        Focus::Faq,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Focus::Home => "Home",
            Focus::Workspaces => "Workspaces",
            Focus::Uploads => "Uploads",
            Focus::Overview => "Overview",
            Focus::Chat => "Chat",
            Focus::Quiz => "Quiz",
            Focus::Faq => "FAQ",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Focus::Home => "⌂",
            Focus::Workspaces => "▦",
            Focus::Uploads => "⇪",
            Focus::Overview => "☰",
            Focus::Chat => "✉",
            Focus::Quiz => "✎",
            Focus::Faq => "?",
        }
    }

    pub fn group(self) -> SidebarGroup {
        match self {
            Focus::Home | Focus::Workspaces => SidebarGroup::Neura,
            Focus::Uploads | Focus::Overview | Focus::Chat | Focus::Quiz | Focus::Faq => {
                SidebarGroup::Workspace
            }
        }
    }

    /// Views that only make sense with an active workspace.
    pub fn needs_workspace(self) -> bool {
        self.group() == SidebarGroup::Workspace
    }

    pub fn to_action(self) -> Action {
        match self {
            Focus::Home => Action::FocusHome,
            Focus::Workspaces => Action::FocusWorkspaces,
            Focus::Uploads => Action::FocusUploads,
            Focus::Overview => Action::FocusOverview,
            Focus::Chat => Action::FocusChat,
            Focus::Quiz => Action::FocusQuiz,
            Focus::Faq => Action::FocusFaq,
        }
    }

    pub fn next(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + 1) % Focus::ALL.len()]
    }

    pub fn prev(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + Focus::ALL.len() - 1) % Focus::ALL.len()]
    }
}

/// Sidebar section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarGroup {
    Neura,
    Workspace,
}

impl SidebarGroup {
    pub const ALL: [SidebarGroup; 2] = [SidebarGroup::Neura, SidebarGroup::Workspace];

    pub fn label(self) -> &'static str {
        match self {
            SidebarGroup::Neura => "NEURA",
            SidebarGroup::Workspace => "WORKSPACE",
        }
    }

    pub fn views(self) -> &'static [Focus] {
        match self {
            SidebarGroup::Neura => &[Focus::Home, Focus::Workspaces],
            SidebarGroup::Workspace => &[
                Focus::Uploads,
                Focus::Overview,
                Focus::Chat,
                Focus::Quiz,
                Focus::Faq,
            ],
        }
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

impl Notification {
    /// Notification with a default lifetime; the id is assigned by `AppState`.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 100,
        }
    }
}
