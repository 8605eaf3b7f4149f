#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessState {
    #[default]
    Stopped,
    Running,
}

impl ProcessState {
    pub fn from_running(running: bool) -> Self {
        if running { Self::Running } else { Self::Stopped }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Running => "Running",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProxyState {
    #[default]
    Disabled,
    Enabled,
}

impl ProxyState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "System proxy off",
            Self::Enabled => "System proxy on",
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}
