use std::collections::VecDeque;

use chrono::Local;

pub const MAX_LOG_LINES: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
    Output,
}

impl LogLevel {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
            Self::Output => "client",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub text: String,
}

impl LogLine {
    pub fn display(&self) -> String {
        match self.level {
            LogLevel::Output => format!("[{}] {}", self.timestamp, self.text),
            level => format!("[{}] [{}] {}", self.timestamp, level.tag(), self.text),
        }
    }
}

pub struct LogBuffer {
    lines: VecDeque<LogLine>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_LINES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(MAX_LOG_LINES)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: LogLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            LogLevel::Info => log::info!("[ui] {text}"),
            LogLevel::Error => log::error!("[ui] {text}"),
            LogLevel::Output => log::debug!("[client] {text}"),
        }

        self.lines.push_back(LogLine {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            text,
        });
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&LogLine> {
        self.lines.back()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}
