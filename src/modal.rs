//! Prompt and confirmation requests raised by profile operations.
//!
//! A request is a value with its own responder; at most one waits for an answer.

use std::cell::RefCell;

use futures::channel::oneshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Text { initial: String },
    Confirm,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub kind: PromptKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Confirm,
    Cancel,
}

struct Pending {
    prompt: Prompt,
    responder: oneshot::Sender<Answer>,
}

#[derive(Default)]
pub struct Modal {
    pending: RefCell<Option<Pending>>,
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `prompt`. Returns `None` while another prompt still waits for an answer.
    pub fn request(&self, prompt: Prompt) -> Option<oneshot::Receiver<Answer>> {
        let mut pending = self.pending.borrow_mut();
        if let Some(existing) = pending.as_ref() {
            if !existing.responder.is_canceled() {
                log::warn!(
                    "[modal] \"{}\" requested while \"{}\" is open",
                    prompt.title,
                    existing.prompt.title
                );
                return None;
            }
            log::debug!("[modal] replacing abandoned \"{}\"", existing.prompt.title);
        }

        let (responder, receiver) = oneshot::channel();
        *pending = Some(Pending { prompt, responder });
        Some(receiver)
    }

    pub async fn ask_text(&self, title: &str, message: &str, initial: &str) -> Option<String> {
        let receiver = self.request(Prompt {
            title: title.to_string(),
            message: message.to_string(),
            kind: PromptKind::Text {
                initial: initial.to_string(),
            },
        })?;
        match receiver.await {
            Ok(Answer::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub async fn confirm(&self, title: &str, message: &str) -> bool {
        let Some(receiver) = self.request(Prompt {
            title: title.to_string(),
            message: message.to_string(),
            kind: PromptKind::Confirm,
        }) else {
            return false;
        };
        matches!(receiver.await, Ok(Answer::Confirm))
    }

    pub fn current(&self) -> Option<Prompt> {
        self.pending
            .borrow()
            .as_ref()
            .filter(|pending| !pending.responder.is_canceled())
            .map(|pending| pending.prompt.clone())
    }

    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }

    /// Resolves the open prompt. Returns false when nothing was waiting.
    pub fn answer(&self, answer: Answer) -> bool {
        let Some(pending) = self.pending.borrow_mut().take() else {
            return false;
        };
        pending.responder.send(answer).is_ok()
    }

    pub fn dismiss(&self) -> bool {
        self.answer(Answer::Cancel)
    }
}
