use spdlog::debug;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient message for the user, like a toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sending half of the notice queue. Whoever renders notices owns the receiver.
#[derive(Clone)]
pub struct Notifier {
    sender: UnboundedSender<Notice>,
}

pub fn notice_channel() -> (Notifier, UnboundedReceiver<Notice>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Notifier { sender }, receiver)
}

impl Notifier {
    fn push(&self, level: NoticeLevel, message: String) {
        if let Err(e) = self.sender.send(Notice { level, message }) {
            debug!("Notice dropped, nobody is listening: {}", e.0.message);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }
}
