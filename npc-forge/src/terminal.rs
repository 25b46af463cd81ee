//! Terminal stand-ins for the host UI: the form and the notification area.

use npc_core::{GenerationForm, MonsterRequest, Notification, NotificationLevel, Notifier};

/// Form values taken from the command line.
#[derive(Debug, Clone)]
pub struct CliForm {
    request: MonsterRequest,
    closed: bool,
}

impl CliForm {
    pub fn new(request: MonsterRequest) -> Self {
        Self {
            request,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl GenerationForm for CliForm {
    fn values(&self) -> MonsterRequest {
        self.request.clone()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Prints notifications: info to stdout, warnings and errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => println!("{notification}"),
            NotificationLevel::Warn | NotificationLevel::Error => eprintln!("{notification}"),
        }
    }
}
