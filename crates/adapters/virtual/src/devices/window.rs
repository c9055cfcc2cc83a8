//! Virtual window contact.

use thermodiff_domain::event::EventKind;

/// A simulated door/window contact sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualWindow {
    open: bool,
}

impl VirtualWindow {
    #[must_use]
    pub fn new(open: bool) -> Self {
        Self { open }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) -> Option<EventKind> {
        if self.open == open {
            return None;
        }
        self.open = open;
        Some(EventKind::WindowChanged { open })
    }
}
