use crate::anchors::Anchor;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    PointActivated(Anchor),
    SelectionCleared,
    PanelToggled { open: bool },
    SettingsReset,
}

impl fmt::Display for ViewerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerEvent::PointActivated(anchor) => write!(f, "PointActivated id={}", anchor.id),
            ViewerEvent::SelectionCleared => write!(f, "SelectionCleared"),
            ViewerEvent::PanelToggled { open } => write!(f, "PanelToggled open={open}"),
            ViewerEvent::SettingsReset => write!(f, "SettingsReset"),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<ViewerEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: ViewerEvent) {
        log::debug!("[events] {event}");
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }
}
