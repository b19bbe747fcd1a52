//! Single-active-selection and settings-panel state.
//!
//! Pointer-down events arrive already resolved to a [`PointerTarget`]; the innermost target handles
//! the press and nothing behind it sees it.

use crate::anchors::Anchor;

/// What sits under the pointer at press time, innermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    Hotspot(String),
    DetailBox,
    DetailBackdrop,
    PanelTrigger,
    Panel,
    Viewport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    active_point: Option<Anchor>,
}

impl SelectionState {
    pub fn active_point(&self) -> Option<&Anchor> {
        self.active_point.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active_point.is_some()
    }
}

/// Marker for the document-level "pointer-down outside" listener of the open panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutsideClickListener;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    outside_listener: Option<OutsideClickListener>,
}

impl PanelState {
    /// Open exactly while the outside-click listener is registered.
    pub fn is_open(&self) -> bool {
        self.outside_listener.is_some()
    }

    fn open(&mut self) {
        self.outside_listener = Some(OutsideClickListener);
    }

    fn close(&mut self) {
        self.outside_listener = None;
    }
}

/// Side effects of one pointer-down, for the caller to apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerOutcome {
    pub activated: Option<Anchor>,
    pub selection_cleared: bool,
    pub panel_closed: bool,
    /// The press may begin a camera orbit drag.
    pub start_orbit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    selection: SelectionState,
    panel: PanelState,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    /// Camera orbit/zoom input is live only while no point is selected.
    pub fn camera_input_enabled(&self) -> bool {
        !self.selection.is_active()
    }

    /// Returns `false` when `anchor` is already the active point.
    pub fn activate(&mut self, anchor: Anchor) -> bool {
        if self.selection.active_point.as_ref().is_some_and(|active| active.id == anchor.id) {
            return false;
        }
        self.selection.active_point = Some(anchor);
        true
    }

    /// Returns `false` when nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        self.selection.active_point.take().is_some()
    }

    /// Flips the panel and returns its new open state.
    pub fn toggle_panel(&mut self) -> bool {
        if self.panel.is_open() {
            self.panel.close();
        } else {
            self.panel.open();
        }
        self.panel.is_open()
    }

    /// Routes a pointer-down. `resolve` maps a hotspot id to its anchor.
    pub fn pointer_down<'a, F>(&mut self, target: &PointerTarget, resolve: F) -> PointerOutcome
    where
        F: FnOnce(&str) -> Option<&'a Anchor>,
    {
        let mut outcome = PointerOutcome::default();
        // hotspot and detail-box presses stop propagation before reaching the document listener
        let reaches_document = !matches!(
            target,
            PointerTarget::Panel | PointerTarget::PanelTrigger | PointerTarget::Hotspot(_) | PointerTarget::DetailBox
        );
        if reaches_document && self.panel.is_open() {
            self.panel.close();
            outcome.panel_closed = true;
        }
        match target {
            PointerTarget::Hotspot(id) => {
                if let Some(anchor) = resolve(id) {
                    let anchor = anchor.clone();
                    if self.activate(anchor.clone()) {
                        outcome.activated = Some(anchor);
                    }
                }
            }
            PointerTarget::DetailBackdrop => {
                outcome.selection_cleared = self.clear_selection();
            }
            PointerTarget::Viewport => {
                outcome.start_orbit = self.camera_input_enabled();
            }
            PointerTarget::DetailBox | PointerTarget::PanelTrigger | PointerTarget::Panel => {}
        }
        outcome
    }
}
