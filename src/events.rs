//! Events.
//!
//! Everything that travels between application threads and the server is an [`Event`]. Events
//! addressed to a window carry its id; input events carry an optional id which is filled in by
//! the server once it has figured out which window the input belongs to.

use crate::channel::Mailbox;
use crate::rect::Rect;
use crate::region::Region;
use crate::topwin::WindowId;
use crate::window::WindowStyle;
use bitflags::bitflags;
use cgmath::Point2;
use core::fmt;

/// Identifies a panel configured on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub u32);

/// List of event kinds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    PanelAttach = 0,
    PanelDetach = 1,
    PanelShow = 2,
    PanelHide = 3,
    PanelInfo = 4,
    WindowCreate = 5,
    WindowDestroy = 6,
    WindowShow = 7,
    WindowHide = 8,
    WindowMove = 9,
    WindowResize = 10,
    WindowActivate = 11,
    WindowDeactivate = 12,
    WindowClose = 13,
    Paint = 14,
    ClipInfo = 15,
    MouseMotion = 16,
    MouseButton = 17,
    Key = 18,
    Timer = 19,
    Command = 20,
    MonitorAdd = 21,
    MonitorRemove = 22,
    Shutdown = 23,
}

bitflags! {
    /// Mouse button state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MouseButtons: u8 {
        const LEFT = 0x01;
        const RIGHT = 0x02;
        const MIDDLE = 0x04;
        /// The button went down.
        const DOWN = 0x10;
        /// The button went up.
        const UP = 0x20;
    }
}

impl MouseButtons {
    pub fn left_down() -> MouseButtons {
        MouseButtons::LEFT | MouseButtons::DOWN
    }

    pub fn left_up() -> MouseButtons {
        MouseButtons::LEFT | MouseButtons::UP
    }
}

/// Modifier key state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    /// Whether any shift key is pressed.
    pub shift: bool,

    /// Whether any control key is pressed.
    pub control: bool,

    /// Whether any alt key is pressed.
    pub alt: bool,
}

/// A key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// Layout-independent key code as reported by the keyboard driver.
    pub code: u16,
    /// The translated character, if the key produces one.
    pub unicode: Option<char>,
    pub modifiers: KeyModifiers,
    pub pressed: bool,
}

/// How a modal window was ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalCode {
    Ok,
    Cancel,
}

/// An event.
#[derive(Clone)]
pub enum Event {
    /// Application → server: bind an application mailbox to a named panel.
    PanelAttach { panel: String, app: Mailbox },
    /// Detach an application from its panel.
    PanelDetach { panel: PanelId },
    PanelShow { panel: PanelId },
    PanelHide { panel: PanelId },
    /// Server → application: answer to `PanelAttach`.
    PanelInfo { panel: PanelId, extent: Rect },

    /// Application → server: register a top-level window.
    WindowCreate {
        wid: WindowId,
        parent: Option<WindowId>,
        extent: Rect,
        style: WindowStyle,
        title: String,
        owner: Mailbox,
    },
    WindowDestroy { wid: WindowId },
    WindowShow { wid: WindowId },
    WindowHide { wid: WindowId },
    /// Move the window so its top left corner is at (x, y).
    WindowMove { wid: WindowId, x: i32, y: i32 },
    WindowResize { wid: WindowId, extent: Rect },
    WindowActivate { wid: WindowId },
    WindowDeactivate { wid: WindowId },
    WindowClose { wid: WindowId },

    /// Server → application: (part of) a window needs to be redrawn.
    ///
    /// `rect` is the dirty area in screen coordinates, or None for the whole window.
    Paint {
        wid: Option<WindowId>,
        rect: Option<Rect>,
    },
    /// Server → application: the window’s visible region changed.
    ClipInfo { wid: WindowId, clip: Region },

    MouseMotion {
        wid: Option<WindowId>,
        position: Point2<i32>,
    },
    MouseButton {
        wid: Option<WindowId>,
        position: Point2<i32>,
        buttons: MouseButtons,
    },
    Key {
        wid: Option<WindowId>,
        key: KeyInput,
    },
    Timer { timer: u32 },
    Command {
        wid: Option<WindowId>,
        command: u32,
    },

    /// Register a mouse monitor rectangle on a window.
    MonitorAdd { wid: WindowId, rect: Rect },
    MonitorRemove { wid: WindowId, rect: Rect },

    /// Stops the server loop.
    Shutdown,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::PanelAttach { .. } => EventKind::PanelAttach,
            Event::PanelDetach { .. } => EventKind::PanelDetach,
            Event::PanelShow { .. } => EventKind::PanelShow,
            Event::PanelHide { .. } => EventKind::PanelHide,
            Event::PanelInfo { .. } => EventKind::PanelInfo,
            Event::WindowCreate { .. } => EventKind::WindowCreate,
            Event::WindowDestroy { .. } => EventKind::WindowDestroy,
            Event::WindowShow { .. } => EventKind::WindowShow,
            Event::WindowHide { .. } => EventKind::WindowHide,
            Event::WindowMove { .. } => EventKind::WindowMove,
            Event::WindowResize { .. } => EventKind::WindowResize,
            Event::WindowActivate { .. } => EventKind::WindowActivate,
            Event::WindowDeactivate { .. } => EventKind::WindowDeactivate,
            Event::WindowClose { .. } => EventKind::WindowClose,
            Event::Paint { .. } => EventKind::Paint,
            Event::ClipInfo { .. } => EventKind::ClipInfo,
            Event::MouseMotion { .. } => EventKind::MouseMotion,
            Event::MouseButton { .. } => EventKind::MouseButton,
            Event::Key { .. } => EventKind::Key,
            Event::Timer { .. } => EventKind::Timer,
            Event::Command { .. } => EventKind::Command,
            Event::MonitorAdd { .. } => EventKind::MonitorAdd,
            Event::MonitorRemove { .. } => EventKind::MonitorRemove,
            Event::Shutdown => EventKind::Shutdown,
        }
    }

    /// The window this event is addressed to, if any.
    pub fn window(&self) -> Option<WindowId> {
        match self {
            Event::WindowCreate { wid, .. }
            | Event::WindowDestroy { wid }
            | Event::WindowShow { wid }
            | Event::WindowHide { wid }
            | Event::WindowMove { wid, .. }
            | Event::WindowResize { wid, .. }
            | Event::WindowActivate { wid }
            | Event::WindowDeactivate { wid }
            | Event::WindowClose { wid }
            | Event::ClipInfo { wid, .. }
            | Event::MonitorAdd { wid, .. }
            | Event::MonitorRemove { wid, .. } => Some(*wid),
            Event::Paint { wid, .. }
            | Event::MouseMotion { wid, .. }
            | Event::MouseButton { wid, .. }
            | Event::Key { wid, .. }
            | Event::Command { wid, .. } => *wid,
            _ => None,
        }
    }

    /// Returns true for keyboard and mouse events.
    pub fn is_input(&self) -> bool {
        match self.kind() {
            EventKind::MouseMotion | EventKind::MouseButton | EventKind::Key => true,
            _ => false,
        }
    }

    /// Returns a copy of this input event addressed to `wid`.
    ///
    /// Non-input events are returned unchanged.
    pub fn addressed_to(&self, target: WindowId) -> Event {
        match self {
            Event::MouseMotion { position, .. } => Event::MouseMotion {
                wid: Some(target),
                position: *position,
            },
            Event::MouseButton {
                position, buttons, ..
            } => Event::MouseButton {
                wid: Some(target),
                position: *position,
                buttons: *buttons,
            },
            Event::Key { key, .. } => Event::Key {
                wid: Some(target),
                key: *key,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::PanelAttach { panel, app } => {
                write!(f, "PanelAttach({:?}, from {:?})", panel, app.name())
            }
            Event::WindowCreate {
                wid,
                parent,
                extent,
                title,
                ..
            } => write!(
                f,
                "WindowCreate({:?}, parent {:?}, {:?}, {:?})",
                wid, parent, extent, title
            ),
            Event::MouseMotion { wid, position } => {
                write!(f, "MouseMotion({:?}, {:?})", wid, (position.x, position.y))
            }
            Event::MouseButton {
                wid,
                position,
                buttons,
            } => write!(
                f,
                "MouseButton({:?}, {:?}, {:?})",
                wid,
                (position.x, position.y),
                buttons
            ),
            Event::ClipInfo { wid, clip } => {
                write!(f, "ClipInfo({:?}, {} rects)", wid, clip.rects().len())
            }
            other => match other.window() {
                Some(wid) => write!(f, "{:?}({:?})", other.kind(), wid),
                None => write!(f, "{:?}", other.kind()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_readdressed() {
        let wid = WindowId::new();
        let event = Event::MouseButton {
            wid: None,
            position: Point2::new(3, 4),
            buttons: MouseButtons::left_down(),
        };
        assert!(event.is_input());
        assert_eq!(event.window(), None);

        let addressed = event.addressed_to(wid);
        assert_eq!(addressed.window(), Some(wid));
        assert_eq!(addressed.kind(), EventKind::MouseButton);
    }

    #[test]
    fn window_events_report_their_target() {
        let wid = WindowId::new();
        assert_eq!(Event::WindowClose { wid }.window(), Some(wid));
        assert!(!Event::WindowClose { wid }.is_input());
        assert_eq!(Event::Timer { timer: 1 }.window(), None);
    }
}
