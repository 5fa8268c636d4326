//! Errors.

use crate::app::ViewId;
use crate::topwin::WindowId;
use core::fmt;

/// Errors that may occur when talking to the window server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operation referenced a window that doesn’t exist.
    NotFound(WindowId),
    /// A window was created with a parent that doesn’t exist.
    OrphanParent(WindowId),
    /// A window can’t be shown because one of its ancestors is hidden.
    AncestorHidden(WindowId),
    /// The operation requires a shown window.
    NotShown(WindowId),
    /// The operation requires a hidden window.
    StillShown(WindowId),
    /// The requested geometry would push a window edge out of the coordinate space.
    BadGeometry(WindowId),
    /// A window with this id already exists.
    Duplicate(WindowId),
    /// The application has no such view.
    UnknownView(ViewId),
    /// No panel with this name is configured.
    UnknownPanel(String),
    /// The recipient’s queue is full.
    ChannelFull,
    /// A synchronous request wasn’t acknowledged in time.
    Timeout,
    /// The recipient went away or dropped the request without answering.
    Disconnected,
    /// The application isn’t attached to a server panel.
    NotAttached,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(id) => write!(f, "no such window: {:?}", id),
            Error::OrphanParent(id) => write!(f, "parent window {:?} does not exist", id),
            Error::AncestorHidden(id) => write!(f, "an ancestor of window {:?} is hidden", id),
            Error::NotShown(id) => write!(f, "window {:?} is not shown", id),
            Error::StillShown(id) => write!(f, "window {:?} must be hidden first", id),
            Error::BadGeometry(id) => {
                write!(f, "window {:?} would leave the coordinate space", id)
            }
            Error::Duplicate(id) => write!(f, "window {:?} already exists", id),
            Error::UnknownView(id) => write!(f, "no such view: {:?}", id),
            Error::UnknownPanel(name) => write!(f, "no such panel: {}", name),
            Error::ChannelFull => write!(f, "message queue is full"),
            Error::Timeout => write!(f, "timed out waiting for acknowledgement"),
            Error::Disconnected => write!(f, "peer disconnected"),
            Error::NotAttached => write!(f, "application is not attached to a panel"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// The outcome of a synchronous request, as posted to its reply slot.
pub type Status = Result<()>;
