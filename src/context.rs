//! Handler contexts.

use crate::events::{Event, ModalCode};
use crate::topwin::WindowId;

/// Anything that can receive events: windows, widgets and the application’s current view.
pub trait Handler {
    /// Handles an event. Returns true if the event was consumed.
    ///
    /// Handlers run on the application thread between two receives, so they must not block
    /// indefinitely: the event loop only notices `exit` once the handler returns.
    fn handle(&mut self, ctx: &mut Context, event: &Event) -> bool;
}

impl<F> Handler for F
where
    F: FnMut(&mut Context, &Event) -> bool,
{
    fn handle(&mut self, ctx: &mut Context, event: &Event) -> bool {
        self(ctx, event)
    }
}

/// Something a handler asked the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request {
    ShowWindow(WindowId),
    HideWindow(WindowId),
    MoveWindow(WindowId, i32, i32),
    DestroyWindow(WindowId),
    EndModal(WindowId, ModalCode),
    /// Ask the server to bring a window back to the front without waiting for it.
    Reshow(WindowId),
    Exit(i32),
}

/// Passed to handlers while they process an event.
///
/// Handlers can’t reach the application directly (it’s busy dispatching to them), so they queue
/// requests here. The application carries them out in order once the handler returns.
#[derive(Debug, Default)]
pub struct Context {
    target: Option<WindowId>,
    requests: Vec<Request>,
}

impl Context {
    pub(crate) fn new(target: Option<WindowId>) -> Context {
        Context {
            target,
            requests: Vec::new(),
        }
    }

    /// The window the event was dispatched to, if any.
    pub fn target(&self) -> Option<WindowId> {
        self.target
    }

    pub fn show_window(&mut self, wid: WindowId) {
        self.requests.push(Request::ShowWindow(wid));
    }

    pub fn hide_window(&mut self, wid: WindowId) {
        self.requests.push(Request::HideWindow(wid));
    }

    pub fn move_window(&mut self, wid: WindowId, x: i32, y: i32) {
        self.requests.push(Request::MoveWindow(wid, x, y));
    }

    pub fn destroy_window(&mut self, wid: WindowId) {
        self.requests.push(Request::DestroyWindow(wid));
    }

    /// Ends the modal loop running for `wid`.
    pub fn end_modal(&mut self, wid: WindowId, code: ModalCode) {
        self.requests.push(Request::EndModal(wid, code));
    }

    /// Closes the application with the given exit code.
    pub fn exit(&mut self, code: i32) {
        self.requests.push(Request::Exit(code));
    }

    pub(crate) fn reshow(&mut self, wid: WindowId) {
        self.requests.push(Request::Reshow(wid));
    }

    pub(crate) fn into_requests(self) -> Vec<Request> {
        self.requests
    }
}
