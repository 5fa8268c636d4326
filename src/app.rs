//! Applications.
//!
//! An [`Application`] is the client side of the window system: it lives on one thread, owns that
//! thread’s mailbox, and turns the events the server posts into calls on its windows.

use crate::channel::{Mailbox, Message};
use crate::config::Config;
use crate::context::{Context, Handler, Request};
use crate::error::{Error, Result, Status};
use crate::events::{Event, EventKind, ModalCode, PanelId};
use crate::rect::Rect;
use crate::topwin::WindowId;
use crate::window::{Window, WindowBuilder, WindowStyle};
use cgmath::Point2;
use log::{debug, info, trace, warn};
use std::collections::HashMap;

/// What the application’s event loop is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Exited,
    Running,
    /// Running a nested loop for a modal window.
    Modal,
}

type IdleCallback = Box<dyn FnMut(&mut Context)>;

/// Identifies a view added to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u32);

/// A full-panel handler for events no window claims. At most one view is shown at a time.
struct View {
    id: ViewId,
    handler: Box<dyn Handler>,
}

/// A client application attached to a server panel.
pub struct Application {
    name: String,
    config: Config,
    mailbox: Mailbox,
    server: Mailbox,
    panel: Option<PanelId>,
    extent: Rect,
    state: AppState,
    shown: bool,
    closed: bool,
    exit_code: i32,
    windows: HashMap<WindowId, Window>,
    /// Receives all input while set.
    modal: Option<WindowId>,
    focused: Option<WindowId>,
    /// In the order they were added.
    views: Vec<View>,
    current_view: Option<ViewId>,
    next_view: u32,
    on_idle: Option<IdleCallback>,
}

impl Application {
    /// Creates an application and attaches it to the named panel.
    pub fn create(
        name: &str,
        panel: &str,
        server: &Mailbox,
        config: &Config,
    ) -> Result<Application> {
        let mailbox =
            Mailbox::with_sync_timeout(name, config.mailbox_capacity(), config.sync_timeout);

        server.send_sync(Event::PanelAttach {
            panel: panel.into(),
            app: mailbox.clone(),
        })?;
        let info = mailbox.recv_filter(EventKind::PanelInfo, config.sync_timeout)?;
        let (panel, extent) = match info.event {
            Event::PanelInfo { panel, extent } => (panel, extent),
            _ => return Err(Error::NotAttached),
        };
        info!("{} attached to panel {:?} at {:?}", name, panel, extent);

        Ok(Application {
            name: name.into(),
            config: config.clone(),
            mailbox,
            server: server.clone(),
            panel: Some(panel),
            extent,
            state: AppState::Exited,
            shown: false,
            closed: false,
            exit_code: 0,
            windows: HashMap::new(),
            modal: None,
            focused: None,
            views: Vec::new(),
            current_view: None,
            next_view: 0,
            on_idle: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The application’s own mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn panel(&self) -> Option<PanelId> {
        self.panel
    }

    /// The panel extent.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// The window that last received `WindowActivate`.
    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    /// The window receiving all input, if a modal loop is running.
    pub fn modal(&self) -> Option<WindowId> {
        self.modal
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    fn attached_panel(&self) -> Result<PanelId> {
        self.panel.ok_or(Error::NotAttached)
    }

    /// Shows the application’s panel.
    pub fn show(&mut self) -> Status {
        let panel = self.attached_panel()?;
        self.server.send_sync(Event::PanelShow { panel })?;
        self.shown = true;
        Ok(())
    }

    /// Hides the application’s panel.
    pub fn hide(&mut self) -> Status {
        let panel = self.attached_panel()?;
        self.server.send_sync(Event::PanelHide { panel })?;
        self.shown = false;
        Ok(())
    }

    /// Detaches from the server panel. Does nothing if already detached.
    pub fn detach(&mut self) -> Status {
        match self.panel.take() {
            Some(panel) => {
                self.shown = false;
                info!("{} detaching from panel {:?}", self.name, panel);
                self.server.send_sync(Event::PanelDetach { panel })
            }
            None => Ok(()),
        }
    }

    /// Runs the event loop until `exit` is called. Returns the exit code.
    pub fn run(&mut self) -> i32 {
        if !self.shown {
            if let Err(err) = self.show() {
                warn!("{}: could not show panel: {}", self.name, err);
            }
        }
        self.closed = false;
        self.state = AppState::Running;
        debug!("{}: running", self.name);

        self.event_loop(None);

        self.state = AppState::Exited;
        debug!("{}: exited with {}", self.name, self.exit_code);
        self.exit_code
    }

    /// Makes the event loop return `code` once the current event has been handled.
    pub fn exit(&mut self, code: i32) {
        self.closed = true;
        self.exit_code = code;
    }

    /// Sets a callback to run whenever no event arrived for an idle interval.
    pub fn set_idle<F: FnMut(&mut Context) + 'static>(&mut self, on_idle: F) {
        self.on_idle = Some(Box::new(on_idle));
    }

    pub fn clear_idle(&mut self) {
        self.on_idle = None;
    }

    /// Adds a view. Views start out hidden.
    pub fn add_view<H: Handler + 'static>(&mut self, handler: H) -> ViewId {
        let id = ViewId(self.next_view);
        self.next_view += 1;
        self.views.push(View {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Adds a view and shows it.
    pub fn set_current_view<H: Handler + 'static>(&mut self, handler: H) -> ViewId {
        let id = self.add_view(handler);
        self.current_view = Some(id);
        self.paint_current_view();
        id
    }

    /// The shown view, which receives the events no window claims.
    pub fn current_view(&self) -> Option<ViewId> {
        self.current_view
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    fn view_index(&self, id: ViewId) -> Result<usize> {
        self.views
            .iter()
            .position(|view| view.id == id)
            .ok_or(Error::UnknownView(id))
    }

    /// Shows a view in place of the current one.
    pub fn show_view(&mut self, id: ViewId) -> Status {
        self.view_index(id)?;
        if self.current_view == Some(id) {
            return Ok(());
        }
        debug!("{}: show view {:?} (was {:?})", self.name, id, self.current_view);
        self.current_view = Some(id);
        self.paint_current_view();
        Ok(())
    }

    /// Hides a view. If it was the current one, the next view (or else the previous one) is
    /// shown instead.
    pub fn hide_view(&mut self, id: ViewId) -> Status {
        let index = self.view_index(id)?;
        if self.current_view != Some(id) {
            return Ok(());
        }
        self.current_view = None;

        let sibling = self
            .views
            .get(index + 1)
            .or_else(|| index.checked_sub(1).and_then(|prev| self.views.get(prev)))
            .map(|view| view.id);
        match sibling {
            Some(sibling) => self.show_view(sibling),
            None => {
                debug!("{}: no view left to show", self.name);
                Ok(())
            }
        }
    }

    /// Removes a view, hiding it first if it is the current one.
    pub fn remove_view(&mut self, id: ViewId) -> Option<Box<dyn Handler>> {
        self.hide_view(id).ok()?;
        let index = self.view_index(id).ok()?;
        Some(self.views.remove(index).handler)
    }

    /// Asks a freshly shown view to draw itself.
    fn paint_current_view(&mut self) {
        if self.shown {
            self.to_current_view(&Event::Paint {
                wid: None,
                rect: Some(self.extent),
            });
        }
    }

    /// Creates a window on the server. It starts out hidden.
    pub fn create_window(&mut self, builder: WindowBuilder) -> Result<WindowId> {
        let wid = WindowId::new();
        self.server.send_sync(Event::WindowCreate {
            wid,
            parent: builder.parent,
            extent: builder.extent,
            style: builder.style,
            title: builder.title.clone(),
            owner: self.mailbox.clone(),
        })?;
        self.windows.insert(wid, builder.build(wid));
        Ok(wid)
    }

    /// Shows a window.
    ///
    /// If `modal` is set, this runs a nested event loop in which the window receives all input,
    /// and returns how the window was ended.
    pub fn show_window(&mut self, id: WindowId, modal: bool) -> Result<Option<ModalCode>> {
        let window = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        window.set_shown();
        if modal {
            window.begin_modal();
        }

        if let Err(err) = self.server.send_sync(Event::WindowShow { wid: id }) {
            if let Some(window) = self.windows.get_mut(&id) {
                window.set_hidden();
                window.end_modal(ModalCode::Cancel);
            }
            return Err(err);
        }

        if modal {
            self.run_modal(id).map(Some)
        } else {
            Ok(None)
        }
    }

    fn run_modal(&mut self, id: WindowId) -> Result<ModalCode> {
        let saved_modal = self.modal.replace(id);
        let saved_focus = self.focused;
        let saved_state = self.state;
        self.state = AppState::Modal;
        debug!("{}: modal loop for {:?}", self.name, id);

        self.event_loop(Some(id));

        self.modal = saved_modal;
        self.focused = saved_focus;
        self.state = saved_state;

        let window = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        if window.is_modal() {
            // the application was closed while the loop ran
            window.end_modal(ModalCode::Cancel);
        }
        let code = window.modal_code();
        let hidden = window.is_hidden();
        let destroy = window.style().contains(WindowStyle::DESTROY_ON_CLOSE);
        debug!("{}: modal loop for {:?} ended with {:?}", self.name, id, code);

        if destroy {
            self.destroy_window(id)?;
        } else if !hidden {
            self.hide_window(id)?;
        }
        Ok(code)
    }

    /// Ends the modal loop of a window.
    pub fn end_modal(&mut self, id: WindowId, code: ModalCode) -> Status {
        let window = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        if window.is_modal() {
            window.end_modal(code);
        }
        Ok(())
    }

    pub fn hide_window(&mut self, id: WindowId) -> Status {
        let window = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        window.set_hidden();
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.server.send_sync(Event::WindowHide { wid: id })
    }

    /// Moves a shown window so that its top left corner is at (x, y).
    pub fn move_window(&mut self, id: WindowId, x: i32, y: i32) -> Status {
        if !self.windows.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        self.server.send_sync(Event::WindowMove { wid: id, x, y })?;
        if let Some(window) = self.windows.get_mut(&id) {
            let extent = window.extent().with_origin(Point2::new(x, y));
            window.set_extent(extent);
        }
        Ok(())
    }

    /// Changes the extent of a hidden window.
    pub fn resize_window(&mut self, id: WindowId, extent: Rect) -> Status {
        if !self.windows.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        self.server.send_sync(Event::WindowResize { wid: id, extent })?;
        if let Some(window) = self.windows.get_mut(&id) {
            window.set_extent(extent);
        }
        Ok(())
    }

    /// Destroys a window and its children.
    ///
    /// A window running a modal loop is destroyed once the loop has ended.
    pub fn destroy_window(&mut self, id: WindowId) -> Status {
        let window = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        if window.is_modal() {
            window.add_style(WindowStyle::DESTROY_ON_CLOSE);
            window.end_modal(ModalCode::Cancel);
            return Ok(());
        }

        self.server.send_sync_urgent(Event::WindowDestroy { wid: id })?;

        let mut doomed = vec![id];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(
                self.windows
                    .values()
                    .filter(|window| window.parent() == Some(parent))
                    .map(|window| window.id()),
            );
            i += 1;
        }
        for wid in doomed {
            self.windows.remove(&wid);
            if self.focused == Some(wid) {
                self.focused = None;
            }
        }
        Ok(())
    }

    /// Registers a rectangle in which the window wants to receive mouse motion.
    pub fn add_monitor(&mut self, id: WindowId, rect: Rect) -> Status {
        self.server.send_sync(Event::MonitorAdd { wid: id, rect })
    }

    pub fn remove_monitor(&mut self, id: WindowId, rect: Rect) -> Status {
        self.server.send_sync(Event::MonitorRemove { wid: id, rect })
    }

    /// Receives and dispatches events until the application is closed or, for a modal loop,
    /// until the modal window ends.
    fn event_loop(&mut self, modal: Option<WindowId>) {
        loop {
            if self.closed {
                break;
            }
            if let Some(id) = modal {
                match self.windows.get(&id) {
                    Some(window) if window.is_modal() => (),
                    _ => break,
                }
            }

            let message = if self.on_idle.is_some() {
                match self.mailbox.recv_timeout(self.config.idle_interval) {
                    Ok(message) => Some(message),
                    Err(Error::Timeout) => None,
                    Err(err) => {
                        warn!("{}: event loop stopped: {}", self.name, err);
                        self.closed = true;
                        break;
                    }
                }
            } else {
                match self.mailbox.recv() {
                    Ok(message) => Some(message),
                    Err(err) => {
                        warn!("{}: event loop stopped: {}", self.name, err);
                        self.closed = true;
                        break;
                    }
                }
            };

            match message {
                Some(message) => self.handle_message(message),
                None => self.idle(),
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        let (event, reply) = message.into_parts();
        self.dispatch(&event);
        if let Some(reply) = reply {
            if let Err(err) = reply.ack(Ok(())) {
                debug!("{}: late acknowledgement: {}", self.name, err);
            }
        }
    }

    fn idle(&mut self) {
        let mut ctx = Context::new(None);
        if let Some(on_idle) = &mut self.on_idle {
            on_idle(&mut ctx);
        }
        self.apply(ctx);
    }

    /// Routes an event to the window or view that should handle it.
    pub(crate) fn dispatch(&mut self, event: &Event) -> bool {
        trace!("{}: dispatch {:?}", self.name, event);

        match event {
            Event::PanelInfo { panel, extent } => {
                self.panel = Some(*panel);
                self.extent = *extent;
                return true;
            }
            Event::PanelShow { .. } => {
                self.shown = true;
                return true;
            }
            Event::PanelHide { .. } => {
                self.shown = false;
                return true;
            }
            Event::PanelDetach { .. } => {
                info!("{}: detached by the server", self.name);
                self.panel = None;
                self.shown = false;
                self.closed = true;
                return true;
            }
            Event::PanelAttach { .. } => return true,
            Event::WindowActivate { wid } => self.focused = Some(*wid),
            Event::WindowDeactivate { wid } => {
                if self.focused == Some(*wid) {
                    self.focused = None;
                }
            }
            _ => (),
        }

        if event.is_input() {
            if let Some(modal) = self.modal {
                return self.deliver(modal, event);
            }
        }

        match event.window() {
            Some(wid) if self.windows.contains_key(&wid) => self.deliver(wid, event),
            _ => self.to_current_view(event),
        }
    }

    fn deliver(&mut self, wid: WindowId, event: &Event) -> bool {
        let mut window = match self.windows.remove(&wid) {
            Some(window) => window,
            None => return self.to_current_view(event),
        };
        let mut ctx = Context::new(Some(wid));
        let handled = window.handle(&mut ctx, event);
        self.windows.insert(wid, window);
        self.apply(ctx);
        handled
    }

    fn to_current_view(&mut self, event: &Event) -> bool {
        let mut ctx = Context::new(event.window());
        let current = self.current_view;
        let handled = match self.views.iter_mut().find(|view| Some(view.id) == current) {
            Some(view) => view.handler.handle(&mut ctx, event),
            None => false,
        };
        self.apply(ctx);
        handled
    }

    /// Carries out what a handler asked for.
    fn apply(&mut self, ctx: Context) {
        for request in ctx.into_requests() {
            let status = match request {
                Request::ShowWindow(id) => self.show_window(id, false).map(|_| ()),
                Request::HideWindow(id) => self.hide_window(id),
                Request::MoveWindow(id, x, y) => self.move_window(id, x, y),
                Request::DestroyWindow(id) => self.destroy_window(id),
                Request::EndModal(id, code) => self.end_modal(id, code),
                Request::Reshow(id) => self.server.send(Event::WindowActivate { wid: id }),
                Request::Exit(code) => {
                    self.exit(code);
                    Ok(())
                }
            };
            if let Err(err) = status {
                warn!("{}: {:?} failed: {}", self.name, request, err);
            }
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if let Err(err) = self.detach() {
            debug!("{}: detach on drop failed: {}", self.name, err);
        }
        self.mailbox.close();
    }
}
