//! The window server.

use crate::channel::{Mailbox, Message};
use crate::clip::ClipTable;
use crate::config::Config;
use crate::error::{Error, Status};
use crate::events::{Event, MouseButtons, PanelId};
use crate::frame::{Decorator, NullDecorator};
use crate::rect::Rect;
use crate::topwin::{Registry, WindowSpec};
use cgmath::Point2;
use log::{debug, error, info, trace, warn};
use std::io;
use std::thread::{self, JoinHandle};

/// A panel: the part of the screen an application’s windows live on.
#[derive(Debug)]
struct Panel {
    id: PanelId,
    name: String,
    extent: Rect,
    /// The attached application.
    owner: Option<Mailbox>,
    shown: bool,
}

/// The window server.
///
/// Owns the window registry. Everybody else talks to it by posting events to its mailbox.
pub struct Server {
    mailbox: Mailbox,
    registry: Registry,
    panels: Vec<Panel>,
}

impl Server {
    /// Creates a server that draws no frames.
    pub fn new(config: &Config) -> Server {
        Server::with_decorator(config, Box::new(NullDecorator))
    }

    pub fn with_decorator(config: &Config, decorator: Box<dyn Decorator>) -> Server {
        let mailbox =
            Mailbox::with_sync_timeout("server", config.mailbox_capacity(), config.sync_timeout);
        let panels = config
            .panels
            .iter()
            .enumerate()
            .map(|(i, panel)| Panel {
                id: PanelId(i as u32),
                name: panel.name.clone(),
                extent: panel.extent,
                owner: None,
                shown: false,
            })
            .collect();

        Server {
            mailbox,
            registry: Registry::new(config.screen_bounds(), config.frame, decorator),
            panels,
        }
    }

    /// The server’s mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Shared handle to the computed clip regions.
    pub fn clips(&self) -> ClipTable {
        self.registry.clips()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the server on its own thread.
    pub fn spawn(self) -> io::Result<ServerHandle> {
        let mailbox = self.mailbox.clone();
        let clips = self.clips();
        let thread = thread::Builder::new()
            .name("roost-server".into())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            mailbox,
            clips,
            thread: Some(thread),
        })
    }

    /// Processes messages until a `Shutdown` event arrives or the mailbox is closed.
    pub fn run(mut self) {
        info!("window server started ({} panels)", self.panels.len());

        loop {
            let message = match self.mailbox.recv() {
                Ok(message) => message,
                Err(_) => break,
            };
            if !self.handle_message(message) {
                break;
            }
        }

        for panel in &self.panels {
            if let Some(owner) = &panel.owner {
                // the application may already be gone
                if let Err(err) = owner.send(Event::PanelDetach { panel: panel.id }) {
                    warn!("could not detach {:?} from panel {:?}: {}", owner, panel.name, err);
                }
            }
        }
        self.mailbox.close();
        info!("window server stopped");
    }

    /// Handles one message, acknowledging it if it’s synchronous.
    ///
    /// Returns false once the server should stop.
    pub fn handle_message(&mut self, message: Message) -> bool {
        let (event, reply) = message.into_parts();
        trace!("server: {:?}", event);

        if let Event::Shutdown = event {
            if let Some(reply) = reply {
                if let Err(err) = reply.ack(Ok(())) {
                    warn!("could not acknowledge shutdown: {}", err);
                }
            }
            return false;
        }

        let status = self.handle_event(event);
        match reply {
            Some(reply) => {
                if reply.ack(status).is_err() {
                    error!("could not acknowledge request: requester is gone");
                }
            }
            None => {
                if let Err(err) = status {
                    warn!("request failed: {}", err);
                }
            }
        }
        true
    }

    fn panel_mut(&mut self, id: PanelId) -> Result<&mut Panel, Error> {
        self.panels
            .iter_mut()
            .find(|panel| panel.id == id)
            .ok_or_else(|| Error::UnknownPanel(format!("#{}", id.0)))
    }

    fn handle_event(&mut self, event: Event) -> Status {
        if event.is_input() {
            self.route_input(&event);
            return Ok(());
        }

        match event {
            Event::PanelAttach { panel, app } => {
                let panel = self
                    .panels
                    .iter_mut()
                    .find(|p| p.name == panel)
                    .ok_or(Error::UnknownPanel(panel))?;
                info!("{} attached to panel {:?}", app.name(), panel.name);
                app.send(Event::PanelInfo {
                    panel: panel.id,
                    extent: panel.extent,
                })?;
                panel.owner = Some(app);
                Ok(())
            }
            Event::PanelDetach { panel } => {
                let panel = self.panel_mut(panel)?;
                info!("panel {:?} detached", panel.name);
                panel.owner = None;
                panel.shown = false;
                Ok(())
            }
            Event::PanelShow { panel } => {
                let panel = self.panel_mut(panel)?;
                debug!("show panel {:?}", panel.name);
                panel.shown = true;
                Ok(())
            }
            Event::PanelHide { panel } => {
                let panel = self.panel_mut(panel)?;
                debug!("hide panel {:?}", panel.name);
                panel.shown = false;
                let extent = panel.extent;
                self.registry.redraw(extent);
                Ok(())
            }
            Event::WindowCreate {
                wid,
                parent,
                extent,
                style,
                title,
                owner,
            } => self
                .registry
                .add(WindowSpec {
                    wid,
                    parent,
                    extent,
                    style,
                    title,
                    owner,
                })
                .map(|_| ()),
            Event::WindowDestroy { wid } => self.registry.remove(wid),
            Event::WindowShow { wid } => self.registry.show(wid),
            Event::WindowHide { wid } => self.registry.hide(wid),
            Event::WindowMove { wid, x, y } => self.registry.move_to(wid, x, y),
            Event::WindowResize { wid, extent } => self.registry.resize(wid, extent),
            Event::WindowActivate { wid } => self.registry.activate(wid),
            Event::MonitorAdd { wid, rect } => self.registry.append_monitor(wid, rect),
            Event::MonitorRemove { wid, rect } => self.registry.remove_monitor(wid, rect),
            Event::Paint { rect, .. } => {
                let rect = rect.unwrap_or(self.registry.screen);
                if rect.fits(0) {
                    self.registry.redraw(rect);
                } else {
                    warn!("ignoring paint request for {:?}", rect);
                }
                Ok(())
            }
            other => {
                debug!("server ignores {:?}", other);
                Ok(())
            }
        }
    }

    /// Routes pointer input to the window under the pointer and keys to the focused window.
    fn route_input(&mut self, event: &Event) {
        match *event {
            Event::MouseButton {
                position, buttons, ..
            } => self.mouse_button(event, position, buttons),
            Event::MouseMotion { position, .. } => {
                if let Some(id) = self.registry.find_at(position) {
                    if self.registry.monitors_contain(id, position) {
                        self.registry.notify(id, event.addressed_to(id));
                    }
                }
            }
            Event::Key { .. } => {
                if let Some(id) = self.registry.focused() {
                    self.registry.notify(id, event.addressed_to(id));
                }
            }
            _ => (),
        }
    }

    fn mouse_button(&mut self, event: &Event, position: Point2<i32>, buttons: MouseButtons) {
        let id = match self.registry.find_at(position) {
            Some(id) => id,
            None => return,
        };

        let pressed = buttons.contains(MouseButtons::LEFT | MouseButtons::DOWN);
        if pressed && self.registry.focused() != Some(id) {
            if let Err(err) = self.registry.activate(id) {
                warn!("click to activate {:?} failed: {}", id, err);
            }
        }
        self.registry.frame_mouse(id, event);
    }
}

/// A server running on its own thread.
///
/// Dropping the handle stops the server.
pub struct ServerHandle {
    mailbox: Mailbox,
    clips: ClipTable,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The server’s mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn clips(&self) -> &ClipTable {
        &self.clips
    }

    /// Posts an event to the server (e.g. input from a driver).
    pub fn post(&self, event: Event) -> Status {
        self.mailbox.send(event)
    }

    /// Stops the server and waits for its thread to exit.
    pub fn shutdown(self) {
        drop(self);
    }

    fn stop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if self.mailbox.send_urgent(Event::Shutdown).is_err() {
                // full or already closed; closing the mailbox stops the loop either way
                self.mailbox.close();
            }
            if thread.join().is_err() {
                error!("window server thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
