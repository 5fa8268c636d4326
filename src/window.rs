//! Client-side window objects.

use crate::context::{Context, Handler};
use crate::events::{Event, ModalCode};
use crate::rect::Rect;
use crate::region::Region;
use crate::topwin::WindowId;
use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Window style, chosen at creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowStyle: u8 {
        /// No title bar.
        const NO_TITLE = 0x01;
        /// No border.
        const NO_BORDER = 0x02;
        /// The title bar has a close box.
        const CLOSEBOX = 0x04;
        /// Never receives keyboard focus.
        const NO_FOCUS = 0x08;
        /// Destroy the window once it has been closed.
        const DESTROY_ON_CLOSE = 0x10;
    }
}

impl Default for WindowStyle {
    fn default() -> WindowStyle {
        WindowStyle::CLOSEBOX
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct WindowFlags: u8 {
        const HIDDEN = 0x01;
        const ACTIVATED = 0x02;
        const MODAL = 0x04;
        const CLOSED = 0x08;
    }
}

/// A window callback. Returning false from `on_close` keeps the window open.
pub type Callback = Box<dyn FnMut(&mut Context, &Event) -> bool>;

/// Describes a window to create.
pub struct WindowBuilder {
    pub(crate) parent: Option<WindowId>,
    pub(crate) title: String,
    pub(crate) extent: Rect,
    pub(crate) style: WindowStyle,
    on_activate: Option<Callback>,
    on_deactivate: Option<Callback>,
    on_close: Option<Callback>,
    content: Option<Box<dyn Handler>>,
}

impl WindowBuilder {
    pub fn new(title: &str, extent: Rect) -> WindowBuilder {
        WindowBuilder {
            parent: None,
            title: title.into(),
            extent,
            style: WindowStyle::default(),
            on_activate: None,
            on_deactivate: None,
            on_close: None,
            content: None,
        }
    }

    /// Makes the window a child of another top-level window.
    pub fn parent(mut self, parent: WindowId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn style(mut self, style: WindowStyle) -> Self {
        self.style = style;
        self
    }

    pub fn on_activate<F: FnMut(&mut Context, &Event) -> bool + 'static>(mut self, f: F) -> Self {
        self.on_activate = Some(Box::new(f));
        self
    }

    pub fn on_deactivate<F: FnMut(&mut Context, &Event) -> bool + 'static>(mut self, f: F) -> Self {
        self.on_deactivate = Some(Box::new(f));
        self
    }

    pub fn on_close<F: FnMut(&mut Context, &Event) -> bool + 'static>(mut self, f: F) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Sets the handler that receives paint and input events for the window’s contents.
    pub fn content<H: Handler + 'static>(mut self, content: H) -> Self {
        self.content = Some(Box::new(content));
        self
    }

    pub(crate) fn build(self, id: WindowId) -> Window {
        Window {
            id,
            parent: self.parent,
            title: self.title,
            extent: self.extent,
            style: self.style,
            flags: WindowFlags::HIDDEN,
            clip: Region::new(),
            modal_code: ModalCode::Ok,
            on_activate: self.on_activate,
            on_deactivate: self.on_deactivate,
            on_close: self.on_close,
            content: self.content,
        }
    }
}

/// A top-level window as seen by its application.
pub struct Window {
    id: WindowId,
    parent: Option<WindowId>,
    title: String,
    extent: Rect,
    style: WindowStyle,
    flags: WindowFlags,
    /// Last clip received from the server.
    clip: Region,
    modal_code: ModalCode,
    on_activate: Option<Callback>,
    on_deactivate: Option<Callback>,
    on_close: Option<Callback>,
    content: Option<Box<dyn Handler>>,
}

impl Window {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn extent(&self) -> Rect {
        self.extent
    }

    pub fn style(&self) -> WindowStyle {
        self.style
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(WindowFlags::HIDDEN)
    }

    pub fn is_activated(&self) -> bool {
        self.flags.contains(WindowFlags::ACTIVATED)
    }

    pub fn is_modal(&self) -> bool {
        self.flags.contains(WindowFlags::MODAL)
    }

    pub fn is_closed(&self) -> bool {
        self.flags.contains(WindowFlags::CLOSED)
    }

    /// The visible part of the window body, as last computed by the server.
    pub fn clip(&self) -> &Region {
        &self.clip
    }

    pub fn modal_code(&self) -> ModalCode {
        self.modal_code
    }

    pub(crate) fn set_shown(&mut self) {
        self.flags.remove(WindowFlags::HIDDEN | WindowFlags::CLOSED);
    }

    pub(crate) fn set_hidden(&mut self) {
        self.flags.insert(WindowFlags::HIDDEN);
        self.flags.remove(WindowFlags::ACTIVATED);
    }

    pub(crate) fn begin_modal(&mut self) {
        self.flags.insert(WindowFlags::MODAL);
        self.modal_code = ModalCode::Ok;
    }

    pub(crate) fn end_modal(&mut self, code: ModalCode) {
        self.flags.remove(WindowFlags::MODAL);
        self.modal_code = code;
    }

    pub(crate) fn set_extent(&mut self, extent: Rect) {
        self.extent = extent;
    }

    pub(crate) fn add_style(&mut self, style: WindowStyle) {
        self.style.insert(style);
    }

    fn forward(&mut self, ctx: &mut Context, event: &Event) -> bool {
        match &mut self.content {
            Some(content) => content.handle(ctx, event),
            None => false,
        }
    }

    fn close(&mut self, ctx: &mut Context, event: &Event) -> bool {
        if let Some(on_close) = &mut self.on_close {
            if !on_close(ctx, event) {
                return false;
            }
        }

        ctx.hide_window(self.id);
        self.flags.insert(WindowFlags::CLOSED);

        if self.is_modal() {
            ctx.end_modal(self.id, ModalCode::Cancel);
        } else if self.style.contains(WindowStyle::DESTROY_ON_CLOSE) {
            ctx.destroy_window(self.id);
        }
        true
    }
}

impl Handler for Window {
    fn handle(&mut self, ctx: &mut Context, event: &Event) -> bool {
        match event {
            Event::WindowActivate { .. } => {
                if self.is_hidden() {
                    // stale activation for a window we already hid
                    return true;
                }
                self.flags.insert(WindowFlags::ACTIVATED);
                self.forward(ctx, event);
                if let Some(on_activate) = &mut self.on_activate {
                    on_activate(ctx, event);
                }
                true
            }
            Event::WindowDeactivate { .. } => {
                if self.is_modal() {
                    // a modal window keeps the focus
                    ctx.reshow(self.id);
                } else {
                    self.flags.remove(WindowFlags::ACTIVATED);
                    self.forward(ctx, event);
                    if let Some(on_deactivate) = &mut self.on_deactivate {
                        on_deactivate(ctx, event);
                    }
                }
                true
            }
            Event::WindowClose { .. } => {
                self.close(ctx, event);
                true
            }
            Event::WindowMove { x, y, .. } => {
                ctx.move_window(self.id, *x, *y);
                true
            }
            Event::ClipInfo { clip, .. } => {
                self.clip = clip.clone();
                true
            }
            Event::Paint { .. } => {
                self.forward(ctx, event);
                true
            }
            _ => self.forward(ctx, event),
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("extent", &self.extent)
            .field("style", &self.style)
            .field("flags", &self.flags)
            .finish()
    }
}
