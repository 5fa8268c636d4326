//! The top-level window registry.
//!
//! Windows form a forest. Each level (the roots, or the children of one window) is ordered from
//! the frontmost to the backmost window; shown windows always come before hidden ones. A child
//! is always in front of its parent, so the front-to-back z-order of the whole screen is:
//! for every window of a level in order, first its children (recursively), then the window.
//!
//! The window holding the keyboard focus is raised to the front of every level on its ancestor
//! chain, which makes it the frontmost window on screen.

use crate::channel::Mailbox;
use crate::clip::ClipTable;
use crate::config::FrameMetrics;
use crate::error::{Error, Result};
use crate::events::{Event, MouseButtons};
use crate::frame::{Decorator, Frame, TitleBar};
use crate::rect::Rect;
use crate::region::Region;
use crate::window::WindowStyle;
use bitflags::bitflags;
use cgmath::{Point2, Vector2};
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// A unique identifier for a top-level window.
///
/// (this is just a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(u32, u16, u16, [u8; 8]);

impl WindowId {
    pub fn new() -> WindowId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        WindowId(a, b, c, *d)
    }
}

bitflags! {
    /// Server-side window state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TopFlags: u8 {
        const SHOWN = 0x01;
        const ACTIVATED = 0x02;
        /// The close box is being held down.
        const CLOSE_PRESSED = 0x04;
        const NO_FOCUS = 0x08;
        const CLOSEBOX = 0x10;
    }
}

/// What the registry needs to know to create a window.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub wid: WindowId,
    pub parent: Option<WindowId>,
    pub extent: Rect,
    pub style: WindowStyle,
    pub title: String,
    /// The thread that receives this window’s events.
    pub owner: Mailbox,
}

/// A top-level window known to the server.
#[derive(Debug)]
pub struct TopWindow {
    id: WindowId,
    owner: Mailbox,
    extent: Rect,
    style: WindowStyle,
    title: Option<TitleBar>,
    flags: TopFlags,
    parent: Option<WindowId>,
    /// Front to back.
    children: Vec<WindowId>,
    monitors: Vec<Rect>,
}

impl TopWindow {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn owner(&self) -> &Mailbox {
        &self.owner
    }

    /// The window body.
    pub fn extent(&self) -> Rect {
        self.extent
    }

    pub fn title(&self) -> Option<&TitleBar> {
        self.title.as_ref()
    }

    pub fn flags(&self) -> TopFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    /// Child windows, front to back.
    pub fn children(&self) -> &[WindowId] {
        &self.children
    }

    pub fn monitors(&self) -> &[Rect] {
        &self.monitors
    }

    pub fn is_shown(&self) -> bool {
        self.flags.contains(TopFlags::SHOWN)
    }

    pub fn is_activated(&self) -> bool {
        self.flags.contains(TopFlags::ACTIVATED)
    }

    /// The area the window covers on screen, frame included.
    pub fn frame_extent(&self) -> Rect {
        match &self.title {
            Some(title) => title.extent,
            None => self.extent,
        }
    }

    fn frame_contains(&self, point: Point2<i32>) -> bool {
        self.frame_extent().contains(point)
    }
}

/// The registry of all top-level windows.
///
/// Owned by the server thread; all operations run to completion (including clip recomputation
/// and redraw notifications) before they return.
pub struct Registry {
    pub(crate) windows: HashMap<WindowId, TopWindow>,
    /// Root-level windows, front to back.
    pub(crate) roots: Vec<WindowId>,
    pub(crate) screen: Rect,
    pub(crate) clips: ClipTable,
    metrics: FrameMetrics,
    decorator: Box<dyn Decorator>,
}

impl Registry {
    pub fn new(screen: Rect, metrics: FrameMetrics, decorator: Box<dyn Decorator>) -> Registry {
        Registry {
            windows: HashMap::new(),
            roots: Vec::new(),
            screen,
            clips: ClipTable::new(),
            metrics,
            decorator,
        }
    }

    /// Shared handle to the computed clip regions.
    pub fn clips(&self) -> ClipTable {
        self.clips.clone()
    }

    pub fn get(&self, id: WindowId) -> Option<&TopWindow> {
        self.windows.get(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Root-level windows, front to back.
    pub fn roots(&self) -> &[WindowId] {
        &self.roots
    }

    fn node(&self, id: WindowId) -> Result<&TopWindow> {
        self.windows.get(&id).ok_or(Error::NotFound(id))
    }

    /// How far a window frame may reach beyond the body.
    fn frame_margin(&self) -> i32 {
        self.metrics.border_size + self.metrics.title_height
    }

    fn level_mut(&mut self, parent: Option<WindowId>) -> &mut Vec<WindowId> {
        match parent {
            Some(parent) => {
                &mut self
                    .windows
                    .get_mut(&parent)
                    .expect("window level refers to a missing parent")
                    .children
            }
            None => &mut self.roots,
        }
    }

    /// Registers a window. New windows start out hidden at the back of their level.
    pub fn add(&mut self, new: WindowSpec) -> Result<WindowId> {
        if self.windows.contains_key(&new.wid) {
            return Err(Error::Duplicate(new.wid));
        }
        if let Some(parent) = new.parent {
            if !self.windows.contains_key(&parent) {
                return Err(Error::OrphanParent(parent));
            }
        }
        if !new.extent.fits(self.frame_margin()) {
            return Err(Error::BadGeometry(new.wid));
        }

        let mut flags = TopFlags::empty();
        if new.style.contains(WindowStyle::NO_FOCUS) {
            flags |= TopFlags::NO_FOCUS;
        }
        if new.style.contains(WindowStyle::CLOSEBOX) {
            flags |= TopFlags::CLOSEBOX;
        }

        let title = TitleBar::new(new.extent, new.style, &new.title, &self.metrics);
        let id = new.wid;
        debug!("add window {:?} {:?} parent {:?}", id, new.title, new.parent);

        self.windows.insert(
            id,
            TopWindow {
                id,
                owner: new.owner,
                extent: new.extent,
                style: new.style,
                title,
                flags,
                parent: new.parent,
                children: Vec::new(),
                monitors: Vec::new(),
            },
        );
        self.level_mut(new.parent).push(id);
        Ok(id)
    }

    /// Removes a window and all of its descendants.
    pub fn remove(&mut self, id: WindowId) -> Result<()> {
        let node = self.node(id)?;
        let was_shown = node.is_shown();
        let parent = node.parent;
        let focus = self.focused();

        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        let had_focus = focus.map_or(false, |focus| subtree.contains(&focus));

        self.level_mut(parent).retain(|sibling| *sibling != id);

        let mut dirty = Region::new();
        {
            let mut clips = self.clips.lock();
            for wid in &subtree {
                if let Some(node) = self.windows.remove(wid) {
                    // frame and monitor list go with the node
                    dirty.union_rect(node.frame_extent());
                }
                clips.remove(wid);
            }
        }
        debug!("removed window {:?} ({} windows in subtree)", id, subtree.len());

        if was_shown {
            self.update_clip();
        }
        if had_focus {
            self.activate_next();
        }
        if let Some(dirty) = dirty.extents() {
            self.redraw(dirty);
        }
        Ok(())
    }

    /// Collects a window and all of its descendants, depth first.
    fn collect_subtree(&self, id: WindowId, out: &mut Vec<WindowId>) {
        if let Some(node) = self.windows.get(&id) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
            out.push(id);
        }
    }

    /// Returns true if every ancestor of the window is shown.
    fn could_show(&self, id: WindowId) -> bool {
        let mut parent = self.windows.get(&id).and_then(|node| node.parent);
        while let Some(id) = parent {
            match self.windows.get(&id) {
                Some(node) if node.is_shown() => parent = node.parent,
                _ => return false,
            }
        }
        true
    }

    fn set_subtree_shown(&mut self, id: WindowId, shown: bool) {
        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        for wid in subtree {
            if let Some(node) = self.windows.get_mut(&wid) {
                if shown {
                    node.flags.insert(TopFlags::SHOWN);
                } else {
                    node.flags
                        .remove(TopFlags::SHOWN | TopFlags::ACTIVATED | TopFlags::CLOSE_PRESSED);
                }
            }
        }
    }

    /// Shows a window along with its descendants, then raises and activates it.
    ///
    /// Showing an already shown window only raises and activates it.
    pub fn show(&mut self, id: WindowId) -> Result<()> {
        let node = self.node(id)?;
        if !self.could_show(id) {
            return Err(Error::AncestorHidden(id));
        }

        let newly_shown = !node.is_shown();
        if newly_shown {
            debug!("show window {:?}", id);
            self.set_subtree_shown(id, true);
        }

        self.raise(id);
        self.update_clip();
        if newly_shown {
            self.draw_tree(id);
        }
        self.focus(id);
        Ok(())
    }

    /// Hides a window along with its descendants.
    pub fn hide(&mut self, id: WindowId) -> Result<()> {
        let node = self.node(id)?;
        if !node.is_shown() {
            return Ok(());
        }
        let parent = node.parent;
        let old_extent = node.frame_extent();

        let mut subtree = Vec::new();
        self.collect_subtree(id, &mut subtree);
        let had_focus = self
            .focused()
            .map_or(false, |focus| subtree.contains(&focus));

        debug!("hide window {:?}", id);
        self.set_subtree_shown(id, false);

        // hidden windows live at the back of their level
        let level = self.level_mut(parent);
        level.retain(|sibling| *sibling != id);
        level.push(id);

        self.update_clip();
        self.redraw(old_extent);

        if had_focus {
            self.activate_next();
        }
        Ok(())
    }

    /// Moves a window (and its whole ancestor chain) to the front of their levels.
    fn raise(&mut self, id: WindowId) {
        let mut current = id;
        loop {
            let parent = self.windows[&current].parent;
            let level = self.level_mut(parent);
            if let Some(pos) = level.iter().position(|sibling| *sibling == current) {
                let wid = level.remove(pos);
                level.insert(0, wid);
            }
            match parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }

    /// Raises a window and gives it the keyboard focus.
    ///
    /// The previously focused window is deactivated first. Windows with `NO_FOCUS` are only
    /// raised.
    pub fn activate(&mut self, id: WindowId) -> Result<()> {
        let node = self.node(id)?;
        if !node.is_shown() {
            return Err(Error::NotShown(id));
        }

        self.raise(id);
        self.update_clip();
        self.focus(id);
        Ok(())
    }

    /// Moves the keyboard focus to an already raised window.
    fn focus(&mut self, id: WindowId) {
        let no_focus = self
            .windows
            .get(&id)
            .map_or(true, |node| node.flags.contains(TopFlags::NO_FOCUS));
        let old_focus = self.focused();
        if no_focus || old_focus == Some(id) {
            return;
        }

        debug!("activate window {:?} (was {:?})", id, old_focus);
        if let Some(old_focus) = old_focus {
            self.deactivate(old_focus);
        }
        self.mark_activated(id);
    }

    fn deactivate(&mut self, id: WindowId) {
        if let Some(node) = self.windows.get_mut(&id) {
            node.flags.remove(TopFlags::ACTIVATED);
        }
        self.notify(id, Event::WindowDeactivate { wid: id });
        self.draw_frame(id);
    }

    fn mark_activated(&mut self, id: WindowId) {
        if let Some(node) = self.windows.get_mut(&id) {
            node.flags.insert(TopFlags::ACTIVATED);
        }
        self.notify(id, Event::WindowActivate { wid: id });
        self.draw_frame(id);
    }

    /// Activates the frontmost shown window that accepts focus, if there is one.
    fn activate_next(&mut self) {
        let next = self.zorder().into_iter().find(|id| {
            !self.windows[id].flags.contains(TopFlags::NO_FOCUS)
        });
        if let Some(next) = next {
            if let Err(err) = self.activate(next) {
                warn!("could not activate {:?}: {}", next, err);
            }
        }
    }

    /// The window holding the keyboard focus.
    pub fn focused(&self) -> Option<WindowId> {
        self.windows
            .values()
            .find(|node| node.is_activated())
            .map(|node| node.id)
    }

    /// Moves a shown window so that its top left corner is at (x, y).
    pub fn move_to(&mut self, id: WindowId, x: i32, y: i32) -> Result<()> {
        let node = self.node(id)?;
        if !node.is_shown() {
            return Err(Error::NotShown(id));
        }

        // everything is checked before anything moves
        let extent = node.extent.with_origin(Point2::new(x, y));
        let delta = match (
            x.checked_sub(node.extent.origin.x),
            y.checked_sub(node.extent.origin.y),
        ) {
            (Some(dx), Some(dy)) if extent.fits(self.frame_margin()) => Vector2::new(dx, dy),
            _ => return Err(Error::BadGeometry(id)),
        };
        let monitors = node
            .monitors
            .iter()
            .map(|monitor| monitor.checked_translate(delta))
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::BadGeometry(id))?;
        let old_extent = node.frame_extent();
        debug!("move window {:?} by {:?}", id, (delta.x, delta.y));

        let node = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        node.extent = extent;
        if let Some(title) = &mut node.title {
            title.translate(delta);
        }
        node.monitors = monitors;
        let new_extent = node.frame_extent();

        self.update_clip();
        self.redraw(old_extent);
        self.draw_frame(id);

        if !old_extent.intersects(new_extent) {
            // nothing of the old contents is on screen anymore
            self.notify(
                id,
                Event::Paint {
                    wid: Some(id),
                    rect: None,
                },
            );
        }
        Ok(())
    }

    /// Changes the extent of a hidden window.
    pub fn resize(&mut self, id: WindowId, extent: Rect) -> Result<()> {
        let metrics = self.metrics;
        let node = self.node(id)?;
        if node.is_shown() {
            return Err(Error::StillShown(id));
        }
        if !extent.fits(self.frame_margin()) {
            return Err(Error::BadGeometry(id));
        }
        debug!("resize window {:?} to {:?}", id, extent);

        let mut dirty = Region::from_rect(node.frame_extent());
        let node = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        node.extent = extent;
        if let Some(title) = &mut node.title {
            if let Some(frame) = TitleBar::layout(extent, node.style, &metrics) {
                title.extent = frame;
            }
        }
        dirty.union_rect(node.frame_extent());

        self.update_clip();
        if let Some(dirty) = dirty.extents() {
            self.redraw(dirty);
        }
        Ok(())
    }

    /// Finds the frontmost shown window covering a point.
    pub fn find_at(&self, point: Point2<i32>) -> Option<WindowId> {
        self.find_in_level(&self.roots, point)
    }

    fn find_in_level(&self, level: &[WindowId], point: Point2<i32>) -> Option<WindowId> {
        for id in level {
            let node = &self.windows[id];
            if !node.is_shown() {
                continue;
            }
            // children are in front of their parent
            if let Some(found) = self.find_in_level(&node.children, point) {
                return Some(found);
            }
            if node.frame_contains(point) {
                return Some(*id);
            }
        }
        None
    }

    /// All shown windows, front to back.
    pub fn zorder(&self) -> Vec<WindowId> {
        let mut order = Vec::with_capacity(self.windows.len());
        self.collect_zorder(&self.roots, &mut order);
        order
    }

    fn collect_zorder(&self, level: &[WindowId], out: &mut Vec<WindowId>) {
        for id in level {
            let node = &self.windows[id];
            if node.is_shown() {
                self.collect_zorder(&node.children, out);
                out.push(*id);
            }
        }
    }

    /// Sends a paint event to every shown window touching `rect`, back to front.
    pub fn redraw(&mut self, rect: Rect) {
        let order = self.zorder();
        for id in order.into_iter().rev() {
            if self.windows[&id].frame_extent().intersects(rect) {
                self.notify(
                    id,
                    Event::Paint {
                        wid: Some(id),
                        rect: Some(rect),
                    },
                );
                self.draw_frame(id);
            }
        }
    }

    /// Paints a freshly shown subtree, parents before their children.
    fn draw_tree(&mut self, id: WindowId) {
        self.draw_frame(id);
        self.notify(
            id,
            Event::Paint {
                wid: Some(id),
                rect: None,
            },
        );

        let children = self.windows[&id].children.clone();
        for child in children.into_iter().rev() {
            if self.windows[&child].is_shown() {
                self.draw_tree(child);
            }
        }
    }

    pub(crate) fn draw_frame(&mut self, id: WindowId) {
        let node = match self.windows.get(&id) {
            Some(node) => node,
            None => return,
        };
        let title = match &node.title {
            Some(title) => title,
            None => return,
        };
        let clip = self
            .clips
            .get(id)
            .and_then(|clip| clip.frame)
            .unwrap_or_default();

        self.decorator.draw_frame(&Frame {
            wid: id,
            title,
            body: node.extent,
            clip: &clip,
            focused: node.is_activated(),
            closable: node.flags.contains(TopFlags::CLOSEBOX),
            close_pressed: node.flags.contains(TopFlags::CLOSE_PRESSED),
        });
    }

    /// Posts a best-effort notification to a window’s owner.
    pub(crate) fn notify(&self, id: WindowId, event: Event) {
        if let Some(node) = self.windows.get(&id) {
            if let Err(err) = node.owner.send(event) {
                warn!(
                    "dropping notification for window {:?} ({:?}): {}",
                    id, node.owner, err
                );
            }
        }
    }

    /// Registers a mouse monitor rectangle.
    pub fn append_monitor(&mut self, id: WindowId, rect: Rect) -> Result<()> {
        let node = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        if !rect.fits(0) {
            return Err(Error::BadGeometry(id));
        }
        node.monitors.push(rect);
        Ok(())
    }

    pub fn remove_monitor(&mut self, id: WindowId, rect: Rect) -> Result<()> {
        let node = self.windows.get_mut(&id).ok_or(Error::NotFound(id))?;
        if let Some(pos) = node.monitors.iter().position(|monitor| *monitor == rect) {
            node.monitors.remove(pos);
        }
        Ok(())
    }

    /// Returns true if one of the window’s monitor rectangles contains the point.
    pub fn monitors_contain(&self, id: WindowId, point: Point2<i32>) -> bool {
        self.windows
            .get(&id)
            .map_or(false, |node| node.monitors.iter().any(|m| m.contains(point)))
    }

    /// Handles a mouse button event on a window or its frame.
    ///
    /// Events inside the body go to the owner. On the frame, a left click on the close box
    /// sends `WindowClose` once the button is released inside the box again.
    pub fn frame_mouse(&mut self, id: WindowId, event: &Event) {
        let (position, buttons) = match *event {
            Event::MouseButton {
                position, buttons, ..
            } => (position, buttons),
            _ => return,
        };
        let metrics = self.metrics;
        let node = match self.windows.get(&id) {
            Some(node) => node,
            None => return,
        };

        if node.extent.contains(position) {
            self.notify(id, event.addressed_to(id));
            return;
        }

        let close_box = match &node.title {
            Some(title) if node.flags.contains(TopFlags::CLOSEBOX) => title.close_box(&metrics),
            _ => return,
        };
        if !buttons.contains(MouseButtons::LEFT) {
            return;
        }

        let inside = close_box.contains(position);
        let pressed = node.flags.contains(TopFlags::CLOSE_PRESSED);

        if buttons.contains(MouseButtons::DOWN) && inside {
            if let Some(node) = self.windows.get_mut(&id) {
                node.flags.insert(TopFlags::CLOSE_PRESSED);
            }
            self.draw_frame(id);
        } else if buttons.contains(MouseButtons::UP) && pressed {
            if let Some(node) = self.windows.get_mut(&id) {
                node.flags.remove(TopFlags::CLOSE_PRESSED);
            }
            self.draw_frame(id);
            if inside {
                self.notify(id, Event::WindowClose { wid: id });
            }
        }
    }
}
