//! Clip computation.
//!
//! The visible part of every shown window is computed in one front-to-back pass over the z-order:
//! starting with the whole screen as the available region, each window takes what is left of it
//! inside its extent, and then removes its frame extent from what’s available to the windows
//! behind it.

use crate::events::Event;
use crate::region::Region;
use crate::topwin::{Registry, WindowId};
use log::trace;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// The visible parts of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowClip {
    /// The visible part of the window body.
    pub body: Region,
    /// The visible part of the frame, never overlapping the body. None for frameless windows.
    pub frame: Option<Region>,
}

/// Clip regions of all shown windows, shared between the server and whoever draws.
///
/// The table is locked for the whole duration of a recomputation, so readers never see a
/// half-updated set of regions.
#[derive(Debug, Clone, Default)]
pub struct ClipTable(Arc<Mutex<HashMap<WindowId, WindowClip>>>);

impl ClipTable {
    pub fn new() -> ClipTable {
        ClipTable::default()
    }

    /// Returns a copy of a window’s clip. Hidden windows have none.
    pub fn get(&self, id: WindowId) -> Option<WindowClip> {
        self.0.lock().get(&id).cloned()
    }

    /// Returns a copy of the visible part of a window body.
    pub fn body(&self, id: WindowId) -> Option<Region> {
        self.0.lock().get(&id).map(|clip| clip.body.clone())
    }

    /// Locks the table.
    pub fn lock(&self) -> MutexGuard<HashMap<WindowId, WindowClip>> {
        self.0.lock()
    }

    pub fn remove(&self, id: WindowId) -> Option<WindowClip> {
        self.0.lock().remove(&id)
    }
}

impl Registry {
    /// Recomputes the clip regions of all windows.
    ///
    /// Owners only hear about windows whose visible body changed (or that just became visible).
    pub(crate) fn update_clip(&self) {
        let order = self.zorder();
        let mut available = Region::from_rect(self.screen);
        let mut changed = Vec::new();

        {
            let mut table = self.clips.lock();
            let old = std::mem::replace(&mut *table, HashMap::with_capacity(order.len()));

            for id in &order {
                let node = &self.windows[id];

                let mut body = available.clone();
                body.intersect_rect(node.extent());

                let frame = node.title().map(|title| {
                    let mut frame = available.clone();
                    frame.intersect_rect(title.extent);
                    frame.subtract_rect(node.extent());
                    frame
                });

                available.subtract_rect(node.frame_extent());
                if old.get(id).map_or(true, |clip| clip.body != body) {
                    changed.push((*id, body.clone()));
                }
                table.insert(*id, WindowClip { body, frame });
            }
        }
        trace!("clipped {} windows, {} changed", order.len(), changed.len());

        for (id, clip) in changed {
            self.notify(id, Event::ClipInfo { wid: id, clip });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::channel::Mailbox;
    use crate::events::Event;
    use crate::rect::Rect;
    use crate::topwin::tests::{drain, new_window, registry};
    use crate::window::WindowStyle;
    use cgmath::Point2;

    #[test]
    fn sibling_clips_are_disjoint() {
        let owner = Mailbox::new("app", 256);
        let mut reg = registry();
        let a = reg
            .add(new_window(&owner, None, Rect::from_corners(0, 0, 200, 200)))
            .unwrap();
        let b = reg
            .add(new_window(&owner, None, Rect::from_corners(100, 100, 300, 300)))
            .unwrap();
        reg.show(a).unwrap();
        reg.show(b).unwrap();

        let clips = reg.clips();
        let clip_a = clips.body(a).unwrap();
        let clip_b = clips.body(b).unwrap();
        assert!(!clip_a.intersects(&clip_b));

        // b is in front, so it’s fully visible and a lost the overlap
        assert_eq!(clip_b.area(), 200 * 200);
        assert_eq!(clip_a.area(), 200 * 200 - 100 * 100);
        assert!(!clip_a.contains(Point2::new(150, 150)));
        assert!(clip_a.contains(Point2::new(50, 50)));

        // bringing a back to the front swaps who gets the overlap
        reg.activate(a).unwrap();
        let clip_a = clips.body(a).unwrap();
        let clip_b = clips.body(b).unwrap();
        assert_eq!(clip_a.area(), 200 * 200);
        assert!(clip_a.contains(Point2::new(150, 150)));
        assert!(!clip_b.contains(Point2::new(150, 150)));
    }

    #[test]
    fn frame_clip_excludes_the_body() {
        let owner = Mailbox::new("app", 256);
        let mut reg = registry();
        let mut window = new_window(&owner, None, Rect::from_corners(100, 100, 300, 200));
        window.style = WindowStyle::default();
        let w = reg.add(window).unwrap();
        reg.show(w).unwrap();

        let clip = reg.clips().get(w).unwrap();
        let frame = clip.frame.unwrap();
        assert!(!frame.intersects(&clip.body));
        assert!(frame.contains(Point2::new(150, 90)));
        assert!(!frame.contains(Point2::new(150, 150)));
        // 204x124 frame minus the 200x100 body
        assert_eq!(frame.area(), 204 * 124 - 200 * 100);
    }

    #[test]
    fn hidden_and_offscreen_windows() {
        let owner = Mailbox::new("app", 256);
        let mut reg = registry();
        let a = reg
            .add(new_window(&owner, None, Rect::from_corners(700, 400, 900, 600)))
            .unwrap();
        let b = reg
            .add(new_window(&owner, None, Rect::from_corners(0, 0, 10, 10)))
            .unwrap();
        reg.show(a).unwrap();

        // clipped to the screen
        assert_eq!(reg.clips().body(a).unwrap().area(), 100 * 80);
        assert_eq!(reg.clips().get(b), None);

        drain(&owner);
        reg.hide(a).unwrap();
        assert_eq!(reg.clips().get(a), None);
        // nobody is shown, so nobody hears about clips
        assert!(drain(&owner)
            .iter()
            .all(|event| match event {
                Event::ClipInfo { .. } => false,
                _ => true,
            }));
    }

    #[test]
    fn children_take_from_their_parent() {
        let owner = Mailbox::new("app", 256);
        let mut reg = registry();
        let parent = reg
            .add(new_window(&owner, None, Rect::from_corners(0, 0, 100, 100)))
            .unwrap();
        let child = reg
            .add(new_window(&owner, Some(parent), Rect::from_corners(10, 10, 30, 30)))
            .unwrap();
        reg.show(parent).unwrap();
        reg.show(child).unwrap();

        let clips = reg.clips();
        assert_eq!(clips.body(child).unwrap().area(), 20 * 20);
        assert_eq!(clips.body(parent).unwrap().area(), 100 * 100 - 20 * 20);

        // the child stays in front of its parent even after the parent is activated
        reg.activate(parent).unwrap();
        assert_eq!(clips.body(child).unwrap().area(), 20 * 20);
    }

    #[test]
    fn framed_siblings_never_share_pixels() {
        let owner = Mailbox::new("app", 256);
        let mut reg = registry();
        let mut framed = |extent| {
            let mut window = new_window(&owner, None, extent);
            window.style = WindowStyle::default();
            reg.add(window).unwrap()
        };
        let a = framed(Rect::from_corners(100, 100, 300, 200));
        let b = framed(Rect::from_corners(200, 150, 400, 300));
        reg.show(a).unwrap();
        reg.show(b).unwrap();

        let clips = reg.clips();
        let visible = |id| {
            let clip = clips.get(id).unwrap();
            let mut all = clip.body.clone();
            for rect in clip.frame.unwrap().rects() {
                all.union_rect(*rect);
            }
            all
        };
        let (visible_a, visible_b) = (visible(a), visible(b));
        assert!(!visible_a.intersects(&visible_b));

        // b is in front and keeps its whole frame; a loses the overlap with it
        let frame_a = reg.get(a).unwrap().frame_extent();
        let frame_b = reg.get(b).unwrap().frame_extent();
        let overlap = frame_a.intersect(frame_b).unwrap();
        assert_eq!(visible_b.area(), frame_b.area());
        assert_eq!(visible_a.area(), frame_a.area() - overlap.area());
        // where b’s body covers a’s body
        assert!(!visible_a.contains(Point2::new(250, 160)));
        assert!(visible_b.contains(Point2::new(250, 160)));
    }
}
