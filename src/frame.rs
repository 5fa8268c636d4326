//! Window frames: the title bar and border the server draws around a top-level window.

use crate::config::FrameMetrics;
use crate::rect::Rect;
use crate::region::Region;
use crate::topwin::WindowId;
use crate::window::WindowStyle;
use cgmath::{Point2, Vector2};
use log::trace;

/// The frame around a window body.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleBar {
    /// Frame extent; always covers the window body.
    pub extent: Rect,
    /// Title text.
    pub text: String,
}

impl TitleBar {
    /// Lays out a frame for a window body, if its style calls for one.
    pub fn new(
        body: Rect,
        style: WindowStyle,
        text: &str,
        metrics: &FrameMetrics,
    ) -> Option<TitleBar> {
        let extent = TitleBar::layout(body, style, metrics)?;
        Some(TitleBar {
            extent,
            text: text.into(),
        })
    }

    /// Computes the frame extent for a window body.
    ///
    /// Windows without both a title and a border have no frame.
    pub fn layout(body: Rect, style: WindowStyle, metrics: &FrameMetrics) -> Option<Rect> {
        let titled = !style.contains(WindowStyle::NO_TITLE);
        let bordered = !style.contains(WindowStyle::NO_BORDER);
        if !titled && !bordered {
            return None;
        }

        let mut extent = body;
        if bordered {
            extent = extent.inflate(metrics.border_size);
        }
        if titled {
            extent.origin.y -= metrics.title_height;
            extent.size.y += metrics.title_height;
        }
        Some(extent)
    }

    /// The close box, in screen coordinates.
    pub fn close_box(&self, metrics: &FrameMetrics) -> Rect {
        let x = self.extent.x2() - metrics.border_size - metrics.close_box.x - 3;
        let y = self.extent.y1() + metrics.border_size + 3;
        Rect::new(Point2::new(x, y), metrics.close_box)
    }

    pub(crate) fn translate(&mut self, delta: Vector2<i32>) {
        self.extent += delta;
    }
}

/// Everything a decorator needs to draw one frame.
#[derive(Debug)]
pub struct Frame<'a> {
    pub wid: WindowId,
    pub title: &'a TitleBar,
    /// The window body.
    pub body: Rect,
    /// Visible part of the frame (never includes the body).
    pub clip: &'a Region,
    pub focused: bool,
    pub closable: bool,
    pub close_pressed: bool,
}

/// Draws window frames.
///
/// The server calls this whenever a frame’s appearance may have changed: on show, on activation
/// changes, after moves, and for every redraw that touches the frame.
pub trait Decorator: Send {
    fn draw_frame(&mut self, frame: &Frame);
}

/// A decorator that draws nothing.
#[derive(Debug, Default)]
pub struct NullDecorator;

impl Decorator for NullDecorator {
    fn draw_frame(&mut self, frame: &Frame) {
        trace!(
            "frame {:?} {:?} focused={}",
            frame.wid,
            frame.title.text,
            frame.focused
        );
    }
}
