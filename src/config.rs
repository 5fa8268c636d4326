//! Server and application configuration.

use crate::rect::Rect;
use cgmath::Vector2;
use log::warn;
use std::env;
use std::time::Duration;

/// Window frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Height of the title bar above the window body.
    pub title_height: i32,
    /// Width of the border around the window body.
    pub border_size: i32,
    /// Size of the close box in the title bar.
    pub close_box: Vector2<i32>,
}

impl Default for FrameMetrics {
    fn default() -> FrameMetrics {
        FrameMetrics {
            title_height: 20,
            border_size: 2,
            close_box: Vector2::new(16, 16),
        }
    }
}

/// A panel the server offers to applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub name: String,
    pub extent: Rect,
}

/// Configuration shared by the server and the applications connecting to it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Screen size in pixels.
    pub screen: Vector2<i32>,
    /// Capacity of every mailbox.
    pub queue_capacity: usize,
    /// How long synchronous requests wait for an acknowledgement.
    pub sync_timeout: Duration,
    /// How long an application with an idle callback waits for events before calling it.
    pub idle_interval: Duration,
    pub frame: FrameMetrics,
    pub panels: Vec<PanelConfig>,
}

impl Default for Config {
    fn default() -> Config {
        let screen = Vector2::new(800, 480);
        Config {
            screen,
            queue_capacity: 32,
            sync_timeout: Duration::from_millis(1000),
            idle_interval: Duration::from_millis(10),
            frame: FrameMetrics::default(),
            panels: vec![PanelConfig {
                name: "main".into(),
                extent: Rect::from_corners(0, 0, screen.x, screen.y),
            }],
        }
    }
}

impl Config {
    /// Returns the default configuration with overrides from the environment.
    ///
    /// - `ROOST_SCREEN`: `WIDTHxHEIGHT`
    /// - `ROOST_QUEUE_CAPACITY`: mailbox capacity
    /// - `ROOST_SYNC_TIMEOUT_MS`: synchronous request timeout in milliseconds
    pub fn from_env() -> Config {
        let mut config = Config::default();

        if let Ok(value) = env::var("ROOST_SCREEN") {
            match parse_size(&value) {
                Some(size) => config = config.with_screen(size),
                None => warn!("ignoring malformed ROOST_SCREEN: {:?}", value),
            }
        }
        if let Ok(value) = env::var("ROOST_QUEUE_CAPACITY") {
            match value.parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.queue_capacity = capacity,
                _ => warn!("ignoring malformed ROOST_QUEUE_CAPACITY: {:?}", value),
            }
        }
        if let Ok(value) = env::var("ROOST_SYNC_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => config.sync_timeout = Duration::from_millis(ms),
                Err(_) => warn!("ignoring malformed ROOST_SYNC_TIMEOUT_MS: {:?}", value),
            }
        }

        config
    }

    /// Sets the screen size. Panels covering the old screen are resized with it.
    pub fn with_screen(mut self, screen: Vector2<i32>) -> Config {
        let old_bounds = self.screen_bounds();
        for panel in &mut self.panels {
            if panel.extent == old_bounds {
                panel.extent = Rect::from_corners(0, 0, screen.x, screen.y);
            }
        }
        self.screen = screen;
        self
    }

    /// Sets the mailbox capacity. A capacity of zero is raised to one.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Config {
        if capacity == 0 {
            warn!("queue capacity must be nonzero, using 1");
        }
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Capacity for new mailboxes; never zero, even if `queue_capacity` was set directly.
    pub fn mailbox_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Config {
        self.sync_timeout = timeout;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Config {
        self.idle_interval = interval;
        self
    }

    pub fn with_frame(mut self, frame: FrameMetrics) -> Config {
        self.frame = frame;
        self
    }

    /// Adds a panel.
    pub fn with_panel(mut self, name: &str, extent: Rect) -> Config {
        self.panels.push(PanelConfig {
            name: name.into(),
            extent,
        });
        self
    }

    pub fn screen_bounds(&self) -> Rect {
        Rect::from_corners(0, 0, self.screen.x, self.screen.y)
    }
}

fn parse_size(value: &str) -> Option<Vector2<i32>> {
    let mut parts = value.trim().splitn(2, 'x');
    let width = parts.next()?.trim().parse().ok()?;
    let height = parts.next()?.trim().parse().ok()?;
    if width > 0 && height > 0 {
        Some(Vector2::new(width, height))
    } else {
        None
    }
}
