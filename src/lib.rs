//! A small window server for embedded devices.
//!
//! One server thread owns every top-level window on screen: their hierarchy, their stacking
//! order, which one has the keyboard focus, and which parts of them are visible. Applications run
//! on their own threads and only ever talk to the server by posting [`Event`]s to its
//! [`Mailbox`]; the server answers by posting clip, paint, activation and input events back to
//! the mailbox of whichever application owns the window concerned.
//!
//! ```text
//!  application thread                 server thread
//!  ┌──────────────┐  WindowShow (sync)  ┌──────────────┐
//!  │ Application  │ ──────────────────▶ │   Registry   │
//!  │   Window…    │ ◀────────────────── │  ClipTable   │
//!  └──────────────┘  ClipInfo, Paint,   └──────────────┘
//!                    WindowActivate…
//! ```
//!
//! Requests that change the window tree are usually sent synchronously: the server finishes the
//! change, including clip recomputation and redraw notifications, before it acknowledges, so
//! once `send_sync` returns the screen is consistent again.

mod app;
mod channel;
mod clip;
mod config;
mod context;
mod error;
pub mod events;
mod frame;
mod rect;
mod region;
mod server;
mod topwin;
mod window;

pub use app::{AppState, Application, ViewId};
pub use channel::{Mailbox, Message, Reply, SyncGuard, DEFAULT_SYNC_TIMEOUT};
pub use clip::{ClipTable, WindowClip};
pub use config::{Config, FrameMetrics, PanelConfig};
pub use context::{Context, Handler};
pub use error::{Error, Result, Status};
pub use events::Event;
pub use frame::{Decorator, Frame, NullDecorator, TitleBar};
pub use rect::Rect;
pub use region::Region;
pub use server::{Server, ServerHandle};
pub use topwin::{Registry, TopFlags, TopWindow, WindowId, WindowSpec};
pub use window::{Callback, Window, WindowBuilder, WindowStyle};
