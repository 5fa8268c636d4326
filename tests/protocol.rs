use cgmath::Point2;
use crossbeam::channel;
use roost::events::{EventKind, ModalCode, MouseButtons};
use roost::{Application, Config, Context, Error, Event, Mailbox, Rect, Server, WindowBuilder};
use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

fn config() -> Config {
    Config::default().with_sync_timeout(Duration::from_millis(500))
}

fn click(x: i32, y: i32) -> Event {
    Event::MouseButton {
        wid: None,
        position: Point2::new(x, y),
        buttons: MouseButtons::left_down(),
    }
}

#[test]
fn window_activation_reaches_the_application() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let server_mailbox = server.mailbox().clone();

    let app = thread::spawn(move || {
        let mut app = Application::create("clock", "main", &server_mailbox, &config).unwrap();
        let wid = app
            .create_window(
                WindowBuilder::new("clock", Rect::from_corners(100, 100, 300, 200)).on_activate(
                    |ctx, _| {
                        ctx.exit(5);
                        true
                    },
                ),
            )
            .unwrap();
        app.show_window(wid, false).unwrap();
        let code = app.run();
        (code, app.focused() == Some(wid))
    });

    let (code, focused) = app.join().unwrap();
    assert_eq!(code, 5);
    assert!(focused);
}

#[test]
fn clicks_are_routed_to_the_window_under_the_pointer() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let server_mailbox = server.mailbox().clone();
    let (ready, wait_ready) = channel::unbounded();

    let app = thread::spawn(move || {
        let mut app = Application::create("pad", "main", &server_mailbox, &config).unwrap();
        let left = app
            .create_window(
                WindowBuilder::new("left", Rect::from_corners(0, 30, 100, 100)).content(
                    |ctx: &mut Context, event: &Event| match event.kind() {
                        EventKind::MouseButton => {
                            ctx.exit(1);
                            true
                        }
                        _ => false,
                    },
                ),
            )
            .unwrap();
        let right = app
            .create_window(
                WindowBuilder::new("right", Rect::from_corners(200, 30, 300, 100)).content(
                    |ctx: &mut Context, event: &Event| match event.kind() {
                        EventKind::MouseButton => {
                            ctx.exit(2);
                            true
                        }
                        _ => false,
                    },
                ),
            )
            .unwrap();
        app.show_window(left, false).unwrap();
        app.show_window(right, false).unwrap();
        ready.send(()).unwrap();
        let code = app.run();
        (code, app.focused() == Some(left))
    });

    wait_ready.recv_timeout(Duration::from_secs(5)).unwrap();
    server.post(click(50, 50)).unwrap();

    let (code, left_focused) = app.join().unwrap();
    assert_eq!(code, 1);
    // clicking an inactive window activates it first
    assert!(left_focused);
}

#[test]
fn modal_window_takes_all_input() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let server_mailbox = server.mailbox().clone();
    let (ready, wait_ready) = channel::unbounded();

    let app = thread::spawn(move || {
        let mut app = Application::create("editor", "main", &server_mailbox, &config).unwrap();
        let main_clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&main_clicks);
        let main = app
            .create_window(
                WindowBuilder::new("main", Rect::from_corners(0, 30, 200, 200)).content(
                    move |_: &mut Context, event: &Event| {
                        if event.kind() == EventKind::MouseButton {
                            counter.set(counter.get() + 1);
                        }
                        false
                    },
                ),
            )
            .unwrap();
        app.show_window(main, false).unwrap();

        let dialog = app
            .create_window(
                WindowBuilder::new("confirm", Rect::from_corners(300, 100, 500, 200))
                    .on_activate(move |_, _| {
                        let _ = ready.send(());
                        true
                    })
                    .content(|ctx: &mut Context, event: &Event| match event {
                        Event::MouseButton { .. } => {
                            if let Some(dialog) = ctx.target() {
                                ctx.end_modal(dialog, ModalCode::Ok);
                            }
                            true
                        }
                        _ => false,
                    }),
            )
            .unwrap();

        let code = app.show_window(dialog, true).unwrap();
        let dialog_hidden = app.window(dialog).map_or(false, |w| w.is_hidden());
        (code, main_clicks.get(), dialog_hidden)
    });

    wait_ready.recv_timeout(Duration::from_secs(5)).unwrap();
    // a click on the main window while the dialog is up
    server.post(click(50, 50)).unwrap();

    let (code, main_clicks, dialog_hidden) = app.join().unwrap();
    assert_eq!(code, Some(ModalCode::Ok));
    assert_eq!(main_clicks, 0);
    assert!(dialog_hidden);
}

#[test]
fn shutdown_detaches_applications() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let server_mailbox = server.mailbox().clone();
    let (ready, wait_ready) = channel::unbounded();

    let app = thread::spawn(move || {
        let mut app = Application::create("idle", "main", &server_mailbox, &config).unwrap();
        ready.send(()).unwrap();
        app.run();
        (app.panel(), app.is_closed())
    });

    wait_ready.recv_timeout(Duration::from_secs(5)).unwrap();
    server.shutdown();

    let (panel, closed) = app.join().unwrap();
    assert_eq!(panel, None);
    assert!(closed);
}

#[test]
fn sync_request_to_a_full_mailbox_fails_fast() {
    let timeout = Duration::from_secs(2);
    let mailbox = Mailbox::with_sync_timeout("busy", 2, timeout);
    mailbox.send(Event::Timer { timer: 1 }).unwrap();
    mailbox.send(Event::Timer { timer: 2 }).unwrap();

    let start = Instant::now();
    assert_eq!(
        mailbox.send_sync(Event::Timer { timer: 3 }),
        Err(Error::ChannelFull)
    );
    assert!(start.elapsed() < timeout);
    assert_eq!(mailbox.len(), 2);
}

#[test]
fn requests_fail_once_the_server_is_gone() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let server_mailbox = server.mailbox().clone();
    server.shutdown();

    let err = Application::create("late", "main", &server_mailbox, &config).err();
    assert_eq!(err, Some(Error::Disconnected));
}

#[test]
fn far_moves_are_refused_and_the_server_keeps_serving() {
    let config = config();
    let server = Server::new(&config).spawn().unwrap();
    let mut app = Application::create("drag", "main", server.mailbox(), &config).unwrap();
    let extent = Rect::from_corners(10, 30, 110, 80);
    let wid = app.create_window(WindowBuilder::new("w", extent)).unwrap();
    app.show_window(wid, false).unwrap();

    assert_eq!(
        app.move_window(wid, i32::MAX - 10, 0),
        Err(Error::BadGeometry(wid))
    );
    assert_eq!(app.window(wid).map(|w| w.extent()), Some(extent));

    let other = app
        .create_window(WindowBuilder::new("other", Rect::from_corners(200, 30, 300, 80)))
        .unwrap();
    assert_eq!(app.show_window(other, false), Ok(None));
    app.move_window(wid, 20, 40).unwrap();
}
