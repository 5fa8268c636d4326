//! Message channels.
//!
//! Every thread taking part in the window system owns one [`Mailbox`]: a bounded FIFO queue that
//! only its owner drains. Anybody holding a clone may post to it. Urgent messages are put at the
//! front of the queue instead of the back.
//!
//! Synchronous requests carry a one-shot [`Reply`] slot. The requester keeps the other end in a
//! [`SyncGuard`] and blocks on it until the recipient acknowledges the message or the mailbox’s
//! timeout runs out.

use crate::error::{Error, Result, Status};
use crate::events::{Event, EventKind};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::trace;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time a synchronous request waits for its acknowledgement.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_millis(1000);

/// An event in transit, possibly waiting for an acknowledgement.
#[derive(Debug)]
pub struct Message {
    pub event: Event,
    reply: Option<Reply>,
}

impl Message {
    /// Creates a fire-and-forget message.
    pub fn new(event: Event) -> Message {
        Message { event, reply: None }
    }

    /// Creates a message whose recipient must acknowledge it through `reply`.
    pub fn with_reply(event: Event, reply: Reply) -> Message {
        Message {
            event,
            reply: Some(reply),
        }
    }

    /// Returns true if the sender is blocked waiting for an acknowledgement.
    pub fn is_sync(&self) -> bool {
        self.reply.is_some()
    }

    /// Splits the message into its event and reply slot.
    pub fn into_parts(self) -> (Event, Option<Reply>) {
        (self.event, self.reply)
    }
}

/// The recipient’s end of a synchronous request.
pub struct Reply(Sender<Status>);

impl Reply {
    /// Posts the outcome of the request.
    ///
    /// Fails with `Disconnected` if the requester isn’t waiting anymore (e.g. it timed out).
    pub fn ack(self, status: Status) -> Result<()> {
        self.0.send(status).map_err(|_| Error::Disconnected)
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Reply")
    }
}

/// The requester’s end of a synchronous request.
///
/// Dropping the guard releases the slot; a late acknowledgement then goes nowhere.
pub struct SyncGuard {
    slot: Receiver<Status>,
}

impl SyncGuard {
    /// Allocates a reply slot.
    pub fn new() -> (SyncGuard, Reply) {
        let (sender, slot) = channel::bounded(1);
        (SyncGuard { slot }, Reply(sender))
    }

    /// Blocks until the request is acknowledged.
    pub fn wait(self, timeout: Duration) -> Status {
        match self.slot.recv_timeout(timeout) {
            Ok(status) => status,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout),
            // the recipient dropped the message without answering
            Err(RecvTimeoutError::Disconnected) => Err(Error::Disconnected),
        }
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        trace!("releasing reply slot");
    }
}

struct Queue {
    messages: VecDeque<Message>,
    closed: bool,
}

struct Shared {
    name: String,
    capacity: usize,
    sync_timeout: Duration,
    queue: Mutex<Queue>,
    available: Condvar,
}

/// A bounded message queue owned by one thread.
#[derive(Clone)]
pub struct Mailbox {
    shared: Arc<Shared>,
}

impl Mailbox {
    /// Creates a mailbox holding at most `capacity` messages.
    pub fn new(name: &str, capacity: usize) -> Mailbox {
        Mailbox::with_sync_timeout(name, capacity, DEFAULT_SYNC_TIMEOUT)
    }

    /// Creates a mailbox whose synchronous requests give up after `sync_timeout`.
    pub fn with_sync_timeout(name: &str, capacity: usize, sync_timeout: Duration) -> Mailbox {
        assert!(capacity > 0, "mailbox capacity must be nonzero");

        Mailbox {
            shared: Arc::new(Shared {
                name: name.to_string(),
                capacity,
                sync_timeout,
                queue: Mutex::new(Queue {
                    messages: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.shared.queue.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the mailbox. Pending messages are dropped and further sends fail.
    pub fn close(&self) {
        let mut queue = self.shared.queue.lock();
        queue.closed = true;
        queue.messages.clear();
        self.shared.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.queue.lock().closed
    }

    fn enqueue(&self, message: Message, urgent: bool) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        if queue.closed {
            return Err(Error::Disconnected);
        }
        if queue.messages.len() >= self.shared.capacity {
            return Err(Error::ChannelFull);
        }

        trace!(
            "{}: enqueue {:?}{}",
            self.shared.name,
            message.event,
            if urgent { " (urgent)" } else { "" }
        );
        if urgent {
            queue.messages.push_front(message);
        } else {
            queue.messages.push_back(message);
        }
        self.shared.available.notify_one();
        Ok(())
    }

    /// Posts an event without waiting for it to be handled.
    pub fn send(&self, event: Event) -> Result<()> {
        self.enqueue(Message::new(event), false)
    }

    /// Posts an event at the front of the queue.
    pub fn send_urgent(&self, event: Event) -> Result<()> {
        self.enqueue(Message::new(event), true)
    }

    /// Posts an event and blocks until the recipient acknowledges it.
    pub fn send_sync(&self, event: Event) -> Status {
        self.request(event, false)
    }

    /// Like `send_sync`, but jumps the queue.
    pub fn send_sync_urgent(&self, event: Event) -> Status {
        self.request(event, true)
    }

    fn request(&self, event: Event, urgent: bool) -> Status {
        let (guard, reply) = SyncGuard::new();
        self.enqueue(Message::with_reply(event, reply), urgent)?;
        guard.wait(self.shared.sync_timeout)
    }

    /// Blocks until a message arrives.
    pub fn recv(&self) -> Result<Message> {
        let mut queue = self.shared.queue.lock();
        loop {
            if let Some(message) = queue.messages.pop_front() {
                return Ok(message);
            }
            if queue.closed {
                return Err(Error::Disconnected);
            }
            self.shared.available.wait(&mut queue);
        }
    }

    /// Blocks until a message arrives or `timeout` passes.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Message> {
        self.recv_matching(timeout, |_| true)
    }

    /// Returns the next message if there is one.
    pub fn try_recv(&self) -> Option<Message> {
        self.shared.queue.lock().messages.pop_front()
    }

    /// Waits for the first message of the given kind, leaving all others queued.
    pub fn recv_filter(&self, kind: EventKind, timeout: Duration) -> Result<Message> {
        self.recv_matching(timeout, |message| message.event.kind() == kind)
    }

    fn recv_matching<F>(&self, timeout: Duration, matches: F) -> Result<Message>
    where
        F: Fn(&Message) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared.queue.lock();
        loop {
            if let Some(pos) = queue.messages.iter().position(|m| matches(m)) {
                if let Some(message) = queue.messages.remove(pos) {
                    return Ok(message);
                }
            }
            if queue.closed {
                return Err(Error::Disconnected);
            }
            if self
                .shared
                .available
                .wait_until(&mut queue, deadline)
                .timed_out()
            {
                return match queue.messages.iter().position(|m| matches(m)) {
                    Some(pos) => queue.messages.remove(pos).ok_or(Error::Timeout),
                    None => Err(Error::Timeout),
                };
            }
        }
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mailbox({:?})", self.shared.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topwin::WindowId;
    use std::thread;

    #[test]
    fn urgent_messages_jump_the_queue() {
        let mailbox = Mailbox::new("test", 8);
        mailbox.send(Event::Timer { timer: 1 }).unwrap();
        mailbox.send(Event::Timer { timer: 2 }).unwrap();
        mailbox.send_urgent(Event::Shutdown).unwrap();

        let kinds: Vec<_> = (0..3)
            .map(|_| mailbox.try_recv().unwrap().event.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::Shutdown, EventKind::Timer, EventKind::Timer]
        );
        assert!(mailbox.try_recv().is_none());
    }

    #[test]
    fn full_mailbox_rejects_sends() {
        let mailbox = Mailbox::new("test", 1);
        mailbox.send(Event::Timer { timer: 1 }).unwrap();
        assert_eq!(mailbox.send(Event::Timer { timer: 2 }), Err(Error::ChannelFull));

        let started = Instant::now();
        assert_eq!(
            mailbox.send_sync(Event::Timer { timer: 3 }),
            Err(Error::ChannelFull)
        );
        assert!(started.elapsed() < DEFAULT_SYNC_TIMEOUT);
    }

    #[test]
    fn send_sync_waits_for_ack() {
        let mailbox = Mailbox::new("server", 4);
        let receiver = mailbox.clone();
        let wid = WindowId::new();

        let handle = thread::spawn(move || {
            let message = receiver.recv().unwrap();
            assert!(message.is_sync());
            let (event, reply) = message.into_parts();
            let status = match event {
                Event::WindowShow { .. } => Err(Error::NotFound(wid)),
                _ => Ok(()),
            };
            reply.unwrap().ack(status).unwrap();
        });

        assert_eq!(
            mailbox.send_sync(Event::WindowShow { wid }),
            Err(Error::NotFound(wid))
        );
        handle.join().unwrap();
    }

    #[test]
    fn unanswered_requests_time_out() {
        let mailbox = Mailbox::with_sync_timeout("slow", 4, Duration::from_millis(20));
        assert_eq!(mailbox.send_sync(Event::Timer { timer: 0 }), Err(Error::Timeout));

        // the abandoned request is still queued, but nobody listens for the answer
        let (_, reply) = mailbox.try_recv().unwrap().into_parts();
        assert_eq!(reply.unwrap().ack(Ok(())), Err(Error::Disconnected));
    }

    #[test]
    fn dropped_requests_disconnect() {
        let mailbox = Mailbox::new("dropper", 4);
        let receiver = mailbox.clone();
        let handle = thread::spawn(move || drop(receiver.recv().unwrap()));
        assert_eq!(
            mailbox.send_sync(Event::Timer { timer: 0 }),
            Err(Error::Disconnected)
        );
        handle.join().unwrap();
    }

    #[test]
    fn recv_filter_leaves_other_messages() {
        let mailbox = Mailbox::new("test", 8);
        mailbox.send(Event::Timer { timer: 1 }).unwrap();
        mailbox.send(Event::Shutdown).unwrap();
        mailbox.send(Event::Timer { timer: 2 }).unwrap();

        let message = mailbox
            .recv_filter(EventKind::Shutdown, Duration::from_millis(10))
            .unwrap();
        assert_eq!(message.event.kind(), EventKind::Shutdown);
        assert_eq!(mailbox.len(), 2);
        assert_eq!(
            mailbox
                .recv_filter(EventKind::PanelInfo, Duration::from_millis(10))
                .unwrap_err(),
            Error::Timeout
        );
    }

    #[test]
    fn closed_mailbox_disconnects() {
        let mailbox = Mailbox::new("test", 2);
        mailbox.send(Event::Timer { timer: 1 }).unwrap();
        mailbox.close();
        assert!(mailbox.is_empty());
        assert_eq!(mailbox.send(Event::Shutdown), Err(Error::Disconnected));
        assert_eq!(mailbox.recv().unwrap_err(), Error::Disconnected);
    }
}
