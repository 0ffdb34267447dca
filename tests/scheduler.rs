//! Scheduler-driven buffered transfer, the way an async serial driver
//! uses it: a conditional task gated on "transmit register empty" moves
//! one byte per pass, resolves a future with the byte count when the
//! buffer is drained, and removes itself.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU16, Ordering};

use attiny1614_hal::rtos::{Future, Scheduler, TickSource};

#[derive(Clone, Copy)]
struct Clock(&'static AtomicU16);

impl Clock {
    fn new() -> Self {
        Self(Box::leak(Box::new(AtomicU16::new(0))))
    }

    fn advance(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

impl TickSource for Clock {
    fn ticks(&self) -> u16 {
        self.0.load(Ordering::Relaxed)
    }
}

/// One in-flight transmit job: source buffer, send cursor, and the sink
/// standing in for the transmit data register.
struct SendJob {
    data: &'static [u8],
    cursor: Cell<usize>,
    sink: RefCell<Vec<u8>>,
    tx_ready: Cell<bool>,
    done: Future<u8>,
}

type Ctx = &'static SendJob;
type Sched = Scheduler<Clock, Ctx, 8>;

fn job(data: &'static [u8]) -> Ctx {
    Box::leak(Box::new(SendJob {
        data,
        cursor: Cell::new(0),
        sink: RefCell::new(Vec::new()),
        tx_ready: Cell::new(true),
        done: Future::new(),
    }))
}

fn tx_ready(job: Ctx) -> bool {
    job.tx_ready.get()
}

/// Move one byte per pass; on the last byte resolve the future and stop.
fn send_step(s: &mut Sched, job: Ctx) {
    let i = job.cursor.get();
    job.sink.borrow_mut().push(job.data[i]);
    job.cursor.set(i + 1);
    if job.cursor.get() == job.data.len() {
        job.done.resolve(job.data.len() as u8);
        if let Some(me) = s.current_task() {
            s.remove_task(me);
        }
    }
}

fn start_send(s: &mut Sched, job: Ctx) {
    let handle = s
        .add_conditional_task(send_step, job, tx_ready, job)
        .unwrap();
    job.done.bind(handle);
}

#[test]
fn buffered_send_resolves_future_and_frees_its_task() {
    let clock = Clock::new();
    let mut s: Sched = Scheduler::new(clock);
    let j = job(b"hello");
    start_send(&mut s, j);

    // one byte per pass while the hardware is ready
    for _ in 0..3 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"hel");
    assert!(j.done.is_unresolved());

    for _ in 0..2 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"hello");
    assert_eq!(j.done.value(), Some(5));

    // the send task removed itself; further passes move nothing
    for _ in 0..4 {
        clock.advance();
        s.run();
    }
    assert_eq!(j.sink.borrow().len(), 5);
}

#[test]
fn send_stalls_while_the_hardware_is_busy() {
    let clock = Clock::new();
    let mut s: Sched = Scheduler::new(clock);
    let j = job(b"abc");
    start_send(&mut s, j);

    clock.advance();
    s.run();
    assert_eq!(&*j.sink.borrow(), b"a");

    j.tx_ready.set(false);
    for _ in 0..5 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"a");
    assert!(j.done.is_unresolved());

    j.tx_ready.set(true);
    for _ in 0..2 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"abc");
    assert_eq!(j.done.value(), Some(3));
}

#[test]
fn cancelling_through_the_future_leaves_it_unresolved() {
    let clock = Clock::new();
    let mut s: Sched = Scheduler::new(clock);
    let j = job(b"abcdef");
    start_send(&mut s, j);

    clock.advance();
    s.run();
    clock.advance();
    s.run();
    assert_eq!(&*j.sink.borrow(), b"ab");

    // cancel mid-transfer via the task handle the future carries
    let task = j.done.task().unwrap();
    s.remove_task(task);
    for _ in 0..4 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"ab");
    assert!(j.done.is_unresolved());

    // restarting after a reset runs the transfer to completion
    j.done.reset();
    j.cursor.set(0);
    j.sink.borrow_mut().clear();
    start_send(&mut s, j);
    for _ in 0..7 {
        clock.advance();
        s.run();
    }
    assert_eq!(&*j.sink.borrow(), b"abcdef");
    assert_eq!(j.done.value(), Some(6));
}
