use core::cell::RefCell;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;

use crate::error::Error;
use crate::operator::OperatorList;
use crate::registration::{OperatorSnapshot, RegistrationSnapshot, Tracker};

pub struct State {
    shared: Mutex<NoopRawMutex, RefCell<Shared>>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                tracker: Tracker::new(),
                signal_percent: None,
                scan: PendingOp::new(),
                operator: PendingOp::new(),
                register: PendingOp::new(),
                strength: PendingOp::new(),
            })),
        }
    }
}

struct Shared {
    tracker: Tracker,
    signal_percent: Option<u8>,

    scan: PendingOp<OperatorList>,
    operator: PendingOp<OperatorSnapshot>,
    register: PendingOp<()>,
    strength: PendingOp<u8>,
}

/// Single-pending completion cell.
///
/// `begin` supersedes whatever operation was pending: a superseded waiter
/// resolves to `Canceled` the next time it is polled, and a result finished
/// against a stale sequence number is dropped.
struct PendingOp<T> {
    seq: u32,
    result: Option<(u32, Result<T, Error>)>,
    waker: WakerRegistration,
}

impl<T> PendingOp<T> {
    const fn new() -> Self {
        Self {
            seq: 0,
            result: None,
            waker: WakerRegistration::new(),
        }
    }

    fn begin(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        self.result = None;
        // Let a superseded waiter observe the new sequence.
        self.waker.wake();
        self.seq
    }

    fn finish(&mut self, op: u32, result: Result<T, Error>) {
        if op == self.seq {
            self.result = Some((op, result));
            self.waker.wake();
        } else {
            trace!("dropping result of a superseded operation");
        }
    }

    fn poll(&mut self, op: u32, cx: &mut Context<'_>) -> Poll<Result<T, Error>> {
        if let Some((id, _)) = &self.result {
            if *id == op {
                let (_, result) = self.result.take().unwrap();
                return Poll::Ready(result);
            }
        }

        if self.seq != op {
            return Poll::Ready(Err(Error::Canceled));
        }

        self.waker.register(cx.waker());
        Poll::Pending
    }
}

#[derive(Clone)]
pub struct Runner<'d> {
    shared: &'d Mutex<NoopRawMutex, RefCell<Shared>>,
}

impl<'d> Runner<'d> {
    pub(crate) fn new(state: &'d mut State) -> Self {
        Self {
            shared: &state.shared,
        }
    }

    pub(crate) fn with_tracker<R>(&self, f: impl FnOnce(&mut Tracker) -> R) -> R {
        self.shared.lock(|s| f(&mut s.borrow_mut().tracker))
    }

    pub fn registration_status(&self) -> RegistrationSnapshot {
        self.shared.lock(|s| s.borrow().tracker.current().clone())
    }

    /// Returns `true` when the cached percentage actually changed.
    pub(crate) fn update_signal_percent(&self, percent: u8) -> bool {
        self.shared.lock(|s| {
            let s = &mut *s.borrow_mut();
            if s.signal_percent == Some(percent) {
                false
            } else {
                s.signal_percent = Some(percent);
                true
            }
        })
    }

    pub(crate) fn begin_scan(&self) -> u32 {
        self.shared.lock(|s| s.borrow_mut().scan.begin())
    }

    pub(crate) fn finish_scan(&self, op: u32, result: Result<OperatorList, Error>) {
        self.shared.lock(|s| s.borrow_mut().scan.finish(op, result))
    }

    pub(crate) fn poll_scan(
        &self,
        op: u32,
        cx: &mut Context<'_>,
    ) -> Poll<Result<OperatorList, Error>> {
        self.shared.lock(|s| s.borrow_mut().scan.poll(op, cx))
    }

    pub(crate) fn begin_operator(&self) -> u32 {
        self.shared.lock(|s| s.borrow_mut().operator.begin())
    }

    pub(crate) fn finish_operator(&self, op: u32, result: Result<OperatorSnapshot, Error>) {
        self.shared
            .lock(|s| s.borrow_mut().operator.finish(op, result))
    }

    pub(crate) fn poll_operator(
        &self,
        op: u32,
        cx: &mut Context<'_>,
    ) -> Poll<Result<OperatorSnapshot, Error>> {
        self.shared.lock(|s| s.borrow_mut().operator.poll(op, cx))
    }

    pub(crate) fn begin_register(&self) -> u32 {
        self.shared.lock(|s| s.borrow_mut().register.begin())
    }

    pub(crate) fn finish_register(&self, op: u32, result: Result<(), Error>) {
        self.shared
            .lock(|s| s.borrow_mut().register.finish(op, result))
    }

    pub(crate) fn poll_register(&self, op: u32, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
        self.shared.lock(|s| s.borrow_mut().register.poll(op, cx))
    }

    pub(crate) fn begin_strength(&self) -> u32 {
        self.shared.lock(|s| s.borrow_mut().strength.begin())
    }

    pub(crate) fn finish_strength(&self, op: u32, result: Result<u8, Error>) {
        self.shared
            .lock(|s| s.borrow_mut().strength.finish(op, result))
    }

    pub(crate) fn poll_strength(&self, op: u32, cx: &mut Context<'_>) -> Poll<Result<u8, Error>> {
        self.shared.lock(|s| s.borrow_mut().strength.poll(op, cx))
    }
}

#[cfg(test)]
mod tests {
    use core::ptr;
    use core::task::{RawWaker, RawWakerVTable, Waker};

    use super::*;

    fn noop_waker() -> Waker {
        const VTABLE: RawWakerVTable = RawWakerVTable::new(|_| RAW, |_| {}, |_| {}, |_| {});
        const RAW: RawWaker = RawWaker::new(ptr::null(), &VTABLE);
        unsafe { Waker::from_raw(RAW) }
    }

    #[test]
    fn a_newer_operation_supersedes_the_pending_one() {
        let mut state = State::new();
        let runner = Runner::new(&mut state);

        let first = runner.begin_scan();
        let second = runner.begin_scan();
        assert_ne!(first, second);

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        // Exactly one failure for the superseded waiter.
        assert_eq!(
            runner.poll_scan(first, &mut cx),
            Poll::Ready(Err(Error::Canceled))
        );

        runner.finish_scan(second, Ok(OperatorList::new()));
        assert_eq!(
            runner.poll_scan(second, &mut cx),
            Poll::Ready(Ok(OperatorList::new()))
        );
    }

    #[test]
    fn results_for_superseded_operations_are_dropped() {
        let mut state = State::new();
        let runner = Runner::new(&mut state);

        let first = runner.begin_strength();
        let second = runner.begin_strength();

        runner.finish_strength(first, Ok(55));

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(runner.poll_strength(second, &mut cx), Poll::Pending);

        runner.finish_strength(second, Ok(70));
        assert_eq!(
            runner.poll_strength(second, &mut cx),
            Poll::Ready(Ok(70))
        );
    }

    #[test]
    fn a_result_is_delivered_once() {
        let mut state = State::new();
        let runner = Runner::new(&mut state);

        let op = runner.begin_register();
        runner.finish_register(op, Ok(()));

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        assert_eq!(runner.poll_register(op, &mut cx), Poll::Ready(Ok(())));
        // Claimed; the cell is pending again for the same id.
        assert_eq!(runner.poll_register(op, &mut cx), Poll::Pending);
    }

    #[test]
    fn signal_percent_dedupes() {
        let mut state = State::new();
        let runner = Runner::new(&mut state);

        assert!(runner.update_signal_percent(40));
        assert!(!runner.update_signal_percent(40));
        assert!(runner.update_signal_percent(41));
    }
}
