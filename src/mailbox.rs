//! Single-slot latest-value handoff between the polling driver and another task.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embassy_sync::waitqueue::WakerRegistration;

use crate::TouchInput;

struct Slot {
    value: Option<TouchInput>,
    waker: WakerRegistration,
}

/// A capacity-1 mailbox holding the most recent [`TouchInput`].
///
/// Writing never blocks and never queues: a new sample replaces whatever is
/// stored. Readers either take the sample, leaving the slot empty, or peek at it.
///
/// With `CriticalSectionRawMutex` the mailbox can live in a `static` and be
/// shared between the polling task and a consumer task.
pub struct TouchMailbox<M: RawMutex> {
    slot: Mutex<M, RefCell<Slot>>,
}

impl<M: RawMutex> TouchMailbox<M> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot {
                value: None,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Store a sample, replacing the previous one, and wake a pending [`Self::wait`].
    pub fn set(&self, sample: TouchInput) {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            slot.value = Some(sample);
            slot.waker.wake();
        })
    }

    /// Take the stored sample, if any.
    pub fn try_take(&self) -> Option<TouchInput> {
        self.slot.lock(|slot| slot.borrow_mut().value.take())
    }

    /// Look at the stored sample without removing it.
    pub fn peek(&self) -> Option<TouchInput> {
        self.slot.lock(|slot| slot.borrow().value)
    }

    pub fn clear(&self) {
        self.slot.lock(|slot| slot.borrow_mut().value = None)
    }

    /// Wait until a sample is stored, then take it.
    ///
    /// Only one waiter is tracked at a time.
    pub async fn wait(&self) -> TouchInput {
        poll_fn(|cx| {
            self.slot.lock(|slot| {
                let mut slot = slot.borrow_mut();
                match slot.value.take() {
                    Some(sample) => Poll::Ready(sample),
                    None => {
                        slot.waker.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }
}

impl<M: RawMutex> Default for TouchMailbox<M> {
    fn default() -> Self {
        Self::new()
    }
}
