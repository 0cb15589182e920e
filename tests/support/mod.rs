#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chat_provider::CancelSignal;
use chatsh::Sleeper;

/// Records every requested sleep and raises `cancel` after `cancel_after` sleeps.
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
    cancel: CancelSignal,
    cancel_after: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            sleeps: Mutex::new(Vec::new()),
            cancel: Arc::new(AtomicBool::new(false)),
            cancel_after: None,
        }
    }

    pub fn cancelling_after(sleeps: usize) -> Self {
        Self {
            cancel_after: Some(sleeps),
            ..Self::new()
        }
    }

    pub fn cancel_signal(&self) -> CancelSignal {
        Arc::clone(&self.cancel)
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        lock_unpoisoned(&self.sleeps).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        let mut sleeps = lock_unpoisoned(&self.sleeps);
        sleeps.push(duration);
        if self.cancel_after.is_some_and(|limit| sleeps.len() >= limit) {
            self.cancel.store(true, Ordering::SeqCst);
        }
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
