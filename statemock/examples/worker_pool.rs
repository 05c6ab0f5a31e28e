// vim: tw=80
//! Share one mock between the threads of a worker pool
//!
//! A synchronized mock serializes every call on one reentrant lock, so that
//! the state transitions of concurrent calls never interleave.  It also
//! verifies itself when dropped.
#![deny(warnings)]

use std::{sync::Arc, thread};

use statemock::*;

pub trait JobQueue: Send + Sync {
    fn next_job(&self) -> Option<u32>;
    fn complete(&self, job: u32);
}

pub struct MockJobQueue {
    ctrl: Controller,
    next_job: Arc<Method<(), Option<u32>>>,
    complete: Arc<Method<(u32,), ()>>,
}

impl MockJobQueue {
    pub fn new() -> Result<Self, Error> {
        let mut ctrl = Controller::with_config(Config::new()
            .synchronized(true)
            .verify_on_drop(true));
        let next_job = ctrl.method("MockJobQueue::next_job", signature!())?;
        let complete = ctrl.method("MockJobQueue::complete",
                                   signature!(u32))?;
        Ok(MockJobQueue { ctrl, next_job, complete })
    }

    /// Hand out jobs `1..=n`, then report the queue as drained.
    pub fn expect_jobs(&self, n: u32) {
        let mut issued = 0;
        self.next_job.expect()
            .times(n as usize)
            .returning(move |_| {
                issued += 1;
                Some(issued)
            });
        self.next_job.expect()
            .times_any()
            .postcondition("drained")
            .return_const(None);
        self.complete.expect()
            .times(n as usize)
            .withf(move |&(job,)| (1..=n).contains(&job))
            .return_const(());
    }
}

impl JobQueue for MockJobQueue {
    fn next_job(&self) -> Option<u32> {
        self.next_job.call(())
    }

    fn complete(&self, job: u32) {
        self.complete.call((job,))
    }
}

/// The code under test: drain `queue` with `workers` threads.
fn run_pool(queue: Arc<dyn JobQueue>, workers: usize) -> usize {
    let handles = (0..workers).map(|_| {
        let q = queue.clone();
        thread::spawn(move || {
            let mut done = 0;
            while let Some(job) = q.next_job() {
                q.complete(job);
                done += 1;
            }
            done
        })
    }).collect::<Vec<_>>();
    handles.into_iter()
        .map(|h| h.join().unwrap_or(0))
        .sum()
}

fn main() -> Result<(), Error> {
    let queue = Arc::new(MockJobQueue::new()?);
    queue.expect_jobs(20);
    let done = run_pool(queue.clone(), 4);
    println!("{} jobs done, queue is {}", done, queue.ctrl.current());
    Ok(())
}
