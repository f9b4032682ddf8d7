//! Off-thread dispatch around the synchronous decoder.
//!
//! The decoder itself has no threading; these helpers only move buffers and
//! results between threads.

use std::thread::JoinHandle;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;

use crate::decode::{DecodedTile, decode};
use crate::error::Result;
use crate::options::DecodeOptions;

type Reply = Result<DecodedTile>;

struct Job {
    buffer: Vec<u8>,
    options: DecodeOptions,
    reply: Sender<Reply>,
}

/// A pool of decode threads fed through a channel. Dropping the pool lets the
/// threads drain the queue and then joins them.
pub struct DecodeWorker {
    jobs: Sender<Job>,
    handles: Vec<JoinHandle<()>>,
}

impl DecodeWorker {
    pub fn spawn(threads: usize) -> std::io::Result<Self> {
        let (jobs, queue) = crossbeam_channel::unbounded::<Job>();
        let mut handles = Vec::with_capacity(threads.max(1));
        for index in 0..threads.max(1) {
            let queue = queue.clone();
            let handle = std::thread::Builder::new()
                .name(format!("mvt-decode-{index}"))
                .spawn(move || run(queue))?;
            handles.push(handle);
        }
        Ok(Self { jobs, handles })
    }

    /// Queues a decode and returns the channel its result will arrive on. If
    /// every worker thread has died the job is dropped and the channel closes
    /// without a value.
    pub fn submit(&self, buffer: Vec<u8>, options: DecodeOptions) -> Receiver<Reply> {
        let (reply, result) = crossbeam_channel::bounded(1);
        let job = Job {
            buffer,
            options,
            reply,
        };
        if self.jobs.send(job).is_err() {
            tracing::warn!("no decode worker threads left");
        }
        result
    }

    /// Submits and waits.
    pub fn decode(&self, buffer: Vec<u8>, options: DecodeOptions) -> anyhow::Result<DecodedTile> {
        let reply = self
            .submit(buffer, options)
            .recv()
            .context("decode worker stopped before replying")?;
        Ok(reply?)
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        // Swap in a sender with no receiver so the workers see the queue close.
        let (closed, _) = crossbeam_channel::bounded(0);
        drop(std::mem::replace(&mut self.jobs, closed));
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("decode worker thread panicked");
            }
        }
    }
}

fn run(queue: Receiver<Job>) {
    for job in queue.iter() {
        let result = decode(&job.buffer, &job.options);
        // The submitter may have stopped listening.
        let _ = job.reply.send(result);
    }
}

/// Decodes independent buffers in parallel, preserving input order.
pub fn decode_batch<B>(buffers: &[B], options: &DecodeOptions) -> Vec<Result<DecodedTile>>
where
    B: AsRef<[u8]> + Sync,
{
    buffers
        .par_iter()
        .map(|buffer| decode(buffer.as_ref(), options))
        .collect()
}
