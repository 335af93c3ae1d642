use crate::buffer::RetentionBuffer;
use crate::types::ImuSample;
use crate::{ImuError, Result};
use crossbeam_channel::{Receiver, Sender};

/// Pending commands before `push` starts blocking the connection thread.
const COMMAND_QUEUE_DEPTH: usize = 1024;

enum Command {
    Push(ImuSample),
    Snapshot(Sender<Vec<ImuSample>>),
    Len(Sender<usize>),
}

/// Handle to the shared retention buffer.
///
/// The buffer lives on a dedicated owner thread; handles only send it
/// commands over a channel, so pushes from concurrent connections are
/// applied one at a time in arrival order. Handles are cheap to clone.
/// The owner thread exits once every handle has been dropped.
#[derive(Debug, Clone)]
pub struct SampleStore {
    sender: Sender<Command>,
}

impl SampleStore {
    /// Start the owner thread with an empty buffer of `capacity` samples.
    pub fn spawn(capacity: usize) -> Result<SampleStore> {
        let (sender, receiver) = crossbeam_channel::bounded(COMMAND_QUEUE_DEPTH);
        let buffer = RetentionBuffer::new(capacity);

        std::thread::Builder::new()
            .name("imu-store".into())
            .spawn(move || {
                store_loop(buffer, receiver);
            })?;

        Ok(SampleStore { sender })
    }

    /// Append a sample, evicting the oldest one at capacity.
    pub fn push(&self, sample: ImuSample) -> Result<()> {
        self.sender
            .send(Command::Push(sample))
            .map_err(|_| ImuError::StoreStopped)
    }

    /// Buffer contents, oldest first.
    pub fn snapshot(&self) -> Result<Vec<ImuSample>> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.sender
            .send(Command::Snapshot(reply))
            .map_err(|_| ImuError::StoreStopped)?;
        response.recv().map_err(|_| ImuError::StoreStopped)
    }

    pub fn len(&self) -> Result<usize> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.sender
            .send(Command::Len(reply))
            .map_err(|_| ImuError::StoreStopped)?;
        response.recv().map_err(|_| ImuError::StoreStopped)
    }

    /// Most recently pushed sample, if any.
    pub fn latest(&self) -> Result<Option<ImuSample>> {
        Ok(self.snapshot()?.last().copied())
    }
}

/// Owner loop: the only code that touches the buffer.
fn store_loop(mut buffer: RetentionBuffer, receiver: Receiver<Command>) {
    log::debug!("Sample store started (capacity {})", buffer.capacity());

    for command in receiver.iter() {
        match command {
            Command::Push(sample) => buffer.push(sample),
            Command::Snapshot(reply) => {
                // Requester may have given up; nothing to do then.
                let _ = reply.send(buffer.snapshot());
            }
            Command::Len(reply) => {
                let _ = reply.send(buffer.len());
            }
        }
    }

    log::debug!("Sample store stopped ({} samples discarded)", buffer.len());
}
