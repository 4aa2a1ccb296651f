//! # Graphics Backend
//!
//! The terrain core decides *what* geometry exists and *when* it changes; the
//! calls that move bytes to the GPU go through the `GraphicsBackend` trait.
//! Every method is only ever called from the main thread.
//!
//! `RecordingBackend` keeps uploaded buffers in memory and logs every call.
//! It backs the headless binary and the integration tests.

use std::collections::HashMap;

use log::warn;

use crate::engine_state::voxels::chunk::sign::Sign;

/// Opaque handle to a GPU-resident buffer.
pub type BufferHandle = u32;

/// The graphics calls the terrain core issues.
pub trait GraphicsBackend {
    /// Uploads a new vertex buffer and returns its handle.
    fn upload(&mut self, data: &[u8]) -> BufferHandle;

    /// Releases a buffer previously returned by `upload` or `upload_signs`.
    fn release(&mut self, handle: BufferHandle);

    /// Overwrites `data.len()` bytes of an existing buffer starting at
    /// byte `offset`.
    fn partial_update(&mut self, handle: BufferHandle, offset: usize, data: &[u8]);

    /// Builds and uploads the glyph geometry for a chunk's signs.
    fn upload_signs(&mut self, signs: &[Sign]) -> BufferHandle;
}

/// A single call received by a `RecordingBackend`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// `upload` of `len` bytes returned `handle`.
    Upload {
        /// Returned handle.
        handle: BufferHandle,
        /// Uploaded byte count.
        len: usize,
    },
    /// `release(handle)`.
    Release(BufferHandle),
    /// `partial_update` of `len` bytes at byte `offset`.
    PartialUpdate {
        /// Target buffer.
        handle: BufferHandle,
        /// Byte offset.
        offset: usize,
        /// Byte count.
        len: usize,
    },
    /// `upload_signs` of `count` signs returned `handle`.
    UploadSigns {
        /// Returned handle.
        handle: BufferHandle,
        /// Number of signs.
        count: usize,
    },
}

/// An in-memory backend that records every call.
///
/// Handle `0` is never issued.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: BufferHandle,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        RecordingBackend::default()
    }

    /// Contents of a live buffer.
    pub fn buffer(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(Vec::as_slice)
    }

    /// Number of buffers uploaded and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Every call received, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forgets the call log, keeping the buffers.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn allocate(&mut self, data: Vec<u8>) -> BufferHandle {
        self.next_handle += 1;
        self.buffers.insert(self.next_handle, data);
        self.next_handle
    }
}

impl GraphicsBackend for RecordingBackend {
    fn upload(&mut self, data: &[u8]) -> BufferHandle {
        let handle = self.allocate(data.to_vec());
        self.calls.push(BackendCall::Upload {
            handle,
            len: data.len(),
        });
        handle
    }

    fn release(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_none() {
            warn!("Released unknown buffer {}", handle);
        }
        self.calls.push(BackendCall::Release(handle));
    }

    fn partial_update(&mut self, handle: BufferHandle, offset: usize, data: &[u8]) {
        self.calls.push(BackendCall::PartialUpdate {
            handle,
            offset,
            len: data.len(),
        });
        let Some(buffer) = self.buffers.get_mut(&handle) else {
            warn!("Partial update of unknown buffer {}", handle);
            return;
        };
        match buffer.get_mut(offset..offset + data.len()) {
            Some(range) => range.copy_from_slice(data),
            None => warn!(
                "Partial update of {} bytes at {} overruns buffer {} ({} bytes)",
                data.len(),
                offset,
                handle,
                buffer.len()
            ),
        }
    }

    fn upload_signs(&mut self, signs: &[Sign]) -> BufferHandle {
        let text: Vec<u8> = signs
            .iter()
            .flat_map(|sign| sign.text.bytes())
            .collect();
        let handle = self.allocate(text);
        self.calls.push(BackendCall::UploadSigns {
            handle,
            count: signs.len(),
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_nonzero() {
        let mut backend = RecordingBackend::new();
        let a = backend.upload(&[1, 2, 3]);
        let b = backend.upload(&[4]);
        assert_ne!(a, 0);
        assert_ne!(a, b);
        backend.release(a);
        assert_eq!(backend.live_buffers(), 1);
        assert!(backend.buffer(a).is_none());
    }

    #[test]
    fn partial_update_patches_in_place() {
        let mut backend = RecordingBackend::new();
        let handle = backend.upload(&[0; 8]);
        backend.partial_update(handle, 4, &[9, 9]);
        assert_eq!(backend.buffer(handle), Some(&[0, 0, 0, 0, 9, 9, 0, 0][..]));
        backend.partial_update(handle, 7, &[1, 1]);
        assert_eq!(backend.buffer(handle).unwrap()[7], 0);
    }
}
