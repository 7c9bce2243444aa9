//! In-memory buffer backend.
//!
//! Stands in for the editor's buffer/window API: every buffer is a list of
//! lines keyed by handle. Tests read rendered output back through `lines`.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use widgetry_domain::{BufferBackend, BufferError, BufferHandle};

#[derive(Debug, Clone)]
struct BufferRecord {
    component_id: String,
    title: String,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryBuffers {
    buffers: DashMap<BufferHandle, BufferRecord>,
    next_handle: AtomicU64,
}

impl InMemoryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content of an open buffer
    pub fn lines(&self, handle: BufferHandle) -> Option<Vec<String>> {
        self.buffers.get(&handle).map(|b| b.lines.clone())
    }

    /// Content of the buffer owned by a component
    pub fn lines_for(&self, component_id: &str) -> Option<Vec<String>> {
        self.buffers
            .iter()
            .find(|entry| entry.component_id == component_id)
            .map(|entry| entry.lines.clone())
    }

    pub fn title(&self, handle: BufferHandle) -> Option<String> {
        self.buffers.get(&handle).map(|b| b.title.clone())
    }

    pub fn is_open(&self, handle: BufferHandle) -> bool {
        self.buffers.contains_key(&handle)
    }

    pub fn open_count(&self) -> usize {
        self.buffers.len()
    }
}

impl BufferBackend for InMemoryBuffers {
    fn create(&self, component_id: &str, title: &str) -> Result<BufferHandle, BufferError> {
        let handle = BufferHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.buffers.insert(
            handle,
            BufferRecord {
                component_id: component_id.to_string(),
                title: title.to_string(),
                lines: Vec::new(),
            },
        );
        tracing::trace!(component_id = %component_id, buffer = %handle, "Buffer created");
        Ok(handle)
    }

    fn set_lines(&self, handle: BufferHandle, lines: &[String]) -> Result<(), BufferError> {
        let mut record = self
            .buffers
            .get_mut(&handle)
            .ok_or(BufferError::NotFound(handle))?;
        record.lines = lines.to_vec();
        Ok(())
    }

    fn close(&self, handle: BufferHandle) -> Result<(), BufferError> {
        self.buffers
            .remove(&handle)
            .map(|_| ())
            .ok_or(BufferError::NotFound(handle))
    }
}
