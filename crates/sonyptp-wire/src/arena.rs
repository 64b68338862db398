//! Growable byte arena for decoded records.
//!
//! Every variable-length part of one decoded object (strings, arrays, enum
//! lists) is appended into a single buffer. Records keep [`Span`]s, which are
//! offsets from the arena base, so growth never invalidates them. The raw
//! address API ([`Arena::begin`], [`Arena::update`], [`Arena::addr_of`]) and
//! the relocation hook exist for callers that observe base addresses.

use std::fmt;

use crate::error::ArenaError;

/// Extra bytes reserved on every growth, on top of the requested size.
pub const GROWTH_SLACK: usize = 1024;

/// A region inside an [`Arena`], stored as an offset from its base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The base address change caused by one growth or compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub old_base: usize,
    pub new_base: usize,
}

impl Relocation {
    /// Signed distance the base moved.
    pub fn delta(&self) -> isize {
        self.new_base.wrapping_sub(self.old_base) as isize
    }

    /// Shift an address captured against the old base.
    pub fn rebase(&self, addr: usize) -> usize {
        addr.wrapping_sub(self.old_base).wrapping_add(self.new_base)
    }
}

/// Base address captured by [`Arena::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    base: usize,
}

type RelocateHook = Box<dyn FnMut(Relocation) + Send>;

/// One contiguous growable buffer holding a decoded object graph.
pub struct Arena {
    buf: Vec<u8>,
    relocations: usize,
    on_relocate: Option<RelocateHook>,
}

impl Arena {
    /// Create an arena with room for `capacity` bytes before the first growth.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            relocations: 0,
            on_relocate: None,
        }
    }

    /// Observe every growth. The hook runs exactly once per growing append.
    pub fn on_relocate(mut self, hook: impl FnMut(Relocation) + Send + 'static) -> Self {
        self.on_relocate = Some(Box::new(hook));
        self
    }

    /// Copy `data` to the end of the arena.
    pub fn append(&mut self, data: &[u8]) -> Result<Span, ArenaError> {
        self.reserve_for(data.len())?;
        let offset = self.buf.len();
        self.buf.extend_from_slice(data);
        Ok(Span::new(offset, data.len()))
    }

    /// Reserve `len` zero bytes at the end of the arena.
    pub fn append_zeroed(&mut self, len: usize) -> Result<Span, ArenaError> {
        self.reserve_for(len)?;
        let offset = self.buf.len();
        self.buf.resize(offset + len, 0);
        Ok(Span::new(offset, len))
    }

    fn reserve_for(&mut self, requested: usize) -> Result<(), ArenaError> {
        if self.buf.capacity() - self.buf.len() >= requested {
            return Ok(());
        }
        let old_base = self.base_addr();
        let additional = requested
            .checked_add(GROWTH_SLACK)
            .ok_or(ArenaError::Alloc { requested })?;
        self.buf
            .try_reserve_exact(additional)
            .map_err(|_| ArenaError::Alloc { requested })?;
        self.relocated(old_base);
        Ok(())
    }

    fn relocated(&mut self, old_base: usize) {
        self.relocations += 1;
        let relocation = Relocation {
            old_base,
            new_base: self.base_addr(),
        };
        if let Some(hook) = self.on_relocate.as_mut() {
            hook(relocation);
        }
    }

    /// Drop all contents but keep the capacity for reuse.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Shrink capacity down to the logical size.
    ///
    /// The hook runs only if the base address changed.
    pub fn truncate(&mut self) {
        let old_base = self.base_addr();
        self.buf.shrink_to_fit();
        if self.base_addr() != old_base {
            self.relocated(old_base);
        }
    }

    /// Capture the current base address.
    pub fn begin(&self) -> Snapshot {
        Snapshot {
            base: self.base_addr(),
        }
    }

    /// Shift `addr`, captured under `snapshot`, onto the current base.
    pub fn update(&self, snapshot: &Snapshot, addr: &mut usize) {
        let base = self.base_addr();
        if base != snapshot.base {
            *addr = addr.wrapping_sub(snapshot.base).wrapping_add(base);
        }
    }

    /// Current base address of the buffer.
    pub fn base_addr(&self) -> usize {
        self.buf.as_ptr() as usize
    }

    /// Address of the first byte of `span` under the current base.
    pub fn addr_of(&self, span: Span) -> usize {
        self.base_addr().wrapping_add(span.offset)
    }

    /// Bytes covered by `span`, or `None` if it reaches past the end.
    pub fn slice(&self, span: Span) -> Option<&[u8]> {
        self.buf.get(span.offset..span.end())
    }

    /// Mutable bytes covered by `span`.
    pub fn slice_mut(&mut self, span: Span) -> Option<&mut [u8]> {
        self.buf.get_mut(span.offset..span.end())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Number of growths (and moving compactions) so far.
    pub fn relocations(&self) -> usize {
        self.relocations
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .field("relocations", &self.relocations)
            .finish()
    }
}
