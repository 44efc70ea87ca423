//! The single growable buffer shared by request serialization and
//! response reading.

/// Default minimum capacity a freshly grown buffer is given, used unless
/// [`crate::config::ClientConfig::with_initial_capacity`] overrides it.
pub const DEFAULT_INITIAL_CAPACITY: usize = 2048;

/// Default minimum spare capacity the response reader keeps available
/// before each `read` call, used unless
/// [`crate::config::ClientConfig::with_read_ahead`] overrides it.
pub const DEFAULT_READ_AHEAD: usize = 1024;

/// A contiguous byte region that grows by doubling, never shrinks, and is
/// reused across requests by clearing rather than reallocating.
///
/// The engine owns exactly one of these. It is cleared at the start of
/// each phase (serializing a request, then reading a response) so the two
/// uses never overlap.
#[derive(Debug)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    min_growth: usize,
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::with_min_growth(DEFAULT_INITIAL_CAPACITY)
    }

    /// Like [`Self::new`], but grows by doubling from `min_growth` instead
    /// of [`DEFAULT_INITIAL_CAPACITY`].
    pub fn with_min_growth(min_growth: usize) -> Self {
        Self {
            data: Vec::new(),
            min_growth,
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Ensure at least `min_spare` bytes of spare capacity exist, growing
    /// by doubling from this buffer's configured minimum growth when it
    /// needs to expand.
    pub fn reserve_spare(&mut self, min_spare: usize) {
        if self.data.capacity() - self.data.len() >= min_spare {
            return;
        }
        let needed = self.data.len() + min_spare;
        let mut target = self.data.capacity().max(self.min_growth);
        while target < needed {
            target *= 2;
        }
        self.data.reserve(target - self.data.len());
    }

    /// Grow the buffer's length by `count` uninitialized-then-read bytes,
    /// used after a successful `read` fills the tail via
    /// [`Self::spare_mut`].
    ///
    /// # Safety
    /// Callers must have just written exactly `count` valid bytes into the
    /// region returned by the most recent [`Self::spare_mut`] call.
    pub unsafe fn assume_filled(&mut self, count: usize) {
        let new_len = self.data.len() + count;
        debug_assert!(new_len <= self.data.capacity());
        self.data.set_len(new_len);
    }

    /// A mutable view over the buffer's spare capacity, for `read` to fill
    /// directly without an intermediate copy.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let len = self.data.len();
        let cap = self.data.capacity();
        // Safety: bytes in [len, cap) are allocated but not yet
        // initialized as far as `Vec` is concerned; we hand them out as a
        // `&mut [u8]` scratch region and only commit the prefix that a
        // successful `read` actually wrote, via `assume_filled`.
        unsafe {
            std::slice::from_raw_parts_mut(self.data.as_mut_ptr().add(len), cap - len)
        }
    }
}
