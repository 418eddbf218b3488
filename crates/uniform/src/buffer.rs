use std::ops::Range;

use glam::{Mat4, Vec3, Vec4};

/// How often the buffer's contents change, forwarded to the graphics backend
/// when the GPU-side twin is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, read many frames.
    Static,
    /// Rewritten every frame or nearly so.
    Stream,
}

/// How a write scope treats the existing contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Reset `head` to zero; the scope rebuilds the buffer from the start.
    Replace,
    /// Keep `head` where it is; the scope appends or patches in place.
    Append,
}

/// A fixed-capacity byte region with a write cursor and alignment-padded
/// appends.
///
/// The buffer owns its storage and tracks the byte range written since the
/// last upload so the graphics backend can flush only what changed. All
/// writes go through a [`WriteScope`], which merges its touched range into
/// the buffer's dirty range when it drops.
#[derive(Debug)]
pub struct AlignedBuffer {
    bytes: Vec<u8>,
    head: usize,
    usage: BufferUsage,
    dirty: Option<Range<usize>>,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes. The capacity is
    /// fixed for the buffer's lifetime; sizing against device limits is the
    /// caller's job.
    pub fn allocate(capacity: usize, usage: BufferUsage) -> Self {
        tracing::debug!(capacity, ?usage, "uniform buffer allocated");
        Self {
            bytes: vec![0; capacity],
            head: 0,
            usage,
            dirty: None,
        }
    }

    /// Open a write scope. `Replace` resets the cursor first; `Append`
    /// leaves it in place for patching. The mutable borrow makes a second
    /// concurrent scope on the same buffer impossible.
    pub fn begin_write(&mut self, mode: WriteMode) -> WriteScope<'_> {
        if mode == WriteMode::Replace {
            self.head = 0;
        }
        WriteScope {
            touched: None,
            buf: self,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The byte range written since the last call, cleared on read. `None`
    /// means nothing changed and no upload is needed.
    pub fn take_dirty(&mut self) -> Option<Range<usize>> {
        self.dirty.take()
    }

    fn mark_dirty(&mut self, range: Range<usize>) {
        self.dirty = Some(match self.dirty.take() {
            Some(prior) => prior.start.min(range.start)..prior.end.max(range.end),
            None => range,
        });
    }
}

/// Scoped write access to an [`AlignedBuffer`].
///
/// Every path out of the scope, early return included, lands in `Drop`,
/// which publishes the touched byte range as the buffer's dirty range.
///
/// Capacity overflow and non-power-of-two alignment requests are sizing or
/// programming defects and panic; they are never runtime data conditions.
#[derive(Debug)]
pub struct WriteScope<'a> {
    buf: &'a mut AlignedBuffer,
    touched: Option<Range<usize>>,
}

impl WriteScope<'_> {
    pub fn head(&self) -> usize {
        self.buf.head
    }

    /// Advance `head` to the next multiple of `alignment`, zero-filling the
    /// skipped bytes. No-op when already aligned.
    pub fn align_head(&mut self, alignment: usize) {
        assert!(
            alignment.is_power_of_two(),
            "alignment {alignment} is not a power of two"
        );
        let aligned = (self.buf.head + alignment - 1) & !(alignment - 1);
        assert!(
            aligned <= self.buf.capacity(),
            "aligning head {} to {} exceeds capacity {}",
            self.buf.head,
            alignment,
            self.buf.capacity()
        );
        self.buf.bytes[self.buf.head..aligned].fill(0);
        self.buf.head = aligned;
    }

    /// Copy `src` to `head` and advance the cursor. Returns the offset the
    /// bytes landed at.
    pub fn push_bytes(&mut self, src: &[u8]) -> usize {
        let start = self.buf.head;
        let end = start + src.len();
        assert!(
            end <= self.buf.capacity(),
            "push of {} bytes at head {} exceeds capacity {}",
            src.len(),
            start,
            self.buf.capacity()
        );
        self.buf.bytes[start..end].copy_from_slice(src);
        self.buf.head = end;
        self.touch(start..end);
        start
    }

    /// Push a scalar at 4-byte alignment.
    pub fn push_u32(&mut self, value: u32) -> usize {
        self.align_head(4);
        self.push_bytes(&value.to_le_bytes())
    }

    /// Push a 3-component vector. Consumes a full 16-byte slot: the base
    /// alignment of a `vec3` in uniform blocks equals that of a `vec4`.
    pub fn push_vec3(&mut self, v: Vec3) -> usize {
        self.align_head(16);
        self.push_bytes(bytemuck::bytes_of(&v.extend(0.0)))
    }

    pub fn push_vec4(&mut self, v: Vec4) -> usize {
        self.align_head(16);
        self.push_bytes(bytemuck::bytes_of(&v))
    }

    /// Push a column-major 4x4 matrix as four 16-byte columns.
    pub fn push_mat4(&mut self, m: &Mat4) -> usize {
        self.align_head(16);
        self.push_bytes(bytemuck::bytes_of(m))
    }

    /// Overwrite bytes at an earlier offset without moving `head`. The
    /// target range must already have been written.
    pub fn write_at(&mut self, offset: usize, src: &[u8]) {
        let end = offset + src.len();
        assert!(
            end <= self.buf.head,
            "write_at {offset}..{end} reaches past head {}",
            self.buf.head
        );
        self.buf.bytes[offset..end].copy_from_slice(src);
        self.touch(offset..end);
    }

    fn touch(&mut self, range: Range<usize>) {
        self.touched = Some(match self.touched.take() {
            Some(prior) => prior.start.min(range.start)..prior.end.max(range.end),
            None => range,
        });
    }
}

impl Drop for WriteScope<'_> {
    fn drop(&mut self) {
        if let Some(range) = self.touched.take() {
            tracing::trace!(start = range.start, end = range.end, "write scope flushed");
            self.buf.mark_dirty(range);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_head_reaches_every_power_of_two() {
        let mut buf = AlignedBuffer::allocate(1024, BufferUsage::Stream);
        let mut scope = buf.begin_write(WriteMode::Replace);
        scope.push_bytes(&[1, 2, 3]);
        let mut last = scope.head();
        for a in [1usize, 2, 4, 8, 16, 32, 64, 128, 256] {
            scope.align_head(a);
            assert_eq!(scope.head() % a, 0);
            assert!(scope.head() >= last);
            last = scope.head();
        }
    }

    #[test]
    fn align_head_zero_fills_the_gap() {
        let mut buf = AlignedBuffer::allocate(64, BufferUsage::Stream);
        let mut scope = buf.begin_write(WriteMode::Replace);
        scope.push_bytes(&[0xff; 5]);
        scope.align_head(16);
        assert_eq!(scope.head(), 16);
        drop(scope);
        assert_eq!(&buf.bytes()[5..16], &[0u8; 11]);
    }

    #[test]
    fn vec3_always_consumes_sixteen_bytes() {
        let mut buf = AlignedBuffer::allocate(256, BufferUsage::Stream);
        let mut scope = buf.begin_write(WriteMode::Replace);
        for v in [Vec3::ZERO, Vec3::ONE, Vec3::new(-0.5, 1e6, f32::MIN_POSITIVE)] {
            let before = scope.head();
            scope.push_vec3(v);
            assert_eq!(scope.head() - before, 16);
        }
    }

    #[test]
    fn write_at_patches_without_moving_head() {
        let mut buf = AlignedBuffer::allocate(64, BufferUsage::Stream);
        let mut scope = buf.begin_write(WriteMode::Replace);
        scope.push_u32(7);
        scope.push_u32(8);
        let head = scope.head();
        scope.write_at(0, &99u32.to_le_bytes());
        assert_eq!(scope.head(), head);
        drop(scope);
        assert_eq!(&buf.bytes()[0..4], &99u32.to_le_bytes());
        assert_eq!(&buf.bytes()[4..8], &8u32.to_le_bytes());
    }

    #[test]
    fn replace_resets_head_and_append_keeps_it() {
        let mut buf = AlignedBuffer::allocate(64, BufferUsage::Stream);
        buf.begin_write(WriteMode::Replace).push_u32(1);
        assert_eq!(buf.head(), 4);
        buf.begin_write(WriteMode::Append).push_u32(2);
        assert_eq!(buf.head(), 8);
        buf.begin_write(WriteMode::Replace).push_u32(3);
        assert_eq!(buf.head(), 4);
    }

    #[test]
    fn dirty_range_merges_across_writes_and_clears_on_take() {
        let mut buf = AlignedBuffer::allocate(256, BufferUsage::Stream);
        {
            let mut scope = buf.begin_write(WriteMode::Replace);
            scope.push_u32(1);
        }
        {
            let mut scope = buf.begin_write(WriteMode::Append);
            scope.align_head(128);
            scope.push_u32(2);
        }
        assert_eq!(buf.take_dirty(), Some(0..132));
        assert_eq!(buf.take_dirty(), None);
    }

    #[test]
    #[should_panic(expected = "exceeds capacity")]
    fn overflowing_push_panics() {
        let mut buf = AlignedBuffer::allocate(8, BufferUsage::Static);
        let mut scope = buf.begin_write(WriteMode::Replace);
        scope.push_bytes(&[0u8; 16]);
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn non_power_of_two_alignment_panics() {
        let mut buf = AlignedBuffer::allocate(64, BufferUsage::Static);
        let mut scope = buf.begin_write(WriteMode::Replace);
        scope.align_head(12);
    }

    #[test]
    fn mat4_round_trips_bit_for_bit() {
        let m = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.0),
        );
        let mut buf = AlignedBuffer::allocate(64, BufferUsage::Static);
        buf.begin_write(WriteMode::Replace).push_mat4(&m);
        let back: Mat4 = bytemuck::pod_read_unaligned(&buf.bytes()[0..64]);
        assert_eq!(back, m);
    }
}
