//! Fixed-capacity timestamp storage.

use cyclebench_common::error::{BenchError, BenchResult};

/// Append-only buffer of per-cycle timestamps, in seconds.
///
/// Capacity is fixed up front, sized to the configured cycle count, so the
/// sampling loop never allocates. Writing past capacity is rejected rather
/// than grown.
#[derive(Debug)]
pub struct TimestampBuffer {
    samples: Vec<f64>,
    capacity: usize,
}

impl TimestampBuffer {
    /// Allocate a buffer holding exactly `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::Allocation`] if the reservation fails.
    pub fn with_capacity(capacity: usize) -> BenchResult<Self> {
        let mut samples = Vec::new();
        samples.try_reserve_exact(capacity).map_err(|e| {
            BenchError::Allocation(format!("timestamp buffer of {capacity} samples: {e}"))
        })?;
        Ok(Self { samples, capacity })
    }

    /// Append one timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::BufferFull`] once `capacity` samples are stored.
    pub fn push(&mut self, seconds: f64) -> BenchResult<()> {
        if self.samples.len() >= self.capacity {
            return Err(BenchError::BufferFull {
                capacity: self.capacity,
            });
        }
        self.samples.push(seconds);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored timestamps in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut buffer = TimestampBuffer::with_capacity(3).unwrap();
        buffer.push(0.1).unwrap();
        buffer.push(0.2).unwrap();
        buffer.push(0.3).unwrap();
        assert_eq!(buffer.as_slice(), &[0.1, 0.2, 0.3]);
        assert!(buffer.is_full());
    }

    #[test]
    fn test_push_past_capacity_is_rejected() {
        let mut buffer = TimestampBuffer::with_capacity(1).unwrap();
        buffer.push(1.0).unwrap();
        let err = buffer.push(2.0).unwrap_err();
        assert_eq!(err, BenchError::BufferFull { capacity: 1 });
        // The stored sample is untouched.
        assert_eq!(buffer.as_slice(), &[1.0]);
    }

    #[test]
    fn test_zero_capacity_rejects_first_push() {
        let mut buffer = TimestampBuffer::with_capacity(0).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.push(1.0).is_err());
    }

    #[test]
    fn test_absurd_capacity_fails_cleanly() {
        let err = TimestampBuffer::with_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, BenchError::Allocation(_)));
    }
}
