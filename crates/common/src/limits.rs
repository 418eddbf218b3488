use serde::{Deserialize, Serialize};

/// Errors from validating device-reported limits.
#[derive(Debug, thiserror::Error)]
pub enum LimitsError {
    #[error("uniform offset alignment {0} is not a power of two")]
    BadAlignment(u32),
    #[error("maximum uniform block size {0} is too small (need at least {1})")]
    BlockTooSmall(u32, u32),
}

/// GPU limits that size and align the uniform buffers.
///
/// Reported once by the graphics backend at startup; the scene uniform
/// writer sizes its buffers from `max_uniform_block_size` and aligns every
/// per-entity record to `uniform_offset_alignment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuLimits {
    /// Largest uniform block binding the device supports, in bytes.
    pub max_uniform_block_size: u32,
    /// Required alignment for uniform buffer binding offsets, in bytes.
    pub uniform_offset_alignment: u32,
}

impl GpuLimits {
    /// Smallest per-entity record size any device must accommodate.
    pub const MIN_BLOCK_SIZE: u32 = 256;

    pub fn new(max_uniform_block_size: u32, uniform_offset_alignment: u32) -> Result<Self, LimitsError> {
        if !uniform_offset_alignment.is_power_of_two() {
            return Err(LimitsError::BadAlignment(uniform_offset_alignment));
        }
        if max_uniform_block_size < Self::MIN_BLOCK_SIZE {
            return Err(LimitsError::BlockTooSmall(
                max_uniform_block_size,
                Self::MIN_BLOCK_SIZE,
            ));
        }
        Ok(Self {
            max_uniform_block_size,
            uniform_offset_alignment,
        })
    }
}

impl Default for GpuLimits {
    /// The wgpu baseline limits (64 KiB blocks, 256-byte offsets).
    fn default() -> Self {
        Self {
            max_uniform_block_size: 65_536,
            uniform_offset_alignment: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_valid() {
        let d = GpuLimits::default();
        assert!(GpuLimits::new(d.max_uniform_block_size, d.uniform_offset_alignment).is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        assert!(matches!(
            GpuLimits::new(65_536, 48),
            Err(LimitsError::BadAlignment(48))
        ));
    }

    #[test]
    fn rejects_tiny_block_size() {
        assert!(matches!(
            GpuLimits::new(128, 256),
            Err(LimitsError::BlockTooSmall(128, _))
        ));
    }
}
