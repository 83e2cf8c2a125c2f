//! Device sample formats.

/// A sample type the renderer can write.
///
/// Conversions expect input already clamped to `[-1, 1]`.
pub trait OutputSample: Copy + Send + 'static {
    /// The value of silence.
    const EQUILIBRIUM: Self;

    fn from_f32(sample: f32) -> Self;
}

impl OutputSample for f32 {
    const EQUILIBRIUM: Self = 0.0;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        sample
    }
}

impl OutputSample for i16 {
    const EQUILIBRIUM: Self = 0;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * i16::MAX as f32) as i16
    }
}

impl OutputSample for u16 {
    const EQUILIBRIUM: Self = 1 << 15;

    #[inline]
    fn from_f32(sample: f32) -> Self {
        (sample * i16::MAX as f32 + 32_768.0) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_16_bit() {
        assert_eq!(i16::from_f32(0.0), 0);
        assert_eq!(i16::from_f32(1.0), 32_767);
        assert_eq!(i16::from_f32(-1.0), -32_767);
        assert_eq!(i16::from_f32(0.5), 16_383);
    }

    #[test]
    fn unsigned_16_bit() {
        assert_eq!(u16::EQUILIBRIUM, 32_768);
        assert_eq!(u16::from_f32(0.0), 32_768);
        assert_eq!(u16::from_f32(1.0), 65_535);
        assert_eq!(u16::from_f32(-1.0), 1);
    }

    #[test]
    fn float_passes_through() {
        assert_eq!(f32::from_f32(-0.25), -0.25);
    }
}
