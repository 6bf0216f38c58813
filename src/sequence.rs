//! Variable-width integer sequences and their lifting into the scalar field.
//!
//! A [`Sequence`] describes a contiguous caller-owned buffer of little-endian
//! integers of a common byte width. Unsigned elements are zero-extended and
//! reduced modulo the group order; signed elements are read as
//! two's-complement, so a negative value `e` lifts to `ℓ − |e|`.

use curve25519_dalek::scalar::Scalar;

/// Widest supported element, matching the scalar encoding width.
pub const MAX_ELEMENT_NBYTES: usize = 32;

/// Widest supported signed element.
pub const MAX_SIGNED_ELEMENT_NBYTES: usize = 16;

/// A borrowed sequence of fixed-width little-endian integers.
#[derive(Clone, Copy, Debug)]
pub struct Sequence<'a> {
    data: &'a [u8],
    element_nbytes: usize,
    is_signed: bool,
}

impl<'a> Sequence<'a> {
    /// Wraps a raw buffer as a sequence of `element_nbytes`-wide integers.
    ///
    /// Panics on an unsupported width or a buffer that is not a whole number
    /// of elements; both indicate caller misuse.
    pub fn new(data: &'a [u8], element_nbytes: usize, is_signed: bool) -> Self {
        assert!(
            (1..=MAX_ELEMENT_NBYTES).contains(&element_nbytes),
            "element width must be between 1 and 32 bytes"
        );
        assert!(
            element_nbytes.is_power_of_two(),
            "element width must be a power of two"
        );
        assert!(
            !is_signed || element_nbytes <= MAX_SIGNED_ELEMENT_NBYTES,
            "signed elements are limited to 16 bytes"
        );
        assert!(
            data.len() % element_nbytes == 0,
            "data length must be a multiple of the element width"
        );
        Self {
            data,
            element_nbytes,
            is_signed,
        }
    }

    /// An unsigned sequence.
    pub fn unsigned(data: &'a [u8], element_nbytes: usize) -> Self {
        Self::new(data, element_nbytes, false)
    }

    /// A two's-complement signed sequence.
    pub fn signed(data: &'a [u8], element_nbytes: usize) -> Self {
        Self::new(data, element_nbytes, true)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.element_nbytes
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn element_nbytes(&self) -> usize {
        self.element_nbytes
    }

    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// The underlying little-endian bytes.
    pub fn raw_data(&self) -> &'a [u8] {
        self.data
    }

    /// Lifts the `index`-th element into the scalar field.
    pub fn scalar(&self, index: usize) -> Scalar {
        let width = self.element_nbytes;
        lift(&self.data[index * width..(index + 1) * width], self.is_signed)
    }

    /// Lifts every element, in order.
    pub fn scalars(&self) -> impl Iterator<Item = Scalar> + 'a {
        let is_signed = self.is_signed;
        self.data
            .chunks_exact(self.element_nbytes)
            .map(move |chunk| lift(chunk, is_signed))
    }

    /// Narrow fast path: the raw machine words of an unsigned sequence whose
    /// width fits in a `u64`. The MSM engine buckets these directly instead
    /// of materializing a scalar per element.
    pub(crate) fn as_u64_words(&self) -> Option<impl Iterator<Item = u64> + 'a> {
        if self.is_signed || self.element_nbytes > 8 {
            return None;
        }
        let width = self.element_nbytes;
        Some(self.data.chunks_exact(width).map(move |chunk| {
            let mut le = [0u8; 8];
            le[..width].copy_from_slice(chunk);
            u64::from_le_bytes(le)
        }))
    }
}

fn lift(chunk: &[u8], is_signed: bool) -> Scalar {
    if is_signed {
        return lift_signed(chunk);
    }
    let mut le = [0u8; 32];
    le[..chunk.len()].copy_from_slice(chunk);
    Scalar::from_bytes_mod_order(le)
}

fn lift_signed(chunk: &[u8]) -> Scalar {
    let width = chunk.len();
    let mut le = [0u8; 16];
    le[..width].copy_from_slice(chunk);
    let magnitude = u128::from_le_bytes(le);
    if chunk[width - 1] & 0x80 == 0 {
        return Scalar::from(magnitude);
    }
    // Two's-complement negation within the element width; the sign bit
    // guarantees magnitude != 0, so the absolute value fits the width.
    let width_mask = if width == 16 {
        u128::MAX
    } else {
        (1u128 << (8 * width)) - 1
    };
    let absolute = ((!magnitude) & width_mask).wrapping_add(1);
    -Scalar::from(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_elements_zero_extend() {
        let data: Vec<u8> = vec![1, 2, 0xff];
        let sequence = Sequence::unsigned(&data, 1);
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.scalar(0), Scalar::from(1u64));
        assert_eq!(sequence.scalar(1), Scalar::from(2u64));
        assert_eq!(sequence.scalar(2), Scalar::from(255u64));
    }

    #[test]
    fn wide_unsigned_elements_reduce_modulo_the_group_order() {
        // 2^256 - 1 reduces, it does not panic.
        let data = [0xffu8; 32];
        let sequence = Sequence::unsigned(&data, 32);
        let expected = Scalar::from_bytes_mod_order([0xffu8; 32]);
        assert_eq!(sequence.scalar(0), expected);
    }

    #[test]
    fn signed_negative_elements_wrap_to_the_scalar_field() {
        for width in [1usize, 2, 4, 8, 16] {
            // -1 at every width is ℓ - 1.
            let data = vec![0xffu8; width];
            let sequence = Sequence::signed(&data, width);
            assert_eq!(sequence.scalar(0), -Scalar::from(1u64), "width {width}");
        }
    }

    #[test]
    fn signed_minimum_value_lifts_correctly() {
        // i16::MIN = -32768.
        let data = (-32768i16).to_le_bytes();
        let sequence = Sequence::signed(&data, 2);
        assert_eq!(sequence.scalar(0), -Scalar::from(32768u64));

        // i128::MIN = -2^127.
        let data = i128::MIN.to_le_bytes();
        let sequence = Sequence::signed(&data, 16);
        assert_eq!(sequence.scalar(0), -Scalar::from(1u128 << 127));
    }

    #[test]
    fn signed_and_unsigned_agree_on_non_negative_values() {
        let values: Vec<i32> = vec![0, 1, 7, 1 << 20, i32::MAX];
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let signed = Sequence::signed(&data, 4);
        let unsigned = Sequence::unsigned(&data, 4);
        let lhs: Vec<Scalar> = signed.scalars().collect();
        let rhs: Vec<Scalar> = unsigned.scalars().collect();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn narrow_words_match_scalar_lifting() {
        let values: Vec<u32> = vec![0, 1, 42, u32::MAX];
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let sequence = Sequence::unsigned(&data, 4);
        let words: Vec<u64> = sequence.as_u64_words().expect("narrow path").collect();
        for (word, scalar) in words.iter().zip(sequence.scalars()) {
            assert_eq!(Scalar::from(*word), scalar);
        }
    }

    #[test]
    fn signed_sequences_have_no_narrow_path() {
        let data = [0u8; 8];
        assert!(Sequence::signed(&data, 4).as_u64_words().is_none());
        assert!(Sequence::unsigned(&data, 4).as_u64_words().is_some());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_widths_that_are_not_powers_of_two() {
        let data = [0u8; 6];
        let _ = Sequence::unsigned(&data, 3);
    }

    #[test]
    #[should_panic(expected = "signed elements are limited")]
    fn rejects_wide_signed_elements() {
        let data = [0u8; 32];
        let _ = Sequence::signed(&data, 32);
    }

    #[test]
    #[should_panic(expected = "multiple of the element width")]
    fn rejects_ragged_buffers() {
        let data = [0u8; 7];
        let _ = Sequence::unsigned(&data, 2);
    }
}
