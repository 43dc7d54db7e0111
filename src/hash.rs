//! Key hashing: FNV-1a over the raw bytes of primitive keys.
//!
//! Only keys with a deterministic identity can be hashed. Primitive numbers,
//! `char`, `bool`, strings and contiguous arrays of primitives hash their
//! native-endian bytes with FNV-1a. Composite keys either implement
//! [`KeyHash`] themselves or are wrapped in [`ByHash`], which feeds their
//! `core::hash::Hash` impl into an [`FnvHasher`]. Pointers and closures have no
//! implementation and are rejected at compile time.

use core::hash::{BuildHasher, Hash, Hasher};

const FNV32_PRIME: u32 = 0x0100_0193;
const FNV32_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01B3;
const FNV64_OFFSET_BASIS: u64 = 0xCBF2_9CE4_8422_2325;

/// 32-bit FNV-1a over `bytes`.
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
        i += 1;
    }
    hash
}

/// 64-bit FNV-1a over `bytes`.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV64_PRIME);
        i += 1;
    }
    hash
}

/// Streaming 64-bit FNV-1a state.
#[derive(Debug, Copy, Clone)]
pub struct FnvHasher {
    hash: u64,
}

impl FnvHasher {
    /// Creates a new [`FnvHasher`], initialized with the 64-bit offset basis.
    pub const fn new() -> Self {
        Self {
            hash: FNV64_OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash ^= *byte as u64;
            self.hash = self.hash.wrapping_mul(FNV64_PRIME);
        }
    }
}

/// Builder for [`FnvHasher`].
#[derive(Debug, Copy, Clone, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> Self::Hasher {
        FnvHasher::new()
    }
}

/// Keys that map deterministically to a 64-bit hash value.
///
/// Two keys that compare equal must produce the same hash, and a borrowed form
/// `Q` of an owned key `K` (`K: Borrow<Q>`) must hash identically to `K`.
pub trait KeyHash {
    /// Feed the key's bytes into `state`.
    fn write_key(&self, state: &mut FnvHasher);

    /// The key's hash value.
    #[inline]
    fn to_hash(&self) -> u64 {
        let mut state = FnvHasher::new();
        self.write_key(&mut state);
        state.finish()
    }
}

/// Primitive values whose raw bytes are their identity.
///
/// Arrays and slices of these hash as one contiguous byte run, so `[1u8, 2]`
/// and `&[1u8, 2][..]` agree.
pub trait RawBytes: Copy {
    fn write_raw(&self, state: &mut FnvHasher);
}

macro_rules! raw_bytes_impl {
    ($($t:ty),* $(,)?) => {$(
        impl RawBytes for $t {
            #[inline]
            fn write_raw(&self, state: &mut FnvHasher) {
                state.write(&self.to_ne_bytes());
            }
        }

        impl KeyHash for $t {
            #[inline]
            fn write_key(&self, state: &mut FnvHasher) {
                self.write_raw(state);
            }
        }
    )*};
}

raw_bytes_impl!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl RawBytes for char {
    #[inline]
    fn write_raw(&self, state: &mut FnvHasher) {
        state.write(&(*self as u32).to_ne_bytes());
    }
}

impl KeyHash for char {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.write_raw(state);
    }
}

impl RawBytes for bool {
    #[inline]
    fn write_raw(&self, state: &mut FnvHasher) {
        state.write(&[*self as u8]);
    }
}

impl KeyHash for bool {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.write_raw(state);
    }
}

impl<T: RawBytes, const N: usize> KeyHash for [T; N] {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.as_slice().write_key(state);
    }
}

impl<T: RawBytes> KeyHash for [T] {
    fn write_key(&self, state: &mut FnvHasher) {
        for item in self {
            item.write_raw(state);
        }
    }
}

impl<T: RawBytes> KeyHash for Vec<T> {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.as_slice().write_key(state);
    }
}

impl KeyHash for str {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        state.write(self.as_bytes());
    }
}

impl KeyHash for String {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.as_str().write_key(state);
    }
}

impl<T: KeyHash + ?Sized> KeyHash for &T {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        (**self).write_key(state);
    }
}

impl<T: KeyHash + ?Sized> KeyHash for Box<T> {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        (**self).write_key(state);
    }
}

/// A key that already is a hash value; it hashes to itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct HashValue(pub u64);

impl KeyHash for HashValue {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        state.write(&self.0.to_ne_bytes());
    }

    #[inline]
    fn to_hash(&self) -> u64 {
        self.0
    }
}

/// Hashes a composite key through its `core::hash::Hash` impl.
///
/// The wrapped type's `Hash` impl must be deterministic (no addresses, no
/// per-process seeds).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct ByHash<T>(pub T);

impl<T: Hash> KeyHash for ByHash<T> {
    #[inline]
    fn write_key(&self, state: &mut FnvHasher) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference vectors from the FNV test suite.
    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811C_9DC5);
        assert_eq!(fnv1a_32(b"a"), 0xE40C_292C);
        assert_eq!(fnv1a_32(b"foobar"), 0xBF9C_F968);
        assert_eq!(fnv1a_64(b""), 0xCBF2_9CE4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xAF63_DC4C_8601_EC8C);
        assert_eq!(fnv1a_64(b"foobar"), 0x8594_4171_F739_67E8);
    }

    #[test]
    fn streaming_matches_oneshot() {
        let mut h = FnvHasher::new();
        h.write(b"foo");
        h.write(b"bar");
        assert_eq!(h.finish(), fnv1a_64(b"foobar"));
        assert_eq!(FnvBuildHasher.hash_one(0u8), fnv1a_64(&[0]));
    }

    #[test]
    fn primitives_hash_raw_bytes() {
        assert_eq!(42u32.to_hash(), fnv1a_64(&42u32.to_ne_bytes()));
        assert_eq!((-7i64).to_hash(), fnv1a_64(&(-7i64).to_ne_bytes()));
        assert_eq!('x'.to_hash(), fnv1a_64(&('x' as u32).to_ne_bytes()));
        assert_eq!(1.5f64.to_hash(), fnv1a_64(&1.5f64.to_ne_bytes()));
    }

    #[test]
    fn arrays_slices_and_vecs_agree() {
        let arr = [1u16, 2, 3];
        let v = vec![1u16, 2, 3];
        assert_eq!(arr.to_hash(), arr[..].to_hash());
        assert_eq!(arr.to_hash(), v.to_hash());

        let mut bytes = Vec::new();
        for x in arr {
            bytes.extend_from_slice(&x.to_ne_bytes());
        }
        assert_eq!(arr.to_hash(), fnv1a_64(&bytes));
    }

    #[test]
    fn string_and_str_agree() {
        let owned = "hello".to_string();
        assert_eq!(owned.to_hash(), "hello".to_hash());
        assert_eq!("hello".to_hash(), fnv1a_64(b"hello"));
    }

    #[test]
    fn hash_value_is_identity() {
        assert_eq!(HashValue(0xDEAD_BEEF).to_hash(), 0xDEAD_BEEF);
    }

    #[test]
    fn by_hash_is_deterministic() {
        #[derive(Hash)]
        struct Point {
            x: i32,
            y: i32,
        }
        let a = ByHash(Point { x: 1, y: 2 }).to_hash();
        let b = ByHash(Point { x: 1, y: 2 }).to_hash();
        let c = ByHash(Point { x: 2, y: 1 }).to_hash();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
