use core::fmt;

/// Set of cell values `1..=63` packed into a single word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueSet(u64);

impl ValueSet {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Every value `1..=size`.
    pub const fn full(size: usize) -> Self {
        if size == 0 {
            return Self(0);
        }
        Self(((1u64 << size) - 1) << 1)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn insert(&mut self, value: u8) {
        if value != 0 {
            self.0 |= 1u64 << value;
        }
    }

    pub fn remove(&mut self, value: u8) {
        self.0 &= !(1u64 << value);
    }

    pub const fn contains(self, value: u8) -> bool {
        value != 0 && value < 64 && self.0 & (1u64 << value) != 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 | other.0)
    }

    pub const fn difference(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 & !other.0)
    }

    /// The only member, if the set holds exactly one value.
    pub fn single(self) -> Option<u8> {
        (self.len() == 1).then(|| self.0.trailing_zeros() as u8)
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let value = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Some(value)
        })
    }
}

impl FromIterator<u8> for ValueSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
