//! The reluctant doubling Luby sequence.
//!
//! This sequence is [A182105](https://oeis.org/A182105).

/// Infinite iterator yielding the Luby sequence.
#[derive(Clone, Debug)]
pub struct LubySequence {
    u: u64,
    v: u64,
}

impl Default for LubySequence {
    fn default() -> LubySequence {
        LubySequence { u: 1, v: 1 }
    }
}

impl LubySequence {
    /// The term the next call to `advance` returns.
    pub fn peek(&self) -> u64 {
        self.v
    }

    /// Yields the next term of the sequence.
    pub fn advance(&mut self) -> u64 {
        let result = self.v;

        // Method by Knuth 2012
        if (self.u & self.u.wrapping_neg()) == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v <<= 1;
        }

        result
    }
}

impl Iterator for LubySequence {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_sequence() {
        let initial_terms: Vec<_> = LubySequence::default().take(64).collect();

        assert_eq!(
            initial_terms,
            vec![
                1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, 1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2,
                4, 8, 16, 1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8, 1, 1, 2, 1, 1, 2, 4, 1, 1,
                2, 1, 1, 2, 4, 8, 16, 32, 1,
            ]
        )
    }

    #[test]
    fn peek_matches_advance() {
        let mut luby = LubySequence::default();
        for _ in 0..100 {
            let next = luby.peek();
            assert_eq!(luby.advance(), next);
        }
    }
}
