use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A permutation on {1..n}, optionally signed
///
/// The mapping sends each element 1..n to a target in 1..n; a negative
/// target encodes a hand flip, which is how switch symmetries express
/// "juggler A's right hand becomes juggler B's left hand". Path
/// permutations are always unsigned.
///
/// `apply` propagates signs: applying to a negated element negates the
/// result, so flips compose the way mirror symmetries should.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permutation {
    // mapping[i] is the signed 1-based target of element i+1
    mapping: Vec<i32>,
}

impl Permutation {
    /// The identity permutation on {1..n}
    pub fn identity(n: usize) -> Self {
        Permutation {
            mapping: (1..=n as i32).collect(),
        }
    }

    /// Build from an explicit signed mapping (1-based targets)
    pub fn from_mapping(mapping: Vec<i32>) -> Result<Self, LayoutError> {
        let n = mapping.len();
        let mut seen = vec![false; n];
        for &t in &mapping {
            let a = t.unsigned_abs() as usize;
            if a == 0 || a > n {
                return Err(LayoutError::BadPermutation {
                    text: format!("{:?}", mapping),
                    reason: format!("target {} out of range 1..{}", t, n),
                });
            }
            if seen[a - 1] {
                return Err(LayoutError::BadPermutation {
                    text: format!("{:?}", mapping),
                    reason: format!("target {} appears twice", a),
                });
            }
            seen[a - 1] = true;
        }
        Ok(Permutation { mapping })
    }

    /// Parse cycle notation, e.g. `"(1,2)(3,4)"` or `"(1,2*)"`
    ///
    /// Elements not mentioned are fixed points. A `*` after an element
    /// marks entry into that element as a hand flip; `allow_flips` is false
    /// for path permutations. The empty string and `"()"` are the identity.
    pub fn from_cycles(text: &str, n: usize, allow_flips: bool) -> Result<Self, LayoutError> {
        let bad = |reason: &str| LayoutError::BadPermutation {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let mut mapping: Vec<i32> = (1..=n as i32).collect();
        let mut assigned = vec![false; n];
        let mut chars = text.chars().peekable();

        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            match chars.next() {
                None => break,
                Some('(') => {}
                Some(c) => return Err(bad(&format!("expected '(' but found '{}'", c))),
            }

            // one cycle: numbers separated by commas, each optionally starred
            let mut cycle: Vec<(usize, bool)> = Vec::new();
            loop {
                while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                    chars.next();
                }
                let mut digits = String::new();
                while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
                    digits.push(chars.next().unwrap());
                }
                if digits.is_empty() {
                    if cycle.is_empty() && chars.peek() == Some(&')') {
                        chars.next();
                        break; // "()" empty cycle
                    }
                    return Err(bad("expected an element number"));
                }
                let elem: usize = digits
                    .parse()
                    .map_err(|_| bad(&format!("bad number '{}'", digits)))?;
                if elem == 0 || elem > n {
                    return Err(bad(&format!("element {} out of range 1..{}", elem, n)));
                }
                let mut flip = false;
                if chars.peek() == Some(&'*') {
                    chars.next();
                    if !allow_flips {
                        return Err(bad("'*' flips are not allowed here"));
                    }
                    flip = true;
                }
                cycle.push((elem, flip));
                while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                    chars.next();
                }
                match chars.next() {
                    Some(',') => continue,
                    Some(')') => break,
                    Some(c) => return Err(bad(&format!("expected ',' or ')' but found '{}'", c))),
                    None => return Err(bad("unclosed '('")),
                }
            }

            for (i, &(elem, _)) in cycle.iter().enumerate() {
                if assigned[elem - 1] {
                    return Err(bad(&format!("element {} appears twice", elem)));
                }
                assigned[elem - 1] = true;
                let (next, next_flip) = cycle[(i + 1) % cycle.len()];
                mapping[elem - 1] = if next_flip { -(next as i32) } else { next as i32 };
            }
        }

        Ok(Permutation { mapping })
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.mapping.len()
    }

    /// Apply to a signed 1-based element; the sign carries through
    pub fn apply(&self, elem: i32) -> i32 {
        if elem < 0 {
            -self.mapping[(-elem - 1) as usize]
        } else {
            self.mapping[(elem - 1) as usize]
        }
    }

    /// True when every element maps to itself unflipped
    pub fn is_identity(&self) -> bool {
        self.mapping.iter().enumerate().all(|(i, &t)| t == i as i32 + 1)
    }

    /// True when some target carries a flip
    pub fn has_flips(&self) -> bool {
        self.mapping.iter().any(|&t| t < 0)
    }

    /// The inverse permutation
    pub fn inverse(&self) -> Permutation {
        let mut mapping = vec![0i32; self.mapping.len()];
        for (i, &t) in self.mapping.iter().enumerate() {
            let a = t.unsigned_abs() as usize;
            let src = i as i32 + 1;
            mapping[a - 1] = if t < 0 { -src } else { src };
        }
        Permutation { mapping }
    }

    /// Composition: `self.compose(&q)` maps x to `self(q(x))`
    pub fn compose(&self, q: &Permutation) -> Permutation {
        debug_assert_eq!(self.size(), q.size());
        let mapping = (1..=q.size() as i32).map(|x| self.apply(q.apply(x))).collect();
        Permutation { mapping }
    }

    /// Signed power; the exponent wraps through the permutation's order,
    /// so negative and arbitrarily large exponents cost the same
    pub fn pow(&self, exp: i64) -> Permutation {
        let exp = exp.rem_euclid(self.order() as i64);
        let mut result = Permutation::identity(self.size());
        for _ in 0..exp {
            result = self.compose(&result);
        }
        result
    }

    /// Cycle decomposition; each cycle lists unsigned elements in traversal
    /// order with the flip flag of the hop into the next element
    pub fn cycles(&self) -> Vec<Vec<(usize, bool)>> {
        let n = self.size();
        let mut seen = vec![false; n];
        let mut out = Vec::new();
        for start in 1..=n {
            if seen[start - 1] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut cur = start;
            loop {
                seen[cur - 1] = true;
                let t = self.mapping[cur - 1];
                cycle.push((cur, t < 0));
                cur = t.unsigned_abs() as usize;
                if cur == start {
                    break;
                }
            }
            out.push(cycle);
        }
        out
    }

    /// Order of the permutation, counting flips
    ///
    /// A cycle of length L with an odd number of flips needs 2L applications
    /// to return every element with its original sign.
    pub fn order(&self) -> u64 {
        fn gcd(a: u64, b: u64) -> u64 {
            if b == 0 {
                a
            } else {
                gcd(b, a % b)
            }
        }
        fn lcm(a: u64, b: u64) -> u64 {
            a / gcd(a, b) * b
        }

        self.cycles()
            .iter()
            .map(|cycle| {
                let len = cycle.len() as u64;
                let flips = cycle.iter().filter(|&&(_, f)| f).count();
                if flips % 2 == 1 {
                    2 * len
                } else {
                    len
                }
            })
            .fold(1, lcm)
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        for cycle in self.cycles() {
            if cycle.len() == 1 && !cycle[0].1 {
                continue;
            }
            write!(f, "(")?;
            for (i, &(elem, _)) in cycle.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                // a star marks the hop INTO this element as a flip
                let flipped_into = cycle[(i + cycle.len() - 1) % cycle.len()].1;
                write!(f, "{}{}", elem, if flipped_into { "*" } else { "" })?;
            }
            write!(f, ")")?;
            wrote = true;
        }
        if !wrote {
            write!(f, "()")?;
        }
        Ok(())
    }
}
