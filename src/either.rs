//! A value of one of two types
//!
//! When a parameter is declared as `either<A, B>`, resolution tries `A` first
//! and only falls back to `B` when `A` fails. The most permissive type should
//! therefore go second, otherwise it swallows input meant for the first.

/// Exactly one of two values; which side is present never changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<A, B> {
    First(A),
    Second(B),
}

impl<A, B> Either<A, B> {
    pub fn first(&self) -> Option<&A> {
        match self {
            Either::First(a) => Some(a),
            Either::Second(_) => None,
        }
    }

    pub fn second(&self) -> Option<&B> {
        match self {
            Either::First(_) => None,
            Either::Second(b) => Some(b),
        }
    }

    pub fn into_first(self) -> Option<A> {
        match self {
            Either::First(a) => Some(a),
            Either::Second(_) => None,
        }
    }

    pub fn into_second(self) -> Option<B> {
        match self {
            Either::First(_) => None,
            Either::Second(b) => Some(b),
        }
    }

    pub fn is_first(&self) -> bool {
        matches!(self, Either::First(_))
    }

    pub fn is_second(&self) -> bool {
        matches!(self, Either::Second(_))
    }

    /// Run `action` on the first value, if present
    pub fn if_first(&self, action: impl FnOnce(&A)) -> &Self {
        if let Either::First(a) = self {
            action(a);
        }
        self
    }

    /// Run `action` on the second value, if present
    pub fn if_second(&self, action: impl FnOnce(&B)) -> &Self {
        if let Either::Second(b) = self {
            action(b);
        }
        self
    }

    /// Collapse both sides into one type
    pub fn map<T>(self, map_first: impl FnOnce(A) -> T, map_second: impl FnOnce(B) -> T) -> T {
        match self {
            Either::First(a) => map_first(a),
            Either::Second(b) => map_second(b),
        }
    }

    pub fn map_first<T>(self, f: impl FnOnce(A) -> T) -> Either<T, B> {
        self.map(|a| Either::First(f(a)), Either::Second)
    }

    pub fn map_second<T>(self, f: impl FnOnce(B) -> T) -> Either<A, T> {
        self.map(Either::First, |b| Either::Second(f(b)))
    }

    pub fn swap(self) -> Either<B, A> {
        self.map(Either::Second, Either::First)
    }

    pub fn as_ref(&self) -> Either<&A, &B> {
        match self {
            Either::First(a) => Either::First(a),
            Either::Second(b) => Either::Second(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sides() {
        let first: Either<i64, String> = Either::First(3);
        assert!(first.is_first());
        assert!(!first.is_second());
        assert_eq!(first.first(), Some(&3));
        assert_eq!(first.second(), None);

        let second: Either<i64, String> = Either::Second("x".to_string());
        assert_eq!(second.clone().into_second(), Some("x".to_string()));
        assert_eq!(second.into_first(), None);
    }

    #[test]
    fn test_map_and_swap() {
        let value: Either<i64, &str> = Either::First(4);
        assert_eq!(value.map(|n| n * 2, |s| s.len() as i64), 8);
        assert_eq!(value.map_first(|n| n + 1), Either::First(5));
        assert_eq!(value.map_second(str::len), Either::First(4));
        assert_eq!(value.swap(), Either::Second(4));
        assert_eq!(value.swap().swap(), value);
    }

    #[test]
    fn test_if_first_and_second() {
        let value: Either<i64, &str> = Either::Second("hi");
        let mut seen = Vec::new();
        value
            .if_first(|n| seen.push(n.to_string()))
            .if_second(|s| seen.push(s.to_string()));
        assert_eq!(seen, vec!["hi".to_string()]);
    }
}
