//! Scalar cycling state machine
//!
//! States are `ShowingScalar(names[i])` for each distinct name plus one
//! `NoScalar` state at index `N`. Advancing walks
//! `names[0] -> ... -> names[N-1] -> NoScalar -> names[0]`.

/// Current position of a [`ScalarCycler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState<'a> {
    NoScalar,
    ShowingScalar(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarCycler {
    names: Vec<String>,
    current: usize,
}

impl ScalarCycler {
    /// Start on the first name, or on `NoScalar` when there are none
    pub fn new(names: Vec<String>) -> Self {
        Self { names, current: 0 }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index in `[0, N]`; `N` is the `NoScalar` sentinel
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn state(&self) -> CycleState<'_> {
        match self.names.get(self.current) {
            Some(name) => CycleState::ShowingScalar(name),
            None => CycleState::NoScalar,
        }
    }

    pub fn current_name(&self) -> Option<&str> {
        self.names.get(self.current).map(String::as_str)
    }

    /// Move to the next state. With no names this does nothing and returns false.
    pub fn advance(&mut self) -> bool {
        if self.names.is_empty() {
            return false;
        }
        self.current = (self.current + 1) % (self.names.len() + 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycler(names: &[&str]) -> ScalarCycler {
        ScalarCycler::new(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_full_cycle() {
        let mut c = cycler(&["A", "B"]);
        assert_eq!(c.state(), CycleState::ShowingScalar("A"));
        let mut visited = Vec::new();
        for _ in 0..4 {
            assert!(c.advance());
            visited.push(c.current_name().map(str::to_string));
        }
        assert_eq!(
            visited,
            vec![Some("B".to_string()), None, Some("A".to_string()), Some("B".to_string())]
        );
    }

    #[test]
    fn test_cycle_length_is_names_plus_one() {
        let mut c = cycler(&["A", "B"]);
        c.advance();
        c.advance();
        assert_eq!(c.state(), CycleState::NoScalar);
        assert_eq!(c.index(), 2);
        c.advance();
        assert_eq!(c.state(), CycleState::ShowingScalar("A"));
    }

    #[test]
    fn test_empty_is_no_op() {
        let mut c = cycler(&[]);
        assert_eq!(c.state(), CycleState::NoScalar);
        assert!(!c.advance());
        assert_eq!(c.state(), CycleState::NoScalar);
        assert_eq!(c.index(), 0);
    }
}
