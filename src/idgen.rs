//! Monotonic unique-ID generator for newly created superdroplets.
//!
//! Design Notes call out the source's shared-pointer ID generator as a
//! cycle to avoid; here it is a plain owned counter the driver constructs
//! once and injects by mutable reference into whatever creates particles,
//! never shared by pointer or `Rc`.

#[derive(Debug, Clone, Copy, Default)]
pub struct SuperdropletIdGen {
    next: u64,
}

impl SuperdropletIdGen {
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut gen = SuperdropletIdGen::new(0);
        let ids: Vec<u64> = (0..5).map(|_| gen.next_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn starts_from_configured_value() {
        let mut gen = SuperdropletIdGen::new(100);
        assert_eq!(gen.next_id(), 100);
        assert_eq!(gen.next_id(), 101);
    }
}
