/// Fires once every `period` ticks.
///
/// Counting starts at creation (or the last [`reset`](Self::reset)), so a
/// `Cadence::every(30)` fires on the 30th call to [`due`](Self::due), the
/// 60th, and so on. A period of 0 never fires.
///
/// ```rust
/// use spacecats_tick::Cadence;
///
/// let mut broadcast = Cadence::every(3);
/// let fired: Vec<bool> = (0..6).map(|_| broadcast.due()).collect();
/// assert_eq!(fired, [false, false, true, false, false, true]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    period: u64,
    elapsed: u64,
}

impl Cadence {
    pub fn every(period: u64) -> Self {
        Self { period, elapsed: 0 }
    }

    /// Advances one tick and reports whether this one is due.
    pub fn due(&mut self) -> bool {
        if self.period == 0 {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed >= self.period {
            self.elapsed = 0;
            true
        } else {
            false
        }
    }

    /// Starts counting from zero again.
    pub fn reset(&mut self) {
        self.elapsed = 0;
    }

    pub fn period(&self) -> u64 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_never_fires() {
        let mut cadence = Cadence::every(0);
        assert!((0..100).all(|_| !cadence.due()));
    }

    #[test]
    fn test_period_one_always_fires() {
        let mut cadence = Cadence::every(1);
        assert!((0..5).all(|_| cadence.due()));
    }

    #[test]
    fn test_reset_restarts_count() {
        let mut cadence = Cadence::every(3);
        cadence.due();
        cadence.due();
        cadence.reset();
        assert!(!cadence.due());
        assert!(!cadence.due());
        assert!(cadence.due());
    }

    #[test]
    fn test_thirty_tick_broadcast_count() {
        let mut cadence = Cadence::every(30);
        let fired = (0..120).filter(|_| cadence.due()).count();
        assert_eq!(fired, 4);
    }
}
