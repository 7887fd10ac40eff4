// Smoother - rolling-mean filter over the most recent relative angles
//
// The window is a fixed-capacity ring buffer allocated once at construction
// (or on an explicit resize outside the frame loop). The mean is recomputed
// from the buffer on every push so the output depends only on the window
// contents, never on how many values have streamed through.

/// Rolling-mean smoother for one axis
#[derive(Debug, Clone)]
pub struct Smoother {
    buffer: Vec<f64>,
    /// Index of the oldest value
    head: usize,
    len: usize,
}

impl Smoother {
    /// Create a smoother; a window below 1 is clamped to 1
    pub fn new(window: usize) -> Self {
        let capacity = window.max(1);
        Self {
            buffer: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    /// Push a value and return the mean of the window including it
    pub fn push(&mut self, value: f64) -> f64 {
        let capacity = self.buffer.len();
        if self.len < capacity {
            let slot = (self.head + self.len) % capacity;
            self.buffer[slot] = value;
            self.len += 1;
        } else {
            // Full: overwrite the oldest slot and advance.
            self.buffer[self.head] = value;
            self.head = (self.head + 1) % capacity;
        }
        self.mean()
    }

    /// Mean of the current window, or 0.0 when empty
    pub fn mean(&self) -> f64 {
        // Incremental mean, oldest to newest. Identical inputs yield the
        // input exactly, which a plain sum/len does not guarantee.
        let mut mean = 0.0;
        for (i, value) in self.iter().enumerate() {
            mean += (value - mean) / (i + 1) as f64;
        }
        mean
    }

    /// Iterate the window from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let capacity = self.buffer.len();
        (0..self.len).map(move |i| self.buffer[(self.head + i) % capacity])
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Change the window size, keeping the newest values that still fit
    ///
    /// Allocates; only called on reconfiguration.
    pub fn resize(&mut self, window: usize) {
        let capacity = window.max(1);
        if capacity == self.buffer.len() {
            return;
        }
        let keep = self.len.min(capacity);
        let skip = self.len - keep;
        let mut buffer = vec![0.0; capacity];
        for (slot, value) in buffer.iter_mut().zip(self.iter().skip(skip)) {
            *slot = value;
        }
        self.buffer = buffer;
        self.head = 0;
        self.len = keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_clamped_to_one() {
        let mut smoother = Smoother::new(0);
        assert_eq!(smoother.capacity(), 1);
        assert_eq!(smoother.push(3.0), 3.0);
        assert_eq!(smoother.push(-7.5), -7.5);
    }

    #[test]
    fn test_mean_includes_pushed_value() {
        let mut smoother = Smoother::new(3);
        assert_eq!(smoother.push(3.0), 3.0);
        assert_eq!(smoother.push(6.0), 4.5);
        assert_eq!(smoother.push(9.0), 6.0);
    }

    #[test]
    fn test_oldest_value_is_evicted() {
        let mut smoother = Smoother::new(2);
        smoother.push(100.0);
        smoother.push(2.0);
        assert_eq!(smoother.push(4.0), 3.0);
        assert_eq!(smoother.len(), 2);
        assert_eq!(smoother.iter().collect::<Vec<_>>(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_identical_values_yield_exact_value() {
        for &v in &[0.1, 1.0 / 3.0, 12.345678, -0.7, 1e-9, 20.000001] {
            for window in 1..=9 {
                let mut smoother = Smoother::new(window);
                let mut last = f64::NAN;
                for _ in 0..window {
                    last = smoother.push(v);
                }
                assert_eq!(last, v, "window {} value {}", window, v);
            }
        }
    }

    #[test]
    fn test_output_is_reproducible() {
        let inputs: Vec<f64> = (0..50).map(|i| ((i * 37) % 11) as f64 * 0.37 - 1.1).collect();
        let run = |inputs: &[f64]| {
            let mut smoother = Smoother::new(5);
            inputs.iter().map(|&v| smoother.push(v)).collect::<Vec<_>>()
        };
        let first = run(&inputs);
        let second = run(&inputs);
        assert_eq!(
            first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_clear_empties_window() {
        let mut smoother = Smoother::new(4);
        smoother.push(5.0);
        smoother.push(5.0);
        smoother.clear();
        assert!(smoother.is_empty());
        assert_eq!(smoother.mean(), 0.0);
        assert_eq!(smoother.push(1.0), 1.0);
    }

    #[test]
    fn test_resize_keeps_newest_values() {
        let mut smoother = Smoother::new(4);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            smoother.push(v);
        }
        smoother.resize(2);
        assert_eq!(smoother.capacity(), 2);
        assert_eq!(smoother.iter().collect::<Vec<_>>(), vec![4.0, 5.0]);

        smoother.resize(5);
        assert_eq!(smoother.iter().collect::<Vec<_>>(), vec![4.0, 5.0]);
        assert_eq!(smoother.push(6.0), 5.0);
    }
}
