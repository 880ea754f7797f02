/*
 * Copyright 2019 The Regents of the University of California
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//! Hann window generation

use std::f32::consts::PI;

/// An iterator that generates a Hann window of a fixed size
///
/// `w[i] = 0.5 * (1 - cos(2*pi*i / (size - 1)))`
pub struct HannWindow {
    size: usize,
    next_index: usize,
}

impl HannWindow {
    /// Creates a window generator that produces `size` samples
    ///
    /// # Panics
    ///
    /// Panics if `size < 2` (the denominator `size - 1` would be zero)
    pub fn new(size: usize) -> Self {
        assert!(size >= 2, "Hann window size must be at least 2");
        HannWindow {
            size,
            next_index: 0,
        }
    }
}

impl Iterator for HannWindow {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index == self.size {
            None
        } else {
            let value = 0.5
                * (1.0
                    - f32::cos(2.0 * PI * (self.next_index as f32) / ((self.size - 1) as f32)));
            self.next_index += 1;
            Some(value)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoints_are_zero() {
        let window: Vec<f32> = HannWindow::new(20).collect();
        assert_eq!(window.len(), 20);
        assert!(window[0].abs() < 1e-6);
        assert!(window[19].abs() < 1e-6);
    }

    #[test]
    fn peak_near_center() {
        let window: Vec<f32> = HannWindow::new(21).collect();
        let peak_index = window
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_index, 10);
        assert!((window[10] - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn too_small_panics() {
        let _ = HannWindow::new(1);
    }
}
