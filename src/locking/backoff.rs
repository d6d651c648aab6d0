// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Jittered exponential backoff between acquisition attempts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Delay to wait after the 1-based `attempt` failed.
///
/// Computes `2^(attempt + jitter - 1) * initial_wait`, where `jitter` is a
/// draw from `[0, 1)`. A zero `initial_wait` always yields zero; other
/// results too large for a `Duration` saturate.
pub fn backoff_delay(attempt: u32, jitter: f64, initial_wait: Duration) -> Duration {
    if initial_wait.is_zero() {
        return Duration::ZERO;
    }
    let exponent = f64::from(attempt) + jitter - 1.0;
    let seconds = exponent.exp2() * initial_wait.as_secs_f64();
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Source of the uniform `[0, 1)` draw applied to each backoff delay.
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Reproducible draws from a seeded generator.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..1.0),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..1.0),
        }
    }
}

/// Always returns the same draw, clamped into `[0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(f64);

impl FixedJitter {
    pub fn new(value: f64) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        };
        Self(value)
    }

    pub fn none() -> Self {
        Self(0.0)
    }
}

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Suspends the caller between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt_without_jitter() {
        let initial = Duration::from_millis(10);
        assert_eq!(backoff_delay(1, 0.0, initial), Duration::from_millis(10));
        assert_eq!(backoff_delay(2, 0.0, initial), Duration::from_millis(20));
        assert_eq!(backoff_delay(3, 0.0, initial), Duration::from_millis(40));
    }

    #[test]
    fn jitter_stays_below_next_power() {
        let initial = Duration::from_millis(10);
        let upper = backoff_delay(1, 0.999, initial);
        assert!(upper >= Duration::from_millis(19));
        assert!(upper < Duration::from_millis(20));
        let half = backoff_delay(1, 0.5, initial).as_secs_f64();
        assert!((half - 0.01 * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn huge_attempts_saturate() {
        assert_eq!(
            backoff_delay(10_000, 0.0, Duration::from_secs(1)),
            Duration::MAX
        );
    }

    #[test]
    fn zero_initial_wait_means_no_delay() {
        assert_eq!(backoff_delay(5, 0.7, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn zero_initial_wait_stays_zero_past_float_range() {
        assert_eq!(backoff_delay(1100, 0.0, Duration::ZERO), Duration::ZERO);
        assert_eq!(backoff_delay(u32::MAX, 0.99, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn seeded_jitter_is_reproducible_and_in_range() {
        let first = SeededJitter::new(7);
        let second = SeededJitter::new(7);
        for _ in 0..100 {
            let a = first.sample();
            assert_eq!(a, second.sample());
            assert!((0.0..1.0).contains(&a));
        }
    }

    #[test]
    fn thread_rng_jitter_in_range() {
        let jitter = ThreadRngJitter;
        for _ in 0..100 {
            assert!((0.0..1.0).contains(&jitter.sample()));
        }
    }

    #[test]
    fn fixed_jitter_is_clamped() {
        assert_eq!(FixedJitter::new(-1.0).sample(), 0.0);
        assert!(FixedJitter::new(5.0).sample() < 1.0);
        assert_eq!(FixedJitter::new(f64::NAN).sample(), 0.0);
        assert_eq!(FixedJitter::none().sample(), 0.0);
    }
}
