//! Reaching a property value through relative steps.
//!
//! Shutter speed, aperture and ISO accept only "one step up" or "one step
//! down". [`Convergence`] walks such a property toward a target: compare,
//! step, wait for the camera to report a new value, compare again. It stops
//! when the value matches, when consecutive comparisons straddle the target
//! (the camera has no value in between), or when a step goes unanswered.
//!
//! The walk assumes the representable values are ordered along the step
//! direction, which holds for the properties wrapped here.

use std::cmp::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use sonyptp_wire::{DataType, Scalar};
use tracing::{debug, warn};

use crate::error::{ControlError, Result};
use crate::shutter::ShutterSpeed;

/// One relative step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The signed single-byte delta sent to the camera.
    pub fn delta(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// Direction that moves a value ordered `current` relative to the
    /// target toward it. `None` when already equal.
    pub fn toward(current: Ordering) -> Option<Self> {
        match current {
            Ordering::Less => Some(Direction::Up),
            Ordering::Greater => Some(Direction::Down),
            Ordering::Equal => None,
        }
    }
}

/// Read and step access to camera properties.
pub trait PropertyAccess {
    /// Current scalar value of `code`, read fresh from the device.
    fn current(&mut self, code: u16) -> Result<Scalar>;

    /// Move `code` one representable value in `direction`.
    fn step(&mut self, code: u16, direction: Direction) -> Result<()>;
}

impl<P: PropertyAccess + ?Sized> PropertyAccess for &mut P {
    fn current(&mut self, code: u16) -> Result<Scalar> {
        (**self).current(code)
    }

    fn step(&mut self, code: u16, direction: Direction) -> Result<()> {
        (**self).step(code, direction)
    }
}

/// Value to converge on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Compared by magnitude.
    Numeric(i128),
    /// Compared as exposure duration.
    Shutter(ShutterSpeed),
}

impl Target {
    /// Order `current` relative to the target.
    pub fn compare(&self, code: u16, current: Scalar) -> Result<Ordering> {
        let mismatch = || ControlError::PropertyType {
            code,
            found: DataType::Scalar(current.scalar_type()),
        };
        match *self {
            Target::Numeric(target) => {
                let value = current.to_i128().ok_or_else(mismatch)?;
                Ok(value.cmp(&target))
            }
            Target::Shutter(target) => {
                let raw = current.as_u32().ok_or_else(mismatch)?;
                Ok(ShutterSpeed::from_raw(raw).compare(target))
            }
        }
    }
}

/// Bounds on a convergence run.
#[derive(Debug, Clone)]
pub struct ConvergeConfig {
    /// How long to wait for the value to change after one step.
    pub change_timeout: Duration,
    /// Pause between reads while waiting for a change.
    pub poll_interval: Duration,
    /// Steps allowed before giving up.
    pub max_steps: usize,
}

impl Default for ConvergeConfig {
    fn default() -> Self {
        Self {
            change_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
            max_steps: 512,
        }
    }
}

impl ConvergeConfig {
    pub fn with_change_timeout(mut self, timeout: Duration) -> Self {
        self.change_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Where a convergence run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergeState {
    /// About to read and compare.
    Idle,
    /// About to step from `from`.
    Stepping { direction: Direction, from: Scalar },
    /// Stepped; waiting for the value to move off `from`.
    AwaitingChange { from: Scalar, deadline: Instant },
    Converged(Scalar),
    /// Consecutive values fell on opposite sides of the target.
    Unreachable { below: Scalar, above: Scalar },
    TimedOut,
}

impl ConvergeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConvergeState::Converged(_) | ConvergeState::Unreachable { .. } | ConvergeState::TimedOut
        )
    }
}

/// One convergence run over a property.
pub struct Convergence<P: PropertyAccess> {
    access: P,
    code: u16,
    target: Target,
    config: ConvergeConfig,
    state: ConvergeState,
    last: Option<(Ordering, Scalar)>,
    steps: usize,
}

impl<P: PropertyAccess> Convergence<P> {
    pub fn new(access: P, code: u16, target: Target, config: ConvergeConfig) -> Self {
        Self {
            access,
            code,
            target,
            config,
            state: ConvergeState::Idle,
            last: None,
            steps: 0,
        }
    }

    pub fn state(&self) -> ConvergeState {
        self.state
    }

    /// Steps issued so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Perform one transition. Device errors end the run immediately.
    pub fn advance(&mut self) -> Result<ConvergeState> {
        self.state = match self.state {
            ConvergeState::Idle => {
                let current = self.access.current(self.code)?;
                self.evaluate(current)?
            }
            ConvergeState::Stepping { direction, from } => {
                if self.steps >= self.config.max_steps {
                    return Err(ControlError::StepLimit {
                        code: self.code,
                        steps: self.steps,
                    });
                }
                debug!(code = self.code, ?direction, %from, "stepping property");
                self.access.step(self.code, direction)?;
                self.steps += 1;
                ConvergeState::AwaitingChange {
                    from,
                    deadline: Instant::now() + self.config.change_timeout,
                }
            }
            ConvergeState::AwaitingChange { from, deadline } => {
                let current = self.access.current(self.code)?;
                if current != from {
                    self.evaluate(current)?
                } else {
                    let now = Instant::now();
                    if now >= deadline {
                        ConvergeState::TimedOut
                    } else {
                        thread::sleep(self.config.poll_interval.min(deadline - now));
                        self.state
                    }
                }
            }
            terminal => terminal,
        };
        Ok(self.state)
    }

    fn evaluate(&mut self, current: Scalar) -> Result<ConvergeState> {
        let ord = self.target.compare(self.code, current)?;
        let Some(direction) = Direction::toward(ord) else {
            return Ok(ConvergeState::Converged(current));
        };
        if let Some((previous, value)) = self.last {
            if previous != ord {
                let (below, above) = if ord == Ordering::Greater {
                    (value, current)
                } else {
                    (current, value)
                };
                return Ok(ConvergeState::Unreachable { below, above });
            }
        }
        self.last = Some((ord, current));
        Ok(ConvergeState::Stepping {
            direction,
            from: current,
        })
    }

    /// Advance until a terminal state and return the reached value.
    pub fn run(mut self) -> Result<Scalar> {
        loop {
            match self.advance()? {
                ConvergeState::Converged(value) => {
                    debug!(code = self.code, %value, steps = self.steps, "property converged");
                    return Ok(value);
                }
                ConvergeState::Unreachable { below, above } => {
                    warn!(code = self.code, %below, %above, "target between device values");
                    return Err(ControlError::Unreachable {
                        code: self.code,
                        below,
                        above,
                    });
                }
                ConvergeState::TimedOut => {
                    warn!(code = self.code, steps = self.steps, "property did not change after step");
                    return Err(ControlError::ConvergeTimeout {
                        code: self.code,
                        waited: self.config.change_timeout,
                    });
                }
                _ => {}
            }
        }
    }
}

/// Walk `code` to `target` through `access`.
pub fn converge<P: PropertyAccess>(
    access: P,
    code: u16,
    target: Target,
    config: &ConvergeConfig,
) -> Result<Scalar> {
    Convergence::new(access, code, target, config.clone()).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: u16 = 0xD21E;

    /// A property confined to a table, stepping by index.
    struct Table {
        values: Vec<u32>,
        index: usize,
        frozen: bool,
        reads: usize,
    }

    impl Table {
        fn new(values: &[u32], index: usize) -> Self {
            Self {
                values: values.to_vec(),
                index,
                frozen: false,
                reads: 0,
            }
        }
    }

    impl PropertyAccess for Table {
        fn current(&mut self, _code: u16) -> Result<Scalar> {
            self.reads += 1;
            Ok(Scalar::Uint32(self.values[self.index]))
        }

        fn step(&mut self, _code: u16, direction: Direction) -> Result<()> {
            if self.frozen {
                return Ok(());
            }
            self.index = match direction {
                Direction::Up => (self.index + 1).min(self.values.len() - 1),
                Direction::Down => self.index.saturating_sub(1),
            };
            Ok(())
        }
    }

    const ISO: [u32; 6] = [100, 200, 400, 800, 1600, 3200];

    fn fast() -> ConvergeConfig {
        ConvergeConfig::default()
            .with_change_timeout(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn already_at_target_takes_no_steps() {
        let mut table = Table::new(&ISO, 2);
        let mut run = Convergence::new(&mut table, CODE, Target::Numeric(400), fast());
        assert_eq!(
            run.advance().unwrap(),
            ConvergeState::Converged(Scalar::Uint32(400))
        );
        assert_eq!(run.steps(), 0);
    }

    #[test]
    fn walks_up_through_states() {
        let mut table = Table::new(&ISO, 0);
        let mut run = Convergence::new(&mut table, CODE, Target::Numeric(200), fast());

        assert_eq!(
            run.advance().unwrap(),
            ConvergeState::Stepping {
                direction: Direction::Up,
                from: Scalar::Uint32(100)
            }
        );
        assert!(matches!(
            run.advance().unwrap(),
            ConvergeState::AwaitingChange {
                from: Scalar::Uint32(100),
                ..
            }
        ));
        assert_eq!(
            run.advance().unwrap(),
            ConvergeState::Converged(Scalar::Uint32(200))
        );
        assert!(run.state().is_terminal());
    }

    #[test]
    fn walks_down_to_lowest() {
        let mut table = Table::new(&ISO, 5);
        let value = converge(&mut table, CODE, Target::Numeric(100), &fast()).unwrap();
        assert_eq!(value, Scalar::Uint32(100));
        assert_eq!(table.index, 0);
    }

    #[test]
    fn every_table_value_is_reached_within_table_size_steps() {
        for start in 0..ISO.len() {
            for &target in &ISO {
                let mut table = Table::new(&ISO, start);
                let mut run =
                    Convergence::new(&mut table, CODE, Target::Numeric(target.into()), fast());
                while !run.advance().unwrap().is_terminal() {}
                assert_eq!(run.state(), ConvergeState::Converged(Scalar::Uint32(target)));
                assert!(run.steps() <= ISO.len());
            }
        }
    }

    #[test]
    fn target_between_values_is_unreachable() {
        let mut table = Table::new(&ISO, 0);
        let err = converge(&mut table, CODE, Target::Numeric(300), &fast()).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Unreachable {
                code: CODE,
                below: Scalar::Uint32(200),
                above: Scalar::Uint32(400)
            }
        ));
        // Overshot once to 400 and stopped there.
        assert_eq!(table.index, 2);
    }

    #[test]
    fn unreachable_from_above_reports_same_bracket() {
        let mut table = Table::new(&ISO, 5);
        let err = converge(&mut table, CODE, Target::Numeric(300), &fast()).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Unreachable {
                below: Scalar::Uint32(200),
                above: Scalar::Uint32(400),
                ..
            }
        ));
    }

    #[test]
    fn unchanged_value_times_out_after_configured_bound() {
        let mut table = Table::new(&ISO, 0);
        table.frozen = true;
        let started = Instant::now();
        let err = converge(&mut table, CODE, Target::Numeric(800), &fast()).unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(matches!(
            err,
            ControlError::ConvergeTimeout { waited, .. } if waited == Duration::from_millis(100)
        ));
        assert!(err.is_retryable());
        assert!(table.reads > 2);
    }

    #[test]
    fn default_bound_is_five_seconds() {
        assert_eq!(ConvergeConfig::default().change_timeout, Duration::from_secs(5));
    }

    #[test]
    fn step_limit_stops_a_long_walk() {
        let mut table = Table::new(&ISO, 0);
        let err = converge(
            &mut table,
            CODE,
            Target::Numeric(3200),
            &fast().with_max_steps(2),
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::StepLimit { steps: 2, .. }));
    }

    #[test]
    fn shutter_target_on_wrong_type_is_rejected() {
        let mut table = Table::new(&ISO, 0);
        let mut run = Convergence::new(
            &mut table,
            CODE,
            Target::Shutter(ShutterSpeed::new(1, 500)),
            fast(),
        );
        assert!(run.advance().is_ok());

        let err = Target::Shutter(ShutterSpeed::new(1, 500))
            .compare(CODE, Scalar::Uint16(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ControlError::PropertyType {
                found: DataType::Scalar(_),
                ..
            }
        ));
    }

    #[test]
    fn shutter_walks_toward_slower_speed() {
        let speeds = [
            ShutterSpeed::new(1, 4000).raw(),
            ShutterSpeed::new(1, 2000).raw(),
            ShutterSpeed::new(1, 1000).raw(),
            ShutterSpeed::new(1, 500).raw(),
        ];
        let mut table = Table::new(&speeds, 0);
        let value = converge(
            &mut table,
            CODE,
            Target::Shutter(ShutterSpeed::new(1, 500)),
            &fast(),
        )
        .unwrap();
        assert_eq!(value, Scalar::Uint32(ShutterSpeed::new(1, 500).raw()));
        assert_eq!(table.index, 3);
    }
}
