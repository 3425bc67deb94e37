/// Vertical extent of one floor in world units ("meters").
pub(crate) const FLOOR_HEIGHT: u32 = 20;

pub(crate) const DEFAULT_NUM_FLOORS: u32 = 10_000;

/// Per-tick displacement a trip starts with.
pub(crate) const CRUISE_SPEED: f64 = 0.5;
pub(crate) const STOP_SPEED: f64 = 0.25;
/// Floor for the scaled speed while a measured trip is running.
pub(crate) const MIN_SPEED: f64 = 0.1;
pub(crate) const ACCEL_GAIN: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Command {
    MoveUp,
    MoveDown,
    /// 1-based floor as typed by the user; anything outside
    /// `1..=num_floors` is rejected.
    GoToFloor(i64),
    EmergencyStop,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Motion {
    Idle,
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Elevator {
    pub(crate) current_y: f64,
    pub(crate) target_floor: u32,
    pub(crate) num_floors: u32,
    pub(crate) speed: f64,
    /// Length of the commanded trip; only scales acceleration. Zero when idle.
    pub(crate) travel_distance: f64,
}

impl Elevator {
    pub(crate) fn new(num_floors: u32) -> Self {
        Self {
            current_y: 0.0,
            target_floor: 0,
            num_floors: num_floors.max(1),
            speed: CRUISE_SPEED,
            travel_distance: 0.0,
        }
    }

    /// 0-based floor the car currently occupies.
    pub(crate) fn current_floor(&self) -> u32 {
        self.current_y.floor() as u32 / FLOOR_HEIGHT
    }

    pub(crate) fn current_height(&self) -> f64 {
        self.current_y
    }

    pub(crate) fn target_floor(&self) -> u32 {
        self.target_floor
    }

    pub(crate) fn target_y(&self) -> f64 {
        f64::from(self.target_floor) * f64::from(FLOOR_HEIGHT)
    }

    pub(crate) fn num_floors(&self) -> u32 {
        self.num_floors
    }

    pub(crate) fn speed(&self) -> f64 {
        self.speed
    }

    pub(crate) fn travel_distance(&self) -> f64 {
        self.travel_distance
    }

    pub(crate) fn motion(&self) -> Motion {
        let target_y = self.target_y();
        if self.current_y < target_y {
            Motion::Ascending
        } else if self.current_y > target_y {
            Motion::Descending
        } else {
            Motion::Idle
        }
    }
}

impl Default for Elevator {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_FLOORS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_ground_floor_with_cruise_speed() {
        let e = Elevator::default();
        assert_eq!(e.current_height(), 0.0);
        assert_eq!(e.current_floor(), 0);
        assert_eq!(e.target_floor(), 0);
        assert_eq!(e.num_floors(), DEFAULT_NUM_FLOORS);
        assert_eq!(e.speed(), CRUISE_SPEED);
        assert_eq!(e.travel_distance(), 0.0);
    }

    #[test]
    fn zero_floors_is_raised_to_one() {
        assert_eq!(Elevator::new(0).num_floors(), 1);
    }

    #[test]
    fn current_floor_is_derived_from_height() {
        let mut e = Elevator::new(10);
        e.current_y = 45.0;
        assert_eq!(e.current_floor(), 2);
        e.current_y = 39.99;
        assert_eq!(e.current_floor(), 1);
        e.current_y = 40.0;
        assert_eq!(e.current_floor(), 2);
    }

    #[test]
    fn motion_follows_target() {
        let mut e = Elevator::new(10);
        assert_eq!(e.motion(), Motion::Idle);
        e.target_floor = 3;
        assert_eq!(e.motion(), Motion::Ascending);
        e.current_y = 70.5;
        assert_eq!(e.motion(), Motion::Descending);
    }
}
