use crate::model::{
    Command, Elevator, ACCEL_GAIN, CRUISE_SPEED, FLOOR_HEIGHT, MIN_SPEED, STOP_SPEED,
};
use tracing::{debug, info};

impl Elevator {
    pub(crate) fn handle_command(&mut self, command: Command) {
        match command {
            Command::MoveUp => {
                if self.speed != 0.0 {
                    debug!(motion = ?self.motion(), "nudge up ignored");
                    return;
                }
                self.target_floor = (self.current_floor() + 1).min(self.num_floors - 1);
                self.speed = CRUISE_SPEED;
            }
            Command::MoveDown => {
                if self.speed != 0.0 {
                    debug!(motion = ?self.motion(), "nudge down ignored");
                    return;
                }
                self.target_floor = self.current_floor().saturating_sub(1);
                self.speed = CRUISE_SPEED;
            }
            Command::GoToFloor(floor) => {
                if floor < 1 || floor > i64::from(self.num_floors) {
                    debug!(floor, num_floors = self.num_floors, "floor request rejected");
                    return;
                }
                self.target_floor = (floor - 1) as u32;
                self.speed = CRUISE_SPEED;
                self.travel_distance = f64::from(self.target_floor.abs_diff(self.current_floor()))
                    * f64::from(FLOOR_HEIGHT);
                info!(
                    from = self.current_floor() + 1,
                    to = floor,
                    travel_distance = self.travel_distance,
                    "trip started"
                );
            }
            Command::EmergencyStop => {
                self.travel_distance = 0.0;
                self.target_floor = self.current_floor();
                self.speed = STOP_SPEED;
                info!(height = self.current_y, floor = self.target_floor + 1, "emergency stop");
            }
            Command::None => {}
        }
    }

    /// Advance the car by one fixed step.
    pub(crate) fn tick(&mut self) {
        let target_y = self.target_y();
        let distance_remaining = (target_y - self.current_y).abs();

        // Nudges and emergency stops leave travel_distance at zero and keep
        // whatever speed they set.
        if self.travel_distance > 0.0 {
            let relative_remaining = distance_remaining / self.travel_distance;
            let delta = ACCEL_GAIN * self.travel_distance.log10();
            if relative_remaining < 0.5 {
                self.speed -= delta;
            } else {
                self.speed += delta;
            }
            self.speed = self.speed.max(MIN_SPEED);
        }

        // The clamps land exactly on target_y so the equality below holds.
        if self.current_y < target_y {
            self.current_y = (self.current_y + self.speed).min(target_y);
        } else if self.current_y > target_y {
            self.current_y = (self.current_y - self.speed).max(target_y);
        }

        if self.current_y == target_y {
            if self.speed != 0.0 {
                debug!(floor = self.target_floor + 1, "arrived");
            }
            self.speed = 0.0;
            self.travel_distance = 0.0;
        }
    }
}
