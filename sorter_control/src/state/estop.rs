//! EStop context.
//!
//! Tracks both emergency-stop switches during one EStop episode. The machine
//! may leave EStop only when both switches are released and every side that
//! was pressed during the episode has been acknowledged with its own reset
//! button. A reset only counts while no switch is pressed anywhere.

use sorter_common::role::Side;

/// One side's switch state within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EStopSide {
    pub pressed: bool,
    pub acknowledged: bool,
}

impl Default for EStopSide {
    /// Never pressed in this episode, so nothing to acknowledge.
    fn default() -> Self {
        Self {
            pressed: false,
            acknowledged: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EStopContext {
    sides: [EStopSide; 2],
}

impl EStopContext {
    /// Start an episode with `side` pressed.
    pub fn pressed(side: Side) -> Self {
        let mut ctx = Self::default();
        ctx.press(side);
        ctx
    }

    pub fn press(&mut self, side: Side) {
        let s = &mut self.sides[side.index()];
        s.pressed = true;
        s.acknowledged = false;
    }

    pub fn release(&mut self, side: Side) {
        self.sides[side.index()].pressed = false;
    }

    /// Reset button on `side`. Returns `false` if the press did not count.
    pub fn reset(&mut self, side: Side) -> bool {
        if self.any_pressed() {
            return false;
        }
        self.sides[side.index()].acknowledged = true;
        true
    }

    #[inline]
    pub fn side(&self, side: Side) -> EStopSide {
        self.sides[side.index()]
    }

    #[inline]
    pub fn any_pressed(&self) -> bool {
        self.sides.iter().any(|s| s.pressed)
    }

    /// Both released and acknowledged.
    pub fn can_leave(&self) -> bool {
        self.sides.iter().all(|s| !s.pressed && s.acknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_side_episode() {
        let mut ctx = EStopContext::pressed(Side::Master);
        assert!(!ctx.can_leave());
        assert!(ctx.side(Side::Slave).acknowledged);

        assert!(!ctx.reset(Side::Master));
        ctx.release(Side::Master);
        assert!(!ctx.can_leave());

        // The untouched side's reset does not acknowledge the pressed one.
        assert!(ctx.reset(Side::Slave));
        assert!(!ctx.can_leave());

        assert!(ctx.reset(Side::Master));
        assert!(ctx.can_leave());
    }

    #[test]
    fn reset_while_other_side_pressed_does_not_count() {
        let mut ctx = EStopContext::pressed(Side::Master);
        ctx.press(Side::Slave);
        ctx.release(Side::Master);

        assert!(!ctx.reset(Side::Master));
        assert!(!ctx.side(Side::Master).acknowledged);

        ctx.release(Side::Slave);
        assert!(ctx.reset(Side::Master));
        assert!(!ctx.can_leave());
        assert!(ctx.reset(Side::Slave));
        assert!(ctx.can_leave());
    }

    #[test]
    fn pressing_again_revokes_acknowledgement() {
        let mut ctx = EStopContext::pressed(Side::Slave);
        ctx.release(Side::Slave);
        ctx.reset(Side::Slave);
        ctx.press(Side::Slave);
        assert!(!ctx.side(Side::Slave).acknowledged);
        assert!(!ctx.can_leave());
    }
}
