//! Position/velocity integration with elastic wall reflection.

use glam::Vec2;
use nyanbounce_platform::ScreenSize;
use serde::{Deserialize, Serialize};

/// Top-left position, velocity in pixels per tick, and the current sprite size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
}

impl SpriteState {
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Walls touched during a single `advance`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounce {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Bounce {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

#[derive(Debug, Clone)]
pub struct Kinematics {
    state: SpriteState,
    screen: Vec2,
    damping: f32,
}

impl Kinematics {
    pub fn new(state: SpriteState, screen: ScreenSize, damping: f32) -> Self {
        Self {
            state,
            screen: Vec2::new(screen.width as f32, screen.height as f32),
            damping,
        }
    }

    /// Horizontally centered, a third of the way down, moving right and down.
    pub fn launch(screen: ScreenSize, size: Vec2, speed: f32, damping: f32) -> Self {
        let x = (screen.width as f32 - size.x).max(0.0) / 2.0;
        let y = (screen.height as f32 - size.y).max(0.0) / 3.0;
        let state = SpriteState {
            pos: Vec2::new(x.floor(), y.floor()),
            vel: Vec2::new(speed, speed * 0.6),
            size,
        };
        Self::new(state, screen, damping)
    }

    pub fn state(&self) -> &SpriteState {
        &self.state
    }

    /// Moves by one tick of velocity using the sprite size of this tick.
    pub fn advance(&mut self, size: Vec2) -> Bounce {
        self.state.size = size;
        let next = self.state.pos + self.state.vel;
        let (x, vx, left, right) =
            reflect_axis(next.x, self.state.vel.x, size.x, self.screen.x, self.damping);
        let (y, vy, top, bottom) =
            reflect_axis(next.y, self.state.vel.y, size.y, self.screen.y, self.damping);
        self.state.pos = Vec2::new(x, y);
        self.state.vel = Vec2::new(vx, vy);
        Bounce {
            left,
            right,
            top,
            bottom,
        }
    }
}

/// Clamps one axis into `[0, extent - size]` and reflects the velocity off whichever
/// wall was reached. A sprite larger than the extent is pinned at 0.
fn reflect_axis(pos: f32, vel: f32, size: f32, extent: f32, damping: f32) -> (f32, f32, bool, bool) {
    let (mut pos, mut vel) = (pos, vel);
    let mut low = false;
    let mut high = false;
    if pos <= 0.0 {
        pos = 0.0;
        vel = vel.abs() * damping;
        low = true;
    }
    if pos >= extent - size {
        pos = (extent - size).max(0.0);
        vel = -vel.abs() * damping;
        high = true;
    }
    (pos, vel, low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sprite(x: f32, y: f32, vx: f32, vy: f32, size: f32) -> SpriteState {
        SpriteState {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            size: Vec2::splat(size),
        }
    }

    #[test]
    fn reflects_off_right_edge_and_clamps() {
        let screen = ScreenSize::new(1920, 1080);
        let mut kin = Kinematics::new(sprite(640.0, 360.0, 4.0, 4.0, 96.0), screen, 1.0);
        let size = Vec2::splat(96.0);

        let mut ticks = 0;
        loop {
            let bounce = kin.advance(size);
            ticks += 1;
            if bounce.right {
                break;
            }
            assert!(ticks < 1000, "never reached the right edge");
        }
        assert_eq!(kin.state().vel.x, -4.0);
        assert_eq!(kin.state().pos.x, 1824.0);
    }

    #[test]
    fn damping_scales_reflected_speed() {
        let screen = ScreenSize::new(100, 100);
        let mut kin = Kinematics::new(sprite(85.0, 10.0, 10.0, 0.0, 10.0), screen, 0.5);
        let bounce = kin.advance(Vec2::splat(10.0));
        assert!(bounce.right);
        assert_eq!(kin.state().pos.x, 90.0);
        assert_eq!(kin.state().vel.x, -5.0);
    }

    #[test]
    fn reflects_off_top_left_corner() {
        let screen = ScreenSize::new(100, 100);
        let mut kin = Kinematics::new(sprite(2.0, 1.0, -5.0, -3.0, 10.0), screen, 1.0);
        let bounce = kin.advance(Vec2::splat(10.0));
        assert!(bounce.left && bounce.top);
        assert!(!bounce.right && !bounce.bottom);
        assert_eq!(kin.state().pos, Vec2::ZERO);
        assert_eq!(kin.state().vel, Vec2::new(5.0, 3.0));
    }

    #[test]
    fn oversized_sprite_is_pinned_at_origin() {
        let screen = ScreenSize::new(50, 50);
        let mut kin = Kinematics::new(sprite(0.0, 0.0, 3.0, 3.0, 80.0), screen, 1.0);
        for _ in 0..5 {
            kin.advance(Vec2::splat(80.0));
            assert_eq!(kin.state().pos, Vec2::ZERO);
        }
    }

    #[test]
    fn launch_places_sprite_like_the_overlay_expects() {
        let kin = Kinematics::launch(ScreenSize::new(1920, 1080), Vec2::new(128.0, 64.0), 6.5, 1.0);
        assert_eq!(kin.state().pos, Vec2::new(896.0, 338.0));
        assert_eq!(kin.state().vel, Vec2::new(6.5, 6.5 * 0.6));
        assert_eq!(kin.state().center(), Vec2::new(960.0, 370.0));
    }

    proptest! {
        #[test]
        fn position_stays_on_screen(
            x in 0.0f32..1000.0,
            y in 0.0f32..600.0,
            vx in -60.0f32..60.0,
            vy in -60.0f32..60.0,
            w in 1.0f32..200.0,
            h in 1.0f32..200.0,
            damping in 0.0f32..=1.0,
            ticks in 1usize..200,
        ) {
            let screen = ScreenSize::new(1200, 800);
            let state = SpriteState { pos: Vec2::new(x, y), vel: Vec2::new(vx, vy), size: Vec2::new(w, h) };
            let mut kin = Kinematics::new(state, screen, damping);
            for _ in 0..ticks {
                kin.advance(Vec2::new(w, h));
                let pos = kin.state().pos;
                prop_assert!(pos.x >= 0.0 && pos.x <= 1200.0 - w);
                prop_assert!(pos.y >= 0.0 && pos.y <= 800.0 - h);
            }
        }
    }
}
