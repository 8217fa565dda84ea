//! Confetti physics, independent of any rendering surface.
//!
//! Each frame integrates gravity, drag, rotation and a height-based fade for
//! every live piece. Bursts are spawned once, rain is fed a fractional number
//! of pieces per frame, and pops are the small bursts left behind by title
//! taps and interrupting clicks.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use super::{Point, Viewport};

/// Rainbow palette, innermost band first
pub const RING_COLORS: [&str; 7] = [
    "#70369d", "#4b369d", "#487de7", "#79c314", "#faeb36", "#ffa500", "#e81416",
];

pub const BURST_PIECES: usize = 150;
pub const POP_PIECES: usize = 150;
pub const RAIN_PIECES_PER_FRAME: f64 = 0.25;

const BURST_RING_INNER: f64 = 60.0;
const BURST_RING_OUTER: f64 = 126.5;
const RAIN_SPAWN_Y: f64 = -20.0;
const FADE_START_FACTOR: f64 = 0.8;
const MIN_OPACITY: f64 = 0.01;
const POP_MIN_OPACITY: f64 = 0.05;
const POP_OPACITY_DECAY: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticleVariant {
    Burst,
    Rain,
    Pop,
}

struct Physics {
    gravity: f64,
    terminal_velocity: f64,
    drag: f64,
    /// Rain and burst damp `vy` exactly like `vx`; pops only damp `vx`
    damp_vertical: bool,
}

impl ParticleVariant {
    fn physics(self) -> Physics {
        match self {
            ParticleVariant::Burst | ParticleVariant::Rain => Physics {
                gravity: 0.125,
                terminal_velocity: 8.0,
                drag: 0.075,
                damp_vertical: true,
            },
            ParticleVariant::Pop => Physics {
                gravity: 0.08,
                terminal_velocity: 6.0,
                drag: 0.02,
                damp_vertical: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfettiPiece {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub rotation: f64,
    pub rotation_speed: f64,
    pub opacity: f64,
    pub base_opacity: f64,
    pub width: f64,
    pub height: f64,
    pub color: &'static str,
    pub fade_end_factor: f64,
}

/// Derive an independent generator for a new field
pub fn fork_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

/// Random size factor shared by every variant; small pieces are also fainter
fn size_and_opacity(rng: &mut StdRng) -> (f64, f64) {
    let size_factor = rng.gen_range(0.5..1.2);
    (size_factor, f64::min(size_factor, 1.0))
}

fn fade_end_factor(rng: &mut StdRng) -> f64 {
    rng.gen_range(0.85..0.98)
}

/// A batch of pieces sharing one variant
#[derive(Debug)]
pub struct ParticleField {
    variant: ParticleVariant,
    pieces: Vec<ConfettiPiece>,
    rng: StdRng,
    next_id: u64,
    spawn_debt: f64,
    completed: bool,
}

impl ParticleField {
    fn empty(variant: ParticleVariant, rng: StdRng) -> Self {
        Self {
            variant,
            pieces: Vec::new(),
            rng,
            next_id: 0,
            spawn_debt: 0.0,
            completed: false,
        }
    }

    /// One-shot burst from a ring around `origin`
    pub fn burst(origin: Point, rng: StdRng) -> Self {
        let mut field = Self::empty(ParticleVariant::Burst, rng);
        for i in 0..BURST_PIECES {
            let angle = field.rng.gen_range(0.0..std::f64::consts::TAU);
            let radius = field.rng.gen_range(BURST_RING_INNER..BURST_RING_OUTER);
            let speed = field.rng.gen_range(6.0..12.0);
            let (size_factor, base_opacity) = size_and_opacity(&mut field.rng);
            let piece = ConfettiPiece {
                id: i as u64,
                x: origin.x + angle.cos() * radius,
                y: origin.y + angle.sin() * radius,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                rotation: field.rng.gen_range(0.0..360.0),
                rotation_speed: field.rng.gen_range(-5.0..5.0),
                opacity: base_opacity,
                base_opacity,
                width: 8.0 * size_factor,
                height: 12.0 * size_factor,
                color: RING_COLORS[i % RING_COLORS.len()],
                fade_end_factor: fade_end_factor(&mut field.rng),
            };
            field.pieces.push(piece);
        }
        field.next_id = BURST_PIECES as u64;
        field
    }

    /// Small burst from a single point, left by title taps and interrupting clicks
    pub fn pop(origin: Point, rng: StdRng) -> Self {
        let mut field = Self::empty(ParticleVariant::Pop, rng);
        for i in 0..POP_PIECES {
            let angle = field.rng.gen_range(0.0..std::f64::consts::TAU);
            let speed = field.rng.gen_range(5.0..11.0);
            let (size_factor, _) = size_and_opacity(&mut field.rng);
            let piece = ConfettiPiece {
                id: i as u64,
                x: origin.x,
                y: origin.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                rotation: field.rng.gen_range(0.0..360.0),
                rotation_speed: field.rng.gen_range(-5.0..5.0),
                opacity: 1.0,
                base_opacity: 1.0,
                width: 8.0 * size_factor,
                height: 12.0 * size_factor,
                color: RING_COLORS[RING_COLORS.len() - 1 - i % RING_COLORS.len()],
                fade_end_factor: 1.0,
            };
            field.pieces.push(piece);
        }
        field.next_id = POP_PIECES as u64;
        field
    }

    /// Continuous rain; starts empty and is fed by `step`
    pub fn rain(rng: StdRng) -> Self {
        Self::empty(ParticleVariant::Rain, rng)
    }

    pub fn pieces(&self) -> &[ConfettiPiece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn spawn_rain_piece(&mut self, viewport: Viewport) {
        let (size_factor, base_opacity) = size_and_opacity(&mut self.rng);
        let color = RING_COLORS[self.rng.gen_range(0..RING_COLORS.len())];
        let piece = ConfettiPiece {
            id: self.next_id,
            x: self.rng.gen_range(0.0..viewport.width.max(1.0)),
            y: RAIN_SPAWN_Y,
            vx: self.rng.gen_range(-2.0..2.0),
            vy: self.rng.gen_range(2.0..4.0),
            rotation: self.rng.gen_range(0.0..360.0),
            rotation_speed: self.rng.gen_range(-3.0..3.0),
            opacity: base_opacity,
            base_opacity,
            width: 8.0 * size_factor,
            height: 12.0 * size_factor,
            color,
            fade_end_factor: fade_end_factor(&mut self.rng),
        };
        self.next_id += 1;
        self.pieces.push(piece);
    }

    /// Advance one frame.
    ///
    /// `burn_off_y` erases every piece above the line; `spawning` feeds the
    /// rain variant. Returns true on the single frame a burst or pop field
    /// runs out of pieces.
    pub fn step(&mut self, viewport: Viewport, burn_off_y: Option<f64>, spawning: bool) -> bool {
        if self.variant == ParticleVariant::Rain && spawning {
            self.spawn_debt += RAIN_PIECES_PER_FRAME;
            while self.spawn_debt >= 1.0 {
                self.spawn_rain_piece(viewport);
                self.spawn_debt -= 1.0;
            }
        }

        let physics = self.variant.physics();
        let variant = self.variant;
        let fade_start = viewport.height * FADE_START_FACTOR;

        for piece in &mut self.pieces {
            piece.vy += physics.gravity;
            piece.vy = piece.vy.min(physics.terminal_velocity);
            piece.vx *= 1.0 - physics.drag;
            if physics.damp_vertical {
                piece.vy *= 1.0 - physics.drag;
            }
            piece.x += piece.vx;
            piece.y += piece.vy;
            piece.rotation += piece.rotation_speed;

            if variant == ParticleVariant::Pop {
                piece.opacity *= POP_OPACITY_DECAY;
            } else if piece.y > fade_start {
                let fade_end = viewport.height * piece.fade_end_factor;
                let range = (fade_end - fade_start).max(1.0);
                let faded = ((piece.y - fade_start) / range).min(1.0);
                piece.opacity = piece.base_opacity * (1.0 - faded);
            }
        }

        match variant {
            ParticleVariant::Pop => self.pieces.retain(|p| p.opacity > POP_MIN_OPACITY),
            ParticleVariant::Burst | ParticleVariant::Rain => self.pieces.retain(|p| {
                if burn_off_y.is_some_and(|line| p.y < line) {
                    return false;
                }
                p.opacity > MIN_OPACITY && p.y < viewport.height
            }),
        }

        if variant != ParticleVariant::Rain && self.pieces.is_empty() && !self.completed {
            self.completed = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn viewport() -> Viewport {
        Viewport::new(1_000.0, 800.0)
    }

    fn still_piece(y: f64) -> ConfettiPiece {
        ConfettiPiece {
            id: 0,
            x: 100.0,
            y,
            vx: 0.0,
            vy: 0.0,
            rotation: 0.0,
            rotation_speed: 1.0,
            opacity: 1.0,
            base_opacity: 1.0,
            width: 8.0,
            height: 12.0,
            color: RING_COLORS[0],
            fade_end_factor: 0.9,
        }
    }

    #[test]
    fn test_burst_spawns_full_batch_around_origin() {
        let origin = Point::new(500.0, 400.0);
        let field = ParticleField::burst(origin, rng());
        assert_eq!(field.len(), BURST_PIECES);
        for piece in field.pieces() {
            let distance = ((piece.x - origin.x).powi(2) + (piece.y - origin.y).powi(2)).sqrt();
            assert!((BURST_RING_INNER - 1e-9..=BURST_RING_OUTER).contains(&distance));
            assert!(piece.opacity <= 1.0 && piece.opacity >= 0.5);
            assert!((0.85..0.98).contains(&piece.fade_end_factor));
        }
    }

    #[test]
    fn test_gravity_drag_and_rotation() {
        let mut field = ParticleField::empty(ParticleVariant::Burst, rng());
        field.pieces.push(still_piece(100.0));
        field.step(viewport(), None, false);

        let piece = &field.pieces()[0];
        let expected_vy = 0.125 * (1.0 - 0.075);
        assert!((piece.vy - expected_vy).abs() < 1e-12);
        assert!((piece.y - (100.0 + expected_vy)).abs() < 1e-12);
        assert_eq!(piece.rotation, 1.0);
    }

    #[test]
    fn test_terminal_velocity_caps_fall() {
        let mut field = ParticleField::empty(ParticleVariant::Burst, rng());
        let mut piece = still_piece(0.0);
        piece.vy = 50.0;
        field.pieces.push(piece);
        field.step(viewport(), None, false);
        assert!(field.pieces()[0].vy <= 8.0);
    }

    #[test]
    fn test_fade_starts_at_eighty_percent() {
        let mut field = ParticleField::empty(ParticleVariant::Burst, rng());
        field.pieces.push(still_piece(100.0));
        field.pieces.push(still_piece(680.0));
        field.step(viewport(), None, false);

        assert_eq!(field.pieces()[0].opacity, 1.0);
        // fade runs from 640 to 720 for a 0.9 fade end factor
        let faded = &field.pieces()[1];
        assert!(faded.opacity < 0.5 && faded.opacity > 0.4, "{}", faded.opacity);
    }

    #[test]
    fn test_pieces_leaving_the_viewport_are_removed() {
        let mut field = ParticleField::empty(ParticleVariant::Burst, rng());
        let mut piece = still_piece(799.95);
        piece.fade_end_factor = 1.2;
        field.pieces.push(piece);
        field.step(viewport(), None, false);
        assert!(field.is_empty());
    }

    #[test]
    fn test_burn_off_erases_pieces_above_line() {
        let mut field = ParticleField::empty(ParticleVariant::Rain, rng());
        field.pieces.push(still_piece(100.0));
        field.pieces.push(still_piece(500.0));
        field.step(viewport(), Some(300.0), false);
        assert_eq!(field.len(), 1);
        assert!(field.pieces()[0].y > 300.0);
    }

    #[test]
    fn test_burst_reports_completion_once() {
        let mut field = ParticleField::empty(ParticleVariant::Burst, rng());
        field.pieces.push(still_piece(100.0));
        assert!(field.step(viewport(), Some(800.0), false));
        assert!(!field.step(viewport(), None, false));
    }

    #[test]
    fn test_rain_spawns_fractional_count_per_frame() {
        let mut field = ParticleField::rain(rng());
        for _ in 0..8 {
            field.step(viewport(), None, true);
        }
        assert_eq!(field.len(), 2);
        assert!(field.pieces().iter().all(|p| p.y < 40.0));

        for _ in 0..8 {
            field.step(viewport(), None, false);
        }
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_rain_never_reports_completion() {
        let mut field = ParticleField::rain(rng());
        assert!(!field.step(viewport(), None, false));
    }

    #[test]
    fn test_pop_decays_opacity_and_completes() {
        let mut field = ParticleField::pop(Point::new(200.0, 100.0), rng());
        assert_eq!(field.len(), POP_PIECES);
        field.step(viewport(), None, false);
        assert!(field.pieces().iter().all(|p| (p.opacity - 0.98).abs() < 1e-12));

        let mut completed = false;
        for _ in 0..200 {
            completed |= field.step(viewport(), None, false);
        }
        assert!(completed);
        assert!(field.is_empty());
    }
}
