//! Fire-and-forget visual and audio cues raised by placement.
//!
//! The core never reads anything back from an [`EffectSink`]. Renderers and
//! audio backends implement it; [`EffectLog`] records cues for tests and
//! headless runs.

use crate::id::DimensionId;

/// Sound played once per successful placement.
pub const PLACE_SOUND: &str = "place";
/// Sound played once per break.
pub const BREAK_SOUND: &str = "break";

/// Visual effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Place,
    Break,
}

/// Receiver of effect and sound cues.
pub trait EffectSink {
    fn play_effect(&mut self, kind: EffectKind, world_x: f32, world_y: f32, dim: DimensionId);

    fn play_sound(&mut self, name: &str, world_x: f32, world_y: f32);
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEffects;

impl EffectSink for NoEffects {
    fn play_effect(&mut self, _kind: EffectKind, _world_x: f32, _world_y: f32, _dim: DimensionId) {}

    fn play_sound(&mut self, _name: &str, _world_x: f32, _world_y: f32) {}
}

/// A recorded visual effect.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedEffect {
    pub kind: EffectKind,
    pub world_x: f32,
    pub world_y: f32,
    pub dim: DimensionId,
}

/// A recorded sound.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedSound {
    pub name: String,
    pub world_x: f32,
    pub world_y: f32,
}

/// Records every cue in order.
#[derive(Debug, Default, Clone)]
pub struct EffectLog {
    pub effects: Vec<PlayedEffect>,
    pub sounds: Vec<PlayedSound>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: EffectKind) -> usize {
        self.effects.iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
        self.sounds.clear();
    }
}

impl EffectSink for EffectLog {
    fn play_effect(&mut self, kind: EffectKind, world_x: f32, world_y: f32, dim: DimensionId) {
        self.effects.push(PlayedEffect {
            kind,
            world_x,
            world_y,
            dim,
        });
    }

    fn play_sound(&mut self, name: &str, world_x: f32, world_y: f32) {
        self.sounds.push(PlayedSound {
            name: name.to_string(),
            world_x,
            world_y,
        });
    }
}
