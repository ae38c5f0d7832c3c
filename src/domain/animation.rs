/// Frame-cycling animations.
///
/// `AnimationTemplate` is immutable and shared (frames + timing).
/// `Animation` is the per-entity playback state: a template handle plus a cursor.
/// Switching action never rewinds an instance in place; the owner builds a
/// fresh instance from the template instead.
///
/// `AnimationLibrary` maps every `(EntityKind, Action)` pair to a template and
/// refuses to build if any pair is missing, so a content hole is reported at
/// startup rather than on first use.

use std::collections::HashMap;
use std::sync::Arc;

use super::player::Action;
use crate::error::AssetError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EntityKind {
    Player,
}

impl EntityKind {
    pub const ALL: [EntityKind; 1] = [EntityKind::Player];
}

/// One image of an animation. The terminal renderer draws `rows` top to
/// bottom, each row one world cell wide.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Frame {
    pub key: &'static str,
    pub rows: [&'static str; 2],
}

#[derive(Clone, Debug)]
pub struct AnimationTemplate {
    frames: Arc<[Frame]>,
    frame_duration: u32,
    looping: bool,
}

impl AnimationTemplate {
    pub fn new(frames: Vec<Frame>, frame_duration: u32, looping: bool) -> Self {
        AnimationTemplate { frames: frames.into(), frame_duration, looping }
    }

    /// Fresh playback state at frame 0.
    pub fn instantiate(&self) -> Animation {
        Animation { template: self.clone(), cursor: 0, done: false }
    }

    fn is_playable(&self) -> bool {
        !self.frames.is_empty() && self.frame_duration > 0
    }

    fn span(&self) -> u32 {
        self.frame_duration * self.frames.len() as u32
    }
}

#[derive(Clone, Debug)]
pub struct Animation {
    template: AnimationTemplate,
    cursor: u32,
    done: bool,
}

impl Animation {
    /// Advance one simulation step.
    pub fn update(&mut self) {
        let span = self.template.span();
        if self.template.looping {
            self.cursor = (self.cursor + 1) % span;
        } else {
            self.cursor = (self.cursor + 1).min(span - 1);
            if self.cursor >= span - 1 {
                self.done = true;
            }
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.template.frames[(self.cursor / self.template.frame_duration) as usize]
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[derive(Clone, Debug)]
pub struct AnimationLibrary {
    templates: HashMap<(EntityKind, Action), AnimationTemplate>,
}

impl AnimationLibrary {
    /// Build the table, checking that every entity/action pair is covered.
    pub fn from_entries<I>(entries: I) -> Result<Self, AssetError>
    where
        I: IntoIterator<Item = ((EntityKind, Action), AnimationTemplate)>,
    {
        let templates: HashMap<_, _> = entries.into_iter().collect();
        for entity in EntityKind::ALL {
            for action in Action::ALL {
                match templates.get(&(entity, action)) {
                    None => return Err(AssetError::MissingAnimation { entity, action }),
                    Some(t) if !t.is_playable() => {
                        return Err(AssetError::EmptyAnimation { entity, action })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(AnimationLibrary { templates })
    }

    /// Terminal glyph animations for the player.
    /// Frame durations match the sprite sheets: idle 10, the rest 4 steps.
    pub fn builtin() -> Result<Self, AssetError> {
        let f = |key, top, bottom| Frame { key, rows: [top, bottom] };
        Self::from_entries([
            ((EntityKind::Player, Action::Idle), AnimationTemplate::new(
                vec![f("idle/0", "()", "/\\"), f("idle/1", "()", "||")],
                10, true,
            )),
            ((EntityKind::Player, Action::Run), AnimationTemplate::new(
                vec![
                    f("run/0", "()", "/|"),
                    f("run/1", "()", "||"),
                    f("run/2", "()", "|\\"),
                    f("run/3", "()", "||"),
                ],
                4, true,
            )),
            ((EntityKind::Player, Action::Jump), AnimationTemplate::new(
                vec![f("jump/0", "\\/", "()"), f("jump/1", "()", "/\\")],
                4, true,
            )),
            ((EntityKind::Player, Action::Crouch), AnimationTemplate::new(
                vec![f("crouch/0", "  ", "<>"), f("crouch/1", "  ", "><")],
                4, true,
            )),
        ])
    }

    pub fn get(&self, entity: EntityKind, action: Action) -> &AnimationTemplate {
        // Presence of every pair is checked in `from_entries`.
        &self.templates[&(entity, action)]
    }
}
