//! Live meteor registry
//!
//! Owns every live meteor. Spawning and killing are the only ways membership
//! changes; callers refer to meteors by [`MeteorId`] and must not assume a
//! handle stays valid across a kill.

use glam::Vec2;
use rand::Rng;

use super::state::{Meteor, MeteorId};
use crate::consts::*;
use crate::question::{self, QuestionOptions};
use crate::units::ConversionTemplate;

/// Where new meteors appear
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnLayout {
    /// Uniformly random x across the bounds
    Random { min_x: f32, max_x: f32, y: f32 },
    /// Evenly spaced columns, lowest free column first
    Grid { columns: usize, min_x: f32, max_x: f32, y: f32 },
}

impl SpawnLayout {
    pub fn random() -> Self {
        SpawnLayout::Random {
            min_x: WORLD_MIN_X + METEOR_RADIUS,
            max_x: WORLD_MAX_X - METEOR_RADIUS,
            y: SPAWN_Y,
        }
    }

    pub fn grid(columns: usize) -> Self {
        SpawnLayout::Grid {
            columns,
            min_x: WORLD_MIN_X,
            max_x: WORLD_MAX_X,
            y: SPAWN_Y,
        }
    }
}

/// Parameters for a single spawn
#[derive(Debug, Clone, Copy)]
pub struct SpawnParams<'a> {
    pub templates: &'a [ConversionTemplate],
    pub difficulty: u8,
    pub options: QuestionOptions,
    pub fall_speed: f32,
}

/// Live meteor set with a hard cap
#[derive(Debug, Clone)]
pub struct MeteorRegistry {
    /// Sorted by id
    meteors: Vec<Meteor>,
    cap: usize,
    layout: SpawnLayout,
    next_id: u32,
}

impl MeteorRegistry {
    pub fn new(cap: usize, layout: SpawnLayout) -> Self {
        Self {
            meteors: Vec::with_capacity(cap),
            cap: cap.min(MAX_METEORS),
            layout,
            next_id: 1,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.meteors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meteors.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.meteors.len() >= self.cap
    }

    pub fn get(&self, id: MeteorId) -> Option<&Meteor> {
        self.meteors.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: MeteorId) -> Option<&mut Meteor> {
        self.meteors.iter_mut().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MeteorId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Meteor> {
        self.meteors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Meteor> {
        self.meteors.iter_mut()
    }

    pub fn ids(&self) -> Vec<MeteorId> {
        self.meteors.iter().map(|m| m.id).collect()
    }

    /// Spawn one meteor from a random template.
    ///
    /// Returns `None` without side effects when the registry is at its cap,
    /// no templates are given, or the grid has no free column.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        params: &SpawnParams<'_>,
        rng: &mut R,
    ) -> Option<MeteorId> {
        if self.is_full() || params.templates.is_empty() {
            log::debug!("Spawn rejected ({} / {} live)", self.meteors.len(), self.cap);
            return None;
        }

        let (pos, slot) = self.spawn_position(rng)?;
        let template = params.templates[rng.random_range(0..params.templates.len())];
        let question = question::generate(&template, params.difficulty, &params.options, rng);

        let id = MeteorId(self.next_id);
        self.next_id += 1;

        let mut meteor = Meteor::new(id, question, pos, params.fall_speed);
        meteor.spawn_slot = slot;
        self.meteors.push(meteor);
        Some(id)
    }

    fn spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Vec2, Option<usize>)> {
        match self.layout {
            SpawnLayout::Random { min_x, max_x, y } => {
                let x = if max_x > min_x {
                    rng.random_range(min_x..=max_x)
                } else {
                    min_x
                };
                Some((Vec2::new(x, y), None))
            }
            SpawnLayout::Grid {
                columns,
                min_x,
                max_x,
                y,
            } => {
                let taken: Vec<usize> = self.meteors.iter().filter_map(|m| m.spawn_slot).collect();
                let slot = (0..columns).find(|c| !taken.contains(c))?;
                let width = (max_x - min_x) / columns as f32;
                let x = min_x + (slot as f32 + 0.5) * width;
                Some((Vec2::new(x, y), Some(slot)))
            }
        }
    }

    /// Meteor closest to `point` along the vertical axis.
    ///
    /// Ties keep the first meteor in id order.
    pub fn closest_to(&self, point: Vec2, skip_dead: bool) -> Option<MeteorId> {
        let mut best: Option<(MeteorId, f32)> = None;
        for meteor in &self.meteors {
            if skip_dead && !meteor.alive {
                continue;
            }
            let dist = (meteor.pos.y - point.y).abs();
            match best {
                Some((_, best_dist)) if !(dist < best_dist) => {}
                _ => best = Some((meteor.id, dist)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Closest meteor that can currently be targeted
    pub fn closest_targetable(&self, point: Vec2) -> Option<MeteorId> {
        let mut best: Option<(MeteorId, f32)> = None;
        for meteor in self.meteors.iter().filter(|m| m.alive && !m.knockback) {
            let dist = (meteor.pos.y - point.y).abs();
            match best {
                Some((_, best_dist)) if !(dist < best_dist) => {}
                _ => best = Some((meteor.id, dist)),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<MeteorId> {
        if self.meteors.is_empty() {
            None
        } else {
            Some(self.meteors[rng.random_range(0..self.meteors.len())].id)
        }
    }

    /// Remove a meteor, returning it marked dead
    pub fn kill(&mut self, id: MeteorId) -> Option<Meteor> {
        let idx = self.meteors.iter().position(|m| m.id == id)?;
        let mut meteor = self.meteors.remove(idx);
        meteor.alive = false;
        Some(meteor)
    }

    /// Kill every live meteor (stage end/reset)
    pub fn kill_all(&mut self) -> Vec<Meteor> {
        let mut killed: Vec<Meteor> = self.meteors.drain(..).collect();
        for meteor in &mut killed {
            meteor.alive = false;
        }
        killed
    }

    /// Forget all meteors and restart id allocation
    pub fn reset(&mut self) {
        self.meteors.clear();
        self.next_id = 1;
    }

    /// Test helper: insert a fully built meteor
    #[cfg(test)]
    pub(crate) fn insert(&mut self, meteor: Meteor) {
        self.next_id = self.next_id.max(meteor.id.0 + 1);
        self.meteors.push(meteor);
        self.meteors.sort_by_key(|m| m.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::CATALOG;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn params() -> SpawnParams<'static> {
        SpawnParams {
            templates: CATALOG,
            difficulty: 3,
            options: QuestionOptions::default(),
            fall_speed: 1.0,
        }
    }

    #[test]
    fn test_spawn_until_cap() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..MAX_METEORS {
            assert!(registry.spawn(&params(), &mut rng).is_some());
        }
        assert!(registry.is_full());
        assert_eq!(registry.spawn(&params(), &mut rng), None);
        assert_eq!(registry.len(), MAX_METEORS);
    }

    #[test]
    fn test_spawn_without_templates_is_rejected() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(1);
        let empty = SpawnParams {
            templates: &[],
            ..params()
        };
        assert_eq!(registry.spawn(&empty, &mut rng), None);
    }

    #[test]
    fn test_random_layout_within_bounds() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(9);
        while registry.spawn(&params(), &mut rng).is_some() {}
        for m in registry.iter() {
            assert!(m.pos.x >= WORLD_MIN_X && m.pos.x <= WORLD_MAX_X);
            assert_eq!(m.pos.y, SPAWN_Y);
            assert_eq!(m.spawn_slot, None);
        }
    }

    #[test]
    fn test_grid_layout_is_deterministic_and_reuses_columns() {
        let mut registry =
            MeteorRegistry::new(MAX_SHOWCASE_METEORS, SpawnLayout::grid(MAX_SHOWCASE_METEORS));
        let mut rng = Pcg32::seed_from_u64(3);
        let first = registry.spawn(&params(), &mut rng).unwrap();
        let second = registry.spawn(&params(), &mut rng).unwrap();
        let width = (WORLD_MAX_X - WORLD_MIN_X) / MAX_SHOWCASE_METEORS as f32;
        assert_eq!(registry.get(first).unwrap().pos.x, WORLD_MIN_X + 0.5 * width);
        assert_eq!(registry.get(second).unwrap().pos.x, WORLD_MIN_X + 1.5 * width);

        registry.kill(first);
        let third = registry.spawn(&params(), &mut rng).unwrap();
        assert_eq!(registry.get(third).unwrap().spawn_slot, Some(0));
    }

    #[test]
    fn test_closest_uses_vertical_distance_and_first_on_ties() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(5);
        let a = registry.spawn(&params(), &mut rng).unwrap();
        let b = registry.spawn(&params(), &mut rng).unwrap();
        let c = registry.spawn(&params(), &mut rng).unwrap();
        registry.get_mut(a).unwrap().pos = Vec2::new(-7.0, 5.0);
        registry.get_mut(b).unwrap().pos = Vec2::new(7.0, 3.0);
        registry.get_mut(c).unwrap().pos = Vec2::new(0.0, 3.0);

        // Horizontal offset is ignored; b and c tie, b was seen first
        assert_eq!(registry.closest_to(Vec2::ZERO, true), Some(b));

        registry.get_mut(b).unwrap().alive = false;
        assert_eq!(registry.closest_to(Vec2::ZERO, true), Some(c));
        assert_eq!(registry.closest_to(Vec2::ZERO, false), Some(b));
    }

    #[test]
    fn test_closest_targetable_skips_knockback() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(5);
        let a = registry.spawn(&params(), &mut rng).unwrap();
        let b = registry.spawn(&params(), &mut rng).unwrap();
        registry.get_mut(a).unwrap().pos.y = 2.0;
        registry.get_mut(a).unwrap().knockback = true;
        registry.get_mut(b).unwrap().pos.y = 8.0;
        assert_eq!(registry.closest_targetable(Vec2::ZERO), Some(b));
    }

    #[test]
    fn test_kill_and_kill_all() {
        let mut registry = MeteorRegistry::new(MAX_METEORS, SpawnLayout::random());
        let mut rng = Pcg32::seed_from_u64(8);
        let a = registry.spawn(&params(), &mut rng).unwrap();
        registry.spawn(&params(), &mut rng).unwrap();
        let killed = registry.kill(a).unwrap();
        assert!(!killed.alive);
        assert!(!registry.contains(a));
        assert_eq!(registry.kill(a).map(|m| m.id), None);

        let rest = registry.kill_all();
        assert_eq!(rest.len(), 1);
        assert!(registry.is_empty());
        assert_eq!(registry.random(&mut rng), None);
    }

    proptest! {
        #[test]
        fn prop_spawn_never_exceeds_cap(seed in any::<u64>(), cap in 1usize..=MAX_METEORS, attempts in 0usize..40) {
            let mut registry = MeteorRegistry::new(cap, SpawnLayout::random());
            let mut rng = Pcg32::seed_from_u64(seed);
            for i in 0..attempts {
                registry.spawn(&params(), &mut rng);
                if i % 5 == 4 {
                    if let Some(id) = registry.random(&mut rng) {
                        registry.kill(id);
                    }
                }
                prop_assert!(registry.len() <= cap);
            }
        }
    }
}
