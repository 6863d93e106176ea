use slotmap::{new_key_type, SlotMap};

use crate::config::WalkConfig;
use crate::error::ConfigError;
use crate::instance::{TickInput, TickOutput, WalkInstance};
use crate::pose::Pose;
use crate::terrain::GroundQuery;

new_key_type! {
    pub struct InstanceHandle;
}

/// Owns every walking character; hosts pass it explicitly into each tick.
#[derive(Debug)]
pub struct InstanceArena {
    instances: SlotMap<InstanceHandle, WalkInstance>,
}

impl InstanceArena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: SlotMap::with_key(),
        }
    }

    pub fn spawn(
        &mut self,
        config: WalkConfig,
        rest_pose: &Pose,
    ) -> Result<InstanceHandle, ConfigError> {
        let instance = WalkInstance::new(config, rest_pose)?;
        Ok(self.instances.insert(instance))
    }

    pub fn despawn(&mut self, handle: InstanceHandle) -> Option<WalkInstance> {
        let removed = self.instances.remove(handle);
        if removed.is_none() {
            log::warn!("despawn of unknown instance handle {:?}", handle);
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.instances.contains_key(handle)
    }

    #[must_use]
    pub fn get(&self, handle: InstanceHandle) -> Option<&WalkInstance> {
        self.instances.get(handle)
    }

    pub fn get_mut(&mut self, handle: InstanceHandle) -> Option<&mut WalkInstance> {
        self.instances.get_mut(handle)
    }

    /// Ticks one instance; `None` for a stale handle.
    pub fn tick<G: GroundQuery + ?Sized>(
        &mut self,
        handle: InstanceHandle,
        input: &TickInput<'_, G>,
    ) -> Option<TickOutput> {
        self.instances.get_mut(handle).map(|instance| instance.tick(input))
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceHandle, &WalkInstance)> {
        self.instances.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (InstanceHandle, &mut WalkInstance)> {
        self.instances.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl Default for InstanceArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_probe_distance_fails_spawn() {
        let mut arena = InstanceArena::new();
        let config = WalkConfig {
            probe_max_distance: 0.0,
            ..WalkConfig::default()
        };
        assert!(arena.spawn(config, &Pose::default()).is_err());
        assert!(arena.is_empty());
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut arena = InstanceArena::new();
        let handle = arena.spawn(WalkConfig::default(), &Pose::default()).unwrap();
        assert!(arena.contains(handle));

        assert!(arena.despawn(handle).is_some());
        assert!(arena.get(handle).is_none());
        assert!(arena.despawn(handle).is_none());

        let fresh = arena.spawn(WalkConfig::default(), &Pose::default()).unwrap();
        assert_ne!(fresh, handle);
        assert_eq!(arena.len(), 1);
    }
}
