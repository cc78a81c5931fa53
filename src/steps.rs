//! Step-keyed checkpointing of the pipeline.
//!
//! Each stage output is memoized as its serialized array under the stage
//! id. With debugging enabled, a later run can resume from a stored step:
//! `init_data` reinstalls the stored map and `run_step` skips everything at
//! or before the resume point. Checkpoint files that fail to load are
//! treated as a cold start, never as a fatal error.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::rawmap::RawMap;

/// Pipeline stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Step {
    Heightmap = 1,
    Erosion = 2,
    Stratums = 3,
    Cliffs = 4,
    Waters = 5,
    Resizing = 6,
    Waterfalls = 7,
}

impl Step {
    pub fn id(self) -> u32 {
        self as u32
    }
}

pub struct StepManager {
    enabled: bool,
    path: PathBuf,
    /// Highest step considered already done; -1 means run everything.
    current_step: i64,
    steps: HashMap<u32, Vec<f64>>,
}

impl StepManager {
    pub fn new(enabled: bool, path: PathBuf, resume_step: u32) -> Self {
        Self {
            enabled,
            path,
            current_step: resume_step as i64,
            steps: HashMap::new(),
        }
    }

    /// A manager that executes every stage and persists nothing.
    pub fn disabled() -> Self {
        Self::new(false, PathBuf::new(), 0)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Populate the cache from the store. A missing or unreadable file is a
    /// cold start.
    pub fn load(&mut self) {
        if !self.enabled {
            return;
        }
        match fs::read(&self.path) {
            Ok(bytes) => match bincode::deserialize::<HashMap<u32, Vec<f64>>>(&bytes) {
                Ok(steps) => {
                    log::debug!("loaded {} cached steps from {:?}", steps.len(), self.path);
                    self.steps = steps;
                }
                Err(err) => {
                    log::warn!("corrupt step file {:?} ({err}), cold start", self.path);
                    self.current_step = -1;
                }
            },
            Err(_) => {
                self.current_step = -1;
            }
        }
    }

    /// Reinstall the map cached at the resume step, or build a fresh one.
    pub fn init_data(&mut self, width: usize, height: usize) -> RawMap {
        if self.enabled && self.current_step >= 0 {
            let id = self.current_step as u32;
            if let Some(arr) = self.steps.get(&id) {
                match RawMap::from_array(id, arr) {
                    Ok(map) => return map,
                    Err(err) => {
                        log::warn!("unusable cache at step {id} ({err}), cold start");
                    }
                }
            }
        }
        self.current_step = -1;
        RawMap::new(width, height)
    }

    /// Execute a stage unless it is at or before the resume point, and
    /// record its output under the step id.
    pub fn run_step<F>(&mut self, step: Step, map: RawMap, run: F) -> Result<RawMap>
    where
        F: FnOnce(RawMap) -> Result<RawMap>,
    {
        if self.enabled && (step.id() as i64) <= self.current_step {
            log::debug!("step {} restored from cache, skipping", step.id());
            return Ok(map);
        }
        let map = run(map)?;
        if self.enabled {
            self.steps.insert(step.id(), map.to_array());
        }
        Ok(map)
    }

    /// Write the cache to the store; no-op when disabled.
    pub fn save(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let bytes = bincode::serialize(&self.steps)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "terrain_generator_steps_{}_{name}.bin",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    fn stamp(map: &mut RawMap, value: f64) {
        map.heightmap.set(0, 0, value);
    }

    #[test]
    fn test_disabled_manager_always_runs() {
        let mut manager = StepManager::disabled();
        let map = manager.init_data(8, 8);
        let map = manager
            .run_step(Step::Heightmap, map, |mut m| {
                stamp(&mut m, 1.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 1.0);
        manager.save().unwrap();
        assert!(!manager.path().exists());
    }

    #[test]
    fn test_resume_skips_completed_steps() {
        let path = temp_path("resume");

        // Cold run: record steps 1 and 2.
        let mut manager = StepManager::new(true, path.clone(), 0);
        manager.load();
        let map = manager.init_data(8, 8);
        let map = manager
            .run_step(Step::Heightmap, map, |mut m| {
                stamp(&mut m, 1.0);
                Ok(m)
            })
            .unwrap();
        let map = manager
            .run_step(Step::Erosion, map, |mut m| {
                stamp(&mut m, 2.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 2.0);
        manager.save().unwrap();
        assert!(path.exists());

        // Resumed run from step 1: step 1 must not re-execute, step 2 must.
        let mut manager = StepManager::new(true, path.clone(), 1);
        manager.load();
        let map = manager.init_data(8, 8);
        assert_eq!(*map.heightmap.get(0, 0), 1.0);
        let map = manager
            .run_step(Step::Heightmap, map, |mut m| {
                stamp(&mut m, 99.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 1.0);
        let map = manager
            .run_step(Step::Erosion, map, |mut m| {
                stamp(&mut m, 2.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 2.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        let path = temp_path("cold");
        let mut manager = StepManager::new(true, path, 5);
        manager.load();
        let map = manager.init_data(6, 6);
        // Nothing cached: the resume point resets and steps run.
        let map = manager
            .run_step(Step::Heightmap, map, |mut m| {
                stamp(&mut m, 7.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 7.0);
    }

    #[test]
    fn test_corrupt_file_is_cold_start() {
        let path = temp_path("corrupt");
        fs::write(&path, b"not a step file").unwrap();
        let mut manager = StepManager::new(true, path.clone(), 3);
        manager.load();
        let map = manager.init_data(6, 6);
        assert_eq!(*map.heightmap.get(0, 0), 0.0);
        let map = manager
            .run_step(Step::Stratums, map, |mut m| {
                stamp(&mut m, 3.0);
                Ok(m)
            })
            .unwrap();
        assert_eq!(*map.heightmap.get(0, 0), 3.0);
        let _ = fs::remove_file(&path);
    }
}
