//! The full generation pipeline.
//!
//! A strictly ordered sequence of stages over one `RawMap`, each wrapped by
//! the step manager so debug runs can resume from a checkpoint. Synthesis
//! through water mapping run at working resolution; the resizing stage
//! doubles every raster and the waterfall pass runs at final resolution.

use std::fs;
use std::path::Path;

use crate::cliffs;
use crate::erosion;
use crate::error::Result;
use crate::export;
use crate::heightmap;
use crate::params::Parameters;
use crate::raster::Raster;
use crate::rawmap::RawMap;
use crate::resize::resize;
use crate::steps::{Step, StepManager};
use crate::stratums;
use crate::waterfalls;
use crate::waters;

/// Process a full generation from a parameter file: build the map, persist
/// checkpoints if debugging is on, export the PNG layers.
pub fn run(path_to_params: &Path) -> Result<()> {
    let mut parameters = Parameters::load(path_to_params)?;
    if parameters.randomize_seed {
        parameters.seed = rand::random::<u32>() as u64;
        println!("Seed randomized to {}", parameters.seed);
    }

    // Resolve the output folder: the debug name when present, else a
    // timestamp generation id.
    // A bare filename has an empty parent; templates expand against ".".
    let directory = match path_to_params.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let (debug_enabled, resume_step, folder) = match &parameters.debug {
        Some(debug) if debug.enabled => (true, debug.step, debug.name.clone()),
        _ => (false, 0, chrono::Utc::now().timestamp().to_string()),
    };
    let out_dir = parameters.resolve_outputs(directory, &folder);
    fs::create_dir_all(&out_dir)?;

    let mut manager = if debug_enabled {
        StepManager::new(true, out_dir.join("steps.bin"), resume_step)
    } else {
        StepManager::disabled()
    };
    manager.load();

    let map = generate_rawmap(&parameters, &mut manager)?;
    manager.save()?;

    println!("Exporting maps to {}", out_dir.display());
    export::export(&out_dir.join("heightmap.png"), &[&map.heightmap])?;
    export::export(&out_dir.join("stratums.png"), &[&map.stratums])?;
    let [red, green, blue] = cliffs::to_rgb_cliffs(&map.cliffs);
    export::export(&out_dir.join("cliffs.png"), &[&red, &green, &blue])?;
    export::export(&out_dir.join("rivers.png"), &[&map.rivermap])?;
    export::export(&out_dir.join("pools.png"), &[&map.poolmap])?;
    export::export(&out_dir.join("waterfalls.png"), &[&map.waterfallmap])?;
    println!("Done");
    Ok(())
}

/// Run the seven stages and return the finished map.
pub fn generate_rawmap(parameters: &Parameters, manager: &mut StepManager) -> Result<RawMap> {
    let seed = parameters.seed;
    println!(
        "Generating map {}x{} with seed {}",
        parameters.map.width, parameters.map.height, seed
    );
    let mut map = manager.init_data(parameters.map.width, parameters.map.height);

    map = manager.run_step(Step::Heightmap, map, |mut map| {
        println!("Generating heightmap...");
        map.heightmap = heightmap::generate(
            &parameters.heightmap_generation,
            map.working_width(),
            map.working_height(),
            seed,
        )?;
        Ok(map)
    })?;

    map = manager.run_step(Step::Erosion, map, |mut map| {
        println!("Simulating erosion ({} droplets)...", parameters.erosion.droplets);
        erosion::erode(&mut map.heightmap, &parameters.erosion, seed);
        Ok(map)
    })?;

    map = manager.run_step(Step::Stratums, map, |mut map| {
        println!("Quantizing stratums ({} steps)...", parameters.cliff_mapping.step_count);
        map.stratums = stratums::calculate_stratums(&map.heightmap, parameters.cliff_mapping.step_count);
        Ok(map)
    })?;

    map = manager.run_step(Step::Cliffs, map, |mut map| {
        println!("Mapping cliffs...");
        map.cliffs = cliffs::calculate_cliffs(&map.stratums);
        Ok(map)
    })?;

    map = manager.run_step(Step::Waters, map, |mut map| {
        println!("Mapping waters ({} sources)...", parameters.water_mapping.sources.amount);
        let waters = waters::generate(
            &map.heightmap,
            &map.stratums,
            &map.cliffs,
            &parameters.water_mapping,
            seed,
        );
        map.rivermap = waters.rivermap;
        map.poolmap = waters.poolmap;
        Ok(map)
    })?;

    map = manager.run_step(Step::Resizing, map, |mut map| {
        println!("Resizing to final resolution...");
        map.heightmap = resize(&map.heightmap, 2);
        map.stratums = resize(&map.stratums, 2);
        map.rivermap = resize(&map.rivermap, 2);
        map.poolmap = resize(&map.poolmap, 2);
        // Upscaled cliff bytes would be garbage; recompute them from the
        // upscaled stratums instead.
        map.cliffs = cliffs::calculate_cliffs(&map.stratums);
        map.waterfallmap = Raster::new(map.stratums.width, map.stratums.height);
        Ok(map)
    })?;

    map = manager.run_step(Step::Waterfalls, map, |mut map| {
        println!("Detecting waterfalls...");
        map.waterfallmap = waterfalls::calculate_waterfalls(&map.rivermap, &map.cliffs);
        Ok(map)
    })?;

    Ok(map)
}
