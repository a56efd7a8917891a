use raidloot::{assets, validate_location};
use std::path::PathBuf;

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    let Some(root) = args.get(1).map(PathBuf::from) else {
        return Err("usage: loot_validate <data-root>".to_string());
    };

    let catalog = assets::load_catalog(&root).map_err(|err| err.to_string())?;
    let locations = assets::list_locations(&root).map_err(|err| err.to_string())?;
    if let Err(err) = assets::load_config(&root) {
        return Err(format!("loot.yaml: {err}"));
    }

    let mut failures = 0usize;
    for name in &locations {
        let location = match assets::load_location(&root, name) {
            Ok(location) => location,
            Err(err) => {
                failures += 1;
                eprintln!("{name}: {err}");
                continue;
            }
        };
        let report = validate_location(&catalog, &location);
        println!(
            "{name}: containers={} weapons={} forced_static={} spawnpoints={} forced_spawnpoints={} entries={} errors={}",
            report.containers,
            report.static_weapons,
            report.forced_static,
            report.spawnpoints,
            report.forced_spawnpoints,
            report.distribution_entries,
            report.errors.len()
        );
        for err in &report.errors {
            eprintln!("  {err}");
        }
        if !report.is_ok() {
            failures += 1;
        }
    }

    println!("locations: {} checked, {} with errors", locations.len(), failures);
    if failures > 0 {
        return Err(format!("{failures} location(s) failed validation"));
    }
    Ok(())
}
