use crate::entities::item::TemplateId;
use crate::world::catalog::Catalog;
use crate::world::location::{LocationLootData, SpawnTemplate, Spawnpoint};
use serde::Serialize;

#[derive(Debug, Default, Clone, Serialize)]
pub struct LocationValidationReport {
    pub location: String,
    pub static_weapons: usize,
    pub containers: usize,
    pub forced_static: usize,
    pub spawnpoints: usize,
    pub forced_spawnpoints: usize,
    pub distribution_entries: usize,
    pub errors: Vec<String>,
}

impl LocationValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Cross-checks a map's loot data against the catalog. Never fails; every
/// problem found lands in `errors`.
pub fn validate_location(catalog: &Catalog, location: &LocationLootData) -> LocationValidationReport {
    let mut report = LocationValidationReport {
        location: location.name.clone(),
        ..LocationValidationReport::default()
    };

    match location.static_containers.as_ref() {
        Some(set) => {
            for weapon in &set.static_weapons {
                report.static_weapons += 1;
                check_template_items(catalog, weapon, "static weapon", &mut report);
            }
            for container in &set.static_containers {
                report.containers += 1;
                let template = &container.template;
                check_template_items(catalog, template, "container", &mut report);
                let Some(root) = template.root_item() else {
                    continue;
                };
                if let Some(item) = catalog.get(&root.tpl) {
                    if item.first_grid().is_none() {
                        report
                            .errors
                            .push(format!("container {}: template {} has no grid", template.id, root.tpl));
                    }
                }
            }
            for forced in &set.static_forced {
                report.forced_static += 1;
                check_tpl(catalog, &forced.item_tpl, &format!("forced item in {}", forced.container_id), &mut report);
                if !set
                    .static_containers
                    .iter()
                    .any(|container| container.template.id == forced.container_id)
                {
                    report.errors.push(format!(
                        "forced item {}: container {} does not exist",
                        forced.item_tpl, forced.container_id
                    ));
                }
            }
            for (container_id, link) in &set.container_links {
                if !set.container_groups.contains_key(&link.group_id) {
                    report.errors.push(format!(
                        "container {container_id}: unknown group {}",
                        link.group_id
                    ));
                }
            }
            for (group_id, group) in &set.container_groups {
                if group.min_containers > group.max_containers {
                    report.errors.push(format!(
                        "container group {group_id}: min {} exceeds max {}",
                        group.min_containers, group.max_containers
                    ));
                }
            }
        }
        None => report
            .errors
            .push("missing static container definition".to_string()),
    }

    for (container_tpl, distribution) in &location.static_loot {
        check_tpl(catalog, container_tpl, "static loot container", &mut report);
        for entry in &distribution.items {
            report.distribution_entries += 1;
            check_tpl(
                catalog,
                &entry.tpl,
                &format!("static loot of {container_tpl}"),
                &mut report,
            );
        }
    }

    for (caliber, table) in &location.static_ammo {
        for entry in table {
            check_tpl(catalog, &entry.tpl, &format!("ammo table {caliber}"), &mut report);
        }
    }

    match location.loose_loot.as_ref() {
        Some(loose) => {
            for spawnpoint in &loose.forced {
                report.forced_spawnpoints += 1;
                check_template_items(catalog, &spawnpoint.template, "forced spawn point", &mut report);
            }
            for spawnpoint in &loose.spawnpoints {
                report.spawnpoints += 1;
                check_spawnpoint(catalog, spawnpoint, &mut report);
            }
        }
        None => report
            .errors
            .push("missing loose loot definition".to_string()),
    }

    report.errors.sort();
    report
}

fn check_spawnpoint(catalog: &Catalog, spawnpoint: &Spawnpoint, report: &mut LocationValidationReport) {
    check_template_items(catalog, &spawnpoint.template, "spawn point", report);
    for entry in &spawnpoint.item_distribution {
        report.distribution_entries += 1;
        let key = &entry.composed_key.key;
        if !spawnpoint.template.items.iter().any(|item| &item.id == key) {
            report.errors.push(format!(
                "spawn point {}: distribution key {key} not in template",
                spawnpoint.template.id
            ));
        }
    }
}

fn check_template_items(
    catalog: &Catalog,
    template: &SpawnTemplate,
    kind: &str,
    report: &mut LocationValidationReport,
) {
    if template.root_item().is_none() {
        report
            .errors
            .push(format!("{kind} {}: no root item", template.id));
    }
    for item in &template.items {
        check_tpl(catalog, &item.tpl, &format!("{kind} {}", template.id), report);
    }
}

fn check_tpl(catalog: &Catalog, tpl: &TemplateId, context: &str, report: &mut LocationValidationReport) {
    if catalog.get(tpl).is_none() {
        report
            .errors
            .push(format!("{context}: unknown template {tpl}"));
    }
}
