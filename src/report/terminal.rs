use std::collections::BTreeMap;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{Dependency, FileDependencies};

/// Render a colored terminal report.
pub fn render(files: &[FileDependencies], quiet: bool) {
    let deps: Vec<&Dependency> = files.iter().flat_map(|f| &f.dependencies).collect();
    let total = deps.len();
    let unresolved = deps.iter().filter(|d| !d.has_version()).count();

    if quiet {
        println!(
            "Files: {}  Dependencies: {}  Unresolved: {}",
            files.len(),
            total.to_string().green(),
            unresolved.to_string().yellow(),
        );
        return;
    }

    println!("\n {} v{}\n", "dep-diff".bold(), env!("CARGO_PKG_VERSION"));

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Dependency files   : {}", files.len()));
    println!(" │  {:<48} │", format!("Dependencies       : {total}"));
    println!(
        " │  {:<48} │",
        format!("Unresolved version : {unresolved}")
    );
    println!(" │  {:<48} │", summarize_ecosystems(&deps));
    println!(" └────────────────────────────────────────────────────┘\n");

    for file in files.iter().filter(|f| !f.dependencies.is_empty()) {
        let label = file
            .path
            .as_ref()
            .map_or_else(|| "<patch>".to_string(), |p| p.display().to_string());
        println!(" {} {}\n", format!("[{}]", file.ecosystem).cyan().bold(), label);
        render_table(&file.dependencies);
        println!();
    }
}

fn render_table(deps: &[Dependency]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Ecosystem").add_attribute(Attribute::Bold),
        ]);

    for dep in deps {
        let version = if dep.has_version() {
            Cell::new(&dep.version)
        } else {
            Cell::new("unresolved").fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(&dep.name),
            version,
            Cell::new(dep.ecosystem.to_string()),
        ]);
    }

    println!("{table}");
}

fn summarize_ecosystems(deps: &[&Dependency]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for dep in deps {
        *counts.entry(dep.ecosystem.as_str()).or_insert(0) += 1;
    }

    let parts: Vec<String> = counts
        .iter()
        .map(|(eco, cnt)| format!("{eco} ({cnt})"))
        .collect();

    if parts.is_empty() {
        "Ecosystems         : -".to_string()
    } else {
        format!("Ecosystems         : {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ecosystem;

    #[test]
    fn test_summarize_ecosystems() {
        let a = Dependency::new(Ecosystem::PyPi, "flask", "");
        let b = Dependency::new(Ecosystem::Go, "example.org/mod", "v0.3.7");
        let c = Dependency::new(Ecosystem::PyPi, "django", "3.2");
        assert_eq!(
            summarize_ecosystems(&[&a, &b, &c]),
            "Ecosystems         : go (1), pypi (2)"
        );
        assert_eq!(summarize_ecosystems(&[]), "Ecosystems         : -");
    }
}
