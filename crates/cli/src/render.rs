use careplan_core::{Category, ItemCatalog, TreatmentItem, TreatmentPlan};
use std::fmt::Write;

fn item_line(out: &mut String, indent: &str, item: &TreatmentItem) {
    let _ = writeln!(
        out,
        "{}{:<28} {:<10} {:>4} min {:>10}  [{}]",
        indent,
        item.title.as_str(),
        item.category,
        item.duration_minutes,
        item.cost.to_string(),
        item.id
    );
}

/// Catalog templates grouped by category, optionally restricted to one.
pub fn catalog(catalog: &ItemCatalog, only: Option<Category>) -> String {
    let mut out = String::new();
    for category in Category::ALL {
        if only.is_some_and(|c| c != category) {
            continue;
        }
        let _ = writeln!(out, "{}:", category);
        for template in catalog.list(category) {
            item_line(&mut out, "  ", template);
        }
    }
    out
}

/// Plan outline with per-phase and plan-wide totals.
pub fn plan(plan: &TreatmentPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", plan.title(), plan.id());
    let _ = writeln!(
        out,
        "patient: {} ({})  author: {} ({})",
        plan.patient().name,
        plan.patient().id,
        plan.author().name,
        plan.author().id
    );
    if !plan.description().is_empty() {
        let _ = writeln!(out, "{}", plan.description());
    }
    let _ = writeln!(
        out,
        "created {}  updated {}",
        plan.created_at().to_rfc3339(),
        plan.updated_at().to_rfc3339()
    );

    for (order, phase) in plan.effective_order() {
        let _ = writeln!(
            out,
            "\n{}. {} [{}]  {} min  {}",
            order,
            phase.title(),
            phase.id(),
            phase.total_duration_minutes(),
            phase.total_cost()
        );
        if !phase.description().is_empty() {
            let _ = writeln!(out, "   {}", phase.description());
        }
        if phase.items().is_empty() {
            let _ = writeln!(out, "   (empty)");
        }
        for item in phase.items() {
            item_line(&mut out, "   - ", item);
        }
    }

    let _ = writeln!(
        out,
        "\ntotal: {} items  {} min  {}",
        plan.item_count(),
        plan.total_duration_minutes(),
        plan.total_cost()
    );
    out
}
