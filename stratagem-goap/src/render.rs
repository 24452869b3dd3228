// Read-only rendering of finished plans, for logs, debugging overlays, and
// GraphViz dumps.

use std::fmt::Write;

use crate::plan::Plan;

/// Output format for a rendered plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// Numbered step list.
    Text,
    /// DOT digraph for GraphViz.
    Dot,
    /// JSON for programmatic consumption.
    Json,
}

/// Renders a plan's ordered steps and their snapshot bindings.
pub struct PlanRenderer {
    format: RenderFormat,
    show_costs: bool,
    show_bindings: bool,
}

impl PlanRenderer {
    pub fn new(format: RenderFormat) -> Self {
        Self {
            format,
            show_costs: true,
            show_bindings: true,
        }
    }

    pub fn with_costs(mut self, show: bool) -> Self {
        self.show_costs = show;
        self
    }

    pub fn with_bindings(mut self, show: bool) -> Self {
        self.show_bindings = show;
        self
    }

    pub fn render(&self, plan: &Plan) -> String {
        match self.format {
            RenderFormat::Text => self.render_text(plan),
            RenderFormat::Dot => self.render_dot(plan),
            RenderFormat::Json => self.render_json(plan),
        }
    }

    fn render_text(&self, plan: &Plan) -> String {
        let mut out = String::new();

        if self.show_costs {
            let _ = writeln!(
                out,
                "Plan '{}' ({} steps, cost {:.1})",
                plan.label(),
                plan.steps().len(),
                plan.total_cost()
            );
        } else {
            let _ = writeln!(out, "Plan '{}' ({} steps)", plan.label(), plan.steps().len());
        }

        for (i, step) in plan.steps().iter().enumerate() {
            let _ = write!(out, "  {}. {}", i + 1, step.action_name());
            if self.show_bindings && !step.snapshot().is_empty() {
                let bindings: Vec<String> = step
                    .snapshot()
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                let _ = write!(out, " [{}]", bindings.join(", "));
            }
            out.push('\n');
        }

        out
    }

    fn render_dot(&self, plan: &Plan) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph plan {{");
        let _ = writeln!(out, "  rankdir=LR;");
        let _ = writeln!(out, "  node [shape=box];");

        for (i, step) in plan.steps().iter().enumerate() {
            let mut label = step.action_name();
            if self.show_costs {
                let _ = write!(label, "\\ncost {:.1}", step.cost());
            }
            if self.show_bindings {
                for (key, value) in step.snapshot() {
                    let _ = write!(label, "\\n{} = {}", key, value);
                }
            }
            let _ = writeln!(out, "  step{} [label=\"{}\"];", i, label);
        }

        for i in 1..plan.steps().len() {
            let _ = writeln!(out, "  step{} -> step{};", i - 1, i);
        }

        let _ = writeln!(out, "}}");
        out
    }

    fn render_json(&self, plan: &Plan) -> String {
        let steps: Vec<serde_json::Value> = plan
            .steps()
            .iter()
            .map(|step| {
                let snapshot: serde_json::Map<String, serde_json::Value> = step
                    .snapshot()
                    .iter()
                    .map(|(k, v)| {
                        (
                            k.clone(),
                            serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect();
                serde_json::json!({
                    "action": step.action_name(),
                    "cost": step.cost(),
                    "snapshot": snapshot,
                })
            })
            .collect();

        let doc = serde_json::json!({
            "label": plan.label(),
            "total_cost": plan.total_cost(),
            "steps": steps,
        });

        serde_json::to_string_pretty(&doc).unwrap_or_default()
    }
}
