//! Graphviz export of transition tables.

use crate::core::{State, TransitionTable};
use crate::machine::MachineDefinition;

/// Generate a state diagram in DOT format.
///
/// Wildcard entries are drawn as one edge from every known state that has no
/// specific entry for the transition.
///
/// # Example
///
/// ```rust
/// use turnstile::dot::to_dot;
/// use turnstile::transition_table;
///
/// let table = transition_table! {
///     ignite: { parked => idling },
///     turn_off: { * => parked },
/// };
/// let dot = to_dot(&table, "Vehicle");
///
/// assert!(dot.starts_with("digraph \"Vehicle\" {"));
/// assert!(dot.contains("\"parked\" -> \"idling\" [label=\"ignite\"];"));
/// assert!(dot.contains("\"idling\" -> \"parked\" [label=\"turn_off\"];"));
/// ```
pub fn to_dot(table: &TransitionTable, name: &str) -> String {
    let mut dot = String::new();
    dot.push_str(&format!("digraph \"{}\" {{\n", escape(name)));
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=ellipse];\n");
    push_body(&mut dot, table, |_| String::new());
    dot.push_str("}\n");
    dot
}

/// Like [`to_dot`], also marking the initial state and the roles each rule
/// admits.
pub fn definition_to_dot(definition: &MachineDefinition, name: &str) -> String {
    let mut dot = String::new();
    dot.push_str(&format!("digraph \"{}\" {{\n", escape(name)));
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=ellipse];\n");

    if let Some(initial) = definition.initial_state() {
        dot.push_str(&format!(
            "  __start [shape=point];\n  __start -> \"{}\";\n",
            escape(initial.as_str())
        ));
    }

    push_body(&mut dot, definition.table(), |transition| {
        let Some(rule) = definition.rules().get(transition) else {
            return String::new();
        };
        let roles: Vec<&str> = rule.allowed_roles().collect();
        match (roles.is_empty(), rule.dependency()) {
            (true, None) => String::new(),
            (true, Some(depends)) => format!(" [{depends}]"),
            (false, None) => format!(" [{}]", roles.join("|")),
            (false, Some(depends)) => format!(" [{} & {depends}]", roles.join("|")),
        }
    });

    dot.push_str("}\n");
    dot
}

fn push_body<F>(dot: &mut String, table: &TransitionTable, guard_label: F)
where
    F: Fn(&str) -> String,
{
    let states = table.states();
    for state in &states {
        dot.push_str(&format!("  \"{}\";\n", escape(state.as_str())));
    }

    for transition in table.transitions() {
        let label = format!("{}{}", transition.name(), guard_label(transition.name()));
        let mut edges: Vec<(&State, &State)> = transition
            .entries()
            .filter(|(from, _)| !from.is_wildcard())
            .collect();
        if let Some(to) = transition.wildcard_destination() {
            for state in &states {
                let specific = transition.entries().any(|(from, _)| from == *state);
                if !specific {
                    edges.push((*state, to));
                }
            }
        }
        edges.sort();

        for (from, to) in edges {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape(from.as_str()),
                escape(to.as_str()),
                escape(&label)
            ));
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
