//! Graphviz export.

use petgraph::dot::Dot;
use petgraph::graph::{Graph, NodeIndex};

use crate::traits::Network;
use crate::{Mig, MigNode, Signal};

fn gate_label(fanins: &[Signal; 3], node: usize) -> String {
    if fanins.contains(&Signal::TRUE) {
        format!("OR {node}")
    } else if fanins.contains(&Signal::FALSE) {
        format!("AND {node}")
    } else {
        format!("Majority {node}")
    }
}

/// Render `mig` in Graphviz dot syntax.
///
/// AND and OR gates are majority gates with a constant fanin; the constant edge is left out. Complemented edges
/// are labelled `not`.
#[must_use]
pub fn to_graphviz(mig: &Mig) -> String {
    let mut graph = Graph::<String, &'static str>::new();
    let mut indices: Vec<Option<NodeIndex>> = vec![None; mig.node_count()];

    let mut vertex = |graph: &mut Graph<String, &'static str>, node: usize| -> NodeIndex {
        *indices[node].get_or_insert_with(|| {
            let label = match mig.node(node) {
                MigNode::Zero => "0".to_string(),
                MigNode::Input(port) => mig.input_name(*port).map_or_else(|| format!("Input {port}"), String::from),
                MigNode::Majority(fanins) => gate_label(fanins, node),
            };
            graph.add_node(label)
        })
    };

    for node in 0..mig.node_count() {
        let Some(fanins) = mig.try_unwrap_majority(node) else {
            continue;
        };
        let target = vertex(&mut graph, node);
        for fanin in fanins.into_iter().filter(|fanin| !fanin.is_constant()) {
            let source = vertex(&mut graph, fanin.node());
            graph.add_edge(source, target, if fanin.is_complemented() { "not" } else { "" });
        }
    }

    for (port, &output) in mig.outputs().iter().enumerate() {
        let label = mig.output_name(port).map_or_else(|| format!("Output {port}"), String::from);
        let target = graph.add_node(label);
        let source = vertex(&mut graph, output.node());
        graph.add_edge(source, target, if output.is_complemented() { "not" } else { "" });
    }

    Dot::new(&graph).to_string()
}

#[cfg(test)]
mod tests {
    use super::to_graphviz;
    use crate::traits::Builder;
    use crate::{Mig, Signal};

    #[test]
    fn labels_gates_by_kind() {
        let mut mig = Mig::new();
        let a = mig.add_input(Some("a".to_string()));
        let b = mig.push_input();
        let c = mig.push_input();
        let and = mig.majority(a, b, Signal::FALSE);
        let or = mig.majority(b, c, Signal::TRUE);
        let m = mig.majority(and, !or, c);
        mig.add_output(m, Some("out".to_string()));

        let dot = to_graphviz(&mig);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"a\""));
        assert!(dot.contains("Input 1"));
        assert!(dot.contains("AND"));
        assert!(dot.contains("OR"));
        assert!(dot.contains("Majority"));
        assert!(dot.contains("\"out\""));
        assert!(dot.contains("not"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
