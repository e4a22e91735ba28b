use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;
use tsb_translate::class::ClassBindingId;
use tsb_translate::BindingModel;
use tsb_ts::index_map::IndexMapKey;

use crate::error::Error;

type Result<T, E = Error> = std::result::Result<T, E>;

/// Order the model's classes so that every parent comes before its children. Parents are looked up by script path
/// and must have been extracted.
#[instrument(level = "trace", skip(model))]
pub fn sort_classes(model: &BindingModel) -> Result<Vec<ClassBindingId>> {
    let mut graph = DiGraph::<ClassBindingId, ()>::new();
    let nodes: Vec<NodeIndex> = (0..model.classes.len())
        .map(|i| graph.add_node(ClassBindingId::from_index(i)))
        .collect();

    for (i, class) in model.classes.iter().enumerate() {
        if let Some(parent) = &class.parent {
            let parent_id = model.get_class_id(parent).ok_or_else(|| Error::UnknownParent {
                class: class.script_path.clone(),
                parent: parent.clone(),
            })?;
            graph.add_edge(nodes[parent_id.get()], nodes[i], ());
        }
    }

    match petgraph::algo::toposort(&graph, None) {
        Ok(sorted) => Ok(sorted.into_iter().map(|n| graph[n]).collect()),
        Err(cycle) => Err(Error::InheritanceCycle(
            model.classes[graph[cycle.node_id()]].script_path.clone(),
        )),
    }
}
