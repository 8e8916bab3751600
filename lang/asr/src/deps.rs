//! Topological ordering of dependency maps.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use crate::{Asr, AsrError, AsrResult, HashMap, Symbol};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Order the nodes `0..deps.len()` so that every node comes after all of its
/// dependencies.
///
/// On a cycle, returns the nodes along the cycle, starting and ending with the same node.
pub fn order_deps_ids(deps: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; deps.len()];
    let mut order = Vec::with_capacity(deps.len());
    let mut path = Vec::new();
    for node in 0..deps.len() {
        if marks[node] == Mark::Unvisited {
            visit(node, deps, &mut marks, &mut path, &mut order)?;
        }
    }
    Ok(order)
}

fn visit(
    node: usize,
    deps: &[Vec<usize>],
    marks: &mut [Mark],
    path: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), Vec<usize>> {
    marks[node] = Mark::Visiting;
    path.push(node);
    for &dep in &deps[node] {
        match marks[dep] {
            Mark::Done => {}
            Mark::Visiting => {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(dep);
                return Err(cycle);
            }
            Mark::Unvisited => visit(dep, deps, marks, path, order)?,
        }
    }
    path.pop();
    marks[node] = Mark::Done;
    order.push(node);
    Ok(())
}

/// Order the keys of `deps` (and every dependency without an entry of its own) so
/// that each node appears after all of its dependencies.
///
/// Keys are interned to integers in map order, then in order of first mention.
pub fn order_deps<K>(deps: &BTreeMap<K, Vec<K>>) -> AsrResult<Vec<K>>
where
    K: Hash + Eq + Clone + Ord + fmt::Display,
{
    let mut ids: HashMap<K, usize> = HashMap::default();
    let mut keys: Vec<K> = Vec::new();
    let mut intern = |key: &K, keys: &mut Vec<K>| -> usize {
        *ids.entry(key.clone()).or_insert_with(|| {
            keys.push(key.clone());
            keys.len() - 1
        })
    };
    for key in deps.keys() {
        intern(key, &mut keys);
    }
    let mut graph: Vec<Vec<usize>> = Vec::new();
    for (key, targets) in deps {
        let from = intern(key, &mut keys);
        let to: Vec<usize> = targets.iter().map(|t| intern(t, &mut keys)).collect();
        if graph.len() <= from {
            graph.resize(from + 1, Vec::new());
        }
        graph[from] = to;
    }
    graph.resize(keys.len(), Vec::new());

    order_deps_ids(&graph)
        .map(|order| order.into_iter().map(|id| keys[id].clone()).collect())
        .map_err(|cycle| AsrError::CyclicDependency {
            cycle: cycle.into_iter().map(|id| keys[id].to_string()).collect(),
        })
}

/// The modules registered in the global scope, in an order in which they can be
/// loaded or emitted.
///
/// Dependencies named by a module but not present in the translation unit are part
/// of the result as well.
pub fn determine_module_dependencies(asr: &Asr) -> AsrResult<Vec<String>> {
    let mut deps: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, sym) in asr.symtab(asr.global_scope()).scope() {
        if let Symbol::Module(module) = asr.symbol(sym) {
            deps.insert(name.to_owned(), module.dependencies.clone());
        }
    }
    log::debug!("Ordering {} modules", deps.len());
    order_deps(&deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&'static str, &[&'static str])]) -> BTreeMap<&'static str, Vec<&'static str>> {
        entries.iter().map(|(k, v)| (*k, v.to_vec())).collect()
    }

    fn position(order: &[&str], node: &str) -> usize {
        order.iter().position(|n| *n == node).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let deps = map(&[("A", &["B", "D"]), ("B", &["C", "D"])]);
        let order = order_deps(&deps).unwrap();

        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, ["A", "B", "C", "D"]);
        for (node, targets) in &deps {
            for target in targets {
                assert!(position(&order, target) < position(&order, node));
            }
        }
        assert_eq!(order, ["C", "D", "B", "A"]);
    }

    #[test]
    fn independent_nodes_keep_map_order() {
        let deps = map(&[("x", &[]), ("y", &[]), ("z", &[])]);
        assert_eq!(order_deps(&deps).unwrap(), ["x", "y", "z"]);
    }

    #[test]
    fn cycle_is_reported() {
        let deps = map(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = order_deps(&deps).unwrap_err();
        match err {
            AsrError::CyclicDependency { cycle } => assert_eq!(cycle, ["a", "b", "c", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        assert_eq!(order_deps_ids(&[vec![0]]), Err(vec![0, 0]));
    }

    #[test]
    fn module_dependencies_follow_use_statements() {
        let mut asr = Asr::new();
        crate::builder::add_module(&mut asr, "m1", &["m2"]).unwrap();
        crate::builder::add_module(&mut asr, "m2", &["m3"]).unwrap();
        crate::builder::add_module(&mut asr, "m3", &[]).unwrap();
        crate::builder::add_program(&mut asr, "main").unwrap();
        assert_eq!(determine_module_dependencies(&asr).unwrap(), ["m3", "m2", "m1"]);
    }
}
