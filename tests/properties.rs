//! Property tests for row expansion and hierarchy flattening

use frameshape::{
    explode, explode_many, flatten_hierarchy, hierarchy_depth, CellValue, DepthOptions,
    FlattenOptions, Table,
};
use proptest::prelude::*;
use proptest::sample::Index;

fn list_table(lists: &[Option<Vec<i64>>]) -> Table {
    let mut table = Table::with_columns(&["tag", "values"]);
    for (i, list) in lists.iter().enumerate() {
        let cell = match list {
            Some(items) => CellValue::from(items.clone()),
            None => CellValue::Null,
        };
        table
            .push_row(vec![CellValue::Int(i as i64), cell])
            .unwrap();
    }
    table
}

fn arb_lists() -> impl Strategy<Value = Vec<Option<Vec<i64>>>> {
    prop::collection::vec(
        prop::option::of(prop::collection::vec(-100i64..100, 0..6)),
        0..24,
    )
}

/// Parent of every node, always an earlier node, so the relation is a forest
fn arb_forest() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::weighted(0.8, any::<Index>()), 1..40).prop_map(|picks| {
        picks
            .iter()
            .enumerate()
            .map(|(i, pick)| match pick {
                Some(pick) if i > 0 => Some(pick.index(i)),
                _ => None,
            })
            .collect()
    })
}

fn forest_table(parents: &[Option<usize>]) -> Table {
    let mut table = Table::with_columns(&["node", "parent"]);
    for (i, parent) in parents.iter().enumerate() {
        table
            .push_row(vec![
                CellValue::from(format!("n{}", i)),
                CellValue::from(parent.map(|p| format!("n{}", p))),
            ])
            .unwrap();
    }
    table
}

fn true_depth(parents: &[Option<usize>], mut node: usize) -> i64 {
    let mut depth = 0;
    while let Some(parent) = parents[node] {
        depth += 1;
        node = parent;
    }
    depth
}

proptest! {
    #[test]
    fn explode_row_count_law(lists in arb_lists()) {
        let table = list_table(&lists);
        let out = explode(&table, "values", Some("value")).unwrap();

        let expected: usize = lists
            .iter()
            .map(|l| l.as_ref().map_or(1, |items| items.len().max(1)))
            .sum();
        prop_assert_eq!(out.row_count(), expected);

        for (i, list) in lists.iter().enumerate() {
            let rows: Vec<_> = out
                .rows
                .iter()
                .filter(|r| r.cells[0] == CellValue::Int(i as i64))
                .collect();
            let produced: Vec<CellValue> = rows.iter().map(|r| r.cells[1].clone()).collect();
            match list {
                Some(items) if !items.is_empty() => {
                    let items: Vec<CellValue> = items.iter().map(|v| CellValue::Int(*v)).collect();
                    prop_assert_eq!(produced, items);
                }
                _ => prop_assert_eq!(produced, vec![CellValue::Null]),
            }
        }
    }

    #[test]
    fn explode_keeps_index_order(lists in arb_lists()) {
        let out = explode(&list_table(&lists), "values", None).unwrap();
        let indices: Vec<_> = out.indices().collect();
        prop_assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn lockstep_is_all_or_nothing(
        left in arb_lists(),
        right in arb_lists(),
    ) {
        let len = left.len().min(right.len());
        let mut table = Table::with_columns(&["left", "right"]);
        for i in 0..len {
            table
                .push_row(vec![CellValue::from(left[i].clone()), CellValue::from(right[i].clone())])
                .unwrap();
        }
        let out = explode_many(&table, &["left", "right"], None).unwrap();

        for i in 0..len {
            let rows: Vec<_> = out
                .rows
                .iter()
                .filter(|r| r.index == frameshape::RowIndex::from(i as i64))
                .collect();
            match (&left[i], &right[i]) {
                (Some(a), Some(b)) => {
                    prop_assert_eq!(rows.len(), a.len().max(b.len()).max(1));
                }
                _ => {
                    prop_assert_eq!(rows.len(), 1);
                    prop_assert!(rows[0].cells.iter().all(CellValue::is_null));
                }
            }
        }
    }

    #[test]
    fn depth_matches_path_length(parents in arb_forest()) {
        let table = forest_table(&parents);
        let options = DepthOptions::new().with_key_column("node");
        let out = hierarchy_depth(&table, "parent", &options).unwrap();

        prop_assert_eq!(out.column_names(), vec!["node", "parent", "depth"]);
        let depths = out.column_values("depth").unwrap();
        for (i, depth) in depths.iter().enumerate() {
            prop_assert_eq!(depth, &CellValue::Int(true_depth(&parents, i)));
        }
    }

    #[test]
    fn ancestor_chains_close_once(parents in arb_forest()) {
        let table = forest_table(&parents);
        let options = FlattenOptions::new().with_key_column("node");
        let out = flatten_hierarchy(&table, "parent", &options).unwrap();

        let max_depth = (0..parents.len()).map(|i| true_depth(&parents, i)).max().unwrap_or(0);
        let generated = out.column_count() - table.column_count();
        prop_assert_eq!(generated as i64, (max_depth - 1).max(0));

        for (i, row) in out.rows.iter().enumerate() {
            let chain = &row.cells[1..];
            let populated = chain.iter().take_while(|c| !c.is_null()).count();
            prop_assert!(chain[populated..].iter().all(CellValue::is_null));
            prop_assert_eq!(populated as i64, true_depth(&parents, i));
        }
    }
}
