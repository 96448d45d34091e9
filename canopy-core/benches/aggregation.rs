//! Aggregation pass benchmarks: full rebuild versus a single changed branch.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use canopy_core::columns::{Column, ColumnModel};
use canopy_core::options::GridOptions;
use canopy_core::stage::{AggregationStage, PivotStage, RowNodeStage, StageContext, StageExecuteParams};
use canopy_core::tree::{ChangedPath, RowNodeId, RowTree};

const GROUPS: usize = 200;
const ROWS_PER_GROUP: usize = 50;

fn build_tree() -> (RowTree, Vec<RowNodeId>) {
    let mut tree = RowTree::new();
    let mut groups = Vec::with_capacity(GROUPS);
    for g in 0..GROUPS {
        let group = tree.add_group(tree.root(), format!("group-{g}"));
        for r in 0..ROWS_PER_GROUP {
            tree.add_leaf(group, json!({"gold": r, "silver": g, "year": 2000 + (r % 5)}));
        }
        groups.push(group);
    }
    (tree, groups)
}

fn stages(pivot_mode: bool) -> (Arc<PivotStage>, AggregationStage) {
    let mut model = ColumnModel::new();
    model.add_value_column(Column::new("gold"));
    model.add_value_column(Column::new("silver").with_agg_func("avg"));
    if pivot_mode {
        model.set_pivot_mode(true);
        model.add_pivot_column(Column::new("year"));
    }
    let options = GridOptions {
        pivot_row_totals: true,
        ..GridOptions::default()
    };
    let ctx = StageContext::new(options, model);
    let pivot = Arc::new(PivotStage::new(ctx.clone()));
    let aggregation = AggregationStage::new(ctx, pivot.clone());
    (pivot, aggregation)
}

fn bench_full_pass(c: &mut Criterion) {
    let (_, aggregation) = stages(false);
    let (mut tree, _) = build_tree();
    let path = ChangedPath::inactive(tree.root());

    c.bench_function("full_pass_values_only", |b| {
        b.iter(|| {
            aggregation.execute(&mut StageExecuteParams::new(&mut tree, &path));
            black_box(&tree);
        })
    });
}

fn bench_incremental_pass(c: &mut Criterion) {
    let (_, aggregation) = stages(false);
    let (mut tree, groups) = build_tree();
    let full = ChangedPath::inactive(tree.root());
    aggregation.execute(&mut StageExecuteParams::new(&mut tree, &full));

    let mut path = ChangedPath::new(true, tree.root());
    path.add_parent_node(&tree, groups[GROUPS / 2], None);

    c.bench_function("incremental_pass_one_group", |b| {
        b.iter(|| {
            aggregation.execute(&mut StageExecuteParams::new(&mut tree, &path));
            black_box(&tree);
        })
    });
}

fn bench_pivot_pass(c: &mut Criterion) {
    let (pivot, aggregation) = stages(true);
    let (mut tree, _) = build_tree();
    let path = ChangedPath::inactive(tree.root());

    c.bench_function("full_pass_with_pivot", |b| {
        b.iter(|| {
            let mut params = StageExecuteParams::new(&mut tree, &path);
            pivot.execute(&mut params);
            aggregation.execute(&mut params);
            black_box(&tree);
        })
    });
}

criterion_group!(benches, bench_full_pass, bench_incremental_pass, bench_pivot_pass);
criterion_main!(benches);
