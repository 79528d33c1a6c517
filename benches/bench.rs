use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;
use tui_bookmark_tree::{Filter, IdAllocator, Node, Store, Tree, TreeItem, TreeState};

/// Groups nested `depth` levels deep, each with `width` links and `width` sub groups on every level but the last.
fn generated(ids: &mut IdAllocator, label: &str, depth: usize, width: usize) -> Node {
    let mut group = Node::group(ids, label);
    for index in 0..width {
        let link = Node::link(
            ids,
            format!("{label} Link {index}"),
            format!("https://{index}.example.com/{label}"),
        );
        group = group.with_child(link);
    }
    group = group.with_child(Node::separator(ids));
    if depth > 0 {
        for index in 0..width {
            let sub = generated(ids, &format!("{label}.{index}"), depth - 1, width);
            group = group.with_child(sub);
        }
    }
    group
}

fn big_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesezeichen.xml");
    std::fs::write(&path, "").unwrap();

    let mut store = Store::new(&path);
    let root = store.root().id();
    let tree = generated(store.ids(), "Group", 4, 6);
    assert!(store.add(root, tree));
    store.save().unwrap();
    (dir, store)
}

fn load(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("load");
    let (_dir, store) = big_store();
    group.throughput(Throughput::Elements(store.root().subtree_len() as u64));

    group.bench_function("generated", |bencher| {
        bencher.iter_batched(
            || Store::new(store.path()),
            |mut store| {
                black_box(store.load().unwrap());
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn filter(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("filter");
    let (_dir, store) = big_store();
    let rows = store.full_hierarchy();
    group.throughput(Throughput::Elements(rows.preorder().len() as u64));

    for (name, filter) in [
        ("empty", Filter::new("")),
        ("few", Filter::new("link 5")),
        ("subtrees", Filter::new("group.1").show_subtrees_of_matches(true)),
        ("none", Filter::new("nothing")),
    ] {
        group.bench_function(name, |bencher| {
            bencher.iter_batched(
                || rows.clone(),
                |mut rows| {
                    filter.apply(black_box(&mut rows));
                    rows
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn renders(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("render");
    group.throughput(Throughput::Elements(1)); // Frames per second

    let buffer_size = Rect::new(0, 0, 100, 100);

    let tree = Tree::new(vec![]);
    group.bench_function("empty", |bencher| {
        bencher.iter_batched(
            || (tree.clone(), TreeState::default()),
            |(tree, mut state)| {
                let mut buffer = Buffer::empty(buffer_size);
                black_box(tree).render(buffer_size, black_box(&mut buffer), &mut state);
            },
            BatchSize::SmallInput,
        );
    });

    let (_dir, store) = big_store();
    let items = TreeItem::menu(store.root());
    let tree = Tree::new(items.clone());
    group.bench_function("menu-all-open", |bencher| {
        bencher.iter_batched(
            || {
                let mut state = TreeState::default();
                state.open_all(&items);
                state.select_last(&items);
                (tree.clone(), state)
            },
            |(tree, mut state)| {
                let mut buffer = Buffer::empty(buffer_size);
                black_box(tree).render(buffer_size, black_box(&mut buffer), &mut state);
            },
            BatchSize::SmallInput,
        );
    });

    let mut rows = store.full_hierarchy();
    Filter::new("link 3").apply(&mut rows);
    let results = TreeItem::from_row(&rows).map_or_else(Vec::new, |item| vec![item]);
    let tree = Tree::new(results.clone());
    group.bench_function("search-results", |bencher| {
        bencher.iter_batched(
            || {
                let mut state = TreeState::default();
                state.open_all(&results);
                (tree.clone(), state)
            },
            |(tree, mut state)| {
                let mut buffer = Buffer::empty(buffer_size);
                black_box(tree).render(buffer_size, black_box(&mut buffer), &mut state);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Create flamegraphs with `cargo bench --bench bench -- --profile-time=5`
#[cfg(unix)]
fn profiled() -> Criterion {
    use pprof::criterion::{Output, PProfProfiler};
    Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}
#[cfg(not(unix))]
fn profiled() -> Criterion {
    Criterion::default()
}

criterion_group! {
    name = benches;
    config = profiled();
    targets = load, filter, renders
}
criterion_main!(benches);
