use shared::*;

use rangetree::geometry::{BoxQuery, GridPoint, RangePoint};
use rangetree::range_tree::RangeTree;
use tracing::{debug, info};

#[test]
fn test_empty_tree() {
    let tree: RangeTree<GridPoint<&'static str>> = RangeTree::new(2).unwrap();
    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert!(tree.get_range(&query2(0, 10, 0, 10)).is_empty());
    assert!(tree.all().is_empty());
}

#[test]
fn test_single_point() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(5, 5)]);

    assert_eq!(tree.len(), 1);
    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 10, 0, 10))), vec![(5, 5)]);
    assert!(tree.get_range(&query2(10, 20, 0, 10)).is_empty());
    assert!(tree.get_range(&query2(0, 10, 10, 20)).is_empty());
}

#[test]
fn test_insert_below_existing_value() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(5, 5)]);
    tree.insert(vec![pt2(1, 1)]);

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 10, 0, 10))),
        vec![(1, 1), (5, 5)]
    );
}

#[test]
fn test_insert_above_existing_value() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(5, 5)]);
    tree.insert(vec![pt2(9, 9)]);

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 10, 0, 10))),
        vec![(5, 5), (9, 9)]
    );
}

#[test]
fn test_query_multiple_levels() {
    let mut tree = RangeTree::new(2).unwrap();
    for p in [pt2(0, 0), pt2(1, 1), pt2(5, 5), pt2(9, 9), pt2(10, 10)] {
        tree.insert(vec![p]);
    }

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(1, 10, 1, 10))),
        vec![(1, 1), (5, 5), (9, 9)]
    );
}

#[test]
fn test_query_multiple_levels_random_insertion_order() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(5, 5), pt2(1, 1), pt2(10, 10), pt2(9, 9), pt2(0, 0)]);

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(1, 10, 1, 10))),
        vec![(1, 1), (5, 5), (9, 9)]
    );
}

#[test]
fn test_dense_grid() {
    info!("Starting dense grid test");
    let tree = RangeTree::bulk(2, grid_points(10, 10)).unwrap();

    assert_eq!(tree.len(), 100);
    assert_eq!(tree.get_range(&query2(0, 10, 0, 10)).len(), 100);
    assert_eq!(sorted_pairs(&tree.get_range(&query2(3, 4, 3, 4))), vec![(3, 3)]);

    let band = tree.get_range(&query2(2, 5, 0, 10));
    debug!("Band query returned {} points", band.len());
    assert_eq!(band.len(), 30);
    info!("Dense grid test completed successfully");
}

#[test]
fn test_middle_of_multidimensional_range() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(4, 4), pt2(4, 3), pt2(3, 4), pt2(3, 3)]);

    assert_eq!(sorted_pairs(&tree.get_range(&query2(3, 4, 3, 4))), vec![(3, 3)]);
}

#[test]
fn test_identical_first_dimension() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 1), pt2(0, 0)]);

    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 1, 0, 1))), vec![(0, 0)]);
}

#[test]
fn test_identical_second_dimension() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(1, 0)]);

    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 1, 0, 1))), vec![(0, 0)]);
}

#[test]
fn test_identical_all_dimensions() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(0, 0)]);

    assert_eq!(tree.len(), 1);
    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 10, 0, 10))), vec![(0, 0)]);
}

#[test]
fn test_wide_second_dimension_ranges() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 3)]);
    tree.insert(vec![pt2(1, 0)]);

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 4, 0, 4))),
        vec![(0, 3), (1, 0)]
    );
}

#[test]
fn test_removal_in_second_dimension() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(0, 1), pt2(0, 3)]);

    assert_eq!(tree.remove(&[pt2(0, 1)]), 1);
    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 1, 0, 5))),
        vec![(0, 0), (0, 3)]
    );
}

#[test]
fn test_removal_of_absent_point_is_noop() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(1, 1)]);

    assert_eq!(tree.remove(&[pt2(5, 5)]), 0);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.remove(&[]), 0);
}

#[test]
fn test_remove_deep_level_point() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(1, 1), pt2(2, 2), pt2(3, 3)]);

    tree.remove(&[pt2(2, 2)]);
    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 5, 0, 5))),
        vec![(0, 0), (1, 1), (3, 3)]
    );
}

#[test]
fn test_remove_everything() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(0, 1)]);

    assert_eq!(tree.remove(&[pt2(0, 0), pt2(0, 1)]), 2);
    assert_eq!(tree.len(), 0);
    assert!(tree.get_range(&query2(0, 10, 0, 10)).is_empty());

    // The tree keeps working after being emptied.
    tree.insert(vec![pt2(2, 2)]);
    assert_eq!(tree.len(), 1);
    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 10, 0, 10))), vec![(2, 2)]);
}

#[test]
fn test_rebalance_keeps_contents() {
    let mut tree = RangeTree::with_rebalance_ratio(2, 0.5).unwrap();
    for x in 1..=5 {
        tree.insert(vec![pt2(x, 0)]);
    }

    assert_eq!(
        sorted_pairs(&tree.get_range(&query2(0, 6, -1, 1))),
        vec![(1, 0), (2, 0), (3, 0), (4, 0), (5, 0)]
    );
}

#[test]
fn test_fetch_all() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![pt2(0, 0), pt2(0, 1), pt2(1, 1), pt2(1, 2)]);

    assert_eq!(
        sorted_pairs(&tree.all()),
        vec![(0, 0), (0, 1), (1, 1), (1, 2)]
    );
}

#[test]
fn test_all_equals_unbounded_query() {
    let tree = RangeTree::bulk(2, grid_points(6, 6)).unwrap();

    assert_eq!(
        sorted_pairs(&tree.all()),
        sorted_pairs(&tree.get_range(&BoxQuery::unbounded(2)))
    );
}

#[test]
fn test_partially_bounded_query() {
    let tree = RangeTree::bulk(2, grid_points(6, 6)).unwrap();

    // Only the second dimension is restricted.
    let found = tree.get_range(&BoxQuery::unbounded(2).with_bound(2, 1, 3));
    assert_eq!(found.len(), 12);
    for p in &found {
        assert!(p.coord(2) >= 1 && p.coord(2) < 3);
    }
}

#[test]
fn test_inverted_bound_matches_nothing() {
    let tree = RangeTree::bulk(2, grid_points(4, 4)).unwrap();

    assert!(tree.get_range(&query2(3, 1, 0, 4)).is_empty());
    assert!(tree.get_range(&query2(0, 4, 2, 2)).is_empty());
}

#[test]
fn test_clear() {
    let mut tree = RangeTree::bulk(2, grid_points(4, 4)).unwrap();
    assert_eq!(tree.len(), 16);

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.get_range(&query2(0, 4, 0, 4)).is_empty());

    tree.insert(vec![pt2(1, 1)]);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_clone_is_isolated() {
    let mut tree = RangeTree::bulk(2, grid_points(4, 4)).unwrap();
    let mut copy = tree.clone();

    copy.insert(vec![pt2(9, 9)]);
    copy.remove(&[pt2(0, 0)]);

    assert_eq!(tree.len(), 16);
    assert_eq!(copy.len(), 16);
    assert_eq!(sorted_pairs(&tree.get_range(&query2(0, 1, 0, 1))), vec![(0, 0)]);
    assert!(copy.get_range(&query2(0, 1, 0, 1)).is_empty());
    assert_eq!(sorted_pairs(&copy.get_range(&query2(9, 10, 9, 10))), vec![(9, 9)]);

    // Mutating the original does not leak into the copy either.
    tree.remove(&[pt2(3, 3)]);
    assert_eq!(sorted_pairs(&copy.get_range(&query2(3, 4, 3, 4))), vec![(3, 3)]);
}

#[test]
fn test_insert_overwrites_payload() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![tagged2(0, 0, "old"), tagged2(1, 1, "keep")]);

    assert_eq!(tree.insert(vec![tagged2(0, 0, "new")]), 0);
    assert_eq!(tree.len(), 2);

    let found = tree.get_range(&query2(0, 1, 0, 1));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].data, Some("new"));

    let kept = tree.get_range(&query2(1, 2, 1, 2));
    assert_eq!(kept[0].data, Some("keep"));
}

#[test]
fn test_insert_overwrite_last_writer_in_batch_wins() {
    let mut tree = RangeTree::new(2).unwrap();
    tree.insert(vec![tagged2(0, 0, "first"), tagged2(0, 0, "second")]);

    let found = tree.all();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].data, Some("second"));
}

#[test]
fn test_split_batches_equal_single_batch() {
    let points = grid_points(7, 5);
    let (head, tail) = points.split_at(13);

    let mut split = RangeTree::new(2).unwrap();
    split.insert(head.to_vec());
    split.insert(tail.to_vec());
    let whole = RangeTree::bulk(2, points.clone()).unwrap();

    assert_eq!(split.len(), whole.len());
    assert_eq!(sorted_pairs(&split.all()), sorted_pairs(&whole.all()));
}

#[test]
fn test_insert_then_remove_restores_contents() {
    let base = grid_points(5, 5);
    let mut tree = RangeTree::bulk(2, base.clone()).unwrap();
    let before = sorted_pairs(&tree.all());

    let extra = vec![pt2(20, 20), pt2(-3, 7), pt2(20, 21)];
    tree.insert(extra.clone());
    assert_eq!(tree.len(), base.len() + extra.len());

    tree.remove(&extra);
    assert_eq!(sorted_pairs(&tree.all()), before);
}

#[test]
fn test_three_dimensions() {
    info!("Starting 3D test");
    let mut points = Vec::new();
    for x in 0..4 {
        for y in 0..4 {
            for z in 0..4 {
                points.push(pt3(x, y, z));
            }
        }
    }
    let mut tree = RangeTree::bulk(3, points).unwrap();
    assert_eq!(tree.len(), 64);

    let found = tree.get_range(&query3([(1, 3), (0, 2), (2, 4)]));
    assert_eq!(found.len(), 2 * 2 * 2);
    for p in &found {
        assert!(p.coord(1) >= 1 && p.coord(1) < 3);
        assert!(p.coord(2) < 2);
        assert!(p.coord(3) >= 2);
    }

    tree.remove(&[pt3(1, 1, 2), pt3(2, 0, 3)]);
    assert_eq!(tree.len(), 62);
    assert_eq!(tree.get_range(&query3([(1, 3), (0, 2), (2, 4)])).len(), 6);
    info!("3D test completed successfully");
}

#[test]
fn test_large_bulk_batch_uses_parallel_path() {
    // Large enough to cross the internal parallel cutoff.
    let side = 64;
    let mut tree = RangeTree::bulk(2, grid_points(side, side)).unwrap();
    assert_eq!(tree.len(), (side * side) as usize);

    assert_eq!(
        tree.get_range(&query2(10, 20, 0, side)).len(),
        (10 * side) as usize
    );

    let removals: Vec<_> = (0..side).map(|i| pt2(i, i)).collect();
    assert_eq!(tree.remove(&removals), side as usize);
    assert_eq!(tree.len(), (side * side - side) as usize);
    assert!(tree.get_range(&query2(7, 8, 7, 8)).is_empty());
}
