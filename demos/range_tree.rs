use rangetree::geometry::{BoxQuery, GridPoint};
use rangetree::range_tree::RangeTree;

fn main() {
    // --- Sparse matrix view over a 2D range tree ---
    println!("--- 2D Range Tree Example ---");
    let mut tree: RangeTree<GridPoint<&str>> = RangeTree::new(2).unwrap();

    // Insert some cells
    tree.insert(vec![
        GridPoint::new(vec![1, 2], Some("A")),
        GridPoint::new(vec![8, 3], Some("B")),
        GridPoint::new(vec![4, 7], Some("C")),
        GridPoint::new(vec![4, 1], Some("D")),
        GridPoint::new(vec![9, 9], Some("E")),
    ]);
    println!("Stored {} cells", tree.len());

    // Query a window of the matrix
    let window = BoxQuery::unbounded(2)
        .with_bound(1, 0, 5)
        .with_bound(2, 0, 5);
    for cell in tree.get_range(&window) {
        println!(
            "({}, {}) -> {:?}",
            cell.coords[0], cell.coords[1], cell.data
        );
    }

    // Re-inserting a cell replaces its payload
    tree.insert(vec![GridPoint::new(vec![4, 1], Some("D2"))]);
    let updated = tree.get_range(&BoxQuery::unbounded(2).with_bound(1, 4, 5).with_bound(2, 1, 2));
    println!("Updated cell: {:?}", updated[0].data);

    // Remove a column slice and count what is left
    tree.remove(&[
        GridPoint::new(vec![4, 7], None),
        GridPoint::new(vec![4, 1], None),
    ]);
    println!("{} cells after removal", tree.len());

    // --- A 3D tree works the same way ---
    println!("--- 3D Range Tree Example ---");
    let mut tree3d: RangeTree<GridPoint<u32>> = RangeTree::new(3).unwrap();
    tree3d.insert(vec![
        GridPoint::new(vec![1, 2, 3], Some(1)),
        GridPoint::new(vec![4, 5, 6], Some(2)),
        GridPoint::new(vec![7, 8, 9], Some(3)),
    ]);
    let box3d = BoxQuery::unbounded(3)
        .with_bound(1, 0, 5)
        .with_bound(2, 0, 6)
        .with_bound(3, 0, 7);
    println!("Points in box: {:?}", tree3d.get_range(&box3d).len());
}
