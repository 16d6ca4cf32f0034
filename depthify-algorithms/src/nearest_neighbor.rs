//! Nearest neighbor search over planar pixel positions

use depthify_core::NearestNeighborSearch;
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPosition = GeomWithData<[f64; 2], usize>;

/// R*-tree backed search, bulk loaded once
pub struct PixelIndex {
    tree: RTree<IndexedPosition>,
}

impl PixelIndex {
    /// Index `positions`; results refer to positions by their slice index
    pub fn new(positions: &[[f64; 2]]) -> Self {
        let items = positions
            .iter()
            .enumerate()
            .map(|(idx, position)| GeomWithData::new(*position, idx))
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl NearestNeighborSearch for PixelIndex {
    fn find_k_nearest(&self, query: &[f64; 2], k: usize) -> Vec<(usize, f64)> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(query)
            .take(k)
            .map(|(item, distance_2)| (item.data, distance_2.sqrt()))
            .collect()
    }
}
