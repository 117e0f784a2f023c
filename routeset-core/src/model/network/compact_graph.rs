use super::NetworkError;

/// Read-only view of a topologically compressed road network.
///
/// Links are a directed multigraph in CSR layout: `outgoing_links(node)`
/// yields the compact link ids leaving `node`, and `head[link]` the node a
/// link enters. Each compact link expands to one or more original network
/// link ids through the expansion mapping, and compact node indices map
/// back to the network node ids callers know about.
///
/// The first `n_zones` node indices are centroids. When centroid blocking
/// is enabled, path-finding workers rewire a private copy of the `head`
/// array so that no route passes *through* a centroid that is neither the
/// origin nor the destination of the search.
#[derive(Debug, Clone)]
pub struct CompactGraph {
    n_nodes: usize,
    n_zones: usize,
    block_centroid_flows: bool,
    cost: Vec<f64>,
    tail: Vec<u32>,
    head: Vec<u32>,
    // forward star: links grouped by tail node
    fs_offsets: Vec<usize>,
    fs_links: Vec<u32>,
    // backward star: links grouped by head node, used for centroid blocking
    bs_offsets: Vec<usize>,
    bs_links: Vec<u32>,
    // compact link -> original network link ids
    expansion_offsets: Vec<usize>,
    network_link_ids: Vec<u32>,
    n_network_links: usize,
    // external network node id <-> compact node index
    node_to_index: Vec<i64>,
    node_ids: Vec<u32>,
    lon: Option<Vec<f64>>,
    lat: Option<Vec<f64>>,
}

impl CompactGraph {
    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    pub fn n_links(&self) -> usize {
        self.cost.len()
    }

    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    pub fn n_network_links(&self) -> usize {
        self.n_network_links
    }

    pub fn blocks_centroid_flows(&self) -> bool {
        self.block_centroid_flows
    }

    pub fn cost(&self, link: u32) -> f64 {
        self.cost[link as usize]
    }

    pub fn costs(&self) -> &[f64] {
        &self.cost
    }

    pub fn tail(&self, link: u32) -> u32 {
        self.tail[link as usize]
    }

    pub fn head(&self, link: u32) -> u32 {
        self.head[link as usize]
    }

    /// compact link ids leaving `node`.
    pub fn outgoing_links(&self, node: u32) -> &[u32] {
        &self.fs_links[self.fs_offsets[node as usize]..self.fs_offsets[node as usize + 1]]
    }

    /// compact link ids entering `node`.
    pub fn incoming_links(&self, node: u32) -> &[u32] {
        &self.bs_links[self.bs_offsets[node as usize]..self.bs_offsets[node as usize + 1]]
    }

    /// iterator of `(link, head)` pairs leaving `node`, over the shared
    /// (unblocked) head array.
    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.outgoing_links(node)
            .iter()
            .map(move |&link| (link, self.head[link as usize]))
    }

    /// original network link ids for a compact link, in traversal order.
    pub fn network_links(&self, link: u32) -> &[u32] {
        let l = link as usize;
        &self.network_link_ids[self.expansion_offsets[l]..self.expansion_offsets[l + 1]]
    }

    /// resolve an external network node id to its compact index.
    pub fn node_index(&self, external: u32) -> Option<u32> {
        match self.node_to_index.get(external as usize) {
            Some(&idx) if idx >= 0 => Some(idx as u32),
            _ => None,
        }
    }

    /// external network node id of a compact node index.
    pub fn node_id(&self, index: u32) -> u32 {
        self.node_ids[index as usize]
    }

    /// per-node (lon, lat) views, when the graph was built with coordinates.
    pub fn coordinates(&self) -> Option<(&[f64], &[f64])> {
        match (&self.lon, &self.lat) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }

    /// a private copy of the head array for one worker thread.
    pub fn clone_head(&self) -> Vec<u32> {
        self.head.clone()
    }

    /// Rewire a worker's private head copy so that centroids other than
    /// `origin` have no usable outgoing links and centroids other than
    /// `destination` have no usable incoming links. Rewired links become
    /// self-loops, which a non-negative-cost search never relaxes.
    ///
    /// Must be paired with [`Self::unblock_centroid_flows`] before the
    /// head copy is reused for another OD pair.
    pub fn block_centroid_flows(&self, head: &mut [u32], origin: u32, destination: u32) {
        if !self.block_centroid_flows {
            return;
        }
        for zone in 0..self.n_zones as u32 {
            if zone != origin {
                for &link in self.outgoing_links(zone) {
                    head[link as usize] = zone;
                }
            }
            if zone != destination {
                for &link in self.incoming_links(zone) {
                    head[link as usize] = self.tail[link as usize];
                }
            }
        }
    }

    /// restore a head copy modified by [`Self::block_centroid_flows`].
    pub fn unblock_centroid_flows(&self, head: &mut [u32], origin: u32, destination: u32) {
        if !self.block_centroid_flows {
            return;
        }
        for zone in 0..self.n_zones as u32 {
            if zone != origin {
                for &link in self.outgoing_links(zone) {
                    head[link as usize] = self.head[link as usize];
                }
            }
            if zone != destination {
                for &link in self.incoming_links(zone) {
                    head[link as usize] = self.head[link as usize];
                }
            }
        }
    }
}

/// Assembles a [`CompactGraph`] from per-link records.
///
/// Link ids are assigned in insertion order. The expansion mapping, node
/// id mapping and coordinates are optional; they default to the identity
/// mapping and "no coordinates".
pub struct CompactGraphBuilder {
    n_nodes: usize,
    n_zones: usize,
    block_centroid_flows: bool,
    tails: Vec<u32>,
    heads: Vec<u32>,
    costs: Vec<f64>,
    expansions: Option<Vec<Vec<u32>>>,
    node_ids: Option<Vec<u32>>,
    coordinates: Option<Vec<(f64, f64)>>,
}

impl CompactGraphBuilder {
    pub fn new(n_nodes: usize) -> Self {
        Self {
            n_nodes,
            n_zones: 0,
            block_centroid_flows: false,
            tails: Vec::new(),
            heads: Vec::new(),
            costs: Vec::new(),
            expansions: None,
            node_ids: None,
            coordinates: None,
        }
    }

    /// declare the first `n_zones` nodes as centroids and set the
    /// centroid-blocking toggle.
    pub fn with_zones(mut self, n_zones: usize, block_centroid_flows: bool) -> Self {
        self.n_zones = n_zones;
        self.block_centroid_flows = block_centroid_flows;
        self
    }

    /// per-compact-link original network link ids, aligned with link
    /// insertion order.
    pub fn with_expansions(mut self, expansions: Vec<Vec<u32>>) -> Self {
        self.expansions = Some(expansions);
        self
    }

    /// external network node id per compact node index.
    pub fn with_node_ids(mut self, node_ids: Vec<u32>) -> Self {
        self.node_ids = Some(node_ids);
        self
    }

    /// per-node (lon, lat), enabling the A* heuristic.
    pub fn with_coordinates(mut self, coordinates: Vec<(f64, f64)>) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// append a directed link, returning its compact link id.
    pub fn add_link(&mut self, tail: u32, head: u32, cost: f64) -> u32 {
        let id = self.tails.len() as u32;
        self.tails.push(tail);
        self.heads.push(head);
        self.costs.push(cost);
        id
    }

    pub fn build(self) -> Result<CompactGraph, NetworkError> {
        let n_nodes = self.n_nodes;
        let n_links = self.costs.len();

        if self.n_zones > n_nodes {
            return Err(NetworkError::TooManyZones {
                n_zones: self.n_zones,
                n_nodes,
            });
        }
        for (link, &cost) in self.costs.iter().enumerate() {
            if !cost.is_finite() || cost < 0.0 {
                return Err(NetworkError::InvalidCost(link, cost));
            }
        }
        for link in 0..n_links {
            for node in [self.tails[link], self.heads[link]] {
                if node as usize >= n_nodes {
                    return Err(NetworkError::NodeOutOfRange {
                        link,
                        node,
                        n_nodes,
                    });
                }
            }
        }

        let (fs_offsets, fs_links) = star(n_nodes, &self.tails);
        let (bs_offsets, bs_links) = star(n_nodes, &self.heads);

        let expansions = match self.expansions {
            Some(expansions) => {
                if expansions.len() != n_links {
                    return Err(NetworkError::LengthMismatch {
                        collection: "expansion",
                        expected: n_links,
                        found: expansions.len(),
                    });
                }
                expansions
            }
            None => (0..n_links as u32).map(|l| vec![l]).collect(),
        };
        let mut expansion_offsets = Vec::with_capacity(n_links + 1);
        let mut network_link_ids = Vec::new();
        expansion_offsets.push(0);
        for (link, expansion) in expansions.iter().enumerate() {
            if expansion.is_empty() {
                return Err(NetworkError::EmptyExpansion(link));
            }
            network_link_ids.extend_from_slice(expansion);
            expansion_offsets.push(network_link_ids.len());
        }
        let n_network_links = network_link_ids
            .iter()
            .max()
            .map(|&max| max as usize + 1)
            .unwrap_or(0);

        let node_ids = match self.node_ids {
            Some(node_ids) => {
                if node_ids.len() != n_nodes {
                    return Err(NetworkError::LengthMismatch {
                        collection: "node id",
                        expected: n_nodes,
                        found: node_ids.len(),
                    });
                }
                node_ids
            }
            None => (0..n_nodes as u32).collect(),
        };
        let max_id = node_ids.iter().max().map(|&id| id as usize).unwrap_or(0);
        let mut node_to_index = vec![-1i64; max_id + 1];
        for (index, &id) in node_ids.iter().enumerate() {
            node_to_index[id as usize] = index as i64;
        }

        let (lon, lat) = match self.coordinates {
            Some(coordinates) => {
                if coordinates.len() != n_nodes {
                    return Err(NetworkError::LengthMismatch {
                        collection: "coordinate",
                        expected: n_nodes,
                        found: coordinates.len(),
                    });
                }
                let (lon, lat): (Vec<f64>, Vec<f64>) = coordinates.into_iter().unzip();
                (Some(lon), Some(lat))
            }
            None => (None, None),
        };

        Ok(CompactGraph {
            n_nodes,
            n_zones: self.n_zones,
            block_centroid_flows: self.block_centroid_flows,
            cost: self.costs,
            tail: self.tails,
            head: self.heads,
            fs_offsets,
            fs_links,
            bs_offsets,
            bs_links,
            expansion_offsets,
            network_link_ids,
            n_network_links,
            node_to_index,
            node_ids,
            lon,
            lat,
        })
    }
}

/// group link ids by an endpoint array into CSR offsets + link list.
fn star(n_nodes: usize, endpoint: &[u32]) -> (Vec<usize>, Vec<u32>) {
    let mut counts = vec![0usize; n_nodes + 1];
    for &node in endpoint {
        counts[node as usize + 1] += 1;
    }
    for node in 0..n_nodes {
        counts[node + 1] += counts[node];
    }
    let offsets = counts.clone();
    let mut cursor = counts;
    let mut links = vec![0u32; endpoint.len()];
    for (link, &node) in endpoint.iter().enumerate() {
        links[cursor[node as usize]] = link as u32;
        cursor[node as usize] += 1;
    }
    (offsets, links)
}
