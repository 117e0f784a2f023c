use std::hash::{Hash, Hasher};

/// An unordered set of banned compact link ids, the node identity of the
/// BFS-LE graph-of-graphs.
///
/// The hash is a wrapping sum of a per-element integer mix, maintained
/// incrementally, so two sets with the same membership hash equal no
/// matter the insertion order that produced them. Links are kept sorted
/// so equality is a slice comparison.
#[derive(Debug, Clone, Eq)]
pub struct LinkSet {
    links: Vec<u32>,
    hash: u64,
}

impl LinkSet {
    pub fn empty() -> Self {
        Self {
            links: Vec::new(),
            hash: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, link: u32) -> bool {
        self.links.binary_search(&link).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.links.iter().copied()
    }

    /// the set extended by `link`, or `None` when the link is already a
    /// member.
    pub fn with_link(&self, link: u32) -> Option<Self> {
        match self.links.binary_search(&link) {
            Ok(_) => None,
            Err(position) => {
                let mut links = Vec::with_capacity(self.links.len() + 1);
                links.extend_from_slice(&self.links[..position]);
                links.push(link);
                links.extend_from_slice(&self.links[position..]);
                Some(Self {
                    links,
                    hash: self.hash.wrapping_add(mix(link)),
                })
            }
        }
    }
}

impl PartialEq for LinkSet {
    fn eq(&self, other: &Self) -> bool {
        self.links == other.links
    }
}

impl Hash for LinkSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// splitmix64 finalizer over the link id.
fn mix(link: u32) -> u64 {
    let mut x = link as u64;
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}
