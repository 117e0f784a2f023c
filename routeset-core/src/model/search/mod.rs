mod astar;
mod dijkstra;
mod path_finder;
mod search_scratch;

pub use astar::{a_star, AStarHeuristic};
pub use dijkstra::dijkstra;
pub use path_finder::{walk_route, PathFinder};
pub use search_scratch::SearchScratch;
