pub mod io;
pub mod map;
pub mod nested;
pub mod order;
pub mod paths;
pub mod relocate;

pub use map::run_map;
pub use nested::run_merge_nested;
pub use order::run_reorder;
pub use paths::run_bucket_paths;
pub use relocate::run_move;
