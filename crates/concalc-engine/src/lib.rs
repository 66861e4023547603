pub mod calc;
pub mod editing;
pub mod history;
pub mod io;
pub mod merge;
pub mod session;
pub mod viewport;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use calc::*;
pub use editing::*;
pub use history::*;
pub use io::*;
pub use merge::{apply_results, merge_lines};
pub use session::*;
pub use viewport::Viewport;
