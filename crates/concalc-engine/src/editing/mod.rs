/*!
 * # Editing Core Module
 *
 * The buffer model every other component works against.
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The whole notebook lives in one **`xi_rope::Rope`**, lines separated by `'\n'`
 * - The caret is a byte offset into that flat text, the selection a byte range
 *
 * ### 2. Command-Based Editing
 * - All edits are **Commands** (`Cmd` enum) compiled to xi-rope **Deltas**
 * - Each command also decides where the caret lands. Structural line commands
 *   locate the caret's line *before* the edit and recompute the caret from it
 *
 * ### 3. Lines as `expression = result`
 * - A line is plain text read as an optional `(expression, result)` pair split on
 *   the first [`line::SEPARATOR`]
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` with the rope buffer, selection and version
 * - **`commands`**: `Cmd` enum, delta compilation and caret placement
 * - **`line`**: separator handling and the shared "locate line" walk
 * - **`motion`**: caret movement for front ends
 * - **`patch`**: edit result metadata including changed ranges and new selection
 */

pub mod commands;
pub mod document;
pub mod line;
pub mod motion;
pub mod patch;

pub use commands::Cmd;
pub use document::{Document, byte_to_point_in_text};
pub use line::{LineLocation, SEPARATOR, expression_of, line_start, locate_line, result_of};
pub use motion::Motion;
pub use patch::Patch;
