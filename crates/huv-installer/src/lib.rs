mod chain;
mod patch;
mod uv;

pub use chain::{ancestors, find_parent};
pub use patch::{patch_activation_scripts, script_path, wire_hierarchy, write_parent_link};
pub use uv::UvTool;

#[cfg(test)]
mod tests;
