mod layout;
mod pyvenv;

pub use layout::VenvLayout;
pub use pyvenv::{PyvenvCfg, PARENT_KEY, VERSION_KEY};
