//! Mermaid description builders for process flows and org charts.

pub mod org;
pub mod process;
pub mod sanitize;

pub use org::build_org_diagram;
pub use process::build_process_diagram;
pub use sanitize::sanitize_label;
