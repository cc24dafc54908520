//! Command implementations for nvme-fw

pub mod scan;
pub mod update;

pub use scan::scan;
pub use update::update;
