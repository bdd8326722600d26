//! CLI command implementations

pub mod apply;
pub mod config;
pub mod init;
pub mod policy;

pub use apply::execute as apply;
pub use config::execute as config;
pub use init::execute as init;
pub use policy::execute as policy;
