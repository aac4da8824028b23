//! CLI command implementations

pub mod capa;
pub mod cert;
pub mod completions;
pub mod doc;
pub mod init;
pub mod insp;
pub mod ncr;
pub mod sup;
