//! Security group ACL compiler.
//!
//! Translates security group rules into the ACL records of a virtual
//! switch's northbound database. The pipeline, leaf to root:
//!
//! - [`protocol`]: normalizes a rule's protocol token
//! - [`matcher`]: builds the match expression for one rule on one port
//! - [`entry`]: wraps a match into an [`AclRecord`](sgacl_types::AclRecord)
//! - [`defaults`]: drop baseline plus DHCP allows for a port
//! - [`AclCompiler::compile_port`]: the complete ACL set for a port
//! - [`AclCompiler::update_for_rule_change`]: per-port entries for one
//!   added or removed rule
//!
//! Directory data comes in through the [`Directory`] trait and compiled
//! records go out through [`AclApplier`]. Both are supplied by the caller.
//!
//! # Example
//!
//! ```ignore
//! use sgacl::{AclCompiler, CompilerConfig, InMemoryDirectory, LookupCache};
//!
//! let directory = InMemoryDirectory::from_json_file("snapshot.json")?;
//! let compiler = AclCompiler::new(CompilerConfig::load()?, &directory);
//!
//! let mut cache = LookupCache::new();
//! for (port_id, acls) in compiler.compile_ports(&directory.ports, &mut cache)? {
//!     println!("{}: {} ACLs", port_id, acls.len());
//! }
//! ```

pub mod addresses;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod directory;
pub mod entry;
pub mod error;
pub mod matcher;
pub mod protocol;
pub mod update;

pub use addresses::{port_addresses, PortAddresses};
pub use assembler::AclCompiler;
pub use cache::{CacheStats, LookupCache};
pub use config::{Capabilities, CompilerConfig, DEFAULT_CONFIG_PATH};
pub use directory::{AclApplier, Directory, InMemoryDirectory};
pub use error::{CompileError, ConfigError, Result};
pub use matcher::address_set_name;
pub use protocol::{Protocol, ProtocolClass};
pub use update::AclUpdate;
