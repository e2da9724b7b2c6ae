//! bluegreen-core — blue/green deployment color state over a managed table.
//!
//! Stores one active color ("blue" or "green") per deployment key in a
//! DynamoDB table, lazily creating the table on first use. The five
//! orchestrator-facing operations (`init`, `get-active`, `set-active`,
//! `get-inactive`, `toggle`) live in [`dispatch`]; storage access sits
//! behind the [`store::TableStore`] seam so everything above the AWS
//! client runs against [`memory::MemoryStore`] in tests.
//!
//! One invocation performs one action and exits. Writes are unconditional
//! row puts (last-writer-wins); concurrent invocations must be serialized
//! by the caller.

pub mod color;
pub mod dispatch;
pub mod dynamo;
pub mod error;
pub mod memory;
pub mod repo;
pub mod store;
pub mod types;

pub use color::Color;
pub use dispatch::{Action, Outcome, Request, dispatch};
pub use dynamo::DynamoStore;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use repo::StateRepository;
pub use store::{StoreConfig, TableStore};
pub use types::{DeploymentState, Provenance, StateRow};
