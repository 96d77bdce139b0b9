#![forbid(unsafe_code)]

//! Composable form state.
//!
//! Three node kinds share one capability, [`FormNode`]:
//!
//! - [`Field`]: a leaf owning one value cell and one error cell.
//! - [`Shape`]: a fixed set of named children plus a shape-level error.
//! - [`List`]: an ordered, resizable sequence of children plus a list-level
//!   error.
//!
//! Children may be any node kind, to any depth. A container's value and error
//! are computed from its children on every read; nothing is cached, so a
//! write anywhere in the tree is visible at every ancestor on the next read.
//! Node handles are `Rc`-backed: a node reachable from several containers is
//! one node, and writes through any handle are seen through all of them.
//!
//! Errors collapse: a container with no error of its own and no child errors
//! reports `None`, never an all-empty structure. See [`node`] for the rule.
//!
//! Everything here is single-threaded and synchronous. Observers attach with
//! [`FormNode::subscribe`]; grouping several writes so observers see them
//! once is done with [`sweety_reactive::batch`].

pub mod error;
pub mod field;
pub mod list;
pub mod node;
pub mod shape;
pub mod validate;

pub use error::{FormError, Result};
pub use field::Field;
pub use list::{List, ListError};
pub use node::{FormNode, Listener, NoError};
pub use shape::{Shape, ShapeError, ShapeFields};
pub use sweety_reactive::Subscription;
pub use validate::{Validator, always_valid, first_error, no_error, validator};
