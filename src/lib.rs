//! Ustencil is a small library for writing stencil kernels on unstructured
//! meshes. A mesh is described by the neighbor relations between its
//! locations (vertices, edges and cells), stored as padded, fixed-width
//! tables. Values live in strided fields over those locations, which may own
//! their storage or view memory owned by the caller. Kernels traverse the
//! elements of one location, gather values from neighbors through the
//! tables, and reduce them.
//!
//! The reference kernel is the finite-volume nabla (gradient) operator,
//! computed in two phases: an edge phase, which averages a vertex field over
//! the endpoints of each edge, and a vertex phase, which sums the
//! sign-weighted edge values around each vertex. Both phases run either
//! sequentially or data-parallel on Rayon.

pub mod composite;
pub mod connectivity;
pub mod error;
pub mod execution;
pub mod field;
pub mod iteration;
pub mod layout;
pub mod location;
pub mod mesh;
pub mod nabla;
pub mod structured;

pub use error::{Error, Result};
