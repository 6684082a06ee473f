#![forbid(unsafe_code)]

//! Layout primitives: the measure protocol and stack negotiation.
//!
//! # Role in Lumen
//! `lumen-layout` is pure arithmetic. It defines what a parent proposes,
//! what a child answers, and how a stack turns its children's answers into
//! concrete extents. Views call into it from `lumen-widgets`; nothing here
//! touches text or state.

pub mod measure;
pub mod stack;

pub use lumen_core::geometry::{Sides, Size};
pub use measure::{Alignment, Axis, ProposedSize, ViewSize};
pub use stack::{AxisDemand, StackPlan, distribute, plan_stack};
