#![warn(missing_docs)]
//! Core models for a "large country" partial-equilibrium trade model.
//!
//! A home market (demand and supply) trades a single good with a foreign exporter whose
//! export supply is upward sloping. The home country levies a tariff, either specific or
//! ad-valorem, on imports. The numerical work of locating equilibria and integrating
//! welfare changes lives in `pem-solver`; this crate only describes the market and the
//! shape of the results.

/// Market primitives and result structures for the trade model.
///
/// The models in this module are primarily data structures with minimal business logic.
/// Evaluating a supply or demand curve at a price is the only computation they perform;
/// everything that requires root-finding or integration is done by the solver crate.
pub mod models;
