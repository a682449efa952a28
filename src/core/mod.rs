//! Core modules of the pindefs toolchain.
//!
//! The pipeline reads a KiCad netlist export, groups components into named
//! snippets, derives the logical-to-physical pin table, and renders it.

pub mod config;
pub mod error;
pub mod export;
pub mod group;
pub mod header;
pub mod ident;
pub mod mapgen;
pub mod netlist;
pub mod pins;
pub mod xml;
