//! jlcprep - Prepare PCB fabrication exports for JLCPCB assembly
//!
//! Converts a project export folder (BOM, Pick Place, Gerber, NC Drill) into
//! the files JLCPCB accepts: a remapped BOM, a remapped placement file and a
//! flat Gerber/drill archive, all written to `<project>/JLCPCB`.

pub mod archive;
pub mod bom;
pub mod config;
pub mod converter;
pub mod csv_io;
pub mod error;
pub mod pick_place;
pub mod progress;
