//! # Overview
//!
//! Crate for converting exported animation clips and meshes from FBX into GLTF/GLB
//! so that the game can load them.
//!
//! The conversion itself is done by an external tool (`fbx2gltf` or Blender). This
//! crate only does the bookkeeping around it: it discovers the source files of every
//! configured group, invokes the [converter](Converter) once per file, classifies the
//! outcome and writes an animation mapping and a log file at the end of the run.
//!
//! ## Example:
//!
//! **Source Directory:**
//!
//! ```text
//! assets/Animations/
//! ├─ Aurora/
//! │  ├─ Idle.FBX
//! │  ├─ Jog_Fwd.FBX
//! ├─ Great_Sword/
//! │  ├─ Great Sword Idle.fbx
//! ```
//!
//! **Output Directory:**
//!
//! ```text
//! assets/Animations_GLTF/
//! ├─ Aurora/
//! │  ├─ Idle.gltf
//! │  ├─ Jog_Fwd.gltf
//! ├─ Great_Sword/
//! │  ├─ Great Sword Idle.gltf
//! ├─ animation_mapping.json
//! ├─ conversion_log.txt
//! ```
//!
//! # Components
//!
//! The [`ConversionPipeline`] drives a run. It checks that the converter is available,
//! prepares the [`OutputLayout`], lets the [walker](scan_group) find the tasks of every
//! group, runs [`convert_task`] for each of them and aggregates the outcomes in the
//! [`RunStatistics`]. The [`AnimationMapping`] and the [`ConversionLog`] are written last.

mod common;
mod config;
mod converter;
mod layout;
mod pattern;
mod pipeline;
mod process;
mod report;
mod statistics;
mod task;
mod walker;

pub use common::{Error, OutputFormat, Result};
pub use config::*;
pub use converter::*;
pub use layout::*;
pub use pattern::WildcardPattern;
pub use pipeline::*;
pub use process::{run_process, ProcessOutput, ProcessStatus};
pub use report::*;
pub use statistics::*;
pub use task::*;
pub use walker::*;
