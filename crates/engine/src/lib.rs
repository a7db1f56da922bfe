//! Locate a previously observed HTML fragment in a document, gather the
//! markup, style and script around it, and write a replacement back.

pub mod config;
pub mod context;
pub mod patch;
pub mod storage;

mod descriptor;
mod error;
mod locator;
mod project;
mod resources;
mod session;

pub use crate::config::{
    AncestorDepth, AncestorPolicy, ContextConfig, EngineConfig, Fallback, LocatorConfig,
    PatchConfig, ReplaceStrategy, StyleGranularity,
};
pub use crate::context::{ContextBundle, collect_context};
pub use crate::descriptor::{Fragment, FragmentDescriptor, class_set};
pub use crate::error::{EngineError, Result};
pub use crate::locator::{Locator, Match, Strategy};
pub use crate::patch::{
    PatchReport, PatchRequest, PatchTargets, ResourceTarget, RuleChange, ScriptOutcome,
    StyleOutcome,
};
pub use crate::project::{ENTRY_DOCUMENT, Project};
pub use crate::resources::{Resources, Source};
pub use crate::session::{Engine, Resolution};
