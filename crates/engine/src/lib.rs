//! # CWL Inspector Engine
//!
//! The engine answers structural and semantic queries against tool and
//! workflow descriptions without executing them: field lookup, positional
//! lookup, derivation of the literal command line a tool would run, and
//! resolution of the files an output would produce.
//!
//! ## Key Features
//!
//! - **Path Resolution**: dotted paths with id-keyed sections and positional shorthand
//! - **Expression Evaluation**: `$(...)` / `${...}` templates, restricted or script-backed
//! - **Command Lines**: container wrapper, arguments ordered by position, stdout capture
//! - **Output Listing**: glob expansion rooted at the configured output directory
//!
//! ## Usage
//!
//! ```rust
//! use cwl_inspector_engine::{Document, InspectOptions, inspect};
//! use cwl_inspector_types::Settings;
//! use serde_json::json;
//!
//! let document = Document::from_yaml_str(
//!     "class: CommandLineTool\nbaseCommand: cowsay\ninputs:\n  - id: input\n    type: string\n    label: Input string\n    inputBinding: {position: 0}\n",
//!     "inline",
//!     ".",
//! )?;
//! let options = InspectOptions::default();
//!
//! let label = inspect(&document, ".inputs.0.label", &Settings::default(), &options)?;
//! assert_eq!(label, json!("Input string"));
//!
//! let mut settings = Settings::default();
//! settings.args.insert("input".into(), json!("Hello!"));
//! assert_eq!(inspect(&document, "commandline", &settings, &options)?, json!("cowsay Hello!"));
//! # Ok::<(), cwl_inspector_engine::InspectError>(())
//! ```
//!
//! ## Architecture
//!
//! - **`field_paths`** and **`sections`**: the path resolver and id-indexing of sections
//! - **`resolve`**, **`templates`**, **`script`**: template parsing and the two evaluation strategies
//! - **`inputs_context`**: the `inputs` object exposed to expressions
//! - **`command_line`** and **`outputs`**: command-line synthesis and output location
//! - **`query`**: classification and dispatch of query strings
//! - **`workflow`**: step lookup and argument wiring for `commandline(<step>)`

pub mod command_line;
pub mod document;
pub mod error;
pub mod field_paths;
pub mod inputs_context;
pub mod options;
pub mod outputs;
pub mod query;
pub mod resolve;
pub mod script;
pub mod sections;
pub mod templates;
pub mod workflow;

pub use command_line::synthesize;
pub use document::{Document, DocumentLocator, SiblingFileLocator};
pub use error::{InspectError, Result};
pub use field_paths::{fetch_or, resolve};
pub use inputs_context::build_inputs_context;
pub use options::{ContainerRuntime, InspectOptions};
pub use outputs::locate_outputs;
pub use query::{Query, inspect};
pub use resolve::{Evaluated, Evaluator, ExpressionMode};
