//! File actions module.
//!
//! This module provides functionality for:
//! - The per-pair resolution policy (report, prompt, link, pattern delete)
//! - Permanent deletion and hardlink replacement
//! - The interactive single-character prompt
//!
//! # Resolution
//!
//! ```no_run
//! use dupelink::actions::{ResolveConfig, Resolver};
//! use dupelink::duplicates::DuplicatePair;
//!
//! let resolver = Resolver::stdout(ResolveConfig {
//!     link: true,
//!     ..Default::default()
//! });
//! let resolution = resolver.resolve(&DuplicatePair::new("/d/b".into(), "/d/a".into()));
//! println!("{:?}", resolution.actions());
//! ```

pub mod delete;
pub mod prompt;
pub mod resolve;

// Re-export commonly used types
pub use delete::{relink, remove_duplicate, remove_file, ActionError};
pub use prompt::{Choice, Prompt, TerminalPrompt, DEFAULT_PROMPT_RETRIES, PROMPT_TEXT};
pub use resolve::{Action, Resolution, ResolveConfig, Resolver};
