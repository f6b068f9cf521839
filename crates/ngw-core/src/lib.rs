//! NG word filter core
//!
//! Hides search result cards on Bing, Google and Google News whose text
//! matches a user-maintained block list. Everything here is browser-agnostic:
//! the page is reached through the [`dom::Dom`] trait, so the same engine runs
//! inside the content script and against saved pages in tests and the CLI.
//!
//! # Architecture
//!
//! A block list is parsed into a [`RuleSet`]. Each pass asks the site adapters
//! active for the current page to discover result cards, the matcher tests
//! every rule against each card's title, site and description text, and the
//! hide engine records matches as markers on the card elements themselves.
//! A [`FilterSession`] ties this to page events and storage changes.
//!
//! # Modules
//!
//! - `parser`, `rule`, `list`: block-list lines, compiled rules and list editing
//! - `dom`, `document`, `selector`, `classify`: document access and structural queries
//! - `page`, `adapters`: page classification and per-site card extraction
//! - `matcher`, `hide`, `orchestrator`: one filter pass
//! - `scheduler`, `session`, `state`, `config`, `notify`: lifecycle and host glue
//! - `style`: marker names and the injected stylesheet

pub mod adapters;
pub mod classify;
pub mod config;
pub mod document;
pub mod dom;
pub mod hide;
pub mod list;
pub mod matcher;
pub mod notify;
pub mod orchestrator;
pub mod page;
pub mod parser;
pub mod rule;
pub mod scheduler;
pub mod selector;
pub mod session;
pub mod state;
pub mod style;
pub mod types;

// Re-export commonly used types
pub use adapters::{AdapterKind, SiteAdapter};
pub use config::{ConfigError, StorageChanges, StoredConfig, SubOptions, Tuning};
pub use dom::{Dom, DomExt};
pub use hide::{HideEngine, Inspection};
pub use notify::{badge_text, CountNotifier, NoopNotifier, NotifyError};
pub use orchestrator::{run_pass, PassReport};
pub use page::PageContext;
pub use parser::{RuleDiagnostic, RuleSet};
pub use rule::{Rule, RuleError};
pub use scheduler::{TimerKind, TimerRequest};
pub use session::{FilterSession, Started};
pub use types::{CardState, Field, HideOutcome, PageType, RuleOptions, SiteType};
