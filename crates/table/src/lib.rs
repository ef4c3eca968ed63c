//! Table state: card stacks whose rendered state is swapped in only after
//! every resource it needs has finished loading.

pub mod card;
pub mod config;
pub mod error;
pub mod request;
pub mod rng;
pub mod stack;
pub mod table;

pub use card::{CardInstance, standard_deck};
pub use config::TableConfig;
pub use error::{ConfigError, StackError, TableError};
pub use request::{RequestStatus, UpdateRequest, VisualState};
pub use rng::TableRng;
pub use stack::{FailureReport, StackEntity, StackSpec, StackStyle, TickOutcome};
pub use table::{EntityId, Table};
