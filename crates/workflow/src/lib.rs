//! renewal-workflow: the renewal wizard and its confirm action.
//!
//! Ties the pure computations of `renewal-core` to an `AgreementStore`:
//!
//! - [`wizard`] -- staging, editing and the atomic confirm
//! - [`config`] -- TOML configuration and the delta engine check
//! - [`navigation`] -- the directive returned to the caller after confirm

pub mod config;
mod error;
pub mod navigation;
pub mod wizard;

pub use config::{ConfigError, DeltaEngine, RenewalConfig};
pub use error::RenewalError;
pub use navigation::{
    ActionDescriptor, ActionRegistry, ActionResolver, NavigationContext, NavigationDirective,
    NoActions,
};
pub use wizard::{RenewalOutcome, RenewalService, RenewalWizard, WizardStep};
