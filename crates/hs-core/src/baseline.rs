//! Reference environments to diff against.
//!
//! A baseline is a freshly built environment carrying only built-in
//! registrations. It shares nothing with the live environment, must be
//! ready before it is walked, and is torn down after the one diff pass.

use std::sync::Arc;

use hs_common::{Error, Result};

use crate::environment::Environment;
use crate::walker::{walk, WalkOptions, WalkResult};

/// Lifecycle of a baseline environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineState {
    Loading,
    Ready,
    Released,
}

impl std::fmt::Display for BaselineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineState::Loading => write!(f, "loading"),
            BaselineState::Ready => write!(f, "ready"),
            BaselineState::Released => write!(f, "released"),
        }
    }
}

/// Produces reference environments.
pub trait BaselineProvider {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Build a new, ready baseline.
    fn load(&self) -> Result<BaselineEnvironment>;
}

/// A reference environment and its lifecycle state.
pub struct BaselineEnvironment {
    env: Environment,
    state: BaselineState,
}

impl BaselineEnvironment {
    /// Wrap an environment that is still initializing.
    pub fn loading(env: Environment) -> Self {
        BaselineEnvironment {
            env,
            state: BaselineState::Loading,
        }
    }

    pub fn mark_ready(&mut self) {
        if self.state == BaselineState::Loading {
            self.state = BaselineState::Ready;
        }
    }

    pub fn state(&self) -> BaselineState {
        self.state
    }

    /// Walk the baseline. Refused unless it is ready, since a partial
    /// walk would flag every genuine built-in as injected.
    pub fn walk(&self, options: &WalkOptions) -> Result<WalkResult> {
        match self.state {
            BaselineState::Ready => Ok(walk(&self.env.root(), options)),
            other => Err(Error::BaselineUnavailable(format!(
                "baseline is {other}, not ready"
            ))),
        }
    }

    /// Tear the environment down. Nothing can be walked afterwards.
    pub fn release(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.state != BaselineState::Released {
            self.env.teardown();
            self.state = BaselineState::Released;
        }
    }
}

impl Drop for BaselineEnvironment {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Extra registration applied to every reference environment.
pub type Registration = Arc<dyn Fn(&Environment) + Send + Sync>;

/// The built-in platform surface, optionally extended with members the
/// host is expected to provide.
#[derive(Clone, Default)]
pub struct ReferenceBaseline {
    registrations: Vec<Registration>,
}

impl ReferenceBaseline {
    pub fn platform() -> Self {
        ReferenceBaseline::default()
    }

    pub fn with_registration(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }
}

impl BaselineProvider for ReferenceBaseline {
    fn name(&self) -> &str {
        "reference"
    }

    fn load(&self) -> Result<BaselineEnvironment> {
        let env = Environment::with_builtins();
        for register in &self.registrations {
            register(&env);
        }
        let mut baseline = BaselineEnvironment::loading(env);
        baseline.mark_ready();
        Ok(baseline)
    }
}
