// cadre-core/src/provider.rs
use std::fmt;
use std::sync::{Condvar, Mutex};

use cadre_common::error::{CadreError, Result};
use cadre_common::model::dependency::Dependency;
use tracing::debug;

use crate::notation::{normalize, DependencyNotation, Normalized, NotationProvider};

/// Providers may hand back further providers; a chain this deep is a bug
/// in the build logic, not a declaration we should keep chasing.
const MAX_PROVIDER_DEPTH: usize = 32;

/// A provider-backed bucket entry value.
///
/// Forced at most once, strictly after the owning suite's configuration
/// closes. The outcome (success or failure) is memoized, so every
/// (suite, kind) domain referencing the entry observes the same result and
/// the provider itself never runs twice. Concurrent forcers wait for the
/// one evaluation in flight.
pub struct DeferredDependency {
    state: Mutex<State>,
    forced: Condvar,
}

enum State {
    Pending(NotationProvider),
    Forcing,
    Ready(Result<Dependency>),
}

impl DeferredDependency {
    pub fn new(provider: NotationProvider) -> Self {
        Self {
            state: Mutex::new(State::Pending(provider)),
            forced: Condvar::new(),
        }
    }

    pub fn force(&self) -> Result<Dependency> {
        let mut state = self.state.lock().unwrap();
        loop {
            match &*state {
                State::Ready(result) => return result.clone(),
                State::Forcing => state = self.forced.wait(state).unwrap(),
                State::Pending(_) => {
                    let State::Pending(provider) =
                        std::mem::replace(&mut *state, State::Forcing)
                    else {
                        unreachable!()
                    };
                    drop(state);
                    let result = evaluate(provider);
                    let mut state = self.state.lock().unwrap();
                    *state = State::Ready(result.clone());
                    self.forced.notify_all();
                    return result;
                }
            }
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), State::Ready(_))
    }
}

impl fmt::Debug for DeferredDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.lock().unwrap() {
            State::Pending(_) => "pending",
            State::Forcing => "forcing",
            State::Ready(Ok(_)) => "ready",
            State::Ready(Err(_)) => "failed",
        };
        write!(f, "DeferredDependency({state})")
    }
}

fn evaluate(mut provider: NotationProvider) -> Result<Dependency> {
    for _ in 0..MAX_PROVIDER_DEPTH {
        let notation = provider()?;
        match normalize(notation)? {
            Normalized::Eager(dep) => {
                debug!("Forced deferred dependency: {}", dep);
                return Ok(dep);
            }
            Normalized::Deferred(next) => provider = next,
        }
    }
    Err(CadreError::DependencyError(format!(
        "provider chain exceeded {MAX_PROVIDER_DEPTH} levels without producing a dependency"
    )))
}
