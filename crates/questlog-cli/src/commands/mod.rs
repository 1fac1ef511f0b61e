pub mod badges;
pub mod config;
pub mod group;
pub mod profile;
pub mod rewards;
pub mod task;

use chrono::Local;
use questlog_core::{Action, Engine, Event, Feature, Profile};

use crate::store::Store;

/// A logged-in user's profile with the engine and store behind it.
pub struct Session {
    pub store: Store,
    pub engine: Engine,
    pub profile: Profile,
}

impl Session {
    /// Open the stored profile of `user_id`.
    pub fn open(user_id: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let store = Store::open()?;
        let engine = Engine::new(store.load_config()?);
        let profile = store.load_profile(&engine, user_id)?.ok_or_else(|| {
            format!("no profile for user '{user_id}'; run `questlog profile init --email <email>` first")
        })?;
        Ok(Self {
            store,
            engine,
            profile,
        })
    }

    /// Fail unless `feature` is unlocked at the current level.
    pub fn require(&self, feature: Feature) -> Result<(), Box<dyn std::error::Error>> {
        if self.engine.is_unlocked(&self.profile, feature) {
            Ok(())
        } else {
            Err(locked(&self.engine, feature).into())
        }
    }

    /// Gate, apply and persist `action`, then print what happened.
    /// Recurring tasks follow the local calendar.
    pub fn apply(&mut self, action: Action) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
        if let Some(feature) = self.engine.locked_feature(&self.profile, &action) {
            return Err(locked(&self.engine, feature).into());
        }

        let outcome = self.engine.apply_in(&self.profile, action, &Local::now())?;
        if outcome.changed {
            self.store.save_profile(&outcome.profile)?;
        } else {
            println!("Nothing changed.");
        }
        for event in &outcome.events {
            println!("{event}");
        }
        self.profile = outcome.profile;
        Ok(outcome.events)
    }
}

fn locked(engine: &Engine, feature: Feature) -> String {
    format!(
        "'{}' unlocks at level {}",
        feature,
        engine.config().unlocks.threshold(feature)
    )
}

/// Id of the task or group an add action created.
pub fn added_id(events: &[Event]) -> Option<&str> {
    events.iter().find_map(|event| match event {
        Event::TaskAdded { task_id, .. } => Some(task_id.as_str()),
        _ => None,
    })
}
